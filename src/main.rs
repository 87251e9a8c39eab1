use code_doc_tool::api::server::start_server;
use code_doc_tool::config::Config;
use log::info;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = Config::from_env().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Failed to load configuration: {}", e),
        )
    })?;

    env_logger::init_from_env(
        env_logger::Env::new().default_filter_or(config.logging.log_level.as_str()),
    );

    info!("Starting Code Documentation Tool...");
    info!("Uploads stored in {}", config.storage.upload_path);
    info!("Documents written to {}", config.storage.output_path);

    start_server(config).await
}
