use actix_cors::Cors;
use actix_files::Files;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::path::Path;
use std::time::Duration;

use crate::api::documentation::{cancel_job, download_documentation, get_status};
use crate::api::upload::upload_codebase;
use crate::api::{health, ApiState};
use crate::config::Config;
use crate::ingestion::JobWorkspace;

const SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Register the API routes on a service config; shared by the server and tests.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health)).service(
        web::scope("/api")
            .route("/upload", web::post().to(upload_codebase))
            .route("/status/{job_id}", web::get().to(get_status))
            .route("/cancel/{job_id}", web::post().to(cancel_job))
            .route("/download/{filename}", web::get().to(download_documentation)),
    );
}

pub async fn start_server(config: Config) -> std::io::Result<()> {
    let workspace = JobWorkspace::new(&config.storage)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    let api_state = web::Data::new(ApiState::new(workspace, config.storage.max_file_size));

    let retention = chrono::Duration::seconds(config.server.job_retention_secs as i64);
    let sweeper_state = api_state.clone();
    actix_rt::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            sweeper_state.sweep_finished_jobs(retention);
        }
    });

    let static_path = config.server.static_path.clone();
    let serve_static = Path::new(&static_path).is_dir();
    if !serve_static {
        log::info!("Static UI directory {} not found, serving API only", static_path);
    }

    log::info!("Server starting on {}:{}", config.server.host, config.server.port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "HEAD", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::ORIGIN,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ]);

        let mut app = App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(api_state.clone())
            .configure(configure_routes);

        if serve_static {
            app = app.service(Files::new("/", static_path.clone()).index_file("index.html"));
        }
        app
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
