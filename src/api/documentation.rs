use actix_web::{http::header, web, HttpResponse, Responder};
use log::error;

use crate::api::{ApiState, ErrorResponse, JobStatus};

/// Report the state of a job, with a download link once it has completed.
pub async fn get_status(state: web::Data<ApiState>, path: web::Path<String>) -> impl Responder {
    let job_id = path.into_inner();

    let Some(job) = state.tracker.get(&job_id) else {
        return HttpResponse::NotFound().json(ErrorResponse::new("Job not found"));
    };

    let mut body = serde_json::json!({
        "job_id": job.id,
        "status": job.status,
        "progress": job.progress,
        "message": job.message,
        "created_at": job.created_at.to_rfc3339(),
        "updated_at": job.updated_at.to_rfc3339(),
    });
    if job.status == JobStatus::Completed {
        if let Some(document) = &job.document {
            body["download_url"] = serde_json::json!(format!("/api/download/{}", document));
        }
    }

    HttpResponse::Ok().json(body)
}

/// Ask a running job to stop.
pub async fn cancel_job(state: web::Data<ApiState>, path: web::Path<String>) -> impl Responder {
    let job_id = path.into_inner();

    if state.tracker.cancel(&job_id) {
        HttpResponse::Accepted().json(serde_json::json!({
            "job_id": job_id,
            "message": "Cancellation requested"
        }))
    } else {
        HttpResponse::NotFound().json(ErrorResponse::new("No running job with that id"))
    }
}

/// Serve a rendered document from the output directory.
pub async fn download_documentation(
    state: web::Data<ApiState>,
    path: web::Path<String>,
) -> impl Responder {
    let file_name = path.into_inner();

    let Some(file_path) = state.workspace.resolve_document(&file_name) else {
        return HttpResponse::BadRequest().json(ErrorResponse::new("Filename is required"));
    };

    match web::block(move || std::fs::read(file_path)).await {
        Ok(Ok(bytes)) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .insert_header((
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", file_name),
            ))
            .body(bytes),
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            HttpResponse::NotFound().json(ErrorResponse::new("Documentation not found"))
        }
        Ok(Err(e)) => {
            error!("Failed to read document {}: {}", file_name, e);
            HttpResponse::InternalServerError().json(ErrorResponse::new("Failed to read documentation"))
        }
        Err(e) => {
            error!("Download worker failed for {}: {}", file_name, e);
            HttpResponse::InternalServerError().json(ErrorResponse::new("Failed to read documentation"))
        }
    }
}
