use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use futures::StreamExt;
use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::api::{ApiState, ErrorResponse};
use crate::ingestion::is_valid_archive;

/// Form field carrying the archive.
pub const UPLOAD_FIELD: &str = "codebase";

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub job_id: String,
    pub message: String,
    pub status: String,
}

/// An archive read out of the multipart form.
struct UploadedFile {
    file_name: String,
    bytes: Vec<u8>,
}

enum FormError {
    Missing,
    TooLarge,
    Malformed(String),
}

/// Read the `codebase` file field, ignoring every other field.
async fn read_upload(mut payload: Multipart, limit: u64) -> Result<UploadedFile, FormError> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| FormError::Malformed(e.to_string()))?;

        let disposition = field.content_disposition();
        if disposition.get_name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = match disposition.get_filename().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(FormError::Missing),
        };

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| FormError::Malformed(e.to_string()))?;
            if (bytes.len() + chunk.len()) as u64 > limit {
                return Err(FormError::TooLarge);
            }
            bytes.extend_from_slice(&chunk);
        }
        if bytes.is_empty() {
            return Err(FormError::Missing);
        }
        return Ok(UploadedFile { file_name, bytes });
    }
    Err(FormError::Missing)
}

/// Accept a multipart archive upload and start processing it in the background.
pub async fn upload_codebase(state: web::Data<ApiState>, payload: Multipart) -> impl Responder {
    let upload = match read_upload(payload, state.max_upload_size).await {
        Ok(upload) => upload,
        Err(FormError::Missing) => {
            return HttpResponse::BadRequest().json(ErrorResponse::new("No file uploaded"));
        }
        Err(FormError::TooLarge) => {
            return HttpResponse::PayloadTooLarge().json(ErrorResponse::new(format!(
                "File exceeds the {} byte upload limit",
                state.max_upload_size
            )));
        }
        Err(FormError::Malformed(e)) => {
            error!("Malformed upload form: {}", e);
            return HttpResponse::BadRequest().json(ErrorResponse::new("Malformed upload form"));
        }
    };

    if !is_valid_archive(&upload.file_name) {
        return HttpResponse::BadRequest().json(ErrorResponse::new(
            "Invalid file type. Please upload .zip, .tar, or .tar.gz files",
        ));
    }

    let job_id = uuid::Uuid::new_v4().to_string();

    let workspace = state.workspace.clone();
    let stored = {
        let job_id = job_id.clone();
        web::block(move || workspace.store_upload(&job_id, &upload.file_name, &upload.bytes)).await
    };
    let archive = match stored {
        Ok(Ok(path)) => path,
        Ok(Err(e)) => {
            error!("Failed to save upload for job {}: {}", job_id, e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::new("Failed to save uploaded file"));
        }
        Err(e) => {
            error!("Upload worker failed for job {}: {}", job_id, e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::new("Failed to save uploaded file"));
        }
    };

    let cancel = state.tracker.start_job(&job_id);
    state.processor.spawn(job_id.clone(), archive, cancel);

    info!("Accepted upload for job {}", job_id);
    HttpResponse::Ok().json(UploadResponse {
        job_id,
        message: "File uploaded successfully. Processing started.".to_string(),
        status: "processing".to_string(),
    })
}
