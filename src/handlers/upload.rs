//! Image upload endpoint.
//!
//! Accepts a multipart body with the image under `imagen` and an optional
//! target subfolder under `carpeta`. Only JPEG and PNG payloads up to the
//! configured size are stored; filenames are server-assigned.

use std::path::PathBuf;

use axum::{body::Bytes, extract::Multipart, response::IntoResponse, Json};
use serde_json::json;
use uuid::Uuid;

use crate::config;
use crate::error::ApiError;

/// POST /api/upload-img
pub async fn upload_img(mut multipart: Multipart) -> Result<impl IntoResponse, ApiError> {
    let upload = &config::config().upload;

    let mut image: Option<(Bytes, &'static str)> = None;
    let mut carpeta: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("imagen") => {
                let content_type = field.content_type().map(|s| s.to_string());
                let Some(extension) = content_type.as_deref().and_then(extension_for) else {
                    return Err(ApiError::bad_request(format!(
                        "unsupported content type: {}",
                        content_type.as_deref().unwrap_or("none")
                    )));
                };

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(e.to_string()))?;
                if data.len() > upload.max_bytes {
                    return Err(ApiError::bad_request("image exceeds the 5MB limit"));
                }

                image = Some((data, extension));
            }
            Some("carpeta") => {
                let folder = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(e.to_string()))?;
                if !upload.folders.iter().any(|allowed| allowed == &folder) {
                    return Err(ApiError::bad_request(format!("invalid folder: {}", folder)));
                }
                carpeta = Some(folder);
            }
            _ => {}
        }
    }

    let (data, extension) = image.ok_or_else(|| ApiError::bad_request("missing field: imagen"))?;

    let nombre_archivo = format!("{}.{}", Uuid::new_v4(), extension);
    let mut dir = PathBuf::from(&upload.dir);
    if let Some(folder) = &carpeta {
        dir.push(folder);
    }

    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    tokio::fs::write(dir.join(&nombre_archivo), &data)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let url = match &carpeta {
        Some(folder) => format!("/uploads/{}/{}", folder, nombre_archivo),
        None => format!("/uploads/{}", nombre_archivo),
    };

    tracing::info!("stored upload {}", url);

    Ok(Json(json!({
        "success": true,
        "nombreArchivo": nombre_archivo,
        "url": url,
    })))
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        _ => None,
    }
}
