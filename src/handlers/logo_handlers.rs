use actix_web::{HttpRequest, HttpResponse, Responder, http::header, web};
use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::errors::AppError;
use crate::services::scanner::MAX_IMAGE_BYTES;
use crate::utils::color::is_image_mime;

/// Accept an uploaded logo and hand it back as a data URI for the generator form
pub async fn upload_logo(req: HttpRequest, body: web::Bytes) -> Result<impl Responder, AppError> {
    let mime = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase())
        .unwrap_or_default();

    if !is_image_mime(&mime) {
        return Err(AppError::input("The logo must be an image"));
    }
    if body.len() > MAX_IMAGE_BYTES {
        return Err(AppError::input("The logo is too large (max 5MB)"));
    }
    if body.is_empty() {
        return Err(AppError::input("The logo file is empty"));
    }

    let encoded = web::block(move || {
        image::load_from_memory(&body)
            .map(|_| STANDARD.encode(&body))
            .map_err(|e| AppError::input(format!("Could not read the logo: {}", e)))
    })
    .await??;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "logo": format!("data:{};base64,{}", mime, encoded)
    })))
}
