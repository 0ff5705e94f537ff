use actix_web::{HttpRequest, HttpResponse, Responder, http::header, web};
use serde::Deserialize;

use crate::errors::AppError;
use crate::services::camera::{CameraError, CameraSession, ReportedCamera};
use crate::state::app_state::AppState;

fn content_type(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

/// Decode a QR code from an uploaded image
pub async fn scan_image(
    app_state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<impl Responder, AppError> {
    let content_type = content_type(&req);
    let scanner = app_state.scanner.clone();

    let result = web::block(move || scanner.scan_image(content_type.as_deref(), &body)).await??;
    log::info!("Decoded QR code from image ({} chars)", result.text().len());
    Ok(HttpResponse::Ok().json(result))
}

/// Decode a single camera frame. A frame without a code answers 204.
pub async fn scan_frame(
    app_state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<impl Responder, AppError> {
    let scanner = app_state.scanner.clone();

    let result = web::block(move || {
        let frame = match image::load_from_memory(&body) {
            Ok(frame) => frame.to_luma8(),
            Err(e) => {
                log::debug!("Unreadable camera frame: {}", e);
                return None;
            }
        };
        scanner.scan_frame(frame)
    })
    .await?;

    Ok(match result {
        Some(result) => HttpResponse::Ok().json(result),
        None => HttpResponse::NoContent().finish(),
    })
}

/// Scanner behaviour the client needs before opening the camera
pub async fn scanner_settings(app_state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "redirectDelayMs": app_state.scanner.redirect_delay().as_millis() as u64,
        "cameraAutostart": app_state.camera_autostart,
        "capabilities": app_state.scanner.capabilities(),
    }))
}

/// Outcome of the client's camera permission request
#[derive(Deserialize)]
pub struct CameraReport {
    /// Platform error name, absent when access was granted
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// Run the reported permission outcome through the camera lifecycle and
/// answer with the state to show, plus guidance when it failed
pub async fn camera_check(
    app_state: web::Data<AppState>,
    web::Json(report): web::Json<CameraReport>,
) -> HttpResponse {
    let failure = report
        .name
        .as_deref()
        .map(|name| CameraError::from_platform(name, &report.message));
    let mut session = CameraSession::new(
        ReportedCamera::new(failure),
        app_state.scanner.clone(),
        app_state.camera_autostart,
    );

    match session.check() {
        Ok(state) => HttpResponse::Ok().json(serde_json::json!({ "state": state })),
        Err(error) => HttpResponse::Ok().json(serde_json::json!({
            "state": session.state(),
            "error": error.to_string(),
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::qr_record::QrRecord;
    use crate::routes::init_routes;
    use crate::services::export::export_png;
    use crate::services::history::MemoryHistory;
    use crate::services::surface::RenderSurface;
    use actix_web::{App, http::StatusCode, test};
    use std::sync::Arc;

    fn state() -> web::Data<AppState> {
        web::Data::new(AppState::new(
            Arc::new(MemoryHistory::new()),
            &Config::default(),
        ))
    }

    fn qr_png(text: &str) -> Vec<u8> {
        let record = QrRecord {
            text: text.into(),
            foreground_color: "#000000".into(),
            background_color: "#FFFFFF".into(),
            created_at: 1,
            kind: None,
            details: None,
            logo: None,
        };
        let mut surface = RenderSurface::new();
        let node = surface.mount_modal(&record).unwrap().clone();
        export_png(&node).unwrap().bytes
    }

    fn blank_png() -> Vec<u8> {
        let image = image::GrayImage::from_pixel(64, 64, image::Luma([255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageLuma8(image)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[actix_web::test]
    async fn image_scan_classifies_links() {
        let app = test::init_service(App::new().app_data(state()).configure(init_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/scan/image")
            .insert_header((header::CONTENT_TYPE, "image/png"))
            .set_payload(qr_png("https://example.com/page"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["type"], "link");
        assert_eq!(body["text"], "https://example.com/page");
        assert_eq!(body["redirectAfterMs"], 3000);
    }

    #[actix_web::test]
    async fn image_scan_reports_every_failure() {
        let app = test::init_service(App::new().app_data(state()).configure(init_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/scan/image")
            .insert_header((header::CONTENT_TYPE, "text/plain"))
            .set_payload("hello")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let req = test::TestRequest::post()
            .uri("/api/scan/image")
            .insert_header((header::CONTENT_TYPE, "image/png"))
            .set_payload(blank_png())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().starts_with("No QR code found"));
    }

    #[actix_web::test]
    async fn frame_miss_is_no_content() {
        let app = test::init_service(App::new().app_data(state()).configure(init_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/scan/frame")
            .set_payload(blank_png())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::post()
            .uri("/api/scan/frame")
            .set_payload("not an image")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::post()
            .uri("/api/scan/frame")
            .set_payload(qr_png("plain words"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["type"], "text");
        assert_eq!(body["text"], "plain words");
    }

    #[actix_web::test]
    async fn settings_and_camera_failures() {
        let app = test::init_service(App::new().app_data(state()).configure(init_routes)).await;

        let req = test::TestRequest::get().uri("/api/scan/settings").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["redirectDelayMs"], 3000);
        assert_eq!(body["cameraAutostart"], false);
        assert_eq!(body["capabilities"]["camera"], true);

        let req = test::TestRequest::post()
            .uri("/api/scan/camera-check")
            .set_json(serde_json::json!({ "name": "NotAllowedError", "message": "denied" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["state"], "denied");

        let req = test::TestRequest::post()
            .uri("/api/scan/camera-check")
            .set_json(serde_json::json!({ "name": "NotReadableError" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["state"], "error");
        assert_eq!(
            body["error"],
            "The camera is already in use by another application."
        );

        let req = test::TestRequest::post()
            .uri("/api/scan/camera-check")
            .set_json(serde_json::json!({}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["state"], "supported");
    }

    #[actix_web::test]
    async fn granted_camera_starts_when_autostart_is_on() {
        let config = Config {
            camera_autostart: true,
            ..Config::default()
        };
        let state = web::Data::new(AppState::new(Arc::new(MemoryHistory::new()), &config));
        let app = test::init_service(App::new().app_data(state).configure(init_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/scan/camera-check")
            .set_json(serde_json::json!({}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["state"], "active");
        assert!(body.get("error").is_none());
    }
}
