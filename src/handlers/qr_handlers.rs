use actix_web::{HttpResponse, Responder, http::header, web};
use validator::Validate;

use crate::errors::AppError;
use crate::models::qr_record::{QrRecord, modal_element_id};
use crate::services::export::{self, Download, ExportError};
use crate::services::renderer::GENERATOR_SIZE;
use crate::services::share::{ShareOutcome, plan_share};
use crate::services::surface::View;
use crate::state::app_state::AppState;
use crate::structs::qr_request::{GenerateQrRequest, GenerateQrResponse, ModalResponse, ShareParams};
use crate::utils::payload::format_payload;

/// Generate a QR code from the form data and add it to the history
pub async fn generate_qr(
    app_state: web::Data<AppState>,
    web::Json(req): web::Json<GenerateQrRequest>,
) -> Result<impl Responder, AppError> {
    req.validate()?;
    if let Some(field) = req.missing_required_field() {
        return Err(AppError::input(format!("Please fill in the {} field", field)));
    }

    let payload = format_payload(
        req.kind,
        req.details.as_ref(),
        &req.text,
        chrono::Utc::now(),
    );
    if payload.trim().is_empty() {
        return Err(AppError::input("Please enter some text or a URL"));
    }

    let skip_history = req.skip_history;
    let record = req.into_record(payload);

    // Render before saving so a code that cannot be drawn never reaches the history
    let (element_id, svg) = {
        let mut surface = app_state.surface.write().await;
        let node = if skip_history {
            surface.mount_preview(&record, GENERATOR_SIZE)?
        } else {
            surface.mount_record(&record, View::List, GENERATOR_SIZE)?
        };
        (node.element_id.clone(), node.svg.clone())
    };

    if !skip_history {
        if let Err(e) = app_state.history.append(&record).await {
            app_state.surface.write().await.unmount(&element_id);
            return Err(e.into());
        }
    }
    log::info!("Generated QR code {} ({} bytes)", record.created_at, record.text.len());

    Ok(HttpResponse::Created().json(GenerateQrResponse {
        record,
        element_id,
        svg,
    }))
}

fn attachment(download: Download) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(download.mime)
        .insert_header((header::CONTENT_DISPOSITION, download.content_disposition()))
        .body(download.bytes)
}

/// Download the mounted rendering of a record as SVG
pub async fn export_svg(
    app_state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let created_at = path.into_inner();
    let surface = app_state.surface.read().await;
    let node = surface
        .locate(created_at)
        .ok_or(ExportError::TargetNotFound)?;

    Ok(attachment(export::export_svg(node)))
}

/// Download the mounted rendering of a record as a 512x512 PNG
pub async fn export_png(
    app_state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let created_at = path.into_inner();
    let node = app_state
        .surface
        .read()
        .await
        .locate(created_at)
        .cloned()
        .ok_or(ExportError::TargetNotFound)?;

    let download = web::block(move || export::export_png(&node)).await??;
    Ok(attachment(download))
}

async fn find_record(app_state: &AppState, created_at: i64) -> Result<QrRecord, AppError> {
    // Newest first, so a duplicate createdAt resolves to the latest record
    app_state
        .history
        .load_all()
        .await?
        .into_iter()
        .find(|r| r.created_at == created_at)
        .ok_or(AppError::RecordNotFound)
}

/// Open the detail modal, rendering the record at modal size
pub async fn open_modal(
    app_state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let record = find_record(&app_state, path.into_inner()).await?;

    let mut surface = app_state.surface.write().await;
    let node = surface.mount_modal(&record)?;
    Ok(HttpResponse::Ok().json(ModalResponse {
        element_id: node.element_id.clone(),
        svg: node.svg.clone(),
    }))
}

pub async fn close_modal(app_state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let element_id = modal_element_id(path.into_inner());
    app_state.surface.write().await.unmount(&element_id);
    HttpResponse::NoContent().finish()
}

/// Describe how the client should share a record
pub async fn share_qr(
    app_state: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<ShareParams>,
) -> Result<impl Responder, AppError> {
    let record = find_record(&app_state, path.into_inner()).await?;
    let action = plan_share(&record, query.native.unwrap_or(true));
    Ok(HttpResponse::Ok().json(action))
}

/// Turn the result of a share attempt into a notification, if one is due
pub async fn share_outcome(web::Json(outcome): web::Json<ShareOutcome>) -> HttpResponse {
    match outcome.into_result() {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "notify": true,
            "message": "QR code shared"
        })),
        Err(e) if !e.is_reportable() => HttpResponse::Ok().json(serde_json::json!({
            "notify": false
        })),
        Err(e) => {
            log::warn!("Share failed: {}", e);
            HttpResponse::Ok().json(serde_json::json!({
                "notify": true,
                "error": e.to_string()
            }))
        }
    }
}
