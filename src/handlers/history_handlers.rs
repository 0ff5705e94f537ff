use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::qr_record::QrRecord;
use crate::state::app_state::AppState;
use crate::structs::qr_request::ClearHistoryParams;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryEntry {
    #[serde(flatten)]
    record: QrRecord,
    element_id: String,
    svg: String,
}

/// List the history, newest first, mounting each code in the list view
pub async fn get_history(app_state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let records = app_state.history.load_all().await?;

    // Mount oldest first so a newer record sharing a createdAt replaces the older one
    let mut surface = app_state.surface.write().await;
    let mut entries = Vec::with_capacity(records.len());
    for record in records.into_iter().rev() {
        match surface.mount_list(&record) {
            Ok(node) => {
                let (element_id, svg) = (node.element_id.clone(), node.svg.clone());
                entries.push(HistoryEntry {
                    record,
                    element_id,
                    svg,
                });
            }
            Err(e) => log::warn!("Skipping history entry {}: {}", record.created_at, e),
        }
    }
    entries.reverse();

    Ok(HttpResponse::Ok().json(entries))
}

/// Remove every saved code. Requires `?confirm=true`.
pub async fn clear_history(
    app_state: web::Data<AppState>,
    query: web::Query<ClearHistoryParams>,
) -> Result<impl Responder, AppError> {
    if query.confirm != Some(true) {
        return Err(AppError::input(
            "Clearing the history needs confirmation (?confirm=true)",
        ));
    }

    let records = app_state.history.load_all().await?;
    app_state.history.clear().await?;

    let mut surface = app_state.surface.write().await;
    for record in &records {
        surface.unmount_record(record.created_at);
    }
    log::info!("Cleared {} history entries", records.len());

    Ok(HttpResponse::Ok().json(serde_json::json!({ "cleared": records.len() })))
}
