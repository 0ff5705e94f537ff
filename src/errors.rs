use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::services::export::ExportError;
use crate::services::history::HistoryError;
use crate::services::renderer::RenderError;
use crate::services::scanner::ScanError;

/// Every failure a request can end with. Each one becomes a JSON
/// `{"error": ...}` body; none of them takes the service down.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Input(String),
    #[error("QR code not found")]
    RecordNotFound,
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn input(message: impl Into<String>) -> Self {
        AppError::Input(message.into())
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("Invalid {}", field),
                })
            })
            .collect::<Vec<_>>()
            .join("; ");
        AppError::Input(message)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Input(_) => StatusCode::BAD_REQUEST,
            AppError::RecordNotFound | AppError::Export(ExportError::TargetNotFound) => {
                StatusCode::NOT_FOUND
            }
            AppError::Scan(ScanError::UnsupportedFormat) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::Scan(ScanError::TooLarge) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Scan(ScanError::NoCodeFound) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Scan(ScanError::NotCapable(_)) => StatusCode::NOT_IMPLEMENTED,
            AppError::Scan(ScanError::Access(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Render(RenderError::EmptyPayload) => StatusCode::BAD_REQUEST,
            AppError::History(HistoryError::EmptyRecord) => StatusCode::BAD_REQUEST,
            AppError::History(_)
            | AppError::Render(_)
            | AppError::Export(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self);
        } else {
            log::warn!("{}", self);
        }
        HttpResponse::build(status).json(serde_json::json!({ "error": self.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_error_kind() {
        assert_eq!(
            AppError::input("Please enter some text").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(ExportError::TargetNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(ScanError::NoCodeFound).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::from(ScanError::UnsupportedFormat).status_code(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            AppError::from(ScanError::Access("busy".into())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::from(HistoryError::EmptyRecord).status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
