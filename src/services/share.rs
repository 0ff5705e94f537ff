use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::qr_record::QrRecord;

pub const SHARE_TITLE: &str = "My QR Code";

/// What goes into the platform share sheet
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ShareData {
    pub title: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ShareData {
    pub fn for_record(record: &QrRecord) -> Self {
        Self {
            title: SHARE_TITLE.to_string(),
            text: format!("QR Code for: {}", record.text),
            url: record.is_url().then(|| record.text.clone()),
        }
    }
}

/// How the client should share a record
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum ShareAction {
    Native(ShareData),
    /// No share sheet available; copy the raw payload instead
    Clipboard { text: String },
}

pub fn plan_share(record: &QrRecord, native_available: bool) -> ShareAction {
    if native_available {
        ShareAction::Native(ShareData::for_record(record))
    } else {
        ShareAction::Clipboard {
            text: record.text.clone(),
        }
    }
}

/// Outcome reported back by the client after a share attempt
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ShareOutcome {
    #[serde(default)]
    pub error_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ShareError {
    #[error("Share cancelled")]
    Aborted,
    #[error("Sharing failed: {0}")]
    Failed(String),
}

impl ShareError {
    pub fn from_platform(name: &str, message: Option<&str>) -> Self {
        match name {
            "AbortError" => ShareError::Aborted,
            _ => ShareError::Failed(message.unwrap_or(name).to_string()),
        }
    }

    /// A user closing the share sheet is not worth a notification
    pub fn is_reportable(&self) -> bool {
        !matches!(self, ShareError::Aborted)
    }
}

impl ShareOutcome {
    pub fn into_result(self) -> Result<(), ShareError> {
        match self.error_name {
            None => Ok(()),
            Some(name) => Err(ShareError::from_platform(&name, self.message.as_deref())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: &str) -> QrRecord {
        QrRecord {
            text: text.into(),
            foreground_color: "#000000".into(),
            background_color: "#FFFFFF".into(),
            created_at: 1,
            kind: None,
            details: None,
            logo: None,
        }
    }

    #[test]
    fn url_field_only_for_links() {
        let link = ShareData::for_record(&record("https://example.com"));
        assert_eq!(link.url.as_deref(), Some("https://example.com"));
        assert_eq!(link.text, "QR Code for: https://example.com");
        assert_eq!(link.title, SHARE_TITLE);

        let text = ShareData::for_record(&record("just words"));
        assert!(text.url.is_none());
    }

    #[test]
    fn falls_back_to_clipboard() {
        assert_eq!(
            plan_share(&record("hello"), false),
            ShareAction::Clipboard {
                text: "hello".into()
            }
        );

        let json = serde_json::to_value(plan_share(&record("hello"), true)).unwrap();
        assert_eq!(json["method"], "native");
        assert_eq!(json["title"], SHARE_TITLE);
        assert!(json.get("url").is_none());
    }

    #[test]
    fn abort_is_not_reported() {
        let aborted = ShareOutcome {
            error_name: Some("AbortError".into()),
            message: None,
        };
        let err = aborted.into_result().unwrap_err();
        assert_eq!(err, ShareError::Aborted);
        assert!(!err.is_reportable());

        let failed = ShareOutcome {
            error_name: Some("NotAllowedError".into()),
            message: Some("Permission denied".into()),
        };
        let err = failed.into_result().unwrap_err();
        assert!(err.is_reportable());
        assert_eq!(err.to_string(), "Sharing failed: Permission denied");
    }
}
