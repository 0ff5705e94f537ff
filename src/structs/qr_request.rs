use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::qr_record::{QrDetails, QrKind, QrRecord};
use crate::utils::color::{
    DEFAULT_BACKGROUND, DEFAULT_FOREGROUND, validate_hex_color, validate_logo_data_uri,
};

fn default_foreground() -> String {
    DEFAULT_FOREGROUND.to_string()
}

fn default_background() -> String {
    DEFAULT_BACKGROUND.to_string()
}

/// Generator form submission
#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQrRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub kind: Option<QrKind>,
    #[serde(default)]
    pub details: Option<QrDetails>,
    #[serde(default = "default_foreground", alias = "fgColor")]
    #[validate(custom(function = "validate_hex_color"))]
    pub foreground_color: String,
    #[serde(default = "default_background", alias = "bgColor")]
    #[validate(custom(function = "validate_hex_color"))]
    pub background_color: String,
    #[validate(custom(function = "validate_logo_data_uri"))]
    pub logo: Option<String>,
    /// Show the code without saving it to the history
    #[serde(default)]
    pub skip_history: bool,
}

fn filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl GenerateQrRequest {
    /// Name of the first required field left empty, if any
    pub fn missing_required_field(&self) -> Option<&'static str> {
        let details = self.details.clone().unwrap_or_default();
        match self.kind {
            None | Some(QrKind::Link) if self.text.trim().is_empty() => Some("text"),
            Some(QrKind::Visit) if !filled(&details.latitude) => Some("latitude"),
            Some(QrKind::Visit) if !filled(&details.longitude) => Some("longitude"),
            Some(QrKind::Contact) if !filled(&details.first_name) && !filled(&details.last_name) => {
                Some("name")
            }
            Some(QrKind::Event) if !filled(&details.title) && self.text.trim().is_empty() => {
                Some("title")
            }
            _ => None,
        }
    }

    pub fn into_record(self, payload: String) -> QrRecord {
        QrRecord::new(
            payload,
            self.foreground_color,
            self.background_color,
            self.kind,
            self.details,
            self.logo,
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQrResponse {
    pub record: QrRecord,
    pub element_id: String,
    pub svg: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalResponse {
    pub element_id: String,
    pub svg: String,
}

#[derive(Deserialize)]
pub struct ShareParams {
    pub native: Option<bool>,
}

#[derive(Deserialize)]
pub struct ClearHistoryParams {
    pub confirm: Option<bool>,
}
