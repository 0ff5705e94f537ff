use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Which structured view a record was generated from
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QrKind {
    Link,
    Visit,
    Contact,
    Event,
}

impl fmt::Display for QrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QrKind::Link => write!(f, "Link"),
            QrKind::Visit => write!(f, "Location"),
            QrKind::Contact => write!(f, "Contact"),
            QrKind::Event => write!(f, "Event"),
        }
    }
}

/// Structured form data behind a record. Every field is optional and the
/// formatter reads only the ones that apply to the record's kind.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct QrDetails {
    // Contact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,

    // Visit
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "string_or_number"
    )]
    pub latitude: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "string_or_number"
    )]
    pub longitude: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,

    // Event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Coordinates arrive as strings from forms and as numbers from scripts.
/// Both keep their textual form so the geo URI repeats them verbatim.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a coordinate, found {}",
            other
        ))),
    }
}

/// One generated QR code, as shown in the history list
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QrRecord {
    pub text: String, // Final payload handed to the renderer
    #[serde(alias = "fgColor")]
    pub foreground_color: String,
    #[serde(alias = "bgColor")]
    pub background_color: String,
    #[serde(alias = "timestamp")]
    pub created_at: i64, // Epoch milliseconds, doubles as the record id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<QrKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<QrDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>, // data URI drawn at the center of the code
}

impl QrRecord {
    pub fn new(
        text: String,
        foreground_color: String,
        background_color: String,
        kind: Option<QrKind>,
        details: Option<QrDetails>,
        logo: Option<String>,
    ) -> Self {
        Self {
            text,
            foreground_color,
            background_color,
            created_at: chrono::Utc::now().timestamp_millis(),
            kind,
            details,
            logo,
        }
    }

    /// Element id of the list (and generator) rendering
    pub fn is_url(&self) -> bool {
        self.text.starts_with("http://") || self.text.starts_with("https://")
    }
}

pub fn list_element_id(created_at: i64) -> String {
    format!("qr-code-{}", created_at)
}

pub fn modal_element_id(created_at: i64) -> String {
    format!("qr-code-modal-{}", created_at)
}
