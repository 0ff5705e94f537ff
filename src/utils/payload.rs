use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use crate::models::qr_record::{QrDetails, QrKind};

/// Label used in geo URIs when no location name was given
pub const DEFAULT_LOCATION_LABEL: &str = "Location";

const ICAL_TIMESTAMP: &str = "%Y%m%dT%H%M%SZ";

/// Build the exact string to encode in the QR symbol.
///
/// Never fails: missing details degrade to empty fields or to the
/// documented defaults. Callers check that the result is usable.
pub fn format_payload(
    kind: Option<QrKind>,
    details: Option<&QrDetails>,
    raw_text: &str,
    now: DateTime<Utc>,
) -> String {
    let empty = QrDetails::default();
    let details = details.unwrap_or(&empty);

    match kind {
        None | Some(QrKind::Link) => raw_text.to_string(),
        Some(QrKind::Visit) => format_geo(details),
        Some(QrKind::Contact) => format_vcard(details),
        Some(QrKind::Event) => format_vevent(details, raw_text, now),
    }
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or("")
}

// Coordinates go into the URI exactly as entered
fn raw(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

fn format_geo(details: &QrDetails) -> String {
    let lat = raw(&details.latitude);
    let lon = raw(&details.longitude);
    let label = match field(&details.location_name) {
        "" => DEFAULT_LOCATION_LABEL,
        name => name,
    };
    format!("geo:{lat},{lon}?q={lat},{lon}({label})")
}

// vCard (RFC 2426) and iCalendar (RFC 5545) escape text values the same way
fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ',' => out.push_str("\\,"),
            ';' => out.push_str("\\;"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

fn format_vcard(details: &QrDetails) -> String {
    let full_name = [field(&details.first_name), field(&details.last_name)]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let lines = [
        "BEGIN:VCARD".to_string(),
        "VERSION:3.0".to_string(),
        format!("FN:{}", escape_text(&full_name)),
        format!("TEL:{}", escape_text(field(&details.phone))),
        format!("EMAIL:{}", escape_text(field(&details.email))),
        format!("ORG:{}", escape_text(field(&details.organization))),
        "END:VCARD".to_string(),
    ];
    lines.join("\r\n")
}

/// Parse a form timestamp. RFC 3339 values are converted to UTC; values
/// without an offset (`datetime-local` inputs) are taken as UTC.
pub fn parse_event_time(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

fn format_vevent(details: &QrDetails, raw_text: &str, now: DateTime<Utc>) -> String {
    let summary = match field(&details.title) {
        "" => raw_text.trim(),
        title => title,
    };

    let start = details
        .start
        .as_deref()
        .and_then(parse_event_time)
        .unwrap_or(now);
    let end = details
        .end
        .as_deref()
        .and_then(parse_event_time)
        .unwrap_or(start + Duration::hours(1));

    let lines = [
        "BEGIN:VEVENT".to_string(),
        format!("SUMMARY:{}", escape_text(summary)),
        format!("DTSTART:{}", start.format(ICAL_TIMESTAMP)),
        format!("DTEND:{}", end.format(ICAL_TIMESTAMP)),
        format!("LOCATION:{}", escape_text(field(&details.location))),
        format!("DESCRIPTION:{}", escape_text(field(&details.description))),
        "END:VEVENT".to_string(),
    ];
    lines.join("\r\n")
}
