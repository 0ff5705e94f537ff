use base64::{Engine as _, engine::general_purpose::STANDARD};
use validator::ValidationError;

pub const DEFAULT_FOREGROUND: &str = "#4F46E5";
pub const DEFAULT_BACKGROUND: &str = "#FFFFFF";

/// Check that a color is a `#` followed by exactly six hex digits
pub fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(digits) => digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

/// Split a validated `#RRGGBB` color into its channels
pub fn parse_hex_color(value: &str) -> Option<(u8, u8, u8)> {
    if !is_hex_color(value) {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&value[range], 16).ok();
    Some((channel(1..3)?, channel(3..5)?, channel(5..7)?))
}

/// Validator hook for color fields on request structs
pub fn validate_hex_color(value: &str) -> Result<(), ValidationError> {
    if is_hex_color(value) {
        Ok(())
    } else {
        let mut error = ValidationError::new("hex_color");
        error.message = Some("Color must be a 6-digit hex code like #4F46E5".into());
        Err(error)
    }
}

/// `image/<subtype>` with a plain subtype such as `png` or `svg+xml`
pub fn is_image_mime(mime: &str) -> bool {
    mime.strip_prefix("image/").is_some_and(|subtype| {
        !subtype.is_empty()
            && subtype
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '+' | '-'))
    })
}

/// Validator hook for logos, which must be base64 image data URIs
pub fn validate_logo_data_uri(value: &str) -> Result<(), ValidationError> {
    let valid = value
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .is_some_and(|(mime, data)| {
            is_image_mime(mime) && !data.is_empty() && STANDARD.decode(data).is_ok()
        });

    if valid {
        Ok(())
    } else {
        let mut error = ValidationError::new("logo_data_uri");
        error.message = Some("Logo must be a base64 image data URI".into());
        Err(error)
    }
}
