use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};
use thiserror::Error;

use crate::models::qr_record::QrRecord;

/// On-screen sizes of the different views, in CSS pixels
pub const GENERATOR_SIZE: u32 = 256;
pub const LIST_SIZE: u32 = 64;
pub const MODAL_SIZE: u32 = 320;

// Modules of light border on every side, as required by the QR standard
const QUIET_ZONE: u32 = 4;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("QR code generation error: {0}")]
    Encode(#[from] qrcode::types::QrError),
    #[error("Nothing to render: the payload is empty")]
    EmptyPayload,
}

/// Options for a single rendering
#[derive(Debug, Clone)]
pub struct RenderOptions<'a> {
    pub size: u32,
    pub foreground: &'a str,
    pub background: &'a str,
    pub logo: Option<&'a str>,
}

impl<'a> RenderOptions<'a> {
    pub fn for_record(record: &'a QrRecord, size: u32) -> Self {
        Self {
            size,
            foreground: &record.foreground_color,
            background: &record.background_color,
            logo: record.logo.as_deref(),
        }
    }
}

/// Render a payload as SVG markup, without the XML declaration so the
/// result is the `<svg>` element itself.
///
/// Error correction is always level H so a centered logo covering up to a
/// fifth of the width still scans.
pub fn render_svg(payload: &str, options: &RenderOptions<'_>) -> Result<String, RenderError> {
    if payload.is_empty() {
        return Err(RenderError::EmptyPayload);
    }

    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::H)?;

    // Whole pixels per module, at least one
    let modules = code.width() as u32 + 2 * QUIET_ZONE;
    let unit = options.size.div_ceil(modules).max(1);
    let dimension = unit * modules;

    let markup = code
        .render::<svg::Color>()
        .quiet_zone(true)
        .module_dimensions(unit, unit)
        .dark_color(svg::Color(options.foreground))
        .light_color(svg::Color(options.background))
        .build();

    let mut markup = strip_xml_declaration(&markup).to_string();
    if let Some(logo) = options.logo {
        overlay_logo(&mut markup, logo, dimension, options.background);
    }
    Ok(markup)
}

/// Render a record at one of the view sizes
pub fn render_record(record: &QrRecord, size: u32) -> Result<String, RenderError> {
    render_svg(&record.text, &RenderOptions::for_record(record, size))
}

fn strip_xml_declaration(markup: &str) -> &str {
    match markup.find("<svg") {
        Some(start) => &markup[start..],
        None => markup,
    }
}

fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Draw the logo over the center of the code on a background-colored pad
fn overlay_logo(markup: &mut String, logo: &str, dimension: u32, background: &str) {
    let Some(close) = markup.rfind("</svg>") else {
        return;
    };

    let logo_size = dimension / 5;
    let offset = (dimension - logo_size) / 2;
    let pad = logo_size / 10;
    let overlay = format!(
        r#"<rect x="{px}" y="{px}" width="{ps}" height="{ps}" fill="{background}"/><image x="{offset}" y="{offset}" width="{logo_size}" height="{logo_size}" preserveAspectRatio="xMidYMid meet" xlink:href="{logo}"/>"#,
        px = offset - pad,
        ps = logo_size + 2 * pad,
        background = escape_attribute(background),
        logo = escape_attribute(logo),
    );
    markup.insert_str(close, &overlay);

    if !markup.contains("xmlns:xlink") {
        if let Some(root) = markup.find("<svg") {
            markup.insert_str(
                root + "<svg".len(),
                r#" xmlns:xlink="http://www.w3.org/1999/xlink""#,
            );
        }
    }
}
