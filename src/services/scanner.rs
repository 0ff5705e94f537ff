use std::time::Duration;

use futures_util::{Stream, StreamExt};
use image::{GrayImage, ImageReader};
use serde::Serialize;
use thiserror::Error;
use validator::ValidateUrl;

/// Uploaded images larger than this are refused
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("The file must be an image")]
    UnsupportedFormat,
    #[error("The file is too large (max 5MB)")]
    TooLarge,
    #[error("No QR code found in the image. Make sure it is sharp and the code is fully visible.")]
    NoCodeFound,
    #[error("Could not read the image: {0}")]
    Access(String),
    #[error("This scanner cannot decode {0}")]
    NotCapable(&'static str),
}

/// Which sources a scanner accepts
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub camera: bool,
    pub file: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            camera: true,
            file: true,
        }
    }
}

/// What a decoded payload looks like to the user
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ScanResult {
    /// A navigable link, opened once the user had time to read it
    Link {
        text: String,
        redirect_after_ms: u64,
    },
    Text {
        text: String,
    },
}

impl ScanResult {
    pub fn text(&self) -> &str {
        match self {
            ScanResult::Link { text, .. } | ScanResult::Text { text } => text,
        }
    }
}

/// One decoder for both camera frames and still images
#[derive(Debug, Clone)]
pub struct ScannerAdapter {
    capabilities: Capabilities,
    redirect_delay: Duration,
}

impl ScannerAdapter {
    pub fn new(capabilities: Capabilities, redirect_delay: Duration) -> Self {
        Self {
            capabilities,
            redirect_delay,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn redirect_delay(&self) -> Duration {
        self.redirect_delay
    }

    /// Decode an uploaded still image. Every failure is reported.
    pub fn scan_image(&self, content_type: Option<&str>, bytes: &[u8]) -> Result<ScanResult, ScanError> {
        if !self.capabilities.file {
            return Err(ScanError::NotCapable("files"));
        }
        if let Some(content_type) = content_type {
            if !content_type.starts_with("image/") {
                return Err(ScanError::UnsupportedFormat);
            }
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ScanError::TooLarge);
        }

        let image = load_gray(bytes)?;
        match decode_gray(image) {
            Some(text) => Ok(self.classify(text)),
            None => Err(ScanError::NoCodeFound),
        }
    }

    /// Decode one camera frame. Most frames hold no code, so a miss, and even
    /// an unreadable frame, is `None` rather than an error.
    pub fn scan_frame(&self, frame: GrayImage) -> Option<ScanResult> {
        if !self.capabilities.camera {
            return None;
        }
        match decode_gray(frame) {
            Some(text) => Some(self.classify(text)),
            None => {
                log::debug!("No QR code in frame");
                None
            }
        }
    }

    /// Lazily decode a stream of frames, yielding only successful reads
    pub fn decode_stream<S>(&self, frames: S) -> impl Stream<Item = ScanResult> + use<S>
    where
        S: Stream<Item = GrayImage>,
    {
        let scanner = self.clone();
        frames.filter_map(move |frame| {
            let result = scanner.scan_frame(frame);
            async move { result }
        })
    }

    /// Links get a delayed redirect, anything else is opaque text
    pub fn classify(&self, text: String) -> ScanResult {
        if is_url(&text) {
            ScanResult::Link {
                text,
                redirect_after_ms: self.redirect_delay.as_millis() as u64,
            }
        } else {
            ScanResult::Text { text }
        }
    }
}

pub fn is_url(text: &str) -> bool {
    text.validate_url()
}

fn load_gray(bytes: &[u8]) -> Result<GrayImage, ScanError> {
    let reader = ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ScanError::Access(e.to_string()))?;
    if reader.format().is_none() {
        return Err(ScanError::UnsupportedFormat);
    }
    let image = reader.decode().map_err(|e| match e {
        image::ImageError::Unsupported(_) | image::ImageError::Decoding(_) => {
            ScanError::UnsupportedFormat
        }
        other => ScanError::Access(other.to_string()),
    })?;
    Ok(image.to_luma8())
}

fn decode_gray(image: GrayImage) -> Option<String> {
    let mut prepared = rqrr::PreparedImage::prepare(image);
    prepared
        .detect_grids()
        .into_iter()
        .find_map(|grid| grid.decode().ok().map(|(_, content)| content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::qr_record::QrRecord;
    use crate::services::export::export_png;
    use crate::services::surface::RenderSurface;
    use futures_util::stream;

    fn scanner() -> ScannerAdapter {
        ScannerAdapter::new(Capabilities::default(), Duration::from_millis(3000))
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
        let image = GrayImage::from_pixel(64, 64, image::Luma([255]));
        let mut buffer = std::io::Cursor::new(Vec::new());
        image.write_to(&mut buffer, image::ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn decodes_an_exported_code_as_a_link() {
        let result = scanner()
            .scan_image(Some("image/png"), &qr_png("https://example.com/menu"))
            .unwrap();
        assert_eq!(
            result,
            ScanResult::Link {
                text: "https://example.com/menu".into(),
                redirect_after_ms: 3000,
            }
        );
    }

    #[test]
    fn plain_text_is_opaque() {
        let result = scanner().scan_image(None, &qr_png("hello world")).unwrap();
        assert_eq!(
            result,
            ScanResult::Text {
                text: "hello world".into()
            }
        );
    }

    #[test]
    fn still_image_failures_are_classified() {
        let s = scanner();
        assert!(matches!(
            s.scan_image(Some("text/plain"), b"hello"),
            Err(ScanError::UnsupportedFormat)
        ));
        assert!(matches!(
            s.scan_image(Some("image/png"), b"not an image"),
            Err(ScanError::UnsupportedFormat)
        ));
        assert!(matches!(
            s.scan_image(Some("image/png"), &blank_png()),
            Err(ScanError::NoCodeFound)
        ));
        assert!(matches!(
            s.scan_image(Some("image/png"), &vec![0u8; MAX_IMAGE_BYTES + 1]),
            Err(ScanError::TooLarge)
        ));
    }

    #[test]
    fn camera_only_scanner_refuses_files() {
        let s = ScannerAdapter::new(
            Capabilities {
                camera: true,
                file: false,
            },
            Duration::from_millis(1500),
        );
        assert!(matches!(
            s.scan_image(Some("image/png"), &blank_png()),
            Err(ScanError::NotCapable(_))
        ));
    }

    #[actix_web::test]
    async fn stream_skips_frames_without_codes() {
        let hit = image::load_from_memory(&qr_png("frame payload"))
            .unwrap()
            .to_luma8();
        let miss = GrayImage::from_pixel(32, 32, image::Luma([0]));
        let frames = stream::iter(vec![miss.clone(), miss.clone(), hit, miss]);

        let results: Vec<ScanResult> = scanner().decode_stream(frames).collect().await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text(), "frame payload");
    }

    #[test]
    fn url_heuristic() {
        assert!(is_url("https://example.com"));
        assert!(is_url("mailto:someone@example.com"));
        assert!(!is_url("hello world"));
        assert!(!is_url("example.com"));
    }
}
