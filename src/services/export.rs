use std::io::Cursor;

use image::{ImageFormat, RgbaImage};
use resvg::{tiny_skia, usvg};
use thiserror::Error;

use crate::services::surface::RenderedNode;
use crate::utils::color::parse_hex_color;

/// Raster exports are always this many pixels square, whatever the
/// on-screen size of the rendering they come from.
pub const RASTER_SIZE: u32 = 512;

pub const SVG_MIME: &str = "image/svg+xml";
pub const PNG_MIME: &str = "image/png";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Could not find the QR code to download")]
    TargetNotFound,
    #[error("Could not read the QR code image: {0}")]
    Decode(#[from] usvg::Error),
    #[error("Invalid background color {0}")]
    Background(String),
    #[error("Could not allocate the export canvas")]
    Canvas,
    #[error("Could not encode the PNG: {0}")]
    Encode(#[from] image::ImageError),
}

/// A file ready to be handed to the user
#[derive(Debug, Clone)]
pub struct Download {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl Download {
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

/// Timestamped file name, e.g. `qrcode-1717000000000.png`
pub fn export_filename(extension: &str) -> String {
    format!(
        "qrcode-{}.{}",
        chrono::Utc::now().timestamp_millis(),
        extension
    )
}

/// Serialize the mounted markup verbatim
pub fn export_svg(node: &RenderedNode) -> Download {
    Download {
        filename: export_filename("svg"),
        mime: SVG_MIME,
        bytes: node.svg.as_bytes().to_vec(),
    }
}

/// Rasterize the mounted markup onto a square PNG.
///
/// The markup is decoded first; the canvas is only allocated, filled with
/// the background and drawn once decoding has succeeded.
pub fn export_png(node: &RenderedNode) -> Result<Download, ExportError> {
    let tree = usvg::Tree::from_str(&node.svg, &usvg::Options::default())?;
    let bytes = rasterize(&tree, &node.background, RASTER_SIZE)?;
    Ok(Download {
        filename: export_filename("png"),
        mime: PNG_MIME,
        bytes,
    })
}

fn rasterize(tree: &usvg::Tree, background: &str, size: u32) -> Result<Vec<u8>, ExportError> {
    let (r, g, b) =
        parse_hex_color(background).ok_or_else(|| ExportError::Background(background.into()))?;

    let mut pixmap = tiny_skia::Pixmap::new(size, size).ok_or(ExportError::Canvas)?;
    pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, 255));

    let sx = size as f32 / tree.size().width();
    let sy = size as f32 / tree.size().height();
    resvg::render(
        tree,
        tiny_skia::Transform::from_scale(sx, sy),
        &mut pixmap.as_mut(),
    );

    // The background is opaque, so premultiplied and straight alpha agree
    let image = RgbaImage::from_raw(size, size, pixmap.take()).ok_or(ExportError::Canvas)?;
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::qr_record::QrRecord;
    use crate::services::renderer::LIST_SIZE;
    use crate::services::surface::RenderSurface;

    fn mounted(background: &str) -> RenderedNode {
        let record = QrRecord {
            text: "https://example.com".into(),
            foreground_color: "#4F46E5".into(),
            background_color: background.into(),
            created_at: 1,
            kind: None,
            details: None,
            logo: None,
        };
        let mut surface = RenderSurface::new();
        surface.mount_list(&record).unwrap().clone()
    }

    #[test]
    fn svg_export_is_the_mounted_markup() {
        let node = mounted("#FFFFFF");
        let download = export_svg(&node);

        assert_eq!(download.mime, "image/svg+xml");
        assert!(download.filename.starts_with("qrcode-"));
        assert!(download.filename.ends_with(".svg"));

        let text = String::from_utf8(download.bytes).unwrap();
        assert_eq!(text, node.svg);
        assert!(usvg::Tree::from_str(&text, &usvg::Options::default()).is_ok());
    }

    #[test]
    fn png_export_is_512_square_from_a_small_rendering() {
        let node = mounted("#FFEEDD");
        assert_eq!(node.size, LIST_SIZE);

        let download = export_png(&node).unwrap();
        assert_eq!(download.mime, "image/png");
        assert!(download.filename.ends_with(".png"));

        let image = image::load_from_memory(&download.bytes).unwrap().to_rgba8();
        assert_eq!(image.dimensions(), (RASTER_SIZE, RASTER_SIZE));
        // Quiet zone shows the background
        assert_eq!(image.get_pixel(1, 1).0, [0xFF, 0xEE, 0xDD, 0xFF]);
    }

    #[test]
    fn broken_markup_produces_no_file() {
        let node = RenderedNode {
            element_id: "qr-code-1".into(),
            svg: "<svg".into(),
            background: "#FFFFFF".into(),
            size: 64,
        };
        assert!(matches!(export_png(&node), Err(ExportError::Decode(_))));
    }

    #[test]
    fn content_disposition_names_the_file() {
        let download = Download {
            filename: "qrcode-1.svg".into(),
            mime: SVG_MIME,
            bytes: Vec::new(),
        };
        assert_eq!(
            download.content_disposition(),
            "attachment; filename=\"qrcode-1.svg\""
        );
    }
}
