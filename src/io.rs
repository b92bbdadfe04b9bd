// ============================================================================
// IMAGE IO — encoded payloads, decode/probe, in-memory PNG/JPEG export
// ============================================================================
//
// Everything here is pure with respect to session state: bytes in, bytes or
// pixels out. The session controller and history store pass `ImageData`
// around as an opaque payload and only decode at compositing boundaries.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ImageEncoder, RgbImage, RgbaImage};
use std::io::Cursor;

use crate::error::EditorError;

pub const MIME_PNG: &str = "image/png";
pub const MIME_JPEG: &str = "image/jpeg";

/// Prefix for exported filenames: `<prefix>-<timestamp>.<ext>`.
const EXPORT_FILE_PREFIX: &str = "promptshop-edit";

// ============================================================================
// ENCODED PAYLOAD
// ============================================================================

/// An encoded image plus its mime type.
///
/// This is the unit the gateway consumes and produces, and the pixel payload
/// stored on every checkpoint. Treated as immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageData {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl ImageData {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
        }
    }

    /// Encode RGBA pixels as a PNG payload.
    pub fn from_rgba(image: &RgbaImage) -> Result<Self, EditorError> {
        Ok(Self::new(encode_png(image)?, MIME_PNG))
    }

    /// Decode into RGBA pixels. The container format is sniffed from the
    /// bytes rather than trusted from `mime`.
    pub fn decode(&self) -> Result<RgbaImage, EditorError> {
        let dynamic = image::load_from_memory(&self.bytes).map_err(EditorError::Decode)?;
        Ok(dynamic.to_rgba8())
    }
}

/// Read the natural dimensions of an encoded image without a full decode.
pub fn probe_dimensions(bytes: &[u8]) -> Result<(u32, u32), EditorError> {
    let reader = image::io::Reader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| EditorError::Decode(image::ImageError::IoError(e)))?;
    reader.into_dimensions().map_err(EditorError::Decode)
}

// ============================================================================
// EXPORT ENCODING
// ============================================================================

/// Output container for `export_encode`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Jpeg,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Png => MIME_PNG,
            ExportFormat::Jpeg => MIME_JPEG,
        }
    }
}

/// Encode composited pixels for download.
///
/// PNG is lossless and keeps the alpha channel; `quality` is ignored.
/// JPEG has no alpha channel, so pixels are composited onto opaque white
/// first, then encoded at `quality` (clamped to 1–100).
pub fn export_encode(
    image: &RgbaImage,
    format: ExportFormat,
    quality: u8,
) -> Result<Vec<u8>, EditorError> {
    match format {
        ExportFormat::Png => encode_png(image),
        ExportFormat::Jpeg => encode_jpeg(image, quality),
    }
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, EditorError> {
    let mut bytes = Vec::new();
    let encoder = PngEncoder::new(Cursor::new(&mut bytes));
    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ColorType::Rgba8,
        )
        .map_err(EditorError::Encode)?;
    Ok(bytes)
}

pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>, EditorError> {
    let quality = quality.clamp(1, 100);
    let flattened = composite_on_white(image);
    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(Cursor::new(&mut bytes), quality);
    encoder
        .encode(
            flattened.as_raw(),
            flattened.width(),
            flattened.height(),
            image::ColorType::Rgb8,
        )
        .map_err(EditorError::Encode)?;
    Ok(bytes)
}

/// Alpha-blend onto an opaque white background, dropping the alpha channel.
fn composite_on_white(image: &RgbaImage) -> RgbImage {
    let mut out = RgbImage::new(image.width(), image.height());
    for (src, dst) in image.pixels().zip(out.pixels_mut()) {
        let a = src[3] as f32 / 255.0;
        for c in 0..3 {
            let v = src[c] as f32 * a + 255.0 * (1.0 - a);
            dst[c] = v.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Filename for a download: fixed prefix, local timestamp, format extension.
pub fn export_file_name(format: ExportFormat) -> String {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    format!("{}-{}.{}", EXPORT_FILE_PREFIX, stamp, format.extension())
}
