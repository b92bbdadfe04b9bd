// ============================================================================
// GEOMETRY — quarter-turn rotation, crop, resample
// ============================================================================

use image::{RgbaImage, imageops};

/// Crop rectangle in source-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Rotate by a multiple of 90°. The angle is wrapped mod 360 (negatives
/// normalized), so `-90` equals `270`. Output dimensions swap width/height
/// on odd multiples of 90°. Non-multiples snap down to the nearest quarter
/// turn and log a warning.
pub fn rotate_quarter(source: &RgbaImage, degrees: i32) -> RgbaImage {
    let wrapped = degrees.rem_euclid(360);
    let snapped = wrapped - wrapped % 90;
    if snapped != wrapped {
        log::warn!("rotation {}° is not a quarter turn, snapping to {}°", degrees, snapped);
    }
    match snapped {
        90 => imageops::rotate90(source),
        180 => imageops::rotate180(source),
        270 => imageops::rotate270(source),
        _ => source.clone(),
    }
}

/// Cut out `region`, clamped to the source bounds. A region that lies fully
/// outside (or clamps to zero size) returns the source unchanged.
pub fn crop(source: &RgbaImage, region: CropRegion) -> RgbaImage {
    let x = region.x.min(source.width());
    let y = region.y.min(source.height());
    let w = region.width.min(source.width() - x);
    let h = region.height.min(source.height() - y);
    if w == 0 || h == 0 {
        log::warn!("crop region {:?} is empty after clamping, skipping", region);
        return source.clone();
    }
    imageops::crop_imm(source, x, y, w, h).to_image()
}

/// High-quality scale to exact target dimensions (Lanczos3). Used once per
/// gateway result: the remote service returns a coarse aspect-ratio bucket,
/// not exact pixels. Identity when the dimensions already match.
pub fn resample(source: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if width == 0 || height == 0 {
        log::warn!("resample target {}x{} is degenerate, skipping", width, height);
        return source.clone();
    }
    if source.width() == width && source.height() == height {
        return source.clone();
    }
    imageops::resize(source, width, height, imageops::FilterType::Lanczos3)
}
