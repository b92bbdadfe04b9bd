// ============================================================================
// COLOR ADJUSTMENTS — per-pixel transforms for the live-preview pipeline
// ============================================================================
//
// All functions are pure: source pixels in, new pixels out. Rows are
// processed in parallel via rayon. Values are carried as f32 in the 0–255
// range and clamped once on write-back.

use image::RgbaImage;
use rayon::prelude::*;

/// Rec.709 luma weights, used for both grayscale and saturation.
const LUMA_R: f32 = 0.2126;
const LUMA_G: f32 = 0.7152;
const LUMA_B: f32 = 0.0722;

/// Apply a per-pixel transform to every pixel of `source`.
/// `transform` receives and returns (r, g, b, a) as f32.
fn map_pixels<F>(source: &RgbaImage, transform: F) -> RgbaImage
where
    F: Fn(f32, f32, f32, f32) -> (f32, f32, f32, f32) + Sync,
{
    let w = source.width() as usize;
    let h = source.height() as usize;
    if w == 0 || h == 0 {
        return source.clone();
    }

    let src_raw = source.as_raw();
    let mut dst_raw = vec![0u8; w * h * 4];
    let stride = w * 4;

    dst_raw.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        let row_in = &src_raw[y * stride..(y + 1) * stride];
        for x in 0..w {
            let pi = x * 4;
            let r = row_in[pi] as f32;
            let g = row_in[pi + 1] as f32;
            let b = row_in[pi + 2] as f32;
            let a = row_in[pi + 3] as f32;
            let (nr, ng, nb, na) = transform(r, g, b, a);
            row_out[pi] = nr.round().clamp(0.0, 255.0) as u8;
            row_out[pi + 1] = ng.round().clamp(0.0, 255.0) as u8;
            row_out[pi + 2] = nb.round().clamp(0.0, 255.0) as u8;
            row_out[pi + 3] = na.round().clamp(0.0, 255.0) as u8;
        }
    });

    RgbaImage::from_raw(w as u32, h as u32, dst_raw)
        .unwrap_or_else(|| source.clone())
}

/// Combined color filter in one pass, applied in order:
/// brightness → contrast → grayscale → sepia → saturation.
///
/// `brightness`, `contrast`, `saturation` are percentages where 100 = no
/// change. `grayscale` and `sepia` are percentages where 0 = no change and
/// 100 = full effect.
pub fn apply_color_filter(
    source: &RgbaImage,
    brightness: f32,
    contrast: f32,
    saturation: f32,
    grayscale: f32,
    sepia: f32,
) -> RgbaImage {
    let bright = brightness / 100.0;
    let contr = contrast / 100.0;
    let sat = saturation / 100.0;
    let gray = (grayscale / 100.0).clamp(0.0, 1.0);
    let sep = (sepia / 100.0).clamp(0.0, 1.0);

    map_pixels(source, move |r, g, b, a| {
        // Brightness: linear gain.
        let (mut r, mut g, mut b) = (r * bright, g * bright, b * bright);

        // Contrast: scale around the midpoint.
        r = (r - 128.0) * contr + 128.0;
        g = (g - 128.0) * contr + 128.0;
        b = (b - 128.0) * contr + 128.0;

        // Grayscale: lerp toward luma.
        if gray > 0.0 {
            let l = LUMA_R * r + LUMA_G * g + LUMA_B * b;
            r += (l - r) * gray;
            g += (l - g) * gray;
            b += (l - b) * gray;
        }

        // Sepia: lerp toward the classic sepia matrix.
        if sep > 0.0 {
            let sr = 0.393 * r + 0.769 * g + 0.189 * b;
            let sg = 0.349 * r + 0.686 * g + 0.168 * b;
            let sb = 0.272 * r + 0.534 * g + 0.131 * b;
            r += (sr - r) * sep;
            g += (sg - g) * sep;
            b += (sb - b) * sep;
        }

        // Saturation: lerp away from (or past) luma.
        if sat != 1.0 {
            let l = LUMA_R * r + LUMA_G * g + LUMA_B * b;
            r = l + (r - l) * sat;
            g = l + (g - l) * sat;
            b = l + (b - l) * sat;
        }

        (r, g, b, a)
    })
}

// ============================================================================
// TEMPERATURE OVERLAY
// ============================================================================

/// Warm overlay color for positive temperature values.
const WARM: [f32; 3] = [255.0, 160.0, 64.0];
/// Cool overlay color for negative temperature values.
const COOL: [f32; 3] = [64.0, 128.0, 255.0];

/// Temperature tint: a translucent soft-light overlay blended over the
/// already filtered and rotated pixels. `temperature` is -100..100; the
/// overlay is warm orange when positive, cool blue when negative, and its
/// opacity scales linearly to 0.5 at |100|. Image alpha is untouched.
pub fn apply_temperature(source: &RgbaImage, temperature: f32) -> RgbaImage {
    let t = temperature.clamp(-100.0, 100.0);
    if t == 0.0 {
        return source.clone();
    }
    let overlay = if t > 0.0 { WARM } else { COOL };
    let alpha = t.abs() / 100.0 * 0.5;

    map_pixels(source, move |r, g, b, a| {
        let nr = soft_light_channel(r / 255.0, overlay[0] / 255.0, alpha) * 255.0;
        let ng = soft_light_channel(g / 255.0, overlay[1] / 255.0, alpha) * 255.0;
        let nb = soft_light_channel(b / 255.0, overlay[2] / 255.0, alpha) * 255.0;
        (nr, ng, nb, a)
    })
}

/// W3C soft-light blend of `cs` over `cb` (both 0..1), mixed at `alpha`.
fn soft_light_channel(cb: f32, cs: f32, alpha: f32) -> f32 {
    let blended = if cs <= 0.5 {
        cb - (1.0 - 2.0 * cs) * cb * (1.0 - cb)
    } else {
        let d = if cb <= 0.25 {
            ((16.0 * cb - 12.0) * cb + 4.0) * cb
        } else {
            cb.sqrt()
        };
        cb + (2.0 * cs - 1.0) * (d - cb)
    };
    cb + (blended - cb) * alpha
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(r: u8, g: u8, b: u8) -> RgbaImage {
        RgbaImage::from_pixel(3, 3, Rgba([r, g, b, 255]))
    }

    #[test]
    fn neutral_parameters_are_identity() {
        let img = solid(120, 64, 200);
        let out = apply_color_filter(&img, 100.0, 100.0, 100.0, 0.0, 0.0);
        assert_eq!(out, img);
    }

    #[test]
    fn brightness_scales_linearly() {
        let out = apply_color_filter(&solid(100, 100, 100), 150.0, 100.0, 100.0, 0.0, 0.0);
        assert_eq!(out.get_pixel(0, 0)[0], 150);
    }

    #[test]
    fn zero_contrast_collapses_to_midpoint() {
        let out = apply_color_filter(&solid(30, 220, 128), 100.0, 0.0, 100.0, 0.0, 0.0);
        assert_eq!(*out.get_pixel(0, 0), Rgba([128, 128, 128, 255]));
    }

    #[test]
    fn full_grayscale_equalizes_channels() {
        let out = apply_color_filter(&solid(250, 10, 30), 100.0, 100.0, 100.0, 100.0, 0.0);
        let p = out.get_pixel(0, 0);
        assert_eq!(p[0], p[1]);
        assert_eq!(p[1], p[2]);
    }

    #[test]
    fn zero_saturation_equals_full_grayscale() {
        let img = solid(250, 10, 30);
        let desat = apply_color_filter(&img, 100.0, 100.0, 0.0, 0.0, 0.0);
        let gray = apply_color_filter(&img, 100.0, 100.0, 100.0, 100.0, 0.0);
        assert_eq!(desat, gray);
    }

    #[test]
    fn zero_temperature_is_identity() {
        let img = solid(90, 90, 90);
        assert_eq!(apply_temperature(&img, 0.0), img);
    }

    #[test]
    fn temperature_sign_picks_warm_or_cool() {
        let img = solid(128, 128, 128);
        let warm = apply_temperature(&img, 80.0);
        let cool = apply_temperature(&img, -80.0);
        let wp = warm.get_pixel(0, 0);
        let cp = cool.get_pixel(0, 0);
        assert!(wp[0] > wp[2], "warm overlay should push red over blue: {:?}", wp);
        assert!(cp[2] > cp[0], "cool overlay should push blue over red: {:?}", cp);
        // Alpha channel never changes.
        assert_eq!(wp[3], 255);
        assert_eq!(cp[3], 255);
    }

    #[test]
    fn temperature_magnitude_scales_the_shift() {
        let img = solid(128, 128, 128);
        let mild = apply_temperature(&img, 20.0);
        let strong = apply_temperature(&img, 100.0);
        let shift = |out: &RgbaImage| {
            let p = out.get_pixel(0, 0);
            p[0] as i32 - p[2] as i32
        };
        assert!(shift(&strong) > shift(&mild));
    }
}
