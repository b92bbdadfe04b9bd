// ============================================================================
// PIXEL COMPOSITOR — pure functions over RGBA buffers
// ============================================================================
//
// Stateless by construction: every function here is a pure function of its
// inputs. Callers that composite the same source twice must do so
// sequentially; nothing in this module shares buffers between calls.

pub mod adjustments;
pub mod transform;

use image::RgbaImage;

use crate::panel::PendingAdjustment;

/// Full adjustment pipeline: combined color filter, then quarter-turn
/// rotation (canvas dimensions swap on odd multiples of 90°), then the
/// temperature overlay blended over the already rotated pixels.
pub fn apply_adjustments(source: &RgbaImage, params: &PendingAdjustment) -> RgbaImage {
    let colored = if params.has_color_change() {
        adjustments::apply_color_filter(
            source,
            params.brightness,
            params.contrast,
            params.saturation,
            params.grayscale,
            params.sepia,
        )
    } else {
        source.clone()
    };
    let rotated = if params.rotation % 360 != 0 {
        transform::rotate_quarter(&colored, params.rotation)
    } else {
        colored
    };
    if params.temperature != 0.0 {
        adjustments::apply_temperature(&rotated, params.temperature)
    } else {
        rotated
    }
}
