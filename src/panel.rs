// ============================================================================
// LOCAL ADJUSTMENT PANEL — transient, per-checkpoint, non-committed params
// ============================================================================

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::ops;

/// Uncommitted color/rotation parameters, previewed live and never part of
/// the history until baked. Serialized to JSON for preset save/load.
///
/// Neutral values: brightness = contrast = saturation = 100 (percent,
/// 100 = unchanged); grayscale = sepia = temperature = 0; rotation = 0.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PendingAdjustment {
    /// 0–200 percent, 100 = unchanged.
    pub brightness: f32,
    /// 0–200 percent, 100 = unchanged.
    pub contrast: f32,
    /// 0–200 percent, 100 = unchanged, 0 = fully desaturated.
    pub saturation: f32,
    /// 0–100 percent, 0 = unchanged.
    pub grayscale: f32,
    /// 0–100 percent, 0 = unchanged.
    pub sepia: f32,
    /// -100 (cool) to 100 (warm), 0 = unchanged.
    pub temperature: f32,
    /// Quarter-turn rotation in degrees, kept wrapped to 0/90/180/270.
    pub rotation: i32,
}

impl Default for PendingAdjustment {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            grayscale: 0.0,
            sepia: 0.0,
            temperature: 0.0,
            rotation: 0,
        }
    }
}

impl PendingAdjustment {
    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }

    /// True when any color parameter deviates from neutral (rotation and
    /// temperature are applied in separate pipeline stages).
    pub fn has_color_change(&self) -> bool {
        self.brightness != 100.0
            || self.contrast != 100.0
            || self.saturation != 100.0
            || self.grayscale != 0.0
            || self.sepia != 0.0
    }

    pub fn rotate_cw(&mut self) {
        self.rotation = (self.rotation + 90).rem_euclid(360);
    }

    pub fn rotate_ccw(&mut self) {
        self.rotation = (self.rotation - 90).rem_euclid(360);
    }

    /// Clamp every parameter into its documented range.
    pub fn clamp(&mut self) {
        self.brightness = self.brightness.clamp(0.0, 200.0);
        self.contrast = self.contrast.clamp(0.0, 200.0);
        self.saturation = self.saturation.clamp(0.0, 200.0);
        self.grayscale = self.grayscale.clamp(0.0, 100.0);
        self.sepia = self.sepia.clamp(0.0, 100.0);
        self.temperature = self.temperature.clamp(-100.0, 100.0);
        self.rotation = self.rotation.rem_euclid(360);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Transient crop-flow parameters. The interactive rectangle math lives in
/// the host's crop UI; the core only carries the knobs so they reset
/// together with the color parameters when the viewed checkpoint changes.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct CropSettings {
    pub zoom: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    /// Free-angle rotation in degrees (crop flow only).
    pub rotation: f32,
    /// Locked width/height ratio, or `None` for freeform.
    pub lock_aspect: Option<f32>,
}

impl Default for CropSettings {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            rotation: 0.0,
            lock_aspect: None,
        }
    }
}

// ============================================================================
// PANEL
// ============================================================================

/// Owns the pending adjustment for the currently viewed checkpoint.
///
/// The session controller resets it whenever the viewed checkpoint changes
/// (generate, undo, redo, bake, new source); nothing here survives a
/// checkpoint switch.
#[derive(Debug, Default)]
pub struct AdjustmentPanel {
    params: PendingAdjustment,
    crop: CropSettings,
}

impl AdjustmentPanel {
    pub fn params(&self) -> &PendingAdjustment {
        &self.params
    }

    pub fn crop(&self) -> &CropSettings {
        &self.crop
    }

    /// Replace the parameters wholesale (slider commit). Out-of-range
    /// values are clamped rather than rejected.
    pub fn set_params(&mut self, mut params: PendingAdjustment) {
        params.clamp();
        self.params = params;
    }

    pub fn set_crop(&mut self, crop: CropSettings) {
        self.crop = crop;
    }

    pub fn rotate_cw(&mut self) {
        self.params.rotate_cw();
    }

    pub fn rotate_ccw(&mut self) {
        self.params.rotate_ccw();
    }

    /// Gates the bake/reset actions in the host UI.
    pub fn has_active_adjustments(&self) -> bool {
        !self.params.is_neutral()
    }

    /// Live, non-destructive preview: composite the pending parameters over
    /// `base` without touching panel state. Recomputed on every change.
    pub fn preview(&self, base: &RgbaImage) -> RgbaImage {
        ops::apply_adjustments(base, &self.params)
    }

    /// Consume the pending parameters into baked pixels: applies the
    /// compositor once and resets the panel. Returns `None` when nothing
    /// deviates from neutral (there is nothing to bake).
    pub fn bake(&mut self, base: &RgbaImage) -> Option<RgbaImage> {
        if !self.has_active_adjustments() {
            return None;
        }
        let baked = ops::apply_adjustments(base, &self.params);
        log::info!("baked local adjustments into new pixels");
        self.reset();
        Some(baked)
    }

    pub fn reset(&mut self) {
        self.params.reset();
        self.crop = CropSettings::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn defaults_are_neutral() {
        let panel = AdjustmentPanel::default();
        assert!(!panel.has_active_adjustments());
        assert!(panel.params().is_neutral());
    }

    #[test]
    fn any_deviation_activates_the_panel() {
        let mut panel = AdjustmentPanel::default();
        panel.set_params(PendingAdjustment {
            sepia: 40.0,
            ..PendingAdjustment::default()
        });
        assert!(panel.has_active_adjustments());
    }

    #[test]
    fn rotation_wraps_through_quarter_turns() {
        let mut p = PendingAdjustment::default();
        p.rotate_cw();
        p.rotate_cw();
        p.rotate_cw();
        p.rotate_cw();
        assert_eq!(p.rotation, 0);
        p.rotate_ccw();
        assert_eq!(p.rotation, 270);
    }

    #[test]
    fn set_params_clamps_out_of_range_values() {
        let mut panel = AdjustmentPanel::default();
        panel.set_params(PendingAdjustment {
            brightness: 900.0,
            temperature: -500.0,
            rotation: -90,
            ..PendingAdjustment::default()
        });
        assert_eq!(panel.params().brightness, 200.0);
        assert_eq!(panel.params().temperature, -100.0);
        assert_eq!(panel.params().rotation, 270);
    }

    #[test]
    fn bake_applies_once_and_resets() {
        let mut panel = AdjustmentPanel::default();
        panel.set_params(PendingAdjustment {
            brightness: 150.0,
            ..PendingAdjustment::default()
        });
        let base = RgbaImage::from_pixel(2, 2, Rgba([100, 100, 100, 255]));
        let baked = panel.bake(&base).unwrap();
        assert_eq!(baked.get_pixel(0, 0)[0], 150);
        assert!(!panel.has_active_adjustments());
    }

    #[test]
    fn bake_with_neutral_params_yields_nothing() {
        let mut panel = AdjustmentPanel::default();
        let base = RgbaImage::new(2, 2);
        assert!(panel.bake(&base).is_none());
    }

    #[test]
    fn preset_json_round_trip() {
        let mut p = PendingAdjustment::default();
        p.contrast = 130.0;
        p.temperature = -25.0;
        let restored = PendingAdjustment::from_json(&p.to_json().unwrap()).unwrap();
        assert_eq!(p, restored);
    }

    #[test]
    fn reset_clears_crop_settings_too() {
        let mut panel = AdjustmentPanel::default();
        panel.set_crop(CropSettings {
            zoom: 2.5,
            lock_aspect: Some(1.0),
            ..CropSettings::default()
        });
        panel.reset();
        assert_eq!(*panel.crop(), CropSettings::default());
    }
}
