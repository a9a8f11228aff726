use crate::core::Rgb8;
use crate::error::{JitterError, JitterResult};

/// Line detection policy used to build the mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMode {
    /// Mark pixels darker than the threshold (ITU-R luma).
    Brightness,
    /// Mark pixels whose summed channel difference against the right and
    /// bottom neighbors exceeds `500 - threshold`.
    Edge,
}

/// Immutable-per-run configuration. The engine receives a snapshot per
/// invocation and treats it as read-only.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Detection threshold, 0..=500. In brightness mode this is compared
    /// against luma (0..=255), so values >= 255 mark every pixel. Kept as
    /// documented behavior.
    pub threshold: u16,
    /// Maximum displacement in output pixels, 0..=10.
    pub jitter_amount: f32,
    /// Milliseconds each frame stays on screen (and the GIF frame delay).
    pub jitter_speed_ms: u32,
    /// Frames per loop, 2..=8.
    pub frame_count: u32,
    pub line_color: Rgb8,
    pub bg_color: Rgb8,
    /// Output scale factor applied after the source-width cap.
    pub scale: f32,
    /// Keep the source pixel's color for marked pixels instead of `line_color`.
    pub use_original_colors: bool,
    pub detection_mode: DetectionMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            threshold: 200,
            jitter_amount: 2.0,
            jitter_speed_ms: 120,
            frame_count: 4,
            line_color: Rgb8::BLACK,
            bg_color: Rgb8::WHITE,
            scale: 1.0,
            use_original_colors: false,
            detection_mode: DetectionMode::Brightness,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> JitterResult<()> {
        if self.threshold > 500 {
            return Err(JitterError::validation("threshold must be <= 500"));
        }
        if !self.jitter_amount.is_finite()
            || self.jitter_amount < 0.0
            || self.jitter_amount > 10.0
        {
            return Err(JitterError::validation("jitter_amount must be in 0..=10"));
        }
        if self.jitter_speed_ms == 0 {
            return Err(JitterError::validation("jitter_speed_ms must be > 0"));
        }
        if !(2..=8).contains(&self.frame_count) {
            return Err(JitterError::validation("frame_count must be in 2..=8"));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(JitterError::validation("scale must be finite and > 0"));
        }
        Ok(())
    }
}
