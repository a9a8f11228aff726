use crate::decode::SourceBitmap;
use crate::error::{JitterError, JitterResult};
use crate::settings::DetectionMode;

/// Binary line/background classification of the (rescaled) source, one bit
/// per pixel. Built once per (source, threshold, mode) and then consumed
/// read-only by every synthesized frame.
#[derive(Clone, Debug)]
pub struct LineMask {
    width: u32,
    height: u32,
    bits: Vec<u8>,
}

impl LineMask {
    fn with_dims(width: u32, height: u32) -> Self {
        let len = (width as usize * height as usize).div_ceil(8);
        Self {
            width,
            height,
            bits: vec![0u8; len],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// True when (x, y) is marked as line foreground. Out-of-bounds
    /// coordinates are never marked.
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let i = y as usize * self.width as usize + x as usize;
        self.bits[i / 8] & (1 << (i % 8)) != 0
    }

    fn set(&mut self, x: u32, y: u32) {
        let i = y as usize * self.width as usize + x as usize;
        self.bits[i / 8] |= 1 << (i % 8);
    }

    /// Number of marked pixels.
    pub fn set_count(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }
}

/// Classify every pixel of `bitmap` under the given detection policy.
///
/// Runs once per source/settings change, not per frame.
pub fn extract_mask(
    bitmap: &SourceBitmap,
    threshold: u16,
    mode: DetectionMode,
) -> JitterResult<LineMask> {
    if threshold > 500 {
        return Err(JitterError::validation("threshold must be <= 500"));
    }

    let (w, h) = (bitmap.width, bitmap.height);
    let mut mask = LineMask::with_dims(w, h);

    match mode {
        DetectionMode::Brightness => {
            let cutoff = f32::from(threshold);
            for y in 0..h {
                for x in 0..w {
                    let [r, g, b, _] = bitmap.pixel(x, y);
                    let luma =
                        0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b);
                    if luma < cutoff {
                        mask.set(x, y);
                    }
                }
            }
        }
        DetectionMode::Edge => {
            // Needs a right and a bottom neighbor, so the final row and
            // column stay unmarked.
            let cutoff = (500 - i32::from(threshold)).max(0);
            for y in 0..h.saturating_sub(1) {
                for x in 0..w.saturating_sub(1) {
                    let p = bitmap.pixel(x, y);
                    let right = bitmap.pixel(x + 1, y);
                    let below = bitmap.pixel(x, y + 1);
                    let total: i32 = (0..3)
                        .map(|c| {
                            let v = i32::from(p[c]);
                            (v - i32::from(right[c])).abs() + (v - i32::from(below[c])).abs()
                        })
                        .sum();
                    if total > cutoff {
                        mask.set(x, y);
                    }
                }
            }
        }
    }

    Ok(mask)
}
