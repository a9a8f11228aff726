use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::core::{FrameRGBA, FrameSequence};
use crate::decode::SourceBitmap;
use crate::error::{JitterError, JitterResult};
use crate::mask::LineMask;
use crate::noise::NoiseField;
use crate::settings::Settings;

/// Scale applied to the per-pixel high-frequency jitter draw before the
/// jitter amount multiplies in.
const HIGH_FREQ_SCALE: f32 = 0.3;

/// Per-run synthesis options.
#[derive(Clone, Copy, Debug, Default)]
pub struct SynthOpts {
    /// Base RNG seed. `None` draws one from the thread RNG, so runs differ
    /// (the intended hand-drawn variability). Tests pass a fixed seed.
    pub seed: Option<u64>,
    /// Render frames on the rayon pool. Output is byte-identical to the
    /// sequential path for the same seed.
    pub parallel: bool,
    /// Override `settings.frame_count` (any count >= 1). The CLI and
    /// single-frame probes use this; `None` follows the settings.
    pub frame_count: Option<u32>,
}

/// Synthesize the full frame loop by backward mapping.
///
/// Every destination pixel looks up its jittered source location, so each
/// destination pixel is assigned exactly once and the output has no holes.
/// The mask is computed by the caller once per source; the only per-frame
/// randomness is the pair of noise fields and the high-frequency draws.
pub fn synthesize(
    bitmap: &SourceBitmap,
    mask: &LineMask,
    settings: &Settings,
    opts: &SynthOpts,
) -> JitterResult<FrameSequence> {
    if mask.width() != bitmap.width || mask.height() != bitmap.height {
        return Err(JitterError::validation(
            "mask dimensions must match the bitmap",
        ));
    }

    let frame_count = opts.frame_count.unwrap_or(settings.frame_count);
    if frame_count == 0 {
        return Err(JitterError::validation("frame count must be >= 1"));
    }

    let base_seed = opts
        .seed
        .unwrap_or_else(|| rand::thread_rng().next_u64());

    let frames: Vec<FrameRGBA> = if opts.parallel {
        (0..frame_count)
            .into_par_iter()
            .map(|i| {
                let mut rng = ChaCha8Rng::seed_from_u64(frame_seed(base_seed, u64::from(i)));
                synthesize_frame(bitmap, mask, settings, &mut rng)
            })
            .collect()
    } else {
        (0..frame_count)
            .map(|i| {
                let mut rng = ChaCha8Rng::seed_from_u64(frame_seed(base_seed, u64::from(i)));
                synthesize_frame(bitmap, mask, settings, &mut rng)
            })
            .collect()
    };

    FrameSequence::new(frames)
}

fn synthesize_frame<R: Rng + ?Sized>(
    bitmap: &SourceBitmap,
    mask: &LineMask,
    settings: &Settings,
    rng: &mut R,
) -> FrameRGBA {
    let (w, h) = (bitmap.width, bitmap.height);
    let noise_x = NoiseField::generate(rng, w, h);
    let noise_y = NoiseField::generate(rng, w, h);

    let amount = settings.jitter_amount;
    let line = settings.line_color;
    let bg = settings.bg_color;

    let mut data = vec![0u8; w as usize * h as usize * 4];
    for y in 0..h {
        for x in 0..w {
            let hx = rng.gen_range(-0.5f32..0.5) * HIGH_FREQ_SCALE;
            let hy = rng.gen_range(-0.5f32..0.5) * HIGH_FREQ_SCALE;
            let dx = noise_x.sample(x, y) * amount + hx * amount;
            let dy = noise_y.sample(x, y) * amount + hy * amount;

            let src_x = (x as f32 - dx).round() as i64;
            let src_y = (y as f32 - dy).round() as i64;
            let in_bounds = src_x >= 0
                && src_y >= 0
                && (src_x as u64) < u64::from(w)
                && (src_y as u64) < u64::from(h);

            let (r, g, b) = if in_bounds && mask.get(src_x as u32, src_y as u32) {
                if settings.use_original_colors {
                    let p = bitmap.pixel(src_x as u32, src_y as u32);
                    (p[0], p[1], p[2])
                } else {
                    (line.r, line.g, line.b)
                }
            } else {
                (bg.r, bg.g, bg.b)
            };

            let i = (y as usize * w as usize + x as usize) * 4;
            data[i] = r;
            data[i + 1] = g;
            data[i + 2] = b;
            data[i + 3] = 255;
        }
    }

    FrameRGBA {
        width: w,
        height: h,
        data,
    }
}

// splitmix64 step: stable per-frame seeds from the base seed, so the rayon
// path and the sequential path construct identical per-frame RNG streams.
fn frame_seed(base: u64, index: u64) -> u64 {
    let mut z = base.wrapping_add(index.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
