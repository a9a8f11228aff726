use crate::core::{Dims, FrameSequence};
use crate::decode::{SourceCache, rescale};
use crate::error::JitterResult;
use crate::mask::extract_mask;
use crate::settings::Settings;
use crate::synth::{SynthOpts, synthesize};

/// Explicit generation pipeline: decode (cached) → output dimensions →
/// rescale → mask (once) → synthesize.
///
/// There is no reactive dependency tracking; the caller invokes
/// [`regenerate`](Pipeline::regenerate) whenever it decides the source or the
/// settings changed, and the last completed call wins. On failure the
/// previously published sequence is left untouched.
#[derive(Debug, Default)]
pub struct Pipeline {
    cache: SourceCache,
    current: Option<FrameSequence>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last successfully generated frame loop, if any.
    pub fn current(&self) -> Option<&FrameSequence> {
        self.current.as_ref()
    }

    /// Drop the cached decode for `source_id` (call when the bytes behind an
    /// identity change).
    pub fn invalidate_source(&mut self, source_id: &str) {
        self.cache.invalidate(source_id);
    }

    /// Run the full pipeline and publish the resulting sequence.
    #[tracing::instrument(skip(self, bytes, settings, opts), fields(source = source_id))]
    pub fn regenerate(
        &mut self,
        source_id: &str,
        bytes: &[u8],
        settings: &Settings,
        opts: &SynthOpts,
    ) -> JitterResult<&FrameSequence> {
        settings.validate()?;

        let source = self.cache.get_or_decode(source_id, bytes)?;
        let dims = Dims::derive(source.width, source.height, settings.scale)?;
        let scaled = rescale(&source, dims)?;
        let mask = extract_mask(&scaled, settings.threshold, settings.detection_mode)?;
        tracing::debug!(
            width = dims.width,
            height = dims.height,
            marked = mask.set_count(),
            "line mask extracted"
        );

        let sequence = synthesize(&scaled, &mask, settings, opts)?;
        tracing::debug!(frames = sequence.len(), "frame loop synthesized");

        Ok(self.current.insert(sequence))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::core::Rgb8;
    use crate::settings::DetectionMode;

    fn png_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
        let data: Vec<u8> = (0..width * height)
            .flat_map(|_| [rgb[0], rgb[1], rgb[2], 255])
            .collect();
        let img = image::RgbaImage::from_raw(width, height, data).unwrap();
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn seeded() -> SynthOpts {
        SynthOpts {
            seed: Some(1),
            ..Default::default()
        }
    }

    #[test]
    fn regenerate_publishes_a_scaled_loop() {
        let bytes = png_bytes(10, 10, [0, 0, 0]);
        let mut pipeline = Pipeline::new();
        let settings = Settings {
            scale: 0.5,
            ..Settings::default()
        };

        let seq = pipeline
            .regenerate("img", &bytes, &settings, &seeded())
            .unwrap();
        assert_eq!(seq.len(), settings.frame_count as usize);
        assert_eq!(
            seq.dims().unwrap(),
            Dims {
                width: 5,
                height: 5
            }
        );
        assert!(pipeline.current().is_some());
    }

    #[test]
    fn failed_regenerate_keeps_the_prior_sequence() {
        let bytes = png_bytes(4, 4, [0, 0, 0]);
        let mut pipeline = Pipeline::new();
        let settings = Settings::default();

        pipeline
            .regenerate("img", &bytes, &settings, &seeded())
            .unwrap();
        let before = pipeline.current().unwrap().clone();

        // A fresh identity with undecodable bytes fails at the decode stage.
        let err = pipeline
            .regenerate("other", b"not an image", &settings, &seeded())
            .unwrap_err();
        assert!(matches!(err, crate::error::JitterError::Decode(_)));

        let after = pipeline.current().unwrap();
        assert_eq!(after.frames(), before.frames());
    }

    #[test]
    fn invalid_settings_fail_before_any_work() {
        let mut pipeline = Pipeline::new();
        let settings = Settings {
            frame_count: 1,
            ..Settings::default()
        };
        assert!(
            pipeline
                .regenerate("img", b"irrelevant", &settings, &seeded())
                .is_err()
        );
        assert!(pipeline.current().is_none());
    }

    #[test]
    fn settings_only_changes_reuse_the_cached_decode() {
        let bytes = png_bytes(4, 4, [10, 10, 10]);
        let mut pipeline = Pipeline::new();

        pipeline
            .regenerate("img", &bytes, &Settings::default(), &seeded())
            .unwrap();

        // Same identity, garbage bytes: the cached bitmap is used, so the
        // run still succeeds with the new settings.
        let settings = Settings {
            detection_mode: DetectionMode::Edge,
            bg_color: Rgb8::new(1, 2, 3),
            ..Settings::default()
        };
        let seq = pipeline
            .regenerate("img", b"garbage ignored", &settings, &seeded())
            .unwrap();
        // Uniform source in edge mode: solid background everywhere.
        assert!(
            seq.frames()[0]
                .data
                .chunks_exact(4)
                .all(|px| px == [1, 2, 3, 255])
        );
    }
}
