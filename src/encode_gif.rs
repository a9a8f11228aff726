use crate::core::FrameRGBA;
use crate::error::{JitterError, JitterResult};
use crate::export::{EncodedArtifact, EncoderConfig, EncoderSink};

/// GIF encoder sink over the `image` codec.
///
/// Frames accumulate on `push_frame` and the actual encode runs in `finish`,
/// matching the add-frames-then-render protocol of the encoder collaborator
/// it stands in for. The output loops forever with the per-frame delays it
/// was given.
#[derive(Debug, Default)]
pub struct GifSink {
    cfg: Option<EncoderConfig>,
    frames: Vec<(FrameRGBA, u32)>,
}

impl GifSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EncoderSink for GifSink {
    fn ready(&self) -> bool {
        // The codec is compiled in; there is no worker context to wait for.
        true
    }

    fn begin(&mut self, cfg: EncoderConfig) -> JitterResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(JitterError::validation(
                "encode width/height must be non-zero",
            ));
        }
        self.cfg = Some(cfg);
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, frame: &FrameRGBA, delay_ms: u32) -> JitterResult<()> {
        let Some(cfg) = self.cfg.as_ref() else {
            return Err(JitterError::validation("push_frame before begin"));
        };
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(JitterError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if frame.data.len() != cfg.width as usize * cfg.height as usize * 4 {
            return Err(JitterError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }
        self.frames.push((frame.clone(), delay_ms));
        Ok(())
    }

    fn finish(&mut self) -> JitterResult<EncodedArtifact> {
        let Some(cfg) = self.cfg.take() else {
            return Err(JitterError::validation("finish before begin"));
        };
        let frames = std::mem::take(&mut self.frames);

        // The image codec's speed knob runs 1..=30; our quality hint maps
        // onto it directly.
        let speed = cfg.quality.clamp(1, 30) as i32;

        let mut bytes = Vec::new();
        {
            let mut encoder = image::codecs::gif::GifEncoder::new_with_speed(&mut bytes, speed);
            encoder
                .set_repeat(image::codecs::gif::Repeat::Infinite)
                .map_err(|e| JitterError::encode(format!("failed to set gif loop: {e}")))?;

            for (frame, delay_ms) in frames {
                let buffer =
                    image::RgbaImage::from_raw(frame.width, frame.height, frame.data)
                        .ok_or_else(|| {
                            JitterError::encode("frame buffer does not match its dimensions")
                        })?;
                let gif_frame = image::Frame::from_parts(
                    buffer,
                    0,
                    0,
                    image::Delay::from_numer_denom_ms(delay_ms, 1),
                );
                encoder
                    .encode_frame(gif_frame)
                    .map_err(|e| JitterError::encode(format!("failed to encode gif frame: {e}")))?;
            }
        }

        Ok(EncodedArtifact { bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Rgb8;

    fn cfg(width: u32, height: u32) -> EncoderConfig {
        EncoderConfig {
            width,
            height,
            bg: Rgb8::WHITE,
            workers: 2,
            quality: 10,
        }
    }

    fn solid_frame(width: u32, height: u32, rgb: [u8; 3]) -> FrameRGBA {
        let data = (0..width * height)
            .flat_map(|_| [rgb[0], rgb[1], rgb[2], 255])
            .collect();
        FrameRGBA {
            width,
            height,
            data,
        }
    }

    #[test]
    fn lifecycle_violations_are_validation_errors() {
        let mut sink = GifSink::new();
        assert!(sink.push_frame(&solid_frame(1, 1, [0, 0, 0]), 100).is_err());
        assert!(sink.finish().is_err());
        assert!(sink.begin(cfg(0, 1)).is_err());
    }

    #[test]
    fn mismatched_frame_dimensions_are_rejected() {
        let mut sink = GifSink::new();
        sink.begin(cfg(2, 2)).unwrap();
        let err = sink.push_frame(&solid_frame(1, 1, [0, 0, 0]), 100).unwrap_err();
        assert!(matches!(err, JitterError::Validation(_)));
    }

    #[test]
    fn finish_produces_a_gif_byte_stream() {
        let mut sink = GifSink::new();
        sink.begin(cfg(2, 2)).unwrap();
        sink.push_frame(&solid_frame(2, 2, [0, 0, 0]), 120).unwrap();
        sink.push_frame(&solid_frame(2, 2, [255, 255, 255]), 120)
            .unwrap();
        let artifact = sink.finish().unwrap();

        // GIF89a magic.
        assert!(artifact.bytes.starts_with(b"GIF89a"));
        assert!(artifact.bytes.len() > 6);

        // Finishing consumed the config; the sink needs a fresh begin.
        assert!(sink.finish().is_err());
    }
}
