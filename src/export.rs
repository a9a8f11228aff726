use crate::core::{FrameRGBA, FrameSequence, Rgb8};
use crate::error::{JitterError, JitterResult};
use crate::settings::Settings;

/// Worker-count hint handed to the encoder.
pub const ENCODER_WORKERS: u32 = 2;
/// Quality hint handed to the encoder (lower is better for the GIF backend).
pub const ENCODER_QUALITY: u32 = 10;

/// Configuration provided to an [`EncoderSink`] before any frames are pushed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncoderConfig {
    pub width: u32,
    pub height: u32,
    pub bg: Rgb8,
    /// Concurrency hint; sinks may ignore it.
    pub workers: u32,
    /// Quality hint; sinks may ignore it.
    pub quality: u32,
}

/// The encoded artifact: an animated-image byte stream suitable for direct
/// download or writing to disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedArtifact {
    pub bytes: Vec<u8>,
}

/// Encoder collaborator contract.
///
/// Frames are pushed in loop order, each with its display delay; `finish`
/// triggers the actual render and yields the artifact. A sink that is not
/// [`ready`](EncoderSink::ready) must not be driven: export fails hard
/// before `begin` is ever called.
pub trait EncoderSink {
    /// Whether the sink's execution context is prepared.
    fn ready(&self) -> bool;
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: EncoderConfig) -> JitterResult<()>;
    /// Push one frame in loop order with its per-frame delay.
    fn push_frame(&mut self, frame: &FrameRGBA, delay_ms: u32) -> JitterResult<()>;
    /// Render and return the encoded artifact.
    fn finish(&mut self) -> JitterResult<EncodedArtifact>;
}

/// Hand the frame loop to the encoder.
///
/// An empty sequence declines silently (`Ok(None)`): no frames, no artifact,
/// no error signaled. An unready sink is a hard [`JitterError::EncoderUnavailable`]
/// failure with no retry.
pub fn export(
    frames: &FrameSequence,
    settings: &Settings,
    sink: &mut dyn EncoderSink,
) -> JitterResult<Option<EncodedArtifact>> {
    let Some(dims) = frames.dims() else {
        tracing::debug!("export skipped: empty frame sequence");
        return Ok(None);
    };

    if !sink.ready() {
        return Err(JitterError::encoder_unavailable(
            "encoder sink is not ready; retry after it is prepared",
        ));
    }

    sink.begin(EncoderConfig {
        width: dims.width,
        height: dims.height,
        bg: settings.bg_color,
        workers: ENCODER_WORKERS,
        quality: ENCODER_QUALITY,
    })?;

    for frame in frames.frames() {
        sink.push_frame(frame, settings.jitter_speed_ms)?;
    }

    sink.finish().map(Some)
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    unready: bool,
    cfg: Option<EncoderConfig>,
    frames: Vec<FrameRGBA>,
    delays: Vec<u32>,
    finished: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose execution context never becomes ready.
    pub fn unready() -> Self {
        Self {
            unready: true,
            ..Self::default()
        }
    }

    pub fn config(&self) -> Option<&EncoderConfig> {
        self.cfg.as_ref()
    }

    pub fn frames(&self) -> &[FrameRGBA] {
        &self.frames
    }

    pub fn delays(&self) -> &[u32] {
        &self.delays
    }

    pub fn finished(&self) -> bool {
        self.finished
    }
}

impl EncoderSink for InMemorySink {
    fn ready(&self) -> bool {
        !self.unready
    }

    fn begin(&mut self, cfg: EncoderConfig) -> JitterResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.delays.clear();
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, frame: &FrameRGBA, delay_ms: u32) -> JitterResult<()> {
        self.frames.push(frame.clone());
        self.delays.push(delay_ms);
        Ok(())
    }

    fn finish(&mut self) -> JitterResult<EncodedArtifact> {
        self.finished = true;
        Ok(EncodedArtifact { bytes: Vec::new() })
    }
}
