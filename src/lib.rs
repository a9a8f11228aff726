#![forbid(unsafe_code)]

pub mod core;
pub mod decode;
pub mod encode_gif;
pub mod error;
pub mod export;
pub mod mask;
pub mod noise;
pub mod pipeline;
pub mod playback;
pub mod settings;
pub mod synth;

pub use core::{Dims, FrameRGBA, FrameSequence, Rgb8};
pub use decode::{SourceBitmap, SourceCache, decode_image, rescale};
pub use encode_gif::GifSink;
pub use error::{JitterError, JitterResult};
pub use export::{EncodedArtifact, EncoderConfig, EncoderSink, InMemorySink, export};
pub use mask::{LineMask, extract_mask};
pub use noise::NoiseField;
pub use pipeline::Pipeline;
pub use playback::{DisplaySurface, PlaybackScheduler};
pub use settings::{DetectionMode, Settings};
pub use synth::{SynthOpts, synthesize};
