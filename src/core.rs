use crate::error::{JitterError, JitterResult};

/// Source images wider than this are shrunk (aspect-preserving) before the
/// output scale factor is applied.
pub const MAX_SOURCE_WIDTH: u32 = 800;

/// Opaque 8-bit RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Parse `#RRGGBB` (leading `#` optional, case-insensitive).
    pub fn from_hex(s: &str) -> JitterResult<Self> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);
        if s.len() != 6 || !s.is_ascii() {
            return Err(JitterError::validation("color must be #RRGGBB"));
        }

        fn hex_byte(pair: &str) -> JitterResult<u8> {
            u8::from_str_radix(pair, 16)
                .map_err(|_| JitterError::validation(format!("invalid hex byte \"{pair}\"")))
        }

        Ok(Self {
            r: hex_byte(&s[0..2])?,
            g: hex_byte(&s[2..4])?,
            b: hex_byte(&s[4..6])?,
        })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl std::str::FromStr for Rgb8 {
    type Err = JitterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl serde::Serialize for Rgb8 {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Rgb8 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            RgbObj { r: u8, g: u8, b: u8 },
            Arr(Vec<u8>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Hex(s) => Rgb8::from_hex(&s).map_err(serde::de::Error::custom),
            Repr::RgbObj { r, g, b } => Ok(Rgb8::new(r, g, b)),
            Repr::Arr(v) => {
                if v.len() == 3 {
                    Ok(Rgb8::new(v[0], v[1], v[2]))
                } else {
                    Err(serde::de::Error::custom("rgb array must have len 3"))
                }
            }
        }
    }
}

/// Output dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Dims {
    pub width: u32,
    pub height: u32,
}

impl Dims {
    /// Derive output dimensions from a source image: cap the width at
    /// [`MAX_SOURCE_WIDTH`] (aspect-preserving), multiply by `scale`, floor.
    pub fn derive(src_width: u32, src_height: u32, scale: f32) -> JitterResult<Self> {
        if src_width == 0 || src_height == 0 {
            return Err(JitterError::validation("source dimensions must be > 0"));
        }
        if !scale.is_finite() || scale <= 0.0 {
            return Err(JitterError::validation("scale must be finite and > 0"));
        }

        let mut w = src_width as f32;
        let mut h = src_height as f32;
        if w > MAX_SOURCE_WIDTH as f32 {
            h = h * MAX_SOURCE_WIDTH as f32 / w;
            w = MAX_SOURCE_WIDTH as f32;
        }

        let width = (w * scale).floor() as u32;
        let height = (h * scale).floor() as u32;
        if width == 0 || height == 0 {
            return Err(JitterError::validation(
                "scale produces an empty output canvas",
            ));
        }

        Ok(Self { width, height })
    }

    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// One rendered frame: straight (non-premultiplied) RGBA8, row-major,
/// tightly packed, fully opaque by construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl FrameRGBA {
    pub fn dims(&self) -> Dims {
        Dims {
            width: self.width,
            height: self.height,
        }
    }

    /// RGBA bytes of pixel (x, y). Panics when out of bounds (callers index
    /// within `width`/`height`).
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }
}

/// Ordered frame loop. Immutable once published: readers never observe
/// partial writes, so playback and export need no synchronization.
#[derive(Clone, Debug, Default)]
pub struct FrameSequence {
    frames: Vec<FrameRGBA>,
}

impl FrameSequence {
    /// Build a sequence, requiring every frame to share one set of dimensions.
    pub fn new(frames: Vec<FrameRGBA>) -> JitterResult<Self> {
        if let Some(first) = frames.first() {
            let dims = first.dims();
            for f in &frames {
                if f.dims() != dims {
                    return Err(JitterError::validation(
                        "all frames in a sequence must share dimensions",
                    ));
                }
                if f.data.len() != dims.pixel_count() * 4 {
                    return Err(JitterError::validation(
                        "frame data length must be width*height*4",
                    ));
                }
            }
        }
        Ok(Self { frames })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Shared dimensions of all frames; `None` when the sequence is empty.
    pub fn dims(&self) -> Option<Dims> {
        self.frames.first().map(FrameRGBA::dims)
    }

    pub fn frames(&self) -> &[FrameRGBA] {
        &self.frames
    }

    pub fn get(&self, index: usize) -> Option<&FrameRGBA> {
        self.frames.get(index)
    }
}
