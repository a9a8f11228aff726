use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use crate::core::Dims;
use crate::error::{JitterError, JitterResult};

/// Decoded source image: straight (non-premultiplied) RGBA8, row-major,
/// tightly packed. Immutable once decoded.
#[derive(Clone, Debug)]
pub struct SourceBitmap {
    pub width: u32,
    pub height: u32,
    rgba8: Arc<Vec<u8>>,
}

impl SourceBitmap {
    pub fn from_rgba8(width: u32, height: u32, rgba8: Vec<u8>) -> JitterResult<Self> {
        if rgba8.len() != width as usize * height as usize * 4 {
            return Err(JitterError::validation(
                "bitmap data length must be width*height*4",
            ));
        }
        Ok(Self {
            width,
            height,
            rgba8: Arc::new(rgba8),
        })
    }

    pub fn dims(&self) -> Dims {
        Dims {
            width: self.width,
            height: self.height,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.rgba8
    }

    /// RGBA bytes of pixel (x, y). Panics when out of bounds (callers index
    /// within `width`/`height`).
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.rgba8[i],
            self.rgba8[i + 1],
            self.rgba8[i + 2],
            self.rgba8[i + 3],
        ]
    }
}

/// Decode an encoded image (PNG, JPEG, ...) into a straight RGBA8 bitmap at
/// its natural resolution.
pub fn decode_image(bytes: &[u8]) -> JitterResult<SourceBitmap> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| JitterError::decode(format!("source image failed to decode: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    SourceBitmap::from_rgba8(width, height, rgba.into_raw())
}

/// Bilinearly resample a bitmap to the output dimensions. The mask extractor
/// and frame synthesizer both consume the rescaled bitmap.
pub fn rescale(bitmap: &SourceBitmap, dims: Dims) -> JitterResult<SourceBitmap> {
    if bitmap.dims() == dims {
        return Ok(bitmap.clone());
    }

    let img = image::RgbaImage::from_raw(bitmap.width, bitmap.height, bitmap.data().to_vec())
        .ok_or_else(|| JitterError::validation("bitmap buffer does not match its dimensions"))?;
    let resized = image::imageops::resize(
        &img,
        dims.width,
        dims.height,
        image::imageops::FilterType::Triangle,
    );
    SourceBitmap::from_rgba8(dims.width, dims.height, resized.into_raw())
}

/// Decoded bitmaps keyed by source identity, so settings-only changes skip
/// the decode work.
#[derive(Debug, Default)]
pub struct SourceCache {
    entries: HashMap<String, SourceBitmap>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached bitmap for `key`, decoding `bytes` on first use.
    /// The pixel buffer is shared, so the returned clone is cheap.
    pub fn get_or_decode(&mut self, key: &str, bytes: &[u8]) -> JitterResult<SourceBitmap> {
        match self.entries.entry(key.to_owned()) {
            Entry::Occupied(e) => Ok(e.get().clone()),
            Entry::Vacant(v) => {
                let bitmap = decode_image(bytes)?;
                Ok(v.insert(bitmap).clone())
            }
        }
    }

    /// Drop the entry for `key`; the next `get_or_decode` re-decodes.
    pub fn invalidate(&mut self, key: &str) {
        self.entries.remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn png_bytes(width: u32, height: u32, rgba: &[u8]) -> Vec<u8> {
        let img = image::RgbaImage::from_raw(width, height, rgba.to_vec()).unwrap();
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn decode_png_preserves_dimensions_and_pixels() {
        let bytes = png_bytes(2, 1, &[10, 20, 30, 255, 40, 50, 60, 255]);
        let bmp = decode_image(&bytes).unwrap();
        assert_eq!((bmp.width, bmp.height), (2, 1));
        assert_eq!(bmp.pixel(0, 0), [10, 20, 30, 255]);
        assert_eq!(bmp.pixel(1, 0), [40, 50, 60, 255]);
    }

    #[test]
    fn decode_garbage_is_a_decode_error() {
        let err = decode_image(b"not an image").unwrap_err();
        assert!(matches!(err, JitterError::Decode(_)));
    }

    #[test]
    fn rescale_identity_shares_the_buffer() {
        let bmp = SourceBitmap::from_rgba8(1, 1, vec![1, 2, 3, 255]).unwrap();
        let same = rescale(&bmp, bmp.dims()).unwrap();
        assert_eq!(same.data(), bmp.data());
    }

    #[test]
    fn rescale_downsamples_uniform_color_exactly() {
        let red = vec![255u8, 0, 0, 255].repeat(16);
        let bmp = SourceBitmap::from_rgba8(4, 4, red).unwrap();
        let half = rescale(
            &bmp,
            Dims {
                width: 2,
                height: 2,
            },
        )
        .unwrap();
        assert_eq!((half.width, half.height), (2, 2));
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(half.pixel(x, y), [255, 0, 0, 255]);
            }
        }
    }

    #[test]
    fn cache_decodes_once_per_key_and_invalidates() {
        let bytes = png_bytes(1, 1, &[9, 9, 9, 255]);
        let mut cache = SourceCache::new();

        let a = cache.get_or_decode("img-1", &bytes).unwrap();
        // Second hit never looks at the bytes again.
        let b = cache.get_or_decode("img-1", b"garbage ignored").unwrap();
        assert_eq!(a.data(), b.data());
        assert_eq!(cache.len(), 1);

        cache.invalidate("img-1");
        assert!(cache.is_empty());
        assert!(cache.get_or_decode("img-1", b"garbage").is_err());
    }
}
