//! Pixel access abstraction.
//!
//! The analyzer never sees files or codecs, only a [`PixelSource`]: width,
//! height, per-pixel RGBA and an approximate encoded byte size. Decoded
//! images and raw RGBA buffers both implement it.

use super::DecodeError;

/// Anything the analyzer can read pixels from.
pub trait PixelSource: Sync {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// RGBA at `(x, y)`. Callers stay within `width × height`.
    fn rgba(&self, x: u32, y: u32) -> [u8; 4];

    /// Approximate size of the encoded source in bytes.
    fn byte_len(&self) -> u64;

    /// MIME type of the encoded source, when known.
    fn mime_type(&self) -> Option<&str> {
        None
    }

    /// Bits per pixel of the source.
    fn color_depth(&self) -> u16 {
        32
    }

    /// Whether the source has an alpha channel at all.
    fn has_alpha_channel(&self) -> bool {
        true
    }
}

/// An in-memory RGBA8 buffer, for callers that already hold decoded pixels.
#[derive(Debug, Clone)]
pub struct RgbaBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
    byte_len: u64,
    mime_type: Option<String>,
}

impl RgbaBuffer {
    /// Wrap `width × height × 4` bytes of RGBA8 data.
    ///
    /// The declared byte length defaults to the buffer length.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, DecodeError> {
        if width == 0 || height == 0 {
            return Err(DecodeError::ZeroDimensions { width, height });
        }
        let expected = width as u64 * height as u64 * 4;
        if data.len() as u64 != expected {
            return Err(DecodeError::PixelDataMismatch {
                expected,
                actual: data.len() as u64,
            });
        }
        let byte_len = data.len() as u64;
        Ok(Self {
            width,
            height,
            data,
            byte_len,
            mime_type: None,
        })
    }

    /// Build a buffer by evaluating `f` at every pixel.
    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(u32, u32) -> [u8; 4],
    ) -> Result<Self, DecodeError> {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self::new(width, height, data)
    }

    /// Override the declared encoded size (e.g. the size of the uploaded file).
    pub fn with_byte_len(mut self, byte_len: u64) -> Self {
        self.byte_len = byte_len;
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

impl PixelSource for RgbaBuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn rgba(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    fn byte_len(&self) -> u64 {
        self.byte_len
    }

    fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }
}
