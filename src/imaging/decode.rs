//! Decoding files and byte buffers into a [`PixelSource`].
//!
//! This is the engine's only fallible I/O step. It runs once per image,
//! before analysis, and never retries: a decode failure goes straight back
//! to the caller.
//!
//! | Format | Decoder |
//! |---|---|
//! | JPEG, PNG, TIFF, WebP | `image` crate (pure Rust decoders) |

use super::DecodeError;
use super::source::PixelSource;
use image::{DynamicImage, ImageReader, RgbaImage};
use std::io::Cursor;
use std::path::Path;

/// A decoded image plus the facts about its encoded form the analyzer needs.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pixels: RgbaImage,
    byte_len: u64,
    mime_type: String,
    color_depth: u16,
    has_alpha: bool,
}

impl DecodedImage {
    /// Wrap an already-decoded image.
    pub fn from_dynamic(image: DynamicImage, byte_len: u64, mime_type: impl Into<String>) -> Self {
        let color = image.color();
        Self {
            has_alpha: color.has_alpha(),
            color_depth: color.bits_per_pixel(),
            pixels: image.into_rgba8(),
            byte_len,
            mime_type: mime_type.into(),
        }
    }
}

impl PixelSource for DecodedImage {
    fn width(&self) -> u32 {
        self.pixels.width()
    }

    fn height(&self) -> u32 {
        self.pixels.height()
    }

    fn rgba(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels.get_pixel(x, y).0
    }

    fn byte_len(&self) -> u64 {
        self.byte_len
    }

    fn mime_type(&self) -> Option<&str> {
        Some(&self.mime_type)
    }

    fn color_depth(&self) -> u16 {
        self.color_depth
    }

    fn has_alpha_channel(&self) -> bool {
        self.has_alpha
    }
}

/// Decode an in-memory encoded image, sniffing the format from its content.
pub fn decode_bytes(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let format = reader.format().ok_or(DecodeError::UnknownFormat)?;
    let image = reader.decode()?;
    if image.width() == 0 || image.height() == 0 {
        return Err(DecodeError::ZeroDimensions {
            width: image.width(),
            height: image.height(),
        });
    }
    Ok(DecodedImage::from_dynamic(
        image,
        bytes.len() as u64,
        format.to_mime_type(),
    ))
}

/// Read and decode an image file.
pub fn decode_file(path: &Path) -> Result<DecodedImage, DecodeError> {
    let bytes = std::fs::read(path)?;
    decode_bytes(&bytes).inspect_err(|e| log::debug!("failed to decode {}: {e}", path.display()))
}
