//! Image decoding and analysis.
//!
//! | Step | Module / crate |
//! |---|---|
//! | **Decode** | [`decode`]: `image` crate readers |
//! | **Pixel access** | [`source`]: [`PixelSource`] trait and [`RgbaBuffer`] |
//! | **Statistics** | `metrics`: pure pixel statistics |
//! | **Analysis** | [`analyzer`]: [`ImageAnalysis`] from a pixel source |
//!
//! Decoding is the only fallible I/O step in the engine. Everything after it
//! works on already-decoded pixels and is deterministic.

pub mod analyzer;
pub mod decode;
mod metrics;
pub mod source;

use thiserror::Error;

pub use analyzer::{
    CompatibilityNotes, FormatInfo, ImageAnalysis, ImageDimensions, PerformanceMetrics,
    QualityMetrics, analyze_image, resolution_class,
};
pub use decode::{DecodedImage, decode_bytes, decode_file};
pub use source::{PixelSource, RgbaBuffer};

/// The image could not be turned into analyzable pixels.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode image: {0}")]
    Image(#[from] image::ImageError),
    #[error("Unrecognized image format")]
    UnknownFormat,
    #[error("Image has zero dimensions ({width}x{height})")]
    ZeroDimensions { width: u32, height: u32 },
    #[error("Pixel data length {actual} does not match dimensions (expected {expected} bytes)")]
    PixelDataMismatch { expected: u64, actual: u64 },
}
