//! Shared test utilities for the framefit test suite.
//!
//! Provides synthetic pixel sources, an [`ImageAnalysis`] builder that
//! never touches pixels, and a frame constructor parameterised by aspect.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let frame = frame_with_aspect(0.46);
//! let analysis = AnalysisBuilder::new(4000, 3000).sharpness(0.8).build();
//! let pixels = checkerboard(64, 64, 8);
//! ```

use crate::config::{AnalysisPolicy, FramePolicy};
use crate::frame::{DeviceDescriptor, FrameSpec, PhysicalSize, build_frame_spec};
use crate::imaging::{
    CompatibilityNotes, FormatInfo, ImageAnalysis, ImageDimensions, PerformanceMetrics,
    QualityMetrics, RgbaBuffer, resolution_class,
};
use crate::types::{Orientation, PixelSize, ResolutionClass};

// =========================================================================
// Pixel sources
// =========================================================================

/// Every pixel the same colour.
pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> RgbaBuffer {
    RgbaBuffer::from_fn(width, height, |_, _| rgba).unwrap()
}

/// Black/white squares of `cell` pixels.
pub fn checkerboard(width: u32, height: u32, cell: u32) -> RgbaBuffer {
    RgbaBuffer::from_fn(width, height, |x, y| {
        let v = if ((x / cell) + (y / cell)) % 2 == 0 { 0 } else { 255 };
        [v, v, v, 255]
    })
    .unwrap()
}

/// Vertical one-pixel stripes: gray `a` on even columns, `b` on odd.
pub fn stripes(width: u32, height: u32, a: u8, b: u8) -> RgbaBuffer {
    RgbaBuffer::from_fn(width, height, |x, _| {
        let v = if x % 2 == 0 { a } else { b };
        [v, v, v, 255]
    })
    .unwrap()
}

// =========================================================================
// Analysis builder
// =========================================================================

/// Builds an [`ImageAnalysis`] directly, for planner and validator tests.
///
/// Defaults: class from the pixel count, sharpness 0.5, noise 0.2, render
/// complexity 0.8, 1 MB PNG, optimal.
pub struct AnalysisBuilder {
    width: u32,
    height: u32,
    class: Option<ResolutionClass>,
    sharpness: f64,
    noise: f64,
    complexity: f64,
    file_size: u64,
}

impl AnalysisBuilder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            class: None,
            sharpness: 0.5,
            noise: 0.2,
            complexity: 0.8,
            file_size: 1024 * 1024,
        }
    }

    pub fn class(mut self, class: ResolutionClass) -> Self {
        self.class = Some(class);
        self
    }

    pub fn sharpness(mut self, sharpness: f64) -> Self {
        self.sharpness = sharpness;
        self
    }

    pub fn noise(mut self, noise: f64) -> Self {
        self.noise = noise;
        self
    }

    pub fn complexity(mut self, complexity: f64) -> Self {
        self.complexity = complexity;
        self
    }

    pub fn file_size(mut self, bytes: u64) -> Self {
        self.file_size = bytes;
        self
    }

    pub fn build(self) -> ImageAnalysis {
        let policy = AnalysisPolicy::default();
        let dimensions = ImageDimensions {
            width: self.width,
            height: self.height,
            aspect_ratio: self.width as f64 / self.height as f64,
        };
        let megapixels = dimensions.megapixels();
        ImageAnalysis {
            dimensions,
            quality: QualityMetrics {
                resolution_class: self
                    .class
                    .unwrap_or_else(|| resolution_class(megapixels, &policy)),
                estimated_dpi: (self.width as f64).hypot(self.height as f64)
                    / policy.reference_diagonal_inches,
                file_size_bytes: self.file_size,
                sharpness: self.sharpness,
                noise: self.noise,
            },
            format: FormatInfo {
                mime_type: "image/png".to_string(),
                has_transparency: false,
                color_depth: 32,
            },
            orientation: Orientation::from_aspect(dimensions.aspect_ratio, policy.square_tolerance),
            compatibility: CompatibilityNotes {
                is_optimal: true,
                ..CompatibilityNotes::default()
            },
            performance: PerformanceMetrics {
                render_complexity: self.complexity,
                memory_usage_mb: megapixels * 4.0 * 1_000_000.0 / (1024.0 * 1024.0),
                analysis_time_ms: 0.0,
            },
        }
    }
}

// =========================================================================
// Frames
// =========================================================================

/// A `1000·aspect × 1000` point viewport at 3x, native resolution equal to
/// the canvas.
pub fn frame_with_aspect(aspect: f64) -> FrameSpec {
    let width = 1000.0 * aspect;
    let device = DeviceDescriptor {
        id: "test-frame".to_string(),
        name: "Test frame".to_string(),
        physical: PhysicalSize::new(width / 10.0, 100.0),
        screen: PhysicalSize::new(width, 1000.0),
        native_resolution: PixelSize::new((width * 3.0).round() as u32, 3000),
        corner_radius: 0.0,
        display_scale: Some(3.0),
        features: Vec::new(),
    };
    build_frame_spec(&device, &FramePolicy::default()).unwrap()
}
