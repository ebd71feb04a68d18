//! Image property analysis.
//!
//! Turns a [`PixelSource`] into an [`ImageAnalysis`]: dimensions, a
//! resolution class, sharpness and noise estimates, format facts,
//! orientation, advisory notes and a few diagnostic performance numbers.
//!
//! Everything except `performance.analysis_time_ms` is a pure function of
//! the pixels, the declared byte size and the [`AnalysisPolicy`].

use super::DecodeError;
use super::metrics;
use super::source::PixelSource;
use crate::config::AnalysisPolicy;
use crate::types::{Orientation, ResolutionClass};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Max grid side used when probing for translucent pixels.
const TRANSPARENCY_SAMPLES: u32 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: f64,
}

impl ImageDimensions {
    pub fn megapixels(&self) -> f64 {
        self.width as f64 * self.height as f64 / 1_000_000.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub resolution_class: ResolutionClass,
    pub estimated_dpi: f64,
    pub file_size_bytes: u64,
    pub sharpness: f64,
    pub noise: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatInfo {
    pub mime_type: String,
    pub has_transparency: bool,
    /// Bits per pixel.
    pub color_depth: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityNotes {
    pub is_optimal: bool,
    pub recommendations: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub render_complexity: f64,
    pub memory_usage_mb: f64,
    /// Wall-clock analysis time. Diagnostic only.
    pub analysis_time_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnalysis {
    pub dimensions: ImageDimensions,
    pub quality: QualityMetrics,
    pub format: FormatInfo,
    pub orientation: Orientation,
    pub compatibility: CompatibilityNotes,
    pub performance: PerformanceMetrics,
}

impl ImageAnalysis {
    /// Sharp and clean enough to survive full-bleed placement.
    pub fn is_high_quality(&self, min_sharpness: f64, max_noise: f64) -> bool {
        self.quality.sharpness > min_sharpness && self.quality.noise < max_noise
    }
}

/// Bucket a pixel count. Monotonic non-decreasing in `megapixels`.
pub fn resolution_class(megapixels: f64, policy: &AnalysisPolicy) -> ResolutionClass {
    if megapixels < policy.low_resolution_mp {
        ResolutionClass::Low
    } else if megapixels < policy.medium_resolution_mp {
        ResolutionClass::Medium
    } else if megapixels < policy.high_resolution_mp {
        ResolutionClass::High
    } else {
        ResolutionClass::Ultra
    }
}

/// Pixel-load share plus edge-density share, in `[0, 1]`.
pub fn render_complexity(megapixels: f64, sharpness: f64, policy: &AnalysisPolicy) -> f64 {
    let load = (megapixels / policy.complexity_reference_mp).min(1.0);
    (0.6 * load + 0.4 * sharpness).clamp(0.0, 1.0)
}

fn compatibility_notes(
    dimensions: &ImageDimensions,
    quality: &QualityMetrics,
    policy: &AnalysisPolicy,
) -> CompatibilityNotes {
    let mut notes = CompatibilityNotes {
        is_optimal: true,
        ..CompatibilityNotes::default()
    };

    if quality.resolution_class == ResolutionClass::Low {
        notes.warnings.push(format!(
            "Low resolution ({}x{}) may look pixelated on high-density screens",
            dimensions.width, dimensions.height
        ));
        notes
            .recommendations
            .push("Use an image of at least 1080p (1920x1080)".to_string());
    }
    if quality.sharpness < policy.blur_warning_below {
        notes.warnings.push(format!(
            "Image appears blurry (sharpness {:.2})",
            quality.sharpness
        ));
    }
    if quality.noise > policy.noise_warning_above {
        notes.warnings.push(format!(
            "Image appears noisy (noise {:.2})",
            quality.noise
        ));
    }
    if quality.file_size_bytes > policy.large_file_bytes {
        notes.warnings.push(format!(
            "Large file ({:.1} MB) may slow down rendering",
            quality.file_size_bytes as f64 / (1024.0 * 1024.0)
        ));
        notes
            .recommendations
            .push("Compress the image or reduce its dimensions".to_string());
    }
    if dimensions.aspect_ratio < policy.min_aspect || dimensions.aspect_ratio > policy.max_aspect {
        notes.warnings.push(format!(
            "Extreme aspect ratio ({:.2}) will leave large empty areas or heavy crops",
            dimensions.aspect_ratio
        ));
        notes
            .recommendations
            .push("Crop the image closer to the device's aspect ratio".to_string());
        notes.is_optimal = false;
    }
    notes
}

/// Analyze a decoded image.
///
/// Fails only if the source has a zero dimension.
pub fn analyze_image(
    source: &dyn PixelSource,
    policy: &AnalysisPolicy,
) -> Result<ImageAnalysis, DecodeError> {
    let started = Instant::now();
    let (width, height) = (source.width(), source.height());
    if width == 0 || height == 0 {
        return Err(DecodeError::ZeroDimensions { width, height });
    }
    if width < 2 || height < 2 {
        log::warn!("{width}x{height} image is too small for meaningful quality metrics");
    }

    let dimensions = ImageDimensions {
        width,
        height,
        aspect_ratio: width as f64 / height as f64,
    };
    let megapixels = dimensions.megapixels();
    let diagonal = (width as f64).hypot(height as f64);

    let sharpness = metrics::sharpness(source, policy.sharpness_sample, policy.sharpness_divisor);
    let noise = metrics::noise(source, policy.noise_sample, policy.noise_divisor);
    let quality = QualityMetrics {
        resolution_class: resolution_class(megapixels, policy),
        estimated_dpi: diagonal / policy.reference_diagonal_inches,
        file_size_bytes: source.byte_len(),
        sharpness,
        noise,
    };

    let format = FormatInfo {
        mime_type: source
            .mime_type()
            .unwrap_or("application/octet-stream")
            .to_string(),
        has_transparency: metrics::has_transparency(source, TRANSPARENCY_SAMPLES),
        color_depth: source.color_depth(),
    };

    let compatibility = compatibility_notes(&dimensions, &quality, policy);
    let analysis = ImageAnalysis {
        orientation: Orientation::from_aspect(dimensions.aspect_ratio, policy.square_tolerance),
        performance: PerformanceMetrics {
            render_complexity: render_complexity(megapixels, sharpness, policy),
            memory_usage_mb: width as f64 * height as f64 * 4.0 / (1024.0 * 1024.0),
            analysis_time_ms: started.elapsed().as_secs_f64() * 1000.0,
        },
        dimensions,
        quality,
        format,
        compatibility,
    };
    log::debug!(
        "analyzed {width}x{height}: {} sharpness={:.3} noise={:.3} {} ({} warnings)",
        analysis.quality.resolution_class,
        analysis.quality.sharpness,
        analysis.quality.noise,
        analysis.orientation,
        analysis.compatibility.warnings.len()
    );
    Ok(analysis)
}
