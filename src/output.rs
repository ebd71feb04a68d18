//! CLI output formatting for every command.
//!
//! # Output Format
//!
//! ## Analyze
//!
//! ```text
//! photo.jpg
//!     4000x3000 landscape, high (12.0 MP)
//!     Sharpness: 0.62  Noise: 0.18  DPI: 819.7
//!     Format: image/jpeg, 24-bit
//!     Warning: Image appears noisy (noise 0.71)
//! ```
//!
//! ## Plan
//!
//! ```text
//! iphone-15-pro (smart → contain)
//!     Scale: 0.2652
//!     Position: (589.5, 1278.0)
//!     Crop: none
//!     Tone: compression 0.95, sharpening 0.00, saturation 1.00, brightness 1.00, contrast 1.00
//!     Why: smart rule 4: the image is much wider than the viewport ...
//! ```
//!
//! ## Check
//!
//! ```text
//! iphone-15-pro: 70/100, compatible
//!     Warning: Aspect ratio 1.33 is noticeably different ...
//!     Tip: Expect visible padding or cropping
//! ```
//!
//! ## Devices
//!
//! ```text
//! 001 iphone-15-pro  393x852 pt @3x  (aspect 0.461, radius 55)
//!     Resolution: min 884x1917, recommended 1179x2556, max 3537x7668
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::cache::CacheStats;
use crate::compatibility::CompatibilityReport;
use crate::frame::FrameSpec;
use crate::imaging::ImageAnalysis;
use crate::types::OptimizedConfig;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Analyze
// ============================================================================

pub fn format_analysis(label: &str, analysis: &ImageAnalysis) -> Vec<String> {
    let d = &analysis.dimensions;
    let q = &analysis.quality;
    let mut lines = vec![
        label.to_string(),
        format!(
            "{}{}x{} {}, {} ({:.1} MP)",
            indent(1),
            d.width,
            d.height,
            analysis.orientation,
            q.resolution_class,
            d.megapixels()
        ),
        format!(
            "{}Sharpness: {:.2}  Noise: {:.2}  DPI: {:.1}",
            indent(1),
            q.sharpness,
            q.noise,
            q.estimated_dpi
        ),
        format!(
            "{}Format: {}, {}-bit{}",
            indent(1),
            analysis.format.mime_type,
            analysis.format.color_depth,
            if analysis.format.has_transparency {
                ", transparent"
            } else {
                ""
            }
        ),
    ];
    for warning in &analysis.compatibility.warnings {
        lines.push(format!("{}Warning: {}", indent(1), warning));
    }
    for tip in &analysis.compatibility.recommendations {
        lines.push(format!("{}Tip: {}", indent(1), tip));
    }
    lines
}

pub fn print_analysis(label: &str, analysis: &ImageAnalysis) {
    print_lines(format_analysis(label, analysis));
}

// ============================================================================
// Plan
// ============================================================================

pub fn format_plan(frame: &FrameSpec, plan: &OptimizedConfig) -> Vec<String> {
    let header = if plan.requested_strategy == plan.strategy {
        format!("{} ({})", frame.device_id, plan.strategy)
    } else {
        format!(
            "{} ({} → {})",
            frame.device_id, plan.requested_strategy, plan.strategy
        )
    };
    let crop = match plan.crop {
        Some(c) => format!("{}x{} at ({}, {})", c.width, c.height, c.x, c.y),
        None => "none".to_string(),
    };
    let t = &plan.quality;
    vec![
        header,
        format!("{}Scale: {:.4}", indent(1), plan.scale),
        format!(
            "{}Position: ({:.1}, {:.1})",
            indent(1),
            plan.position.x,
            plan.position.y
        ),
        format!("{}Crop: {}", indent(1), crop),
        format!(
            "{}Tone: compression {:.2}, sharpening {:.2}, saturation {:.2}, brightness {:.2}, contrast {:.2}",
            indent(1),
            t.compression,
            t.sharpening,
            t.saturation,
            t.brightness,
            t.contrast
        ),
        format!("{}Why: {}", indent(1), plan.reasoning),
    ]
}

pub fn print_plan(frame: &FrameSpec, plan: &OptimizedConfig) {
    print_lines(format_plan(frame, plan));
}

pub fn format_cache_stats(stats: &CacheStats) -> String {
    format!("Plans: {}", stats)
}

// ============================================================================
// Check
// ============================================================================

pub fn format_compatibility(frame: &FrameSpec, report: &CompatibilityReport) -> Vec<String> {
    let verdict = if report.is_compatible {
        "compatible"
    } else {
        "not compatible"
    };
    let mut lines = vec![format!(
        "{}: {}/100, {}",
        frame.device_id, report.score, verdict
    )];
    for issue in &report.issues {
        lines.push(format!("{}Issue: {}", indent(1), issue.message));
    }
    for warning in &report.warnings {
        lines.push(format!("{}Warning: {}", indent(1), warning.message));
    }
    for tip in &report.recommendations {
        lines.push(format!("{}Tip: {}", indent(1), tip));
    }
    lines
}

pub fn print_compatibility(frame: &FrameSpec, report: &CompatibilityReport) {
    print_lines(format_compatibility(frame, report));
}

// ============================================================================
// Devices
// ============================================================================

pub fn format_devices(frames: &[FrameSpec]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, frame) in frames.iter().enumerate() {
        let v = &frame.viewport;
        let band = &frame.optimal_resolutions;
        lines.push(format!(
            "{} {}  {}x{} pt @{}x  (aspect {:.3}, radius {})",
            format_index(i + 1),
            frame.device_id,
            v.width,
            v.height,
            frame.display_scale,
            v.aspect_ratio,
            v.corner_radius
        ));
        lines.push(format!(
            "{}Resolution: min {}, recommended {}, max {}",
            indent(1),
            band.min,
            band.recommended,
            band.max
        ));
        if !frame.features.is_empty() {
            lines.push(format!(
                "{}Features: {}",
                indent(1),
                frame.features.join(", ")
            ));
        }
    }
    lines
}

pub fn print_devices(frames: &[FrameSpec]) {
    print_lines(format_devices(frames));
}
