//! Image/frame compatibility scoring.
//!
//! The score starts at 100 and loses a weighted penalty for each problem,
//! floored at 0. Problems are split into hard *issues* and soft *warnings*;
//! an image is compatible only when it has no issues, whatever its score.
//!
//! | Check | Penalty | Severity |
//! |---|---|---|
//! | below minimum resolution (either axis) | 30 | issue |
//! | below recommended resolution | 10 | warning |
//! | aspect difference > 0.5 | 20 | issue |
//! | aspect difference > 0.3 | 10 | warning |
//! | file size > 20 MB | 15 | warning |
//! | image aspect > 4 or < 0.25 | 25 | issue |

use crate::config::CompatibilityPolicy;
use crate::frame::FrameSpec;
use crate::imaging::ImageAnalysis;
use crate::placement::aspect_ratio_diff;
use crate::types::PixelSize;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    BelowMinimumResolution,
    BelowRecommendedResolution,
    SevereAspectMismatch,
    AspectMismatch,
    LargeFile,
    ExtremeAspectRatio,
}

impl IssueKind {
    /// Hard issues make an image incompatible; the rest are warnings.
    pub fn is_hard(self) -> bool {
        matches!(
            self,
            Self::BelowMinimumResolution | Self::SevereAspectMismatch | Self::ExtremeAspectRatio
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityReport {
    pub score: u32,
    pub is_compatible: bool,
    pub issues: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub recommendations: Vec<String>,
}

struct Findings {
    penalty: u32,
    issues: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
    recommendations: Vec<String>,
}

impl Findings {
    fn add(&mut self, kind: IssueKind, penalty: u32, message: String, recommendation: &str) {
        self.penalty = self.penalty.saturating_add(penalty);
        let issue = ValidationIssue { kind, message };
        if kind.is_hard() {
            self.issues.push(issue);
        } else {
            self.warnings.push(issue);
        }
        self.recommendations.push(recommendation.to_string());
    }
}

/// Score how well an image fits a frame.
pub fn validate_compatibility(
    analysis: &ImageAnalysis,
    frame: &FrameSpec,
    policy: &CompatibilityPolicy,
) -> CompatibilityReport {
    let image = PixelSize::new(analysis.dimensions.width, analysis.dimensions.height);
    let band = &frame.optimal_resolutions;
    let mut findings = Findings {
        penalty: 0,
        issues: Vec::new(),
        warnings: Vec::new(),
        recommendations: Vec::new(),
    };

    if !band.min.fits_within(image) {
        findings.add(
            IssueKind::BelowMinimumResolution,
            policy.below_min_penalty,
            format!("Image {image} is below the minimum {} for {}", band.min, frame.device_id),
            "Use a higher-resolution source image",
        );
    } else if !band.recommended.fits_within(image) {
        findings.add(
            IssueKind::BelowRecommendedResolution,
            policy.below_recommended_penalty,
            format!(
                "Image {image} is below the recommended {} for {}",
                band.recommended, frame.device_id
            ),
            "Use an image at the device's native resolution for best sharpness",
        );
    }

    let diff = aspect_ratio_diff(analysis, frame);
    if diff > policy.severe_aspect_diff {
        findings.add(
            IssueKind::SevereAspectMismatch,
            policy.severe_aspect_penalty,
            format!(
                "Aspect ratio {:.2} differs from the viewport's {:.2} by {diff:.2}",
                analysis.dimensions.aspect_ratio, frame.viewport.aspect_ratio
            ),
            "Crop the image to the viewport's aspect ratio before placing it",
        );
    } else if diff > policy.moderate_aspect_diff {
        findings.add(
            IssueKind::AspectMismatch,
            policy.moderate_aspect_penalty,
            format!(
                "Aspect ratio {:.2} is noticeably different from the viewport's {:.2}",
                analysis.dimensions.aspect_ratio, frame.viewport.aspect_ratio
            ),
            "Expect visible padding or cropping",
        );
    }

    if analysis.quality.file_size_bytes > policy.large_file_bytes {
        findings.add(
            IssueKind::LargeFile,
            policy.large_file_penalty,
            format!(
                "File size {:.1} MB is large",
                analysis.quality.file_size_bytes as f64 / (1024.0 * 1024.0)
            ),
            "Compress the image to speed up rendering",
        );
    }

    let aspect = analysis.dimensions.aspect_ratio;
    if aspect > policy.extreme_aspect_max || aspect < policy.extreme_aspect_min {
        findings.add(
            IssueKind::ExtremeAspectRatio,
            policy.extreme_aspect_penalty,
            format!("Aspect ratio {aspect:.2} is extreme"),
            "Use an image closer to a standard photo or screen ratio",
        );
    }

    let score = 100u32.saturating_sub(findings.penalty);
    let report = CompatibilityReport {
        score,
        is_compatible: findings.issues.is_empty(),
        issues: findings.issues,
        warnings: findings.warnings,
        recommendations: findings.recommendations,
    };
    log::debug!(
        "compatibility with {}: score {score}, {} issues, {} warnings",
        frame.device_id,
        report.issues.len(),
        report.warnings.len()
    );
    report
}
