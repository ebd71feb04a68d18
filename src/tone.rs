//! Tone hints: compression, sharpening, saturation, brightness, contrast.
//!
//! Hints start from the neutral values in [`TonePolicy`] and receive
//! additive nudges from the analysis, the planned scale and the fit. The
//! combined values are clamped into the policy's safe ranges, so no
//! combination of nudges can push a parameter out of range.

use crate::config::TonePolicy;
use crate::imaging::ImageAnalysis;
use crate::types::{ResolutionClass, Strategy, ToneConfig};

/// Derive tone hints for a plan.
///
/// `strategy` is the resolved fit; `Fill` is treated as `Cover`.
pub fn adjust_tone(
    analysis: &ImageAnalysis,
    scale: f64,
    strategy: Strategy,
    policy: &TonePolicy,
) -> ToneConfig {
    let n = &policy.nudges;
    let mut tone = policy.neutral;

    if analysis.quality.resolution_class == ResolutionClass::Low {
        tone.sharpening += n.low_resolution_sharpening;
        tone.contrast += n.low_resolution_contrast;
    }
    if analysis.quality.sharpness < n.soft_below {
        tone.sharpening += n.soft_sharpening;
    }
    if analysis.quality.noise > n.noisy_above {
        tone.sharpening += n.noisy_sharpening;
        tone.compression += n.noisy_compression;
    }
    if scale > n.upscale_above {
        tone.compression += n.upscale_compression;
        tone.sharpening += n.upscale_sharpening;
    } else if scale < n.downscale_below {
        tone.compression += n.downscale_compression;
    }
    if matches!(strategy, Strategy::Cover | Strategy::Fill) {
        tone.saturation += n.cover_saturation;
        tone.contrast += n.cover_contrast;
    }

    let l = &policy.limits;
    ToneConfig {
        compression: l.compression.clamp(tone.compression),
        sharpening: l.sharpening.clamp(tone.sharpening),
        saturation: l.saturation.clamp(tone.saturation),
        brightness: l.brightness.clamp(tone.brightness),
        contrast: l.contrast.clamp(tone.contrast),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Range, ToneNudges};
    use crate::test_helpers::AnalysisBuilder;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn clean_source_at_unit_scale_is_neutral() {
        let a = AnalysisBuilder::new(2000, 1500).sharpness(0.7).noise(0.1).build();
        let tone = adjust_tone(&a, 1.0, Strategy::Contain, &TonePolicy::default());
        assert_eq!(tone, ToneConfig::default());
    }

    #[test]
    fn low_resolution_adds_sharpening_and_contrast() {
        let a = AnalysisBuilder::new(640, 480)
            .class(ResolutionClass::Low)
            .sharpness(0.7)
            .noise(0.1)
            .build();
        let tone = adjust_tone(&a, 1.0, Strategy::Contain, &TonePolicy::default());
        assert!(close(tone.sharpening, 0.25));
        assert!(close(tone.contrast, 1.03));
    }

    #[test]
    fn soft_source_gets_moderate_sharpening() {
        let a = AnalysisBuilder::new(2000, 1500).sharpness(0.2).noise(0.1).build();
        let tone = adjust_tone(&a, 1.0, Strategy::Contain, &TonePolicy::default());
        assert!(close(tone.sharpening, 0.15));
    }

    #[test]
    fn noise_backs_off_sharpening_and_compresses_harder() {
        let a = AnalysisBuilder::new(2000, 1500).sharpness(0.2).noise(0.8).build();
        let tone = adjust_tone(&a, 1.0, Strategy::Contain, &TonePolicy::default());
        assert!(close(tone.sharpening, 0.05));
        assert!(close(tone.compression, 0.90));
    }

    #[test]
    fn upscale_reduces_compression_and_sharpens() {
        let a = AnalysisBuilder::new(2000, 1500).sharpness(0.7).noise(0.1).build();
        let tone = adjust_tone(&a, 2.5, Strategy::Contain, &TonePolicy::default());
        assert!(close(tone.compression, 0.98));
        assert!(close(tone.sharpening, 0.1));
    }

    #[test]
    fn downscale_increases_compression() {
        let a = AnalysisBuilder::new(2000, 1500).sharpness(0.7).noise(0.1).build();
        let tone = adjust_tone(&a, 0.3, Strategy::Contain, &TonePolicy::default());
        assert!(close(tone.compression, 0.90));
    }

    #[test]
    fn cover_boosts_saturation_and_contrast() {
        let a = AnalysisBuilder::new(2000, 1500).sharpness(0.7).noise(0.1).build();
        for strategy in [Strategy::Cover, Strategy::Fill] {
            let tone = adjust_tone(&a, 1.0, strategy, &TonePolicy::default());
            assert!(close(tone.saturation, 1.05));
            assert!(close(tone.contrast, 1.02));
        }
    }

    #[test]
    fn stacked_nudges_are_clamped_to_safe_ranges() {
        // Low res + soft + upscale: 0.25 + 0.15 + 0.1 = 0.5 sharpening → 0.4
        let a = AnalysisBuilder::new(320, 240)
            .class(ResolutionClass::Low)
            .sharpness(0.1)
            .noise(0.1)
            .build();
        let tone = adjust_tone(&a, 4.0, Strategy::Cover, &TonePolicy::default());
        assert_eq!(tone.sharpening, 0.4);
        assert!(close(tone.contrast, 1.05));
    }

    #[test]
    fn aggressive_policy_still_respects_limits() {
        let policy = TonePolicy {
            nudges: ToneNudges {
                cover_saturation: 5.0,
                noisy_compression: -5.0,
                noisy_sharpening: -5.0,
                ..ToneNudges::default()
            },
            ..TonePolicy::default()
        };
        let a = AnalysisBuilder::new(2000, 1500).sharpness(0.7).noise(0.9).build();
        let tone = adjust_tone(&a, 1.0, Strategy::Cover, &policy);
        assert_eq!(tone.saturation, 1.1);
        assert_eq!(tone.compression, 0.7);
        assert_eq!(tone.sharpening, 0.0);
        let limits = &policy.limits;
        assert!(limits.brightness.contains(tone.brightness));
        assert_eq!(limits.contrast, Range::new(0.9, 1.1));
    }
}
