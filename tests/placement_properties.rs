use framefit::Engine;
use framefit::config::AnalysisPolicy;
use framefit::frame::{DeviceDescriptor, FrameSpec, PhysicalSize};
use framefit::imaging::{
    CompatibilityNotes, FormatInfo, ImageAnalysis, ImageDimensions, PerformanceMetrics,
    QualityMetrics, resolution_class,
};
use framefit::placement::scale_bounds;
use framefit::types::{Orientation, PixelSize, Strategy as FitStrategy};
use proptest::prelude::*;

fn analysis(width: u32, height: u32, sharpness: f64, noise: f64, complexity: f64) -> ImageAnalysis {
    let policy = AnalysisPolicy::default();
    let dimensions = ImageDimensions {
        width,
        height,
        aspect_ratio: width as f64 / height as f64,
    };
    ImageAnalysis {
        dimensions,
        quality: QualityMetrics {
            resolution_class: resolution_class(dimensions.megapixels(), &policy),
            estimated_dpi: 300.0,
            file_size_bytes: width as u64 * height as u64,
            sharpness,
            noise,
        },
        format: FormatInfo {
            mime_type: "image/jpeg".to_string(),
            has_transparency: false,
            color_depth: 24,
        },
        orientation: Orientation::from_aspect(dimensions.aspect_ratio, policy.square_tolerance),
        compatibility: CompatibilityNotes::default(),
        performance: PerformanceMetrics {
            render_complexity: complexity,
            memory_usage_mb: 0.0,
            analysis_time_ms: 0.0,
        },
    }
}

fn frame(engine: &Engine, width: f64, height: f64, scale: f64) -> FrameSpec {
    let device = DeviceDescriptor {
        id: "prop".to_string(),
        name: "Property device".to_string(),
        physical: PhysicalSize::new(70.0, 150.0),
        screen: PhysicalSize::new(width, height),
        native_resolution: PixelSize::new(
            ((width * scale).round() as u32).max(1),
            ((height * scale).round() as u32).max(1),
        ),
        corner_radius: 0.0,
        display_scale: Some(scale),
        features: Vec::new(),
    };
    engine.build_frame_spec(&device).unwrap()
}

fn strategy() -> impl Strategy<Value = FitStrategy> {
    prop_oneof![
        Just(FitStrategy::Contain),
        Just(FitStrategy::Cover),
        Just(FitStrategy::Fill),
        Just(FitStrategy::Smart),
    ]
}

fn image_strategy() -> impl Strategy<Value = ImageAnalysis> {
    (1u32..=20_000, 1u32..=20_000, 0.0f64..=1.0, 0.0f64..=1.0, 0.0f64..=1.0)
        .prop_map(|(w, h, s, n, c)| analysis(w, h, s, n, c))
}

fn frame_params() -> impl Strategy<Value = (f64, f64, f64)> {
    (100.0f64..3000.0, 100.0f64..3000.0, 1.0f64..4.0)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn scale_is_positive_finite_and_bounded(
        image in image_strategy(),
        (w, h, s) in frame_params(),
        strategy in strategy(),
    ) {
        let engine = Engine::default();
        let frame = frame(&engine, w, h, s);
        let plan = engine.plan_placement(&image, &frame, strategy);
        let (min, max) = scale_bounds(&image, &engine.config().placement);
        prop_assert!(plan.scale.is_finite());
        prop_assert!(plan.scale > 0.0);
        prop_assert!(plan.scale >= min && plan.scale <= max, "scale {} not in [{min}, {max}]", plan.scale);
    }

    #[test]
    fn crop_lies_inside_the_image(
        image in image_strategy(),
        (w, h, s) in frame_params(),
        strategy in strategy(),
    ) {
        let engine = Engine::default();
        let frame = frame(&engine, w, h, s);
        let plan = engine.plan_placement(&image, &frame, strategy);
        if let Some(crop) = plan.crop {
            prop_assert!(
                crop.is_within(image.dimensions.width, image.dimensions.height),
                "{crop:?} outside {}x{}", image.dimensions.width, image.dimensions.height
            );
        }
    }

    #[test]
    fn planning_is_deterministic(
        image in image_strategy(),
        (w, h, s) in frame_params(),
        strategy in strategy(),
    ) {
        let engine = Engine::default();
        let frame = frame(&engine, w, h, s);
        let first = serde_json::to_string(&engine.plan_placement(&image, &frame, strategy)).unwrap();
        let second = serde_json::to_string(&engine.plan_placement(&image, &frame, strategy)).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn fill_and_cover_share_geometry(
        image in image_strategy(),
        (w, h, s) in frame_params(),
    ) {
        let engine = Engine::default();
        let frame = frame(&engine, w, h, s);
        let fill = engine.plan_placement(&image, &frame, FitStrategy::Fill);
        let cover = engine.plan_placement(&image, &frame, FitStrategy::Cover);
        prop_assert_eq!(fill.strategy, FitStrategy::Cover);
        prop_assert_eq!(fill.scale, cover.scale);
        prop_assert_eq!(fill.crop, cover.crop);
        prop_assert_eq!(fill.quality, cover.quality);
    }

    #[test]
    fn tone_stays_in_safe_ranges(
        image in image_strategy(),
        (w, h, s) in frame_params(),
        strategy in strategy(),
    ) {
        let engine = Engine::default();
        let frame = frame(&engine, w, h, s);
        let tone = engine.plan_placement(&image, &frame, strategy).quality;
        let limits = &engine.config().tone.limits;
        prop_assert!(limits.compression.contains(tone.compression));
        prop_assert!(limits.sharpening.contains(tone.sharpening));
        prop_assert!(limits.saturation.contains(tone.saturation));
        prop_assert!(limits.brightness.contains(tone.brightness));
        prop_assert!(limits.contrast.contains(tone.contrast));
    }

    #[test]
    fn compatibility_score_is_bounded_and_consistent(
        image in image_strategy(),
        (w, h, s) in frame_params(),
    ) {
        let engine = Engine::default();
        let frame = frame(&engine, w, h, s);
        let report = engine.validate_compatibility(&image, &frame);
        prop_assert!(report.score <= 100);
        prop_assert_eq!(report.is_compatible, report.issues.is_empty());
    }

    #[test]
    fn resolution_class_is_monotonic(a in 0.0f64..100.0, b in 0.0f64..100.0) {
        let policy = AnalysisPolicy::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(resolution_class(lo, &policy) <= resolution_class(hi, &policy));
    }
}

#[test]
fn exact_match_ultra_sharp_clean_image_covers() {
    // aspect diff 0.02, ultra, sharpness 0.8, noise 0.1
    let engine = Engine::default();
    let image = analysis(4000, 3000, 0.8, 0.1, 0.9);
    let viewport_aspect = 4.0 / 3.0 - 0.02;
    let frame = frame(&engine, 1000.0 * viewport_aspect, 1000.0, 3.0);
    let plan = engine.plan_placement(&image, &frame, FitStrategy::Smart);
    let (cw, ch) = frame.canvas();
    assert_eq!(plan.strategy, FitStrategy::Cover);
    assert!((plan.scale - (cw / 4000.0).max(ch / 3000.0)).abs() < 1e-9);
}

#[test]
fn much_taller_image_contains_with_standard_padding() {
    // image 0.4 vs viewport 1.0: diff 0.6, 0.4 < 1.0 × 0.7
    let engine = Engine::default();
    let image = analysis(1200, 3000, 0.5, 0.2, 0.8);
    let frame = frame(&engine, 1000.0, 1000.0, 3.0);
    let plan = engine.plan_placement(&image, &frame, FitStrategy::Smart);
    assert_eq!(plan.strategy, FitStrategy::Contain);
    assert!((plan.scale - (3000.0f64 / 1200.0).min(3000.0 / 3000.0) * 0.95).abs() < 1e-9);
}
