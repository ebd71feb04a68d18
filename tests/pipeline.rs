//! End-to-end: encode → decode → analyze → frame → plan → check → report.

use framefit::Engine;
use framefit::cache::{self, PlanCache, PlanKey};
use framefit::imaging::{PixelSource, decode_bytes, decode_file};
use framefit::placement::SmartRule;
use framefit::report::ReportDocument;
use framefit::types::{ResolutionClass, Strategy};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::convert::Infallible;
use std::io::Cursor;
use tempfile::TempDir;

fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Procedural 4000x3000 photo stand-in; no pixel buffer is allocated.
struct SyntheticPhoto;

impl PixelSource for SyntheticPhoto {
    fn width(&self) -> u32 {
        4000
    }

    fn height(&self) -> u32 {
        3000
    }

    fn rgba(&self, x: u32, y: u32) -> [u8; 4] {
        let v = ((x / 3 + y / 5) % 256) as u8;
        [v, v / 2, 255 - v, 255]
    }

    fn byte_len(&self) -> u64 {
        4 * 1024 * 1024
    }

    fn mime_type(&self) -> Option<&str> {
        Some("image/jpeg")
    }
}

#[test]
fn decoded_png_runs_through_the_whole_engine() {
    let engine = Engine::default();
    let bytes = gradient_png(400, 300);
    let decoded = decode_bytes(&bytes).unwrap();

    let analysis = engine.analyze_image(&decoded).unwrap();
    assert_eq!(analysis.dimensions.width, 400);
    assert_eq!(analysis.format.mime_type, "image/png");
    assert_eq!(analysis.quality.file_size_bytes, bytes.len() as u64);
    assert_eq!(analysis.quality.resolution_class, ResolutionClass::Low);

    let frame = engine.frame_for("iphone-15-pro").unwrap();
    let plan = engine.plan_placement(&analysis, &frame, Strategy::Smart);
    assert_eq!(plan.strategy, Strategy::Contain);
    assert!(plan.reasoning.starts_with(&format!(
        "smart rule {}",
        SmartRule::VeryWide.number()
    )));
    let (cw, ch) = frame.canvas();
    let expected = (cw / 400.0).min(ch / 300.0) * 0.9;
    assert!((plan.scale - expected).abs() < 1e-9);

    let check = engine.validate_compatibility(&analysis, &frame);
    assert!(!check.is_compatible);

    let report = engine.generate_report(&analysis, &frame, &plan);
    let parsed = ReportDocument::from_json(&report.to_json().unwrap()).unwrap();
    assert_eq!(parsed.plan.scale, plan.scale);
    assert_eq!(parsed.plan.strategy, plan.strategy);
    assert_eq!(parsed.compatibility.score, check.score);
    assert_eq!(parsed.summary.score, check.score);
}

#[test]
fn wide_photo_on_tall_phone_is_contained() {
    // 4000x3000 (1.333) into a 0.46 viewport
    let engine = Engine::default();
    let analysis = engine.analyze_image(&SyntheticPhoto).unwrap();
    let frame = engine.frame_for("iphone-15-pro").unwrap();
    assert!((frame.viewport.aspect_ratio - 0.46).abs() < 0.01);

    let plan = engine.plan_placement(&analysis, &frame, Strategy::Smart);
    let (cw, ch) = frame.canvas();
    assert_eq!(plan.strategy, Strategy::Contain);
    assert!((plan.scale - (cw / 4000.0).min(ch / 3000.0) * 0.9).abs() < 1e-9);
    assert_eq!(plan.crop, None);
    assert_eq!(plan.position.x, cw / 2.0);
    assert_eq!(plan.position.y, ch / 2.0);
}

#[test]
fn every_strategy_plans_in_parallel() {
    let engine = Engine::default();
    let analysis = engine.analyze_image(&SyntheticPhoto).unwrap();
    let frame = engine.frame_for("pixel-8").unwrap();
    let plans = engine.plan_all_strategies(&analysis, &frame);
    let requested: Vec<Strategy> = plans.iter().map(|p| p.requested_strategy).collect();
    assert_eq!(requested, Strategy::ALL.to_vec());
    assert!(plans.iter().all(|p| p.strategy != Strategy::Fill));
}

#[test]
fn plan_cache_survives_a_restart() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("photo.png");
    std::fs::write(&path, gradient_png(320, 240)).unwrap();

    let engine = Engine::default();
    let frame = engine.frame_for("ipad-air-11").unwrap();
    let key = PlanKey {
        image_hash: cache::hash_file(&path).unwrap(),
        device_id: frame.device_id.clone(),
        strategy: Strategy::Cover,
        policy_hash: cache::hash_policy(engine.config(), &frame).unwrap(),
    };

    let mut first = PlanCache::load(tmp.path());
    let planned = first
        .get_or_plan(&key, || {
            let analysis = engine.analyze_image(&decode_file(&path).unwrap()).unwrap();
            Ok::<_, Infallible>(engine.plan_placement(&analysis, &frame, Strategy::Cover))
        })
        .unwrap();
    first.save(tmp.path()).unwrap();

    let mut second = PlanCache::load(tmp.path());
    let cached = second
        .get_or_plan(&key, || -> Result<_, Infallible> {
            panic!("plan should come from the cache")
        })
        .unwrap();
    assert_eq!(cached, planned);
    assert_eq!(second.stats().hits, 1);
}
