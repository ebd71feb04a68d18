//! Placement planning: strategy selection, scale, crop window and anchor.
//!
//! The planner turns an [`ImageAnalysis`] and a [`FrameSpec`] into an
//! [`OptimizedConfig`]. It is a pure, total function of its inputs and the
//! [`PlacementPolicy`]: the same inputs always produce the same plan, down
//! to the reasoning text.
//!
//! # Strategies
//!
//! The requested [`Strategy`] is first resolved with [`Strategy::resolve`]:
//! `fill` is an alias of `cover`, `smart` defers to the decision tree below.
//!
//! | Fit | Base scale | Crops |
//! |---|---|---|
//! | contain | `min(scale_x, scale_y) × contain_padding` | never |
//! | cover | `max(scale_x, scale_y)` | when the aspect difference exceeds `crop_min_aspect_diff` |
//!
//! # Smart decision tree
//!
//! With `diff = |image_aspect − viewport_aspect|`, the first matching rule wins:
//!
//! ```text
//! 1. diff < exact_match_diff, high/ultra, sharp and clean  → cover × 1.0
//! 2. diff < close_match_diff, high/ultra                   → cover × 1.0
//! 3. diff < near_match_diff, low render complexity         → cover × 0.98
//! 4. image_aspect > viewport_aspect × wide_ratio           → contain × 0.9
//! 5. image_aspect < viewport_aspect × tall_ratio           → contain × 0.95
//! 6. not sharp and clean                                   → contain × 0.92
//! 7. otherwise                                             → contain × 0.95
//! ```
//!
//! # Focus points
//!
//! Crop windows are centred on a focus point supplied by a
//! [`FocusHeuristic`]. The stock [`RuleOfThirds`] heuristic is rule-based and
//! knows nothing about image content; a content-aware detector can be
//! plugged in through [`Planner::with_focus`] without changing callers.

use crate::config::{PlacementPolicy, TonePolicy};
use crate::frame::FrameSpec;
use crate::imaging::ImageAnalysis;
use crate::tone::adjust_tone;
use crate::types::{
    CropRect, FitMode, OptimizedConfig, Orientation, Position, ResolutionClass, Strategy,
    StrategyResolution, Transform,
};

/// Chooses where a crop window is centred.
///
/// Both methods return a fraction of the image extent in `[0, 1]`
/// (`0` = left/top edge). Values outside that range are clamped.
pub trait FocusHeuristic: Sync {
    fn horizontal(&self, analysis: &ImageAnalysis) -> f64;
    fn vertical(&self, analysis: &ImageAnalysis) -> f64;
}

/// Stock focus heuristic.
///
/// - horizontal: centre for landscape images, else the left third line;
/// - vertical: upper quarter for portrait images (screenshots put their
///   content at the top), else the upper third line.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleOfThirds;

impl FocusHeuristic for RuleOfThirds {
    fn horizontal(&self, analysis: &ImageAnalysis) -> f64 {
        match analysis.orientation {
            Orientation::Landscape => 0.5,
            _ => 1.0 / 3.0,
        }
    }

    fn vertical(&self, analysis: &ImageAnalysis) -> f64 {
        match analysis.orientation {
            Orientation::Portrait => 0.25,
            _ => 1.0 / 3.0,
        }
    }
}

/// Which branch of the smart decision tree fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmartRule {
    ExactMatch,
    CloseMatch,
    NearMatch,
    VeryWide,
    VeryTall,
    LowQuality,
    Fallback,
}

impl SmartRule {
    /// 1-based rule number in evaluation order.
    pub fn number(self) -> u8 {
        match self {
            Self::ExactMatch => 1,
            Self::CloseMatch => 2,
            Self::NearMatch => 3,
            Self::VeryWide => 4,
            Self::VeryTall => 5,
            Self::LowQuality => 6,
            Self::Fallback => 7,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::ExactMatch => "aspect ratios match and the source is sharp, clean and high resolution",
            Self::CloseMatch => "aspect ratios nearly match and the source is high resolution",
            Self::NearMatch => "aspect ratios are close and the source is simple to render",
            Self::VeryWide => "the image is much wider than the viewport",
            Self::VeryTall => "the image is much taller than the viewport",
            Self::LowQuality => "the source is too soft or noisy to magnify",
            Self::Fallback => "no full-bleed rule applied",
        }
    }
}

/// Fit chosen for one plan, before scale clamping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitDecision {
    pub mode: FitMode,
    /// Multiplier on the base scale.
    pub padding: f64,
    /// Set when the smart tree made the choice.
    pub rule: Option<SmartRule>,
}

/// Geometry half of a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub scale: f64,
    pub strategy: FitMode,
    pub crop: Option<CropRect>,
    pub reasoning: String,
}

/// `|image_aspect − viewport_aspect|`.
pub fn aspect_ratio_diff(analysis: &ImageAnalysis, frame: &FrameSpec) -> f64 {
    (analysis.dimensions.aspect_ratio - frame.viewport.aspect_ratio).abs()
}

/// Run the smart decision tree.
pub fn smart_decision(
    analysis: &ImageAnalysis,
    frame: &FrameSpec,
    policy: &PlacementPolicy,
) -> FitDecision {
    let image_aspect = analysis.dimensions.aspect_ratio;
    let viewport_aspect = frame.viewport.aspect_ratio;
    let diff = aspect_ratio_diff(analysis, frame);
    let high_res = analysis.quality.resolution_class.is_high();
    let high_quality = analysis.is_high_quality(
        policy.high_quality_min_sharpness,
        policy.high_quality_max_noise,
    );

    let (rule, mode, padding) = if diff < policy.exact_match_diff && high_res && high_quality {
        (SmartRule::ExactMatch, FitMode::Cover, 1.0)
    } else if diff < policy.close_match_diff && high_res {
        (SmartRule::CloseMatch, FitMode::Cover, 1.0)
    } else if diff < policy.near_match_diff
        && analysis.performance.render_complexity < policy.low_complexity_below
    {
        (SmartRule::NearMatch, FitMode::Cover, policy.near_match_padding)
    } else if image_aspect > viewport_aspect * policy.wide_ratio {
        (SmartRule::VeryWide, FitMode::Contain, policy.wide_padding)
    } else if image_aspect < viewport_aspect * policy.tall_ratio {
        (SmartRule::VeryTall, FitMode::Contain, policy.tall_padding)
    } else if !high_quality {
        (SmartRule::LowQuality, FitMode::Contain, policy.low_quality_padding)
    } else {
        (SmartRule::Fallback, FitMode::Contain, policy.default_padding)
    };

    log::debug!(
        "smart rule {} fired (diff {diff:.3}, image {image_aspect:.3}, viewport {viewport_aspect:.3})",
        rule.number()
    );
    FitDecision {
        mode,
        padding,
        rule: Some(rule),
    }
}

/// `[min_scale, max_scale]` for this source.
///
/// Sharp sources may shrink further, ultra-resolution sources may grow
/// further, before quality loss shows.
pub fn scale_bounds(analysis: &ImageAnalysis, policy: &PlacementPolicy) -> (f64, f64) {
    let min = if analysis.quality.sharpness > policy.high_quality_min_sharpness {
        policy.min_scale_sharp
    } else {
        policy.min_scale
    };
    let max = if analysis.quality.resolution_class == ResolutionClass::Ultra {
        policy.max_scale_ultra
    } else {
        policy.max_scale
    };
    (min, max)
}

fn clamp_origin(start: f64, max_origin: u32) -> u32 {
    start.round().clamp(0.0, max_origin as f64) as u32
}

/// Source-pixel window that is visible when the image is drawn at `scale`
/// into `canvas`, centred on the focus point.
///
/// Only axes that overflow the canvas are cropped. Returns `None` when the
/// whole image stays visible.
pub fn crop_window(
    analysis: &ImageAnalysis,
    canvas: (f64, f64),
    scale: f64,
    focus: &dyn FocusHeuristic,
) -> Option<CropRect> {
    let (img_w, img_h) = (analysis.dimensions.width, analysis.dimensions.height);
    let (canvas_w, canvas_h) = canvas;
    let mut crop = CropRect {
        x: 0,
        y: 0,
        width: img_w,
        height: img_h,
    };

    if img_w as f64 * scale > canvas_w {
        crop.width = ((canvas_w / scale).round() as u32).clamp(1, img_w);
        let focus_x = focus.horizontal(analysis).clamp(0.0, 1.0) * img_w as f64;
        crop.x = clamp_origin(focus_x - crop.width as f64 / 2.0, img_w - crop.width);
    }
    if img_h as f64 * scale > canvas_h {
        crop.height = ((canvas_h / scale).round() as u32).clamp(1, img_h);
        let focus_y = focus.vertical(analysis).clamp(0.0, 1.0) * img_h as f64;
        crop.y = clamp_origin(focus_y - crop.height as f64 / 2.0, img_h - crop.height);
    }

    if crop.width == img_w && crop.height == img_h {
        None
    } else {
        Some(crop)
    }
}

/// Placement planner bound to a policy and a focus heuristic.
pub struct Planner<'a> {
    policy: &'a PlacementPolicy,
    tone: &'a TonePolicy,
    focus: &'a dyn FocusHeuristic,
}

impl<'a> Planner<'a> {
    pub fn new(policy: &'a PlacementPolicy, tone: &'a TonePolicy) -> Self {
        Self {
            policy,
            tone,
            focus: &RuleOfThirds,
        }
    }

    /// Swap in a different focus heuristic for crop windows.
    pub fn with_focus(mut self, focus: &'a dyn FocusHeuristic) -> Self {
        self.focus = focus;
        self
    }

    fn decide(&self, analysis: &ImageAnalysis, frame: &FrameSpec, strategy: Strategy) -> FitDecision {
        match strategy.resolve() {
            StrategyResolution::Fixed(FitMode::Contain) => FitDecision {
                mode: FitMode::Contain,
                padding: self.policy.contain_padding,
                rule: None,
            },
            StrategyResolution::Fixed(FitMode::Cover) => FitDecision {
                mode: FitMode::Cover,
                padding: 1.0,
                rule: None,
            },
            StrategyResolution::Smart => smart_decision(analysis, frame, self.policy),
        }
    }

    /// Compute scale, fit and crop.
    pub fn place(&self, analysis: &ImageAnalysis, frame: &FrameSpec, strategy: Strategy) -> Placement {
        let canvas = frame.canvas();
        let scale_x = canvas.0 / analysis.dimensions.width as f64;
        let scale_y = canvas.1 / analysis.dimensions.height as f64;
        let diff = aspect_ratio_diff(analysis, frame);
        let decision = self.decide(analysis, frame, strategy);

        let base = match decision.mode {
            FitMode::Contain => scale_x.min(scale_y),
            FitMode::Cover => scale_x.max(scale_y),
        };
        let raw = base * decision.padding;
        let (min_scale, max_scale) = scale_bounds(analysis, self.policy);
        // yields max_scale when an unvalidated policy has max < min
        let scale = raw.max(min_scale).min(max_scale);

        let mut reasoning = match decision.rule {
            Some(rule) => format!(
                "smart rule {}: {} (aspect diff {diff:.3}); {} at {:.2} x {}",
                rule.number(),
                rule.describe(),
                Strategy::from(decision.mode),
                decision.padding,
                base_label(decision.mode),
            ),
            None if strategy == Strategy::Fill => format!(
                "fill resolves to cover so the image is never distorted; cover at 1.00 x {}",
                base_label(FitMode::Cover)
            ),
            None => format!(
                "{} requested; {} at {:.2} x {}",
                strategy,
                Strategy::from(decision.mode),
                decision.padding,
                base_label(decision.mode),
            ),
        };
        if scale != raw {
            log::debug!("scale {raw:.4} clamped to [{min_scale}, {max_scale}]");
            reasoning.push_str(&format!(
                "; scale {raw:.4} clamped to [{min_scale}, {max_scale}]"
            ));
        }

        let crop = if decision.mode == FitMode::Cover && diff > self.policy.crop_min_aspect_diff {
            crop_window(analysis, canvas, scale, self.focus)
        } else {
            None
        };
        if let Some(c) = crop {
            log::debug!("crop window {}x{} at ({}, {})", c.width, c.height, c.x, c.y);
            reasoning.push_str(&format!(
                "; cropped to {}x{} at ({}, {})",
                c.width, c.height, c.x, c.y
            ));
        }

        Placement {
            scale,
            strategy: decision.mode,
            crop,
            reasoning,
        }
    }

    /// Full plan: placement plus tone hints, anchored at the viewport centre.
    pub fn plan(
        &self,
        analysis: &ImageAnalysis,
        frame: &FrameSpec,
        strategy: Strategy,
    ) -> OptimizedConfig {
        let placement = self.place(analysis, frame, strategy);
        let resolved = Strategy::from(placement.strategy);
        let (canvas_w, canvas_h) = frame.canvas();
        OptimizedConfig {
            scale: placement.scale,
            position: Position {
                x: canvas_w / 2.0,
                y: canvas_h / 2.0,
            },
            crop: placement.crop,
            transform: Transform::default(),
            quality: adjust_tone(analysis, placement.scale, resolved, self.tone),
            strategy: resolved,
            requested_strategy: strategy,
            reasoning: placement.reasoning,
        }
    }
}

fn base_label(mode: FitMode) -> &'static str {
    match mode {
        FitMode::Contain => "min(scale_x, scale_y)",
        FitMode::Cover => "max(scale_x, scale_y)",
    }
}

/// Plan with the stock [`RuleOfThirds`] focus heuristic.
pub fn plan_placement(
    analysis: &ImageAnalysis,
    frame: &FrameSpec,
    strategy: Strategy,
    policy: &PlacementPolicy,
    tone: &TonePolicy,
) -> OptimizedConfig {
    Planner::new(policy, tone).plan(analysis, frame, strategy)
}
