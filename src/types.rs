//! Shared value types passed between the engine stages.
//!
//! Everything here is an immutable value object: analysis, frame spec and
//! plan are recomputed on demand and never mutated after construction. All
//! types serialize to JSON for the report and the plan cache, so field names
//! and enum spellings are part of the on-disk format.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Width × height in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Scale both axes by `factor`, rounding to the nearest pixel.
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            width: (self.width as f64 * factor).round() as u32,
            height: (self.height as f64 * factor).round() as u32,
        }
    }

    /// Componentwise `self <= other`.
    pub fn fits_within(self, other: PixelSize) -> bool {
        self.width <= other.width && self.height <= other.height
    }
}

impl fmt::Display for PixelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Coarse pixel-count bucket used by every downstream heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionClass {
    Low,
    Medium,
    High,
    Ultra,
}

impl ResolutionClass {
    /// High and ultra sources tolerate full-bleed placement.
    pub fn is_high(self) -> bool {
        matches!(self, Self::High | Self::Ultra)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Ultra => "ultra",
        }
    }
}

impl fmt::Display for ResolutionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
    Square,
}

impl Orientation {
    /// Classify an aspect ratio, treating `1.0 ± tolerance` (inclusive) as square.
    pub fn from_aspect(aspect_ratio: f64, tolerance: f64) -> Self {
        if aspect_ratio > 1.0 + tolerance {
            Self::Landscape
        } else if aspect_ratio < 1.0 - tolerance {
            Self::Portrait
        } else {
            Self::Square
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::Landscape => "landscape",
            Self::Square => "square",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fitting policy requested by the caller.
///
/// `Fill` is an alias of `Cover` and `Smart` picks one of the two from the
/// image and frame; see [`Strategy::resolve`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Contain,
    Cover,
    Fill,
    #[default]
    Smart,
}

/// Geometric fit a strategy resolves to. These are the only two placements
/// the planner ever emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    Contain,
    Cover,
}

/// Outcome of resolving a requested [`Strategy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyResolution {
    /// The strategy names a fit directly (after alias expansion).
    Fixed(FitMode),
    /// The fit is chosen by the smart decision tree.
    Smart,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Contain,
        Strategy::Cover,
        Strategy::Fill,
        Strategy::Smart,
    ];

    /// Expand aliases. `Fill` maps to `Cover` so the image is never stretched
    /// non-uniformly.
    pub fn resolve(self) -> StrategyResolution {
        match self {
            Self::Contain => StrategyResolution::Fixed(FitMode::Contain),
            Self::Cover | Self::Fill => StrategyResolution::Fixed(FitMode::Cover),
            Self::Smart => StrategyResolution::Smart,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contain => "contain",
            Self::Cover => "cover",
            Self::Fill => "fill",
            Self::Smart => "smart",
        }
    }
}

impl From<FitMode> for Strategy {
    fn from(mode: FitMode) -> Self {
        match mode {
            FitMode::Contain => Strategy::Contain,
            FitMode::Cover => Strategy::Cover,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "contain" => Ok(Self::Contain),
            "cover" => Ok(Self::Cover),
            "fill" => Ok(Self::Fill),
            "smart" => Ok(Self::Smart),
            other => Err(format!(
                "unknown strategy '{other}' (expected contain, cover, fill or smart)"
            )),
        }
    }
}

/// Anchor point in render-surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Source-image sub-rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// True if the rectangle lies entirely inside a `width × height` image.
    pub fn is_within(&self, width: u32, height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.x as u64 + self.width as u64 <= width as u64
            && self.y as u64 + self.height as u64 <= height as u64
    }
}

/// Orientation transform handed to the renderer. The planner never sets a
/// non-identity value; the field exists so renderers have a single place to
/// read it from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub rotation: f64,
    pub flip_x: bool,
    pub flip_y: bool,
}

/// Post-scale cosmetic hints. None of these affect geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneConfig {
    /// Encoder quality hint; higher means less compression.
    pub compression: f64,
    pub sharpening: f64,
    pub saturation: f64,
    pub brightness: f64,
    pub contrast: f64,
}

/// The engine's output: one plan per analysis + frame + strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedConfig {
    pub scale: f64,
    pub position: Position,
    pub crop: Option<CropRect>,
    pub transform: Transform,
    pub quality: ToneConfig,
    /// The fit actually applied.
    pub strategy: Strategy,
    /// The strategy the caller asked for.
    pub requested_strategy: Strategy,
    pub reasoning: String,
}
