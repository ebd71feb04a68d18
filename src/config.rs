//! Engine configuration: the heuristic policy table and the device catalog.
//!
//! Every threshold, padding factor and tone nudge the engine uses lives in
//! [`EngineConfig`], so placement behaviour can be tuned and tested as data
//! instead of by editing literals. The stock values reproduce the documented
//! defaults; a `config.toml` only needs the keys it changes.
//!
//! ## Config File Location
//!
//! The CLI reads `config.toml` from the directory given by `--config`
//! (default: the working directory). A missing file means stock defaults.
//!
//! ## Configuration Options
//!
//! ```toml
//! [analysis]
//! sharpness_sample = 200      # Side of the centred sharpness sample (px)
//! noise_sample = 100          # Side of the centred noise sample (px)
//! low_resolution_mp = 0.5     # Below: low
//! medium_resolution_mp = 2.0  # Below: medium
//! high_resolution_mp = 8.0    # Below: high, else ultra
//!
//! [frame]
//! default_display_scale = 3.0
//! min_resolution_fraction = 0.75
//! max_resolution_multiplier = 3.0
//!
//! [placement]
//! contain_padding = 0.95
//! crop_min_aspect_diff = 0.15
//!
//! [tone.neutral]
//! compression = 0.95
//!
//! [compatibility]
//! below_min_penalty = 30
//!
//! [processing]
//! max_processes = 4
//!
//! [[devices]]
//! id = "iphone-15-pro"
//! ...
//! ```
//!
//! Run `framefit gen-config` for the full commented file. Unknown keys are
//! rejected to catch typos early.

use crate::frame::{DeviceDescriptor, PhysicalSize};
use crate::types::{PixelSize, ToneConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Invalid device '{device}': {reason}")]
    InvalidDevice { device: String, reason: String },
    #[error("Unknown device '{0}'")]
    UnknownDevice(String),
}

/// Full engine configuration loaded from `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub analysis: AnalysisPolicy,
    pub frame: FramePolicy,
    pub placement: PlacementPolicy,
    pub tone: TonePolicy,
    pub compatibility: CompatibilityPolicy,
    pub processing: ProcessingConfig,
    /// Device catalog. Replaces (does not extend) the stock catalog when set.
    #[serde(default = "stock_devices")]
    pub devices: Vec<DeviceDescriptor>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            analysis: AnalysisPolicy::default(),
            frame: FramePolicy::default(),
            placement: PlacementPolicy::default(),
            tone: TonePolicy::default(),
            compatibility: CompatibilityPolicy::default(),
            processing: ProcessingConfig::default(),
            devices: stock_devices(),
        }
    }
}

impl EngineConfig {
    /// Stock policy with the stock device catalog.
    pub fn stock() -> Self {
        Self::default()
    }

    /// Look up a catalog device by id.
    pub fn device(&self, id: &str) -> Result<&DeviceDescriptor, ConfigError> {
        self.devices
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| ConfigError::UnknownDevice(id.to_string()))
    }

    /// Validate that every policy value is usable.
    ///
    /// Device descriptors are validated separately when a frame spec is
    /// built from them, so a bad catalog entry only fails when selected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analysis.validate()?;
        self.frame.validate()?;
        self.placement.validate()?;
        self.tone.validate()?;
        self.compatibility.validate()?;
        let mut seen = std::collections::HashSet::new();
        for device in &self.devices {
            if !seen.insert(device.id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate device id '{}'",
                    device.id
                )));
            }
        }
        Ok(())
    }
}

fn positive(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!("{name} must be > 0")))
    }
}

fn unit_interval(name: &str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!("{name} must be in (0, 1]")))
    }
}

// =============================================================================
// Analysis
// =============================================================================

/// Image analysis thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisPolicy {
    /// Side of the centred square sampled for sharpness.
    pub sharpness_sample: u32,
    /// Side of the centred square sampled for noise.
    pub noise_sample: u32,
    /// Mean gradient magnitude that maps to sharpness 1.0.
    pub sharpness_divisor: f64,
    /// Grayscale standard deviation that maps to noise 1.0.
    pub noise_divisor: f64,
    /// Aspect ratios within `1.0 ± square_tolerance` are square.
    pub square_tolerance: f64,
    pub low_resolution_mp: f64,
    pub medium_resolution_mp: f64,
    pub high_resolution_mp: f64,
    /// Panel diagonal used to turn a pixel diagonal into a DPI estimate.
    pub reference_diagonal_inches: f64,
    /// Sharpness below which a blur warning is raised.
    pub blur_warning_below: f64,
    /// Noise above which a noise warning is raised.
    pub noise_warning_above: f64,
    /// File size above which a performance warning is raised.
    pub large_file_bytes: u64,
    /// Aspect ratios outside `[min_aspect, max_aspect]` are extreme.
    pub min_aspect: f64,
    pub max_aspect: f64,
    /// Megapixels at which the pixel-load share of render complexity saturates.
    pub complexity_reference_mp: f64,
}

impl Default for AnalysisPolicy {
    fn default() -> Self {
        Self {
            sharpness_sample: 200,
            noise_sample: 100,
            sharpness_divisor: 50.0,
            noise_divisor: 50.0,
            square_tolerance: 0.1,
            low_resolution_mp: 0.5,
            medium_resolution_mp: 2.0,
            high_resolution_mp: 8.0,
            reference_diagonal_inches: 6.1,
            blur_warning_below: 0.3,
            noise_warning_above: 0.7,
            large_file_bytes: 10 * 1024 * 1024,
            min_aspect: 1.0 / 3.0,
            max_aspect: 3.0,
            complexity_reference_mp: 12.0,
        }
    }
}

impl AnalysisPolicy {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.sharpness_sample < 2 {
            return Err(ConfigError::Validation(
                "analysis.sharpness_sample must be at least 2".into(),
            ));
        }
        if self.noise_sample == 0 {
            return Err(ConfigError::Validation(
                "analysis.noise_sample must be non-zero".into(),
            ));
        }
        positive("analysis.sharpness_divisor", self.sharpness_divisor)?;
        positive("analysis.noise_divisor", self.noise_divisor)?;
        positive("analysis.reference_diagonal_inches", self.reference_diagonal_inches)?;
        positive("analysis.complexity_reference_mp", self.complexity_reference_mp)?;
        if !(0.0..1.0).contains(&self.square_tolerance) {
            return Err(ConfigError::Validation(
                "analysis.square_tolerance must be in [0, 1)".into(),
            ));
        }
        if !(self.low_resolution_mp < self.medium_resolution_mp
            && self.medium_resolution_mp < self.high_resolution_mp)
        {
            return Err(ConfigError::Validation(
                "analysis resolution thresholds must be strictly increasing".into(),
            ));
        }
        if !(self.min_aspect > 0.0 && self.min_aspect < self.max_aspect) {
            return Err(ConfigError::Validation(
                "analysis.min_aspect must be > 0 and below max_aspect".into(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Frame
// =============================================================================

/// How a device descriptor becomes a frame spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FramePolicy {
    /// Used when a device does not declare its own display scale.
    pub default_display_scale: f64,
    /// `optimal_resolutions.min` as a fraction of native resolution.
    pub min_resolution_fraction: f64,
    /// `optimal_resolutions.max` as a multiple of native resolution.
    pub max_resolution_multiplier: f64,
}

impl Default for FramePolicy {
    fn default() -> Self {
        Self {
            default_display_scale: 3.0,
            min_resolution_fraction: 0.75,
            max_resolution_multiplier: 3.0,
        }
    }
}

impl FramePolicy {
    fn validate(&self) -> Result<(), ConfigError> {
        positive("frame.default_display_scale", self.default_display_scale)?;
        unit_interval("frame.min_resolution_fraction", self.min_resolution_fraction)?;
        if !(2.0..=4.0).contains(&self.max_resolution_multiplier) {
            return Err(ConfigError::Validation(
                "frame.max_resolution_multiplier must be in [2, 4]".into(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Placement
// =============================================================================

/// Smart-strategy decision table and scale bounds.
///
/// The smart rules are evaluated in order; see
/// [`placement`](crate::placement) for the tree itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlacementPolicy {
    /// Padding applied to an explicitly requested `contain`.
    pub contain_padding: f64,
    /// Rule 1: aspect difference below which a high-quality source covers.
    pub exact_match_diff: f64,
    /// Rule 2: aspect difference below which a high-resolution source covers.
    pub close_match_diff: f64,
    /// Rule 3: aspect difference below which a simple source covers with padding.
    pub near_match_diff: f64,
    pub near_match_padding: f64,
    /// Rule 3: render complexity below which a source counts as simple.
    pub low_complexity_below: f64,
    /// Rule 4: `image_aspect > viewport_aspect × wide_ratio` is very wide.
    pub wide_ratio: f64,
    pub wide_padding: f64,
    /// Rule 5: `image_aspect < viewport_aspect × tall_ratio` is very tall.
    pub tall_ratio: f64,
    pub tall_padding: f64,
    /// Rule 6 padding for sources that fail the high-quality test.
    pub low_quality_padding: f64,
    /// Rule 7 padding.
    pub default_padding: f64,
    /// High quality means sharpness above this...
    pub high_quality_min_sharpness: f64,
    /// ...and noise below this.
    pub high_quality_max_noise: f64,
    /// Cover plans crop only when the aspect difference exceeds this.
    pub crop_min_aspect_diff: f64,
    /// Lower scale bound for sharp sources.
    pub min_scale_sharp: f64,
    /// Lower scale bound for everything else.
    pub min_scale: f64,
    /// Upper scale bound for ultra-resolution sources.
    pub max_scale_ultra: f64,
    /// Upper scale bound for everything else.
    pub max_scale: f64,
}

impl Default for PlacementPolicy {
    fn default() -> Self {
        Self {
            contain_padding: 0.95,
            exact_match_diff: 0.05,
            close_match_diff: 0.1,
            near_match_diff: 0.3,
            near_match_padding: 0.98,
            low_complexity_below: 0.5,
            wide_ratio: 1.5,
            wide_padding: 0.9,
            tall_ratio: 0.7,
            tall_padding: 0.95,
            low_quality_padding: 0.92,
            default_padding: 0.95,
            high_quality_min_sharpness: 0.6,
            high_quality_max_noise: 0.4,
            crop_min_aspect_diff: 0.15,
            min_scale_sharp: 0.1,
            min_scale: 0.2,
            max_scale_ultra: 6.0,
            max_scale: 4.0,
        }
    }
}

impl PlacementPolicy {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("placement.contain_padding", self.contain_padding),
            ("placement.near_match_padding", self.near_match_padding),
            ("placement.wide_padding", self.wide_padding),
            ("placement.tall_padding", self.tall_padding),
            ("placement.low_quality_padding", self.low_quality_padding),
            ("placement.default_padding", self.default_padding),
        ] {
            unit_interval(name, value)?;
        }
        if !(self.exact_match_diff <= self.close_match_diff
            && self.close_match_diff <= self.near_match_diff)
        {
            return Err(ConfigError::Validation(
                "placement match thresholds must satisfy exact <= close <= near".into(),
            ));
        }
        positive("placement.wide_ratio", self.wide_ratio)?;
        positive("placement.tall_ratio", self.tall_ratio)?;
        positive("placement.min_scale_sharp", self.min_scale_sharp)?;
        positive("placement.min_scale", self.min_scale)?;
        for (name, max) in [
            ("placement.max_scale", self.max_scale),
            ("placement.max_scale_ultra", self.max_scale_ultra),
        ] {
            if !(max.is_finite() && max >= self.min_scale && max >= self.min_scale_sharp) {
                return Err(ConfigError::Validation(format!(
                    "{name} must be finite and at least both minimum scales"
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Tone
// =============================================================================

/// Inclusive `[min, max]` range for one tone parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Clamp into the range. Never panics; an inverted range yields `max`.
    pub fn clamp(self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    pub fn contains(self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Safe range for every tone parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToneLimits {
    pub compression: Range,
    pub sharpening: Range,
    pub saturation: Range,
    pub brightness: Range,
    pub contrast: Range,
}

impl Default for ToneLimits {
    fn default() -> Self {
        Self {
            compression: Range::new(0.7, 1.0),
            sharpening: Range::new(0.0, 0.4),
            saturation: Range::new(0.9, 1.1),
            brightness: Range::new(0.95, 1.05),
            contrast: Range::new(0.9, 1.1),
        }
    }
}

/// Additive tone nudges and the conditions that trigger them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToneNudges {
    pub low_resolution_sharpening: f64,
    pub low_resolution_contrast: f64,
    /// Sharpness below which soft-source sharpening applies.
    pub soft_below: f64,
    pub soft_sharpening: f64,
    /// Noise above which sharpening is backed off.
    pub noisy_above: f64,
    pub noisy_sharpening: f64,
    pub noisy_compression: f64,
    /// Scale above which the plan counts as an upscale.
    pub upscale_above: f64,
    pub upscale_compression: f64,
    pub upscale_sharpening: f64,
    /// Scale below which the plan counts as a downscale.
    pub downscale_below: f64,
    pub downscale_compression: f64,
    pub cover_saturation: f64,
    pub cover_contrast: f64,
}

impl Default for ToneNudges {
    fn default() -> Self {
        Self {
            low_resolution_sharpening: 0.25,
            low_resolution_contrast: 0.03,
            soft_below: 0.4,
            soft_sharpening: 0.15,
            noisy_above: 0.6,
            noisy_sharpening: -0.1,
            noisy_compression: -0.05,
            upscale_above: 2.0,
            upscale_compression: 0.03,
            upscale_sharpening: 0.1,
            downscale_below: 0.5,
            downscale_compression: -0.05,
            cover_saturation: 0.05,
            cover_contrast: 0.02,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TonePolicy {
    pub neutral: ToneConfig,
    pub nudges: ToneNudges,
    pub limits: ToneLimits,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            compression: 0.95,
            sharpening: 0.0,
            saturation: 1.0,
            brightness: 1.0,
            contrast: 1.0,
        }
    }
}

impl Default for TonePolicy {
    fn default() -> Self {
        Self {
            neutral: ToneConfig::default(),
            nudges: ToneNudges::default(),
            limits: ToneLimits::default(),
        }
    }
}

impl TonePolicy {
    fn validate(&self) -> Result<(), ConfigError> {
        let l = &self.limits;
        let n = &self.neutral;
        for (name, range, neutral) in [
            ("compression", l.compression, n.compression),
            ("sharpening", l.sharpening, n.sharpening),
            ("saturation", l.saturation, n.saturation),
            ("brightness", l.brightness, n.brightness),
            ("contrast", l.contrast, n.contrast),
        ] {
            if range.min > range.max {
                return Err(ConfigError::Validation(format!(
                    "tone.limits.{name}: min must not exceed max"
                )));
            }
            if !range.contains(neutral) {
                return Err(ConfigError::Validation(format!(
                    "tone.neutral.{name} must lie inside tone.limits.{name}"
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Compatibility
// =============================================================================

/// Compatibility score penalties and the thresholds that trigger them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompatibilityPolicy {
    pub below_min_penalty: u32,
    pub below_recommended_penalty: u32,
    pub severe_aspect_diff: f64,
    pub severe_aspect_penalty: u32,
    pub moderate_aspect_diff: f64,
    pub moderate_aspect_penalty: u32,
    pub large_file_bytes: u64,
    pub large_file_penalty: u32,
    /// Image aspect ratios outside `[extreme_aspect_min, extreme_aspect_max]`.
    pub extreme_aspect_min: f64,
    pub extreme_aspect_max: f64,
    pub extreme_aspect_penalty: u32,
}

impl Default for CompatibilityPolicy {
    fn default() -> Self {
        Self {
            below_min_penalty: 30,
            below_recommended_penalty: 10,
            severe_aspect_diff: 0.5,
            severe_aspect_penalty: 20,
            moderate_aspect_diff: 0.3,
            moderate_aspect_penalty: 10,
            large_file_bytes: 20 * 1024 * 1024,
            large_file_penalty: 15,
            extreme_aspect_min: 0.25,
            extreme_aspect_max: 4.0,
            extreme_aspect_penalty: 25,
        }
    }
}

impl CompatibilityPolicy {
    fn validate(&self) -> Result<(), ConfigError> {
        positive("compatibility.moderate_aspect_diff", self.moderate_aspect_diff)?;
        positive("compatibility.severe_aspect_diff", self.severe_aspect_diff)?;
        if self.moderate_aspect_diff > self.severe_aspect_diff {
            return Err(ConfigError::Validation(
                "compatibility.moderate_aspect_diff must not exceed severe_aspect_diff".into(),
            ));
        }
        positive("compatibility.extreme_aspect_min", self.extreme_aspect_min)?;
        if !(self.extreme_aspect_max.is_finite()
            && self.extreme_aspect_min < self.extreme_aspect_max)
        {
            return Err(ConfigError::Validation(
                "compatibility.extreme_aspect_min must be below extreme_aspect_max".into(),
            ));
        }
        for (name, penalty) in [
            ("below_min_penalty", self.below_min_penalty),
            ("below_recommended_penalty", self.below_recommended_penalty),
            ("severe_aspect_penalty", self.severe_aspect_penalty),
            ("moderate_aspect_penalty", self.moderate_aspect_penalty),
            ("large_file_penalty", self.large_file_penalty),
            ("extreme_aspect_penalty", self.extreme_aspect_penalty),
        ] {
            if penalty > 100 {
                return Err(ConfigError::Validation(format!(
                    "compatibility.{name} must be at most 100"
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Processing
// =============================================================================

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel analysis workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Stock device catalog
// =============================================================================

/// Devices shipped with the stock config.
pub fn stock_devices() -> Vec<DeviceDescriptor> {
    vec![
        DeviceDescriptor {
            id: "iphone-15-pro".into(),
            name: "iPhone 15 Pro".into(),
            physical: PhysicalSize::new(70.6, 146.6),
            screen: PhysicalSize::new(393.0, 852.0),
            native_resolution: PixelSize::new(1179, 2556),
            corner_radius: 55.0,
            display_scale: Some(3.0),
            features: vec!["dynamic-island".into()],
        },
        DeviceDescriptor {
            id: "pixel-8".into(),
            name: "Pixel 8".into(),
            physical: PhysicalSize::new(70.8, 150.5),
            screen: PhysicalSize::new(412.0, 915.0),
            native_resolution: PixelSize::new(1080, 2400),
            corner_radius: 42.0,
            display_scale: Some(2.625),
            features: vec!["punch-hole".into()],
        },
        DeviceDescriptor {
            id: "ipad-air-11".into(),
            name: "iPad Air 11\"".into(),
            physical: PhysicalSize::new(178.5, 247.6),
            screen: PhysicalSize::new(820.0, 1180.0),
            native_resolution: PixelSize::new(1640, 2360),
            corner_radius: 18.0,
            display_scale: Some(2.0),
            features: Vec::new(),
        },
        DeviceDescriptor {
            id: "macbook-air-13".into(),
            name: "MacBook Air 13\"".into(),
            physical: PhysicalSize::new(304.1, 215.0),
            screen: PhysicalSize::new(1470.0, 956.0),
            native_resolution: PixelSize::new(2940, 1912),
            corner_radius: 10.0,
            display_scale: Some(2.0),
            features: vec!["notch".into()],
        },
    ]
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(EngineConfig::stock()).expect("stock config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay, arrays included, replace base values.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<EngineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: EngineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in `dir`, layered over stock defaults.
pub fn load_config(dir: &Path) -> Result<EngineConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(dir)?;
    let config = resolve_config(base, overlay)?;
    log::debug!(
        "loaded config from {} ({} devices)",
        dir.display(),
        config.devices.len()
    );
    Ok(config)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# framefit configuration
# ======================
# All settings are optional. Values shown below are the defaults.
# Each file only needs the keys it wants to override.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Image analysis
# ---------------------------------------------------------------------------
[analysis]
# Side of the centred square sampled for sharpness / noise (pixels).
sharpness_sample = 200
noise_sample = 100

# Mean gradient (sharpness) and std-dev (noise) that map to 1.0.
sharpness_divisor = 50.0
noise_divisor = 50.0

# Aspect ratios within 1.0 +/- this are "square".
square_tolerance = 0.1

# Megapixel boundaries: < low = low, < medium = medium, < high = high, else ultra.
low_resolution_mp = 0.5
medium_resolution_mp = 2.0
high_resolution_mp = 8.0

# Panel diagonal used for the DPI estimate (inches).
reference_diagonal_inches = 6.1

# Warning thresholds.
blur_warning_below = 0.3
noise_warning_above = 0.7
large_file_bytes = 10485760
min_aspect = 0.3333333333333333
max_aspect = 3.0

# Megapixels at which pixel load stops adding render complexity.
complexity_reference_mp = 12.0

# ---------------------------------------------------------------------------
# Frame derivation
# ---------------------------------------------------------------------------
[frame]
# Used when a device does not declare display_scale.
default_display_scale = 3.0
# optimal_resolutions.min = native * fraction; max = native * multiplier (2-4).
min_resolution_fraction = 0.75
max_resolution_multiplier = 3.0

# ---------------------------------------------------------------------------
# Placement (smart strategy rules are evaluated top to bottom)
# ---------------------------------------------------------------------------
[placement]
contain_padding = 0.95
# Rule 1: aspect diff below this + high quality + high resolution -> cover.
exact_match_diff = 0.05
# Rule 2: aspect diff below this + high resolution -> cover.
close_match_diff = 0.1
# Rule 3: aspect diff below this + low render complexity -> padded cover.
near_match_diff = 0.3
near_match_padding = 0.98
low_complexity_below = 0.5
# Rule 4: very wide images -> contain with extra padding.
wide_ratio = 1.5
wide_padding = 0.9
# Rule 5: very tall images -> contain.
tall_ratio = 0.7
tall_padding = 0.95
# Rule 6: low quality -> contain. Rule 7: default contain.
low_quality_padding = 0.92
default_padding = 0.95
# "High quality" = sharpness above and noise below these.
high_quality_min_sharpness = 0.6
high_quality_max_noise = 0.4
# Cover plans crop only above this aspect difference.
crop_min_aspect_diff = 0.15
# Scale bounds.
min_scale_sharp = 0.1
min_scale = 0.2
max_scale_ultra = 6.0
max_scale = 4.0

# ---------------------------------------------------------------------------
# Tone hints
# ---------------------------------------------------------------------------
[tone.neutral]
compression = 0.95
sharpening = 0.0
saturation = 1.0
brightness = 1.0
contrast = 1.0

[tone.nudges]
low_resolution_sharpening = 0.25
low_resolution_contrast = 0.03
soft_below = 0.4
soft_sharpening = 0.15
noisy_above = 0.6
noisy_sharpening = -0.1
noisy_compression = -0.05
upscale_above = 2.0
upscale_compression = 0.03
upscale_sharpening = 0.1
downscale_below = 0.5
downscale_compression = -0.05
cover_saturation = 0.05
cover_contrast = 0.02

[tone.limits]
compression = { min = 0.7, max = 1.0 }
sharpening = { min = 0.0, max = 0.4 }
saturation = { min = 0.9, max = 1.1 }
brightness = { min = 0.95, max = 1.05 }
contrast = { min = 0.9, max = 1.1 }

# ---------------------------------------------------------------------------
# Compatibility scoring (score starts at 100)
# ---------------------------------------------------------------------------
[compatibility]
below_min_penalty = 30
below_recommended_penalty = 10
severe_aspect_diff = 0.5
severe_aspect_penalty = 20
moderate_aspect_diff = 0.3
moderate_aspect_penalty = 10
large_file_bytes = 20971520
large_file_penalty = 15
extreme_aspect_min = 0.25
extreme_aspect_max = 4.0
extreme_aspect_penalty = 25

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel analysis workers. Omit to use all CPU cores.
# max_processes = 4

# ---------------------------------------------------------------------------
# Device catalog. Defining [[devices]] replaces the stock catalog.
# ---------------------------------------------------------------------------
# [[devices]]
# id = "iphone-15-pro"
# name = "iPhone 15 Pro"
# physical = { width = 70.6, height = 146.6 }      # millimetres
# screen = { width = 393.0, height = 852.0 }       # points
# native_resolution = { width = 1179, height = 2556 }
# corner_radius = 55.0
# display_scale = 3.0                              # omit for [frame] default
# features = ["dynamic-island"]
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn stock_config_is_valid() {
        EngineConfig::stock().validate().unwrap();
    }

    #[test]
    fn stock_config_has_documented_defaults() {
        let config = EngineConfig::stock();
        assert_eq!(config.placement.contain_padding, 0.95);
        assert_eq!(config.placement.crop_min_aspect_diff, 0.15);
        assert_eq!(config.analysis.sharpness_divisor, 50.0);
        assert_eq!(config.tone.neutral.compression, 0.95);
        assert_eq!(config.tone.limits.sharpening, Range::new(0.0, 0.4));
        assert_eq!(config.compatibility.below_min_penalty, 30);
        assert!(config.device("iphone-15-pro").is_ok());
    }

    #[test]
    fn stock_toml_parses_to_stock_policy() {
        let value: toml::Value = toml::from_str(stock_config_toml()).unwrap();
        let config = resolve_config(stock_defaults_value(), Some(value)).unwrap();
        let stock = EngineConfig::stock();
        assert_eq!(config.analysis, stock.analysis);
        assert_eq!(config.placement, stock.placement);
        assert_eq!(config.tone, stock.tone);
        assert_eq!(config.compatibility, stock.compatibility);
        assert_eq!(config.devices, stock.devices);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[placement]
contain_padding = 0.9
"#;
        let config: EngineConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.placement.contain_padding, 0.9);
        // Defaults preserved
        assert_eq!(config.placement.wide_padding, 0.9);
        assert_eq!(config.placement.max_scale, 4.0);
        assert_eq!(config.devices.len(), stock_devices().len());
    }

    #[test]
    fn unknown_key_is_rejected() {
        let toml = r#"
[placement]
contain_pading = 0.9
"#;
        assert!(toml::from_str::<EngineConfig>(toml).is_err());
    }

    #[test]
    fn merge_overrides_nested_keys_only() {
        let base = stock_defaults_value();
        let overlay: toml::Value = toml::from_str(
            r#"
[tone.limits]
sharpening = { min = 0.0, max = 0.3 }
"#,
        )
        .unwrap();
        let config = resolve_config(base, Some(overlay)).unwrap();
        assert_eq!(config.tone.limits.sharpening.max, 0.3);
        assert_eq!(config.tone.limits.saturation, Range::new(0.9, 1.1));
    }

    #[test]
    fn devices_array_replaces_stock_catalog() {
        let overlay: toml::Value = toml::from_str(
            r#"
[[devices]]
id = "kiosk"
name = "Kiosk"
physical = { width = 300.0, height = 500.0 }
screen = { width = 1080.0, height = 1920.0 }
native_resolution = { width = 1080, height = 1920 }
corner_radius = 0.0
"#,
        )
        .unwrap();
        let config = resolve_config(stock_defaults_value(), Some(overlay)).unwrap();
        assert_eq!(config.devices.len(), 1);
        let kiosk = config.device("kiosk").unwrap();
        assert_eq!(kiosk.display_scale, None);
        assert!(kiosk.features.is_empty());
        assert!(matches!(
            config.device("pixel-8"),
            Err(ConfigError::UnknownDevice(_))
        ));
    }

    #[test]
    fn validation_rejects_unordered_resolution_thresholds() {
        let mut config = EngineConfig::stock();
        config.analysis.medium_resolution_mp = 0.4;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validation_rejects_padding_above_one() {
        let mut config = EngineConfig::stock();
        config.placement.wide_padding = 1.2;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validation_rejects_neutral_outside_limits() {
        let mut config = EngineConfig::stock();
        config.tone.neutral.saturation = 1.3;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validation_rejects_max_multiplier_outside_band() {
        let mut config = EngineConfig::stock();
        config.frame.max_resolution_multiplier = 5.0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validation_rejects_max_scale_below_min_scale() {
        let mut config = EngineConfig::stock();
        config.placement.min_scale = 5.0;
        config.placement.max_scale = 4.0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validation_rejects_inverted_tone_range() {
        let mut config = EngineConfig::stock();
        config.tone.limits.contrast = Range::new(1.1, 0.9);
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validation_rejects_moderate_aspect_above_severe() {
        let mut config = EngineConfig::stock();
        config.compatibility.moderate_aspect_diff = 0.6;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validation_rejects_nan_compatibility_threshold() {
        let mut config = EngineConfig::stock();
        config.compatibility.severe_aspect_diff = f64::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validation_rejects_inverted_extreme_aspect_band() {
        let mut config = EngineConfig::stock();
        config.compatibility.extreme_aspect_min = 5.0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn inverted_range_clamps_to_max() {
        assert_eq!(Range::new(1.1, 0.9).clamp(1.0), 0.9);
        assert_eq!(Range::new(0.9, 1.1).clamp(1.3), 1.1);
        assert_eq!(Range::new(0.9, 1.1).clamp(0.5), 0.9);
    }

    #[test]
    fn validation_rejects_duplicate_device_ids() {
        let mut config = EngineConfig::stock();
        let dup = config.devices[0].clone();
        config.devices.push(dup);
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_stock_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, EngineConfig::stock());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
[compatibility]
below_min_penalty = 40

[processing]
max_processes = 2
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.compatibility.below_min_penalty, 40);
        assert_eq!(config.processing.max_processes, Some(2));
        assert_eq!(config.compatibility.below_recommended_penalty, 10);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_invalid_value_is_validation_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "[placement]\nmin_scale = 0.0\n",
        )
        .unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn effective_threads_caps_at_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = ProcessingConfig {
            max_processes: Some(10_000),
        };
        assert_eq!(effective_threads(&config), cores);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
        let one = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&one), 1);
    }
}
