//! Device descriptors and the frame specs derived from them.
//!
//! A [`FrameSpec`] is what the planner places images into: the viewport in
//! physical units, the scale that maps those units to render-surface pixels,
//! and the resolution band a source image should fall inside. It is built
//! once per device selection and never mutated.
//!
//! ## Formula
//!
//! ```text
//! viewport      = screen size (points), aspect = width / height
//! display_scale = device value, else [frame] default_display_scale
//! min           = native × min_resolution_fraction (0.75)
//! recommended   = native
//! max           = native × max_resolution_multiplier (3.0)
//! ```
//!
//! Min, recommended and max are ordered componentwise by construction.

use crate::config::{ConfigError, FramePolicy};
use crate::types::PixelSize;
use serde::{Deserialize, Serialize};

/// Width × height in physical units (millimetres or points).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhysicalSize {
    pub width: f64,
    pub height: f64,
}

impl PhysicalSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A device as described by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceDescriptor {
    pub id: String,
    pub name: String,
    /// Body dimensions in millimetres.
    pub physical: PhysicalSize,
    /// Screen dimensions in points.
    pub screen: PhysicalSize,
    pub native_resolution: PixelSize,
    pub corner_radius: f64,
    /// Points → render pixels. `None` uses the policy default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_scale: Option<f64>,
    /// Free-form hardware flags (`"notch"`, `"dynamic-island"`, ...).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub aspect_ratio: f64,
    pub corner_radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionBand {
    pub min: PixelSize,
    pub recommended: PixelSize,
    pub max: PixelSize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSpec {
    pub device_id: String,
    pub viewport: Viewport,
    pub display_scale: f64,
    pub optimal_resolutions: ResolutionBand,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

impl FrameSpec {
    /// Viewport size in render-surface pixels.
    pub fn canvas(&self) -> (f64, f64) {
        (
            self.viewport.width * self.display_scale,
            self.viewport.height * self.display_scale,
        )
    }
}

fn invalid(device: &DeviceDescriptor, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidDevice {
        device: device.id.clone(),
        reason: reason.into(),
    }
}

fn require_positive(device: &DeviceDescriptor, field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(device, format!("{field} must be > 0, got {value}")))
    }
}

/// Derive a [`FrameSpec`] from a device description.
///
/// Fails with [`ConfigError::InvalidDevice`] on any non-positive dimension
/// or scale; the caller must fix the descriptor.
pub fn build_frame_spec(
    device: &DeviceDescriptor,
    policy: &FramePolicy,
) -> Result<FrameSpec, ConfigError> {
    require_positive(device, "physical.width", device.physical.width)?;
    require_positive(device, "physical.height", device.physical.height)?;
    require_positive(device, "screen.width", device.screen.width)?;
    require_positive(device, "screen.height", device.screen.height)?;
    if device.native_resolution.width == 0 || device.native_resolution.height == 0 {
        return Err(invalid(
            device,
            format!(
                "native_resolution must be non-zero, got {}",
                device.native_resolution
            ),
        ));
    }
    if !(device.corner_radius.is_finite() && device.corner_radius >= 0.0) {
        return Err(invalid(
            device,
            format!("corner_radius must be >= 0, got {}", device.corner_radius),
        ));
    }
    let display_scale = device.display_scale.unwrap_or(policy.default_display_scale);
    require_positive(device, "display_scale", display_scale)?;

    let native = device.native_resolution;
    let optimal_resolutions = ResolutionBand {
        min: native.scaled(policy.min_resolution_fraction),
        recommended: native,
        max: native.scaled(policy.max_resolution_multiplier),
    };

    let spec = FrameSpec {
        device_id: device.id.clone(),
        viewport: Viewport {
            width: device.screen.width,
            height: device.screen.height,
            aspect_ratio: device.screen.width / device.screen.height,
            corner_radius: device.corner_radius,
        },
        display_scale,
        optimal_resolutions,
        features: device.features.clone(),
    };
    log::debug!(
        "frame {}: viewport {}x{} @{}x, band {} / {} / {}",
        spec.device_id,
        spec.viewport.width,
        spec.viewport.height,
        spec.display_scale,
        optimal_resolutions.min,
        optimal_resolutions.recommended,
        optimal_resolutions.max
    );
    Ok(spec)
}
