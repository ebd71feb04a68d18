//! Engine facade.
//!
//! [`Engine`] owns an [`EngineConfig`] and exposes every stage with the
//! policy arguments filled in. All methods are `&self` and the engine is
//! `Send + Sync`, so one instance can serve many threads.

use crate::compatibility::{self, CompatibilityReport};
use crate::config::{ConfigError, EngineConfig};
use crate::frame::{self, DeviceDescriptor, FrameSpec};
use crate::imaging::{self, DecodeError, ImageAnalysis, PixelSource};
use crate::placement::{FocusHeuristic, Planner};
use crate::report::{self, ReportDocument};
use crate::tone;
use crate::types::{OptimizedConfig, Strategy, ToneConfig};
use rayon::prelude::*;

#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Validate `config` and bind it. [`Engine::default`] uses the stock
    /// policy, which is always valid.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn analyze_image(&self, source: &dyn PixelSource) -> Result<ImageAnalysis, DecodeError> {
        imaging::analyze_image(source, &self.config.analysis)
    }

    pub fn build_frame_spec(&self, device: &DeviceDescriptor) -> Result<FrameSpec, ConfigError> {
        frame::build_frame_spec(device, &self.config.frame)
    }

    /// Frame spec for a catalog device.
    pub fn frame_for(&self, device_id: &str) -> Result<FrameSpec, ConfigError> {
        self.build_frame_spec(self.config.device(device_id)?)
    }

    /// Frame specs for the whole catalog, in catalog order.
    pub fn catalog(&self) -> Result<Vec<FrameSpec>, ConfigError> {
        self.config
            .devices
            .iter()
            .map(|d| self.build_frame_spec(d))
            .collect()
    }

    fn planner(&self) -> Planner<'_> {
        Planner::new(&self.config.placement, &self.config.tone)
    }

    pub fn plan_placement(
        &self,
        analysis: &ImageAnalysis,
        frame: &FrameSpec,
        strategy: Strategy,
    ) -> OptimizedConfig {
        self.planner().plan(analysis, frame, strategy)
    }

    /// Plan with a caller-supplied focus heuristic for crop windows.
    pub fn plan_placement_with_focus(
        &self,
        analysis: &ImageAnalysis,
        frame: &FrameSpec,
        strategy: Strategy,
        focus: &dyn FocusHeuristic,
    ) -> OptimizedConfig {
        self.planner()
            .with_focus(focus)
            .plan(analysis, frame, strategy)
    }

    /// One plan per strategy, in [`Strategy::ALL`] order, computed in parallel.
    pub fn plan_all_strategies(
        &self,
        analysis: &ImageAnalysis,
        frame: &FrameSpec,
    ) -> Vec<OptimizedConfig> {
        Strategy::ALL
            .par_iter()
            .map(|&strategy| self.plan_placement(analysis, frame, strategy))
            .collect()
    }

    pub fn adjust_tone(&self, analysis: &ImageAnalysis, scale: f64, strategy: Strategy) -> ToneConfig {
        tone::adjust_tone(analysis, scale, strategy, &self.config.tone)
    }

    pub fn validate_compatibility(
        &self,
        analysis: &ImageAnalysis,
        frame: &FrameSpec,
    ) -> CompatibilityReport {
        compatibility::validate_compatibility(analysis, frame, &self.config.compatibility)
    }

    pub fn generate_report(
        &self,
        analysis: &ImageAnalysis,
        frame: &FrameSpec,
        plan: &OptimizedConfig,
    ) -> ReportDocument {
        report::generate_report(analysis, frame, plan, &self.config.compatibility)
    }
}
