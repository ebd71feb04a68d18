//! Audit reports.
//!
//! A [`ReportDocument`] bundles everything the engine derived for one
//! image/frame/strategy triple. It is pure aggregation: nothing is recomputed
//! here except the compatibility score, and parsing a serialized report gives
//! back the same values.

use crate::compatibility::{CompatibilityReport, validate_compatibility};
use crate::config::CompatibilityPolicy;
use crate::frame::FrameSpec;
use crate::imaging::ImageAnalysis;
use crate::types::{OptimizedConfig, Strategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

pub const TOOL_NAME: &str = env!("CARGO_PKG_NAME");
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One-line digest of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub device_id: String,
    pub requested_strategy: Strategy,
    pub strategy: Strategy,
    pub scale: f64,
    pub cropped: bool,
    pub score: u32,
    pub is_compatible: bool,
    pub warning_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub tool: String,
    pub version: String,
    pub image: ImageAnalysis,
    pub frame: FrameSpec,
    pub plan: OptimizedConfig,
    pub compatibility: CompatibilityReport,
    pub summary: ReportSummary,
}

/// Assemble a report for an already computed plan.
pub fn generate_report(
    analysis: &ImageAnalysis,
    frame: &FrameSpec,
    plan: &OptimizedConfig,
    policy: &CompatibilityPolicy,
) -> ReportDocument {
    let compatibility = validate_compatibility(analysis, frame, policy);
    let summary = ReportSummary {
        device_id: frame.device_id.clone(),
        requested_strategy: plan.requested_strategy,
        strategy: plan.strategy,
        scale: plan.scale,
        cropped: plan.crop.is_some(),
        score: compatibility.score,
        is_compatible: compatibility.is_compatible,
        warning_count: analysis.compatibility.warnings.len() + compatibility.warnings.len(),
    };
    ReportDocument {
        tool: TOOL_NAME.to_string(),
        version: TOOL_VERSION.to_string(),
        image: analysis.clone(),
        frame: frame.clone(),
        plan: plan.clone(),
        compatibility,
        summary,
    }
}

impl ReportDocument {
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ReportError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Flatten into dotted keys (`plan.crop.width`, `compatibility.issues.0.kind`).
    ///
    /// Strings are unquoted, `null` becomes an empty string. Keys are sorted.
    pub fn to_key_values(&self) -> Result<BTreeMap<String, String>, ReportError> {
        let value = serde_json::to_value(self)?;
        let mut out = BTreeMap::new();
        flatten("", &value, &mut out);
        Ok(out)
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut BTreeMap<String, String>) {
    let join = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        }
    };
    match value {
        Value::Object(map) => {
            for (key, v) in map {
                flatten(&join(key), v, out);
            }
        }
        Value::Array(items) => {
            for (i, v) in items.iter().enumerate() {
                flatten(&join(&i.to_string()), v, out);
            }
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        Value::Null => {
            out.insert(prefix.to_string(), String::new());
        }
        other => {
            out.insert(prefix.to_string(), other.to_string());
        }
    }
}
