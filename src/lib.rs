//! # framefit
//!
//! Plans how a raster image is placed inside a device screen: how much to
//! scale it, whether to crop it and where, and which cosmetic tone hints a
//! renderer should apply. The engine only computes a plan; drawing the image
//! is the caller's job.
//!
//! # Pipeline
//!
//! ```text
//! image bytes ─ decode ─ analyze ─┐
//!                                 ├─ plan (scale, crop, anchor) ─ tone ─ OptimizedConfig
//! device ─ frame spec ────────────┘
//!                                 └─ compatibility score, report   (diagnostics)
//! ```
//!
//! Decoding is the only fallible I/O step. Everything after it is a pure,
//! deterministic function of the analysis, the frame spec and the policy in
//! [`config::EngineConfig`]: the same inputs always give byte-identical plans.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Decoding and image analysis: resolution class, sharpness, noise, orientation |
//! | [`frame`] | Device descriptors and the frame specs derived from them |
//! | [`placement`] | Strategy resolution, smart decision tree, scale clamping, crop windows |
//! | [`tone`] | Tone hints clamped to safe ranges |
//! | [`compatibility`] | 0–100 compatibility score with issues and warnings |
//! | [`report`] | JSON audit report and key/value export |
//! | [`engine`] | [`Engine`] facade binding every stage to one config |
//! | [`config`] | Policy table, device catalog, `config.toml` loading and validation |
//! | [`cache`] | Content-addressed plan cache for repeated CLI runs |
//! | [`types`] | Shared value types (`Strategy`, `OptimizedConfig`, ...) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Heuristics As Data
//!
//! Every threshold and padding factor is a named field of the policy table,
//! overridable from `config.toml`. Tests tune the table instead of patching
//! literals, and the plan cache hashes it so retuning invalidates old plans.
//!
//! ## Explicit Strategy Resolution
//!
//! [`types::Strategy::resolve`] maps the four requested strategies onto the
//! two fits the planner actually emits. `fill` is an alias of `cover`: an
//! image is never stretched non-uniformly.
//!
//! ## Rule-Based Focus Points
//!
//! Crop windows are centred on a point chosen by a
//! [`placement::FocusHeuristic`]. The stock [`placement::RuleOfThirds`] looks
//! only at orientation, never at content; a detector that does can be
//! plugged in through [`placement::Planner::with_focus`].
//!
//! ## One Frame Formula
//!
//! A frame's resolution band is derived from the device's native pixels:
//! `min = 0.75 × native`, `recommended = native`, `max = 3 × native`, and the
//! render canvas is the screen size in points times the display scale.

pub mod cache;
pub mod compatibility;
pub mod config;
pub mod engine;
pub mod frame;
pub mod imaging;
pub mod output;
pub mod placement;
pub mod report;
pub mod tone;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use engine::Engine;
