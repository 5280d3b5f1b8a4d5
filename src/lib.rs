//! # Rescore
//!
//! A CLI application for ATS résumé analysis against a remote scoring backend.
//!
//! ## Features
//!
//! - **Canonical results**: Normalizes every backend response shape into a typed `AnalysisResult`
//! - **Graceful degradation**: Backend failures substitute a fallback result, never a dead end
//! - **Best-effort email**: Report delivery via EmailJS runs fire-and-forget, never gating the flow

pub mod analysis;
pub mod client;
pub mod config;
pub mod form;
pub mod notifier;
pub mod orchestrator;
pub mod render;
pub mod storage;

pub use analysis::{AnalysisRequest, AnalysisResult};
pub use config::Config;
pub use orchestrator::{AnalysisState, Orchestrator};
pub use storage::Storage;
