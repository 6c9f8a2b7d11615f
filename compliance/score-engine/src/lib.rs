//! Compliance score engine.
//!
//! Reads the compliance sources, turns each into a per-category percentage,
//! and combines them with configured weights into a 0-100 score.
//! No network; every call re-reads its inputs.

pub mod collect;
pub mod config;
pub mod error;
pub mod render;
pub mod score;
pub mod types;
pub mod validate;

use compliance_registers::Paths;

pub use collect::collect;
pub use config::ScoreConfig;
pub use error::ScoreError;
pub use render::{render, ReportFormat};
pub use score::compute;
pub use types::{CategoryData, CategoryInput, CategoryScore, Gap, Inputs, ScoreResult};
pub use validate::validate;

/// Collect and score in one step.
pub fn run(paths: &Paths, config: &ScoreConfig) -> Result<ScoreResult, ScoreError> {
  let inputs = collect(paths, config)?;
  compute(config, &inputs)
}
