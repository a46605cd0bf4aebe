//! Pipeline stages
//!
//! Each stage is a one-shot function of the parameter set and the artifact
//! layout. Stages share nothing in memory: the feature transformer writes
//! processed tables, the trainer reads them and writes the best model and a
//! manifest, the evaluator reads all of those and writes the metrics report.
//! A failing stage returns before writing any of its outputs.

pub mod evaluate;
pub mod preprocess;
pub mod train;

pub use evaluate::{evaluate_model, MetricsReport};
pub use preprocess::PreprocessSummary;

use crate::artifacts::ArtifactLayout;
use crate::config::ParamSet;
use crate::error::Result;
use crate::training::Manifest;

/// Outputs of a full run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub preprocess: PreprocessSummary,
    pub manifest: Manifest,
    pub report: MetricsReport,
}

/// Run the three stages in order, stopping at the first failure.
pub fn run_all(params: &ParamSet, layout: &ArtifactLayout) -> Result<RunSummary> {
    let preprocess = preprocess::run(params, layout)?;
    let manifest = train::run(params, layout)?;
    let report = evaluate::run(params, layout)?;
    Ok(RunSummary {
        preprocess,
        manifest,
        report,
    })
}
