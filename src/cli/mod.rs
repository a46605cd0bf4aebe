//! Command-line interface
//!
//! One subcommand per stage plus `run` (all three in order) and `status`.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::artifacts::{ArtifactLayout, PipelineState};
use crate::config::{load_params, ParamSet, DEFAULT_PARAMS_PATH};
use crate::stages::{self, MetricsReport, PreprocessSummary};
use crate::training::Manifest;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn kv(key: &str, val: &str) {
    println!("  {:<18} {}", muted(key), val.white());
}

fn step_ok(msg: &str, detail: &str) {
    println!("  {} {} {}", ok("✓"), msg, dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "regpipe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Three-stage tabular regression pipeline: preprocess, train, evaluate")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split the raw dataset and write standardized / one-hot encoded tables
    Preprocess {
        /// Parameter document
        #[arg(short, long, default_value = DEFAULT_PARAMS_PATH)]
        params: PathBuf,
    },

    /// Train every configured candidate and keep the lowest training RMSE
    Train {
        /// Parameter document
        #[arg(short, long, default_value = DEFAULT_PARAMS_PATH)]
        params: PathBuf,
    },

    /// Score the best model on the test split and write metrics.json
    Evaluate {
        /// Parameter document
        #[arg(short, long, default_value = DEFAULT_PARAMS_PATH)]
        params: PathBuf,
    },

    /// Run preprocess, train and evaluate in order
    Run {
        /// Parameter document
        #[arg(short, long, default_value = DEFAULT_PARAMS_PATH)]
        params: PathBuf,
    },

    /// Show which stages have produced their artifacts
    Status,
}

// ─── Output ────────────────────────────────────────────────────────────────────

fn print_preprocess(summary: &PreprocessSummary) {
    kv("Rows", &format!("{} ({} train / {} test)", summary.n_rows, summary.n_train, summary.n_test));
    kv("Numeric", &summary.numeric_columns.len().to_string());
    kv("Categorical", &summary.categorical_columns.len().to_string());
    if !summary.dropped_columns.is_empty() {
        kv("Dropped", &summary.dropped_columns.join(", ").yellow().to_string());
    }
    kv("Features out", &summary.feature_names.len().to_string());
}

fn print_manifest(manifest: &Manifest) {
    for record in &manifest.all_models {
        let marker = if record.model_name == manifest.best_model_name { ok("★") } else { dim("·") };
        println!(
            "  {} {:<24} {:<20} {}",
            marker,
            record.model_name.white(),
            muted(&record.model_type),
            format!("{:.6}", record.rmse_train).white()
        );
    }
    println!();
    kv("Best model", &manifest.best_model_name.cyan().bold().to_string());
    kv("Train RMSE", &format!("{:.6}", manifest.best_rmse_train));
}

fn print_report(report: &MetricsReport) {
    kv("Model", &report.best_model_name);
    kv("Primary metric", &report.primary_metric);
    kv("Test RMSE", &format!("{:.6}", report.rmse).bold().to_string());
    kv("Test R²", &format!("{:.6}", report.r2).bold().to_string());
}

// ─── Commands ──────────────────────────────────────────────────────────────────

fn load(params_path: &Path) -> anyhow::Result<ParamSet> {
    Ok(load_params(params_path)?)
}

pub fn cmd_preprocess(params_path: &Path) -> anyhow::Result<()> {
    let params = load(params_path)?;
    let layout = ArtifactLayout::default();

    section("Preprocess");
    let start = Instant::now();
    let summary = stages::preprocess::run(&params, &layout)?;
    step_ok("Wrote processed tables", &format!("{:?}", start.elapsed()));
    print_preprocess(&summary);
    println!();
    Ok(())
}

pub fn cmd_train(params_path: &Path) -> anyhow::Result<()> {
    let params = load(params_path)?;
    let layout = ArtifactLayout::default();

    section("Train");
    let start = Instant::now();
    let manifest = stages::train::run(&params, &layout)?;
    step_ok("Saved best model and manifest", &format!("{:?}", start.elapsed()));
    print_manifest(&manifest);
    println!();
    Ok(())
}

pub fn cmd_evaluate(params_path: &Path) -> anyhow::Result<()> {
    let params = load(params_path)?;
    let layout = ArtifactLayout::default();

    section("Evaluate");
    let start = Instant::now();
    let report = stages::evaluate::run(&params, &layout)?;
    step_ok("Wrote metrics report", &format!("{:?}", start.elapsed()));
    print_report(&report);
    println!();
    Ok(())
}

pub fn cmd_run(params_path: &Path) -> anyhow::Result<()> {
    cmd_preprocess(params_path)?;
    cmd_train(params_path)?;
    cmd_evaluate(params_path)
}

pub fn cmd_status() -> anyhow::Result<()> {
    let layout = ArtifactLayout::default();
    let state = layout.state();

    section("Status");
    let artifacts = [
        ("X_train", layout.x_train()),
        ("X_test", layout.x_test()),
        ("y_train", layout.y_train()),
        ("y_test", layout.y_test()),
        ("best model", layout.best_model()),
        ("manifest", layout.manifest()),
        ("metrics", layout.metrics_report()),
    ];
    for (label, path) in &artifacts {
        let marker = if path.is_file() { ok("✓") } else { dim("✗") };
        println!("  {} {:<12} {}", marker, label, dim(&path.display().to_string()));
    }
    println!();

    let rendered = state.to_string();
    let state_str = match state {
        PipelineState::Evaluated => rendered.green().bold(),
        PipelineState::NotStarted => rendered.yellow(),
        _ => rendered.cyan(),
    };
    kv("State", &state_str.to_string());
    println!();
    Ok(())
}
