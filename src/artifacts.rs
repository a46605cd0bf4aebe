//! File locations shared by the three stages
//!
//! Stages never talk to each other directly; each one reads the files the
//! previous stage left under a common root and writes its own.

use crate::error::{PipelineError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

const PROCESSED_DIR: &str = "data/processed";
const MODELS_DIR: &str = "models";

/// Conventional artifact paths under a root directory
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    root: PathBuf,
}

impl Default for ArtifactLayout {
    fn default() -> Self {
        Self::new(".")
    }
}

impl ArtifactLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a configured path; relative paths are taken from the root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.root.join(PROCESSED_DIR)
    }

    pub fn x_train(&self) -> PathBuf {
        self.processed_dir().join("X_train.csv")
    }

    pub fn x_test(&self) -> PathBuf {
        self.processed_dir().join("X_test.csv")
    }

    pub fn y_train(&self) -> PathBuf {
        self.processed_dir().join("y_train.csv")
    }

    pub fn y_test(&self) -> PathBuf {
        self.processed_dir().join("y_test.csv")
    }

    pub fn models_dir(&self) -> PathBuf {
        self.root.join(MODELS_DIR)
    }

    pub fn best_model(&self) -> PathBuf {
        self.models_dir().join("best_model.bin")
    }

    pub fn manifest(&self) -> PathBuf {
        self.models_dir().join("best_model_info.json")
    }

    pub fn metrics_report(&self) -> PathBuf {
        self.root.join("metrics.json")
    }

    /// Inspect which artifacts exist and derive how far the pipeline got.
    pub fn state(&self) -> PipelineState {
        let all_exist = |paths: &[PathBuf]| paths.iter().all(|p| p.is_file());

        let transformed = all_exist(&[self.x_train(), self.x_test(), self.y_train(), self.y_test()]);
        let trained = transformed && all_exist(&[self.best_model(), self.manifest()]);
        let evaluated = trained && self.metrics_report().is_file();

        if evaluated {
            PipelineState::Evaluated
        } else if trained {
            PipelineState::Trained
        } else if transformed {
            PipelineState::Transformed
        } else {
            PipelineState::NotStarted
        }
    }
}

/// Progress of the pipeline as recorded on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineState {
    NotStarted,
    Transformed,
    Trained,
    Evaluated,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineState::NotStarted => "NOT_STARTED",
            PipelineState::Transformed => "TRANSFORMED",
            PipelineState::Trained => "TRAINED",
            PipelineState::Evaluated => "EVALUATED",
        };
        f.write_str(s)
    }
}

/// Fail with `MissingArtifact` unless `path` is an existing file.
pub fn require(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PipelineError::MissingArtifact { path: path.to_path_buf() })
    }
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Write a value as pretty JSON, replacing any previous file.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Read a JSON artifact written by an upstream stage.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    require(path)?;
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_paths_follow_convention() {
        let layout = ArtifactLayout::new("/work");
        assert_eq!(layout.x_train(), PathBuf::from("/work/data/processed/X_train.csv"));
        assert_eq!(layout.y_test(), PathBuf::from("/work/data/processed/y_test.csv"));
        assert_eq!(layout.best_model(), PathBuf::from("/work/models/best_model.bin"));
        assert_eq!(layout.manifest(), PathBuf::from("/work/models/best_model_info.json"));
        assert_eq!(layout.metrics_report(), PathBuf::from("/work/metrics.json"));
    }

    #[test]
    fn test_resolve() {
        let layout = ArtifactLayout::new("/work");
        assert_eq!(layout.resolve(Path::new("raw.csv")), PathBuf::from("/work/raw.csv"));
        assert_eq!(layout.resolve(Path::new("/abs/raw.csv")), PathBuf::from("/abs/raw.csv"));
    }

    #[test]
    fn test_state_progression() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ArtifactLayout::new(dir.path());
        assert_eq!(layout.state(), PipelineState::NotStarted);

        std::fs::create_dir_all(layout.processed_dir()).unwrap();
        for p in [layout.x_train(), layout.x_test(), layout.y_train(), layout.y_test()] {
            std::fs::write(p, "a\n1.0\n").unwrap();
        }
        assert_eq!(layout.state(), PipelineState::Transformed);

        std::fs::create_dir_all(layout.models_dir()).unwrap();
        std::fs::write(layout.best_model(), b"x").unwrap();
        assert_eq!(layout.state(), PipelineState::Transformed);
        std::fs::write(layout.manifest(), "{}").unwrap();
        assert_eq!(layout.state(), PipelineState::Trained);

        std::fs::write(layout.metrics_report(), "{}").unwrap();
        assert_eq!(layout.state(), PipelineState::Evaluated);
        assert_eq!(layout.state().to_string(), "EVALUATED");
    }

    #[test]
    fn test_json_round_trip_and_missing() {
        #[derive(Serialize, Deserialize, PartialEq, Debug)]
        struct Doc {
            value: f64,
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/doc.json");
        assert!(matches!(
            read_json::<Doc>(&path),
            Err(PipelineError::MissingArtifact { .. })
        ));

        write_json(&path, &Doc { value: 1.5 }).unwrap();
        assert_eq!(read_json::<Doc>(&path).unwrap(), Doc { value: 1.5 });
    }

    #[test]
    fn test_json_floats_read_back_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("floats.json");
        let values = vec![1.1380833204734033_f64, 0.1 + 0.2, 2.0_f64.sqrt(), 1e-300];

        write_json(&path, &values).unwrap();
        let back: Vec<f64> = read_json(&path).unwrap();
        for (a, b) in values.iter().zip(&back) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }
}
