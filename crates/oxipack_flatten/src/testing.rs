//! Test doubles shared by the unit tests of this crate.

use anyhow::{Result, bail};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::{
    bundle::source_map_path,
    engine::{BundleEngine, BundleJob, BundleReport, Diagnostic},
};

/// Records every job and writes placeholder output instead of bundling.
#[derive(Default)]
pub(crate) struct FakeEngine {
    jobs: Mutex<Vec<BundleJob>>,
    diagnostics: Vec<Diagnostic>,
    failure: Option<String>,
}

impl FakeEngine {
    pub(crate) fn with_diagnostics(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics, ..Default::default() }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self { failure: Some(message.to_string()), ..Default::default() }
    }

    pub(crate) fn jobs(&self) -> Vec<BundleJob> {
        self.jobs.lock().unwrap().clone()
    }
}

impl BundleEngine for FakeEngine {
    async fn version(&self) -> Result<String> {
        Ok("0.0.0-test".to_string())
    }

    async fn bundle(&self, job: &BundleJob) -> Result<BundleReport> {
        self.jobs.lock().unwrap().push(job.clone());
        if let Some(message) = &self.failure {
            bail!("{}", message);
        }
        if let Some(parent) = job.dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&job.dest, format!("// {} bundle of {}\n", job.format, job.module_name))?;
        fs::write(source_map_path(&job.dest), "{\"version\":3,\"mappings\":\"\"}")?;
        Ok(BundleReport { diagnostics: self.diagnostics.clone() })
    }
}

pub(crate) fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
    let file_path = dir.join(path);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    fs::write(&file_path, content).expect("Failed to write test file");
    file_path.canonicalize().unwrap()
}
