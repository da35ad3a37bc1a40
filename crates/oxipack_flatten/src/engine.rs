use anyhow::Result;
use serde::Deserialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    future::Future,
    path::PathBuf,
};

use crate::types::BundleFormat;

/// Rollup rewrites a top-level `this` to `undefined` in ES and UMD output.
/// Compiler output hits this on every decorator helper, so it is not worth
/// reporting.
pub const THIS_IS_UNDEFINED: &str = "THIS_IS_UNDEFINED";

/// A warning raised by the bundler while building or writing a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Diagnostic {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn is_this_is_undefined(&self) -> bool {
        self.code.as_deref() == Some(THIS_IS_UNDEFINED)
    }
}

/// A bundling request.
///
/// The engine must apply the externality rules of [`crate::is_external`]
/// with `embedded` to every identifier it meets. `externals` is what a scan
/// of the graph found ahead of time and `globals` names those for UMD output.
#[derive(Debug, Clone)]
pub struct BundleJob {
    pub module_name: String,
    pub entry: PathBuf,
    pub dest: PathBuf,
    pub format: BundleFormat,
    pub working_directory: PathBuf,
    pub embedded: BTreeSet<String>,
    pub externals: BTreeSet<String>,
    pub globals: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct BundleReport {
    pub diagnostics: Vec<Diagnostic>,
}

/// The bundler doing the actual graph building and code generation.
///
/// `bundle` must write the bundle to `job.dest` and its source map next to
/// it, and fail if either cannot be produced.
pub trait BundleEngine {
    /// Version string, used for logging only
    fn version(&self) -> impl Future<Output = Result<String>>;

    fn bundle(&self, job: &BundleJob) -> impl Future<Output = Result<BundleReport>>;
}
