use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    fmt,
    path::PathBuf,
};

/// Output module format of a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleFormat {
    /// Flat ES module
    Es,
    /// Universal module definition, usable as AMD, CommonJS or a global
    Umd,
}

impl BundleFormat {
    /// Name the bundler knows the format by
    pub fn as_str(&self) -> &'static str {
        match self {
            BundleFormat::Es => "es",
            BundleFormat::Umd => "umd",
        }
    }
}

impl fmt::Display for BundleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to produce one bundle.
#[derive(Debug, Clone)]
pub struct BundleOptions {
    /// Logical module name; the global a UMD bundle registers itself under
    pub module_name: String,
    pub entry: PathBuf,
    pub format: BundleFormat,
    pub dest: PathBuf,
    /// Package root, used for `node_modules` lookups and as the bundler's cwd
    pub working_directory: PathBuf,
    pub umd_module_ids: HashMap<String, String>,
    pub embedded: HashSet<String>,
}

#[derive(Debug, Clone)]
pub struct BundleResult {
    pub dest: PathBuf,
    pub source_map: PathBuf,
    pub format: BundleFormat,
    pub externals: BTreeSet<String>,
    /// Globals handed to the bundler, keyed by external identifier
    pub globals: BTreeMap<String, String>,
    pub modules_inlined: usize,
    /// Diagnostics forwarded to the log
    pub warnings: usize,
}
