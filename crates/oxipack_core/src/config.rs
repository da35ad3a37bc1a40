use anyhow::{Context, Result, anyhow};
use log::{debug, trace};
use serde::Deserialize;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

/// The parts of a `package.json` the bundling steps read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageManifest {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, rename = "oxipack")]
    pub bundle: BundleManifest,
}

/// Optional `"oxipack"` section of `package.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleManifest {
    /// ES2015 entry file, relative to the package root
    pub entry_file: Option<String>,
    /// Base name of the produced bundle files
    pub flat_module_file: Option<String>,
    /// Global name the UMD bundle registers itself under
    pub umd_id: Option<String>,
    /// Explicit UMD global names for external modules
    #[serde(default)]
    pub umd_module_ids: HashMap<String, String>,
    /// Dependencies to inline instead of keeping external
    #[serde(default)]
    pub embedded: Vec<String>,
}

/// Finds the closest directory at or above `start` that holds a `package.json`.
pub fn find_package_root(start: &Path) -> Result<PathBuf> {
    debug!("Searching for package root from: {:?}", start);
    let mut current_dir = start.to_path_buf();

    loop {
        let manifest = current_dir.join("package.json");
        trace!("Checking for package.json at: {:?}", manifest);
        if manifest.is_file() {
            debug!("Found package root at: {:?}", current_dir);
            return Ok(current_dir);
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => {
                return Err(anyhow!(
                    "Could not find package.json in {} or any parent folder",
                    start.display()
                ));
            }
        }
    }
}

pub fn read_package_manifest(root: &Path) -> Result<PackageManifest> {
    let path = root.join("package.json");
    debug!("Reading package manifest: {}", path.display());
    let content =
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let manifest: PackageManifest = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    if manifest.name.is_empty() {
        return Err(anyhow!("{} has no package name", path.display()));
    }
    debug!(
        "Loaded manifest for {} ({} embedded, {} UMD global overrides)",
        manifest.name,
        manifest.bundle.embedded.len(),
        manifest.bundle.umd_module_ids.len()
    );
    Ok(manifest)
}
