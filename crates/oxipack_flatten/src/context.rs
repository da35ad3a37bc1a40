use log::debug;
use oxipack_core::PackageManifest;
use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};

use crate::types::{BundleFormat, BundleOptions, BundleResult};

/// Default ES2015 entry file, relative to the package root
pub const DEFAULT_ENTRY_FILE: &str = "index.js";

#[derive(Debug, Clone)]
pub struct PackageDescriptor {
    pub name: String,
    pub version: Option<String>,
    pub root: PathBuf,
}

/// The public surface being flattened and how to name its bundles.
#[derive(Debug, Clone)]
pub struct EntryPoint {
    pub module_id: String,
    /// Global the UMD bundle registers itself under
    pub umd_module_id: String,
    /// Base file name of the produced bundles
    pub flat_module_file: String,
    pub entry_file: PathBuf,
    pub embedded: HashSet<String>,
    pub umd_module_ids: HashMap<String, String>,
}

impl EntryPoint {
    pub fn from_manifest(root: &Path, manifest: &PackageManifest) -> Self {
        let bundle = &manifest.bundle;
        let module_id = manifest.name.clone();
        let entry_point = Self {
            umd_module_id: bundle
                .umd_id
                .clone()
                .unwrap_or_else(|| flatten_module_id(&module_id, ".")),
            flat_module_file: bundle
                .flat_module_file
                .clone()
                .unwrap_or_else(|| flatten_module_id(&module_id, "-")),
            entry_file: root.join(bundle.entry_file.as_deref().unwrap_or(DEFAULT_ENTRY_FILE)),
            embedded: bundle.embedded.iter().cloned().collect(),
            umd_module_ids: bundle.umd_module_ids.clone(),
            module_id,
        };
        debug!(
            "Entry point {} (UMD id {}, flat module file {})",
            entry_point.module_id, entry_point.umd_module_id, entry_point.flat_module_file
        );
        entry_point
    }
}

/// `@acme/ui` -> `acme<sep>ui`
pub fn flatten_module_id(module_id: &str, separator: &str) -> String {
    module_id.trim_start_matches('@').split('/').collect::<Vec<_>>().join(separator)
}

#[derive(Debug, Clone)]
pub struct StagingDirs {
    /// Directory the bundler runs in and resolves `node_modules` from
    pub working_directory: PathBuf,
    /// Directory the bundles are written to
    pub dest_directory: PathBuf,
}

/// Files produced so far by the pipeline steps.
#[derive(Debug, Clone, Default)]
pub struct Artefacts {
    pub fesm_bundle_file: Option<PathBuf>,
    pub umd_bundle_file: Option<PathBuf>,
    pub results: Vec<BundleResult>,
}

/// State shared by the pipeline steps of one package build.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub staging: StagingDirs,
    pub entry_point: EntryPoint,
    pub package: PackageDescriptor,
    pub artefacts: Artefacts,
}

impl BuildContext {
    pub fn new(package: PackageDescriptor, entry_point: EntryPoint, staging: StagingDirs) -> Self {
        Self { staging, entry_point, package, artefacts: Artefacts::default() }
    }

    /// `<dest>/<flatModuleFile>.js`
    pub fn fesm_dest(&self) -> PathBuf {
        self.staging.dest_directory.join(format!("{}.js", self.entry_point.flat_module_file))
    }

    /// `<dest>/bundles/<flatModuleFile>.umd.js`
    pub fn umd_dest(&self) -> PathBuf {
        self.staging
            .dest_directory
            .join("bundles")
            .join(format!("{}.umd.js", self.entry_point.flat_module_file))
    }

    /// Records a flat ES bundle left by an earlier run, if there is one.
    pub fn adopt_existing_fesm(&mut self) -> bool {
        let fesm = self.fesm_dest();
        if fesm.is_file() {
            debug!("Reusing flat ES module bundle {}", fesm.display());
            self.artefacts.fesm_bundle_file = Some(fesm);
            true
        } else {
            false
        }
    }

    pub(crate) fn bundle_options(
        &self,
        module_name: &str,
        entry: PathBuf,
        format: BundleFormat,
        dest: PathBuf,
    ) -> BundleOptions {
        BundleOptions {
            module_name: module_name.to_string(),
            entry,
            format,
            dest,
            working_directory: self.staging.working_directory.clone(),
            umd_module_ids: self.entry_point.umd_module_ids.clone(),
            embedded: self.entry_point.embedded.clone(),
        }
    }
}
