use anyhow::{Result, anyhow};
use clap::Parser;
use log::{debug, info};
use oxipack_core::{find_package_root, read_package_manifest};
use std::{env, path::PathBuf};

use crate::{
    context::{BuildContext, EntryPoint, PackageDescriptor, StagingDirs},
    rollup::{Plugins, RollupCli},
};

#[derive(Debug, Clone, Parser)]
#[command(about = "Bundle a compiled JavaScript package into flat ES module and UMD files")]
pub struct Config {
    /// Package root (defaults to the closest directory holding a package.json)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// ES2015 entry file to flatten (defaults to the manifest's entryFile, then index.js)
    #[arg(long)]
    pub entry: Option<PathBuf>,

    /// Output directory (defaults to <root>/dist)
    #[arg(long)]
    pub dest: Option<PathBuf>,

    /// Rollup executable (defaults to node_modules/.bin/rollup, then rollup on PATH)
    #[arg(long)]
    pub rollup: Option<PathBuf>,

    /// Inline this dependency instead of keeping it external (repeatable)
    #[arg(long = "embed", value_name = "MODULE_ID")]
    pub embedded: Vec<String>,

    /// UMD global name for an external module (repeatable)
    #[arg(long = "global", value_name = "MODULE_ID=GLOBAL", value_parser = parse_global)]
    pub globals: Vec<(String, String)>,

    /// Do not register @rollup/plugin-node-resolve
    #[arg(long)]
    pub no_node_resolve: bool,

    /// Do not register @rollup/plugin-commonjs
    #[arg(long)]
    pub no_commonjs: bool,
}

impl Config {
    /// Resolve the package root, searching upwards from the current directory when unset
    pub fn initialize(&mut self) -> Result<()> {
        let root = if let Some(r) = self.root.take() {
            debug!("Using provided root directory: {:?}", r);
            r.canonicalize().unwrap_or(r)
        } else {
            debug!("No root provided, searching for package.json");
            find_package_root(&env::current_dir()?)?
        };
        info!("Using package root: {}", root.display());
        self.root = Some(root);
        Ok(())
    }

    /// Get the root directory, returning an error if not initialized
    pub fn root(&self) -> Result<&PathBuf> {
        self.root
            .as_ref()
            .ok_or_else(|| anyhow!("Config not initialized - call initialize() first"))
    }

    /// Builds the pipeline context from the package manifest and the CLI flags.
    ///
    /// Flags extend the manifest's embedded list and global overrides, and
    /// replace its entry file.
    pub fn build_context(&self) -> Result<BuildContext> {
        let root = self.root()?.clone();
        let manifest = read_package_manifest(&root)?;

        let mut entry_point = EntryPoint::from_manifest(&root, &manifest);
        if let Some(entry) = &self.entry {
            entry_point.entry_file = root.join(entry);
        }
        entry_point.embedded.extend(self.embedded.iter().cloned());
        entry_point.umd_module_ids.extend(self.globals.iter().cloned());
        debug!(
            "Entry file {} with {} embedded modules and {} global overrides",
            entry_point.entry_file.display(),
            entry_point.embedded.len(),
            entry_point.umd_module_ids.len()
        );

        let staging = StagingDirs {
            working_directory: root.clone(),
            dest_directory: self
                .dest
                .as_ref()
                .map(|d| root.join(d))
                .unwrap_or_else(|| root.join("dist")),
        };
        let package = PackageDescriptor { name: manifest.name, version: manifest.version, root };

        Ok(BuildContext::new(package, entry_point, staging))
    }

    /// The rollup engine these flags describe.
    pub fn engine(&self) -> Result<RollupCli> {
        let engine = match &self.rollup {
            Some(bin) => RollupCli::new(bin),
            None => RollupCli::locate(self.root()?),
        };
        Ok(engine.with_plugins(Plugins {
            node_resolve: !self.no_node_resolve,
            commonjs: !self.no_commonjs,
        }))
    }
}

fn parse_global(s: &str) -> Result<(String, String), String> {
    let (module_id, global) =
        s.split_once('=').ok_or_else(|| format!("expected MODULE_ID=GLOBAL, got '{}'", s))?;
    if module_id.is_empty() || global.is_empty() {
        return Err(format!("expected MODULE_ID=GLOBAL, got '{}'", s));
    }
    Ok((module_id.to_string(), global.to_string()))
}
