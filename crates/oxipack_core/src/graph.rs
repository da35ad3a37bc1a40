use anyhow::{Context, Result};
use dashmap::DashMap;
use log::{debug, trace};
use rayon::prelude::*;
use std::{
    collections::{BTreeSet, HashSet},
    path::{Path, PathBuf},
};

use crate::{
    constants::JS_TS_EXTENSIONS, parser::imports_for, resolver::resolve, types::Specifier,
};

/// What the bundler will meet when it walks the graph below an entry file.
#[derive(Debug, Clone, Default)]
pub struct ModuleGraphScan {
    /// Files that get inlined into the bundle, entry first, in discovery order
    pub modules: Vec<PathBuf>,
    /// Identifiers kept as external references
    pub externals: BTreeSet<String>,
    /// Inlined requests that could not be found on disk
    pub unresolved: BTreeSet<String>,
}

/// Walks the module graph below `entry` the way the bundler will.
///
/// Every request is first passed to `is_external`. External identifiers are
/// collected and not followed; everything else is resolved and scanned in
/// turn. Each breadth-first frontier is parsed in parallel.
pub fn scan_module_graph<F>(root: &Path, entry: &Path, is_external: F) -> Result<ModuleGraphScan>
where
    F: Fn(&str) -> bool + Sync,
{
    let entry = entry
        .canonicalize()
        .with_context(|| format!("Entry file {} does not exist", entry.display()))?;
    debug!("Scanning module graph from {}", entry.display());

    let import_cache: DashMap<PathBuf, Vec<Specifier>> = DashMap::new();
    let resolve_cache: DashMap<(PathBuf, String), Option<PathBuf>> = DashMap::new();

    let mut scan = ModuleGraphScan::default();
    let mut visited: HashSet<PathBuf> = HashSet::new();
    visited.insert(entry.clone());
    scan.modules.push(entry.clone());

    let mut frontier = vec![entry];
    let mut depth = 0;

    while !frontier.is_empty() {
        trace!("Scanning frontier {} with {} modules", depth, frontier.len());

        // Any unscannable file fails the scan; its externals would go missing
        let edges: Vec<(PathBuf, Vec<Specifier>)> = frontier
            .par_iter()
            .filter(|file| is_scannable(file))
            .map(|file| {
                imports_for(file, &import_cache)
                    .map(|specs| (file.clone(), specs))
                    .with_context(|| format!("Failed to scan imports of {}", file.display()))
            })
            .collect::<Result<_>>()?;

        let mut next = Vec::new();
        for (file, specs) in edges {
            for spec in specs {
                if is_external(&spec.request) {
                    trace!("'{}' stays external", spec.request);
                    scan.externals.insert(spec.request);
                    continue;
                }

                match resolve(root, &file, &spec.request, &resolve_cache)? {
                    Some(resolved) => {
                        if visited.insert(resolved.clone()) {
                            trace!("Adding to frontier: {}", resolved.display());
                            scan.modules.push(resolved.clone());
                            next.push(resolved);
                        }
                    }
                    None => {
                        trace!("Could not resolve '{}' from {}", spec.request, file.display());
                        scan.unresolved.insert(spec.request);
                    }
                }
            }
        }

        frontier = next;
        depth += 1;
    }

    debug!(
        "Module graph has {} inlined modules, {} externals, {} unresolved",
        scan.modules.len(),
        scan.externals.len(),
        scan.unresolved.len()
    );
    Ok(scan)
}

/// JSON, stylesheets and other assets are handed to bundler plugins as-is.
fn is_scannable(file: &Path) -> bool {
    file.extension().and_then(|e| e.to_str()).is_some_and(|ext| JS_TS_EXTENSIONS.contains(&ext))
}
