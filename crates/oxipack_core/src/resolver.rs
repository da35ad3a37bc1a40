use anyhow::Result;
use dashmap::DashMap;
use log::{debug, trace};
use path_clean::clean;
use serde_json::Value;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::constants::{INDEX_FILES, MAIN_FIELDS, RESOLVE_EXTENSIONS};

/// Resolves `request` as seen from `from_file` to a file on disk.
///
/// Relative and absolute requests are joined onto the importing file's
/// directory. Anything else is looked up in `node_modules`, walking up from
/// the importing file until `root` is passed. Returns `Ok(None)` when the
/// request cannot be found.
pub fn resolve(
    root: &Path,
    from_file: &Path,
    request: &str,
    cache: &DashMap<(PathBuf, String), Option<PathBuf>>,
) -> Result<Option<PathBuf>> {
    let key = (from_file.to_path_buf(), request.to_string());
    if let Some(v) = cache.get(&key) {
        trace!("Cache hit for resolve: '{}' from {}", request, from_file.display());
        return Ok(v.clone());
    }
    trace!("Resolving: '{}' from {}", request, from_file.display());

    let resolved = if request.starts_with("./")
        || request.starts_with("../")
        || request == "."
        || request == ".."
        || Path::new(request).is_absolute()
    {
        let base = from_file.parent().unwrap_or(root);
        let p = clean(base.join(request).to_string_lossy().to_string());
        let result = resolve_file(Path::new(&p));
        if result.is_none() {
            trace!("Failed to resolve relative import '{}'", request);
        }
        result
    } else {
        trace!("Resolving as node_modules package: '{}'", request);
        let start_dir = from_file.parent().unwrap_or(root);
        let result = resolve_node_module_from_dir(start_dir, request, root);
        if result.is_none() {
            trace!("Failed to resolve node_modules package '{}'", request);
        }
        result
    };

    cache.insert(key, resolved.clone());
    if let Some(r) = &resolved {
        debug!("Resolved '{}' from {} to {}", request, from_file.display(), r.display());
    }
    Ok(resolved)
}

fn resolve_file(p: &Path) -> Option<PathBuf> {
    if p.is_file() {
        return Some(p.canonicalize().unwrap_or_else(|_| p.to_path_buf()));
    }

    for ext in RESOLVE_EXTENSIONS {
        let candidate = PathBuf::from(format!("{}.{}", p.display(), ext));
        if candidate.is_file() {
            return Some(candidate.canonicalize().unwrap_or(candidate));
        }
    }

    if p.is_dir() {
        if let Some(resolved) = resolve_package_dir(p) {
            return Some(resolved);
        }
        for index_file in INDEX_FILES {
            let candidate = p.join(index_file);
            if candidate.is_file() {
                return Some(candidate.canonicalize().unwrap_or(candidate));
            }
        }
    }

    None
}

fn resolve_node_module_from_dir(
    start_dir: &Path,
    request: &str,
    workspace_root: &Path,
) -> Option<PathBuf> {
    trace!("Walking up from {:?} to find node_modules for '{}'", start_dir, request);
    let mut current_dir = start_dir;

    loop {
        let candidate = current_dir.join("node_modules").join(request);
        if let Some(resolved) = resolve_file(&candidate) {
            return Some(resolved);
        }

        // Stop at workspace root
        if current_dir == workspace_root {
            break;
        }

        current_dir = current_dir.parent()?;
    }

    None
}

/// Reads the entry point a directory's own `package.json` advertises.
///
/// Covers package roots (`node_modules/tslib`) as well as secondary entry
/// points that ship a nested manifest (`node_modules/rxjs/operators`).
fn resolve_package_dir(dir: &Path) -> Option<PathBuf> {
    let pkg_json = dir.join("package.json");
    let txt = fs::read_to_string(&pkg_json).ok()?;
    let v = serde_json::from_str::<Value>(&txt).ok()?;
    trace!("Checking package manifest at: {:?}", pkg_json);

    if let Some(exports) = v.get("exports")
        && let Some(resolved) = exports_entry(exports).and_then(|s| resolve_in(dir, s))
    {
        return Some(resolved);
    }

    for field in MAIN_FIELDS {
        if let Some(s) = v.get(*field).and_then(|x| x.as_str())
            && let Some(resolved) = resolve_in(dir, s)
        {
            return Some(resolved);
        }
    }

    None
}

fn exports_entry(exports: &Value) -> Option<&str> {
    if let Some(s) = exports.as_str() {
        return Some(s);
    }
    let obj = exports.as_object()?;
    let dot = obj.get(".").unwrap_or(exports);
    if let Some(s) = dot.as_str() {
        return Some(s);
    }
    let conditions = dot.as_object()?;
    ["import", "module", "default", "require"]
        .iter()
        .find_map(|key| conditions.get(*key).and_then(|x| x.as_str()))
}

fn resolve_in(dir: &Path, target: &str) -> Option<PathBuf> {
    let p = dir.join(target.trim_start_matches("./"));
    // A manifest pointing back at its own directory must not recurse
    if p == dir {
        return None;
    }
    resolve_file(&p)
}
