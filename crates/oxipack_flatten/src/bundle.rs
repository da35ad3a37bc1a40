use anyhow::{Context, Result};
use log::{debug, trace, warn};
use oxipack_core::scan_module_graph;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use crate::{
    engine::{BundleEngine, BundleJob, Diagnostic},
    external::is_external,
    globals::umd_global_name,
    types::{BundleFormat, BundleOptions, BundleResult},
};

/// Bundles `opts.entry` into a single file at `opts.dest`.
///
/// The module graph is scanned first to learn the external identifiers and
/// their UMD globals; the engine still classifies every id it meets itself.
/// Engine failures are returned as they are; diagnostics are logged and
/// never fail the bundle.
pub async fn rollup_bundle_file<E: BundleEngine>(
    engine: &E,
    opts: &BundleOptions,
) -> Result<BundleResult> {
    let version = match engine.version().await {
        Ok(v) => v,
        Err(e) => {
            debug!("Could not determine rollup version: {}", e);
            "unknown".to_string()
        }
    };
    debug!(
        "rollup (v{}) {} to {} ({})",
        version,
        opts.entry.display(),
        opts.dest.display(),
        opts.format
    );

    let root = opts.working_directory.clone();
    let entry = opts.entry.clone();
    let embedded = opts.embedded.clone();
    let scan = tokio::task::spawn_blocking(move || {
        scan_module_graph(&root, &entry, |id| is_external(id, &embedded))
    })
    .await
    .context("Module graph scan did not complete")??;

    for request in &scan.unresolved {
        debug!("'{}' was not found on disk, leaving it to rollup", request);
    }

    let globals: BTreeMap<String, String> = scan
        .externals
        .iter()
        .filter_map(|id| umd_global_name(id, &opts.umd_module_ids).map(|name| (id.clone(), name)))
        .collect();
    if opts.format == BundleFormat::Umd {
        for id in scan.externals.iter().filter(|id| !globals.contains_key(*id)) {
            trace!("No global name for '{}', rollup will guess one", id);
        }
    }

    let job = BundleJob {
        module_name: opts.module_name.clone(),
        entry: opts.entry.clone(),
        dest: opts.dest.clone(),
        format: opts.format,
        working_directory: opts.working_directory.clone(),
        embedded: opts.embedded.iter().cloned().collect(),
        externals: scan.externals.clone(),
        globals: globals.clone(),
    };
    let report = engine.bundle(&job).await?;
    let warnings = forward_diagnostics(&report.diagnostics);

    Ok(BundleResult {
        dest: opts.dest.clone(),
        source_map: source_map_path(&opts.dest),
        format: opts.format,
        externals: scan.externals,
        globals,
        modules_inlined: scan.modules.len(),
        warnings,
    })
}

/// Logs diagnostics as warnings, except the expected `THIS_IS_UNDEFINED`.
///
/// Returns how many were forwarded.
pub fn forward_diagnostics(diagnostics: &[Diagnostic]) -> usize {
    let mut forwarded = 0;
    for diagnostic in diagnostics {
        if diagnostic.is_this_is_undefined() {
            trace!("Ignoring rollup diagnostic: {}", diagnostic.message);
            continue;
        }
        warn!("{}", diagnostic.message);
        forwarded += 1;
    }
    forwarded
}

/// `dist/x.umd.js` -> `dist/x.umd.js.map`
pub fn source_map_path(dest: &Path) -> PathBuf {
    let mut path = dest.as_os_str().to_owned();
    path.push(".map");
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeEngine, create_test_file};
    use std::collections::{HashMap, HashSet};
    use tempfile::TempDir;

    fn options(root: &Path, entry: PathBuf, format: BundleFormat) -> BundleOptions {
        BundleOptions {
            module_name: "acme.ui".to_string(),
            entry,
            format,
            dest: root.join("dist").join("acme-ui.js"),
            working_directory: root.to_path_buf(),
            umd_module_ids: HashMap::new(),
            embedded: HashSet::new(),
        }
    }

    #[tokio::test]
    async fn test_bundle_passes_externals_and_globals() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let entry = create_test_file(
            root,
            "build/index.js",
            "export * from './button';\nimport { Observable } from 'rxjs/Observable';\nimport 'lodash';",
        );
        create_test_file(root, "build/button.js", "import { Component } from '@angular/core';");

        let engine = FakeEngine::default();
        let mut opts = options(root, entry, BundleFormat::Umd);
        opts.umd_module_ids.insert("lodash".to_string(), "_".to_string());

        let result = rollup_bundle_file(&engine, &opts).await.unwrap();

        let jobs = engine.jobs();
        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        let externals: Vec<&str> = job.externals.iter().map(String::as_str).collect();
        assert_eq!(externals, vec!["@angular/core", "lodash", "rxjs/Observable"]);
        assert_eq!(job.globals.get("@angular/core").map(String::as_str), Some("ng.core"));
        assert_eq!(job.globals.get("rxjs/Observable").map(String::as_str), Some("Rx"));
        assert_eq!(job.globals.get("lodash").map(String::as_str), Some("_"));
        assert_eq!(job.format, BundleFormat::Umd);
        assert_eq!(job.module_name, "acme.ui");

        assert_eq!(result.modules_inlined, 2);
        assert_eq!(result.externals.len(), 3);
        assert!(result.dest.is_file());
        assert!(result.source_map.is_file());
    }

    #[tokio::test]
    async fn test_nested_requests_reach_the_engine() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let entry = create_test_file(
            root,
            "build/index.js",
            "export function lazy() { return import('@angular/router'); }\n\
export function legacy() { return require('moment'); }\n\
import '@angular/core';",
        );

        let engine = FakeEngine::default();
        let mut opts = options(root, entry, BundleFormat::Umd);
        opts.embedded.insert("tslib".to_string());
        rollup_bundle_file(&engine, &opts).await.unwrap();

        let job = &engine.jobs()[0];
        let externals: Vec<&str> = job.externals.iter().map(String::as_str).collect();
        assert_eq!(externals, vec!["@angular/core", "@angular/router", "moment"]);
        assert!(externals.iter().all(|id| is_external(id, &opts.embedded)));
        assert_eq!(job.globals.get("@angular/router").map(String::as_str), Some("ng.router"));
        assert!(job.embedded.contains("tslib"));
    }

    #[tokio::test]
    async fn test_embedded_modules_are_not_external() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let entry = create_test_file(
            root,
            "build/index.js",
            "import { __decorate } from 'tslib';\nimport { Injectable } from '@angular/core';",
        );
        create_test_file(root, "node_modules/tslib/tslib.es6.js", "export function __decorate() {}");
        create_test_file(
            root,
            "node_modules/tslib/package.json",
            r#"{ "name": "tslib", "module": "tslib.es6.js" }"#,
        );

        let engine = FakeEngine::default();
        let mut opts = options(root, entry, BundleFormat::Es);
        opts.embedded.insert("tslib".to_string());

        let result = rollup_bundle_file(&engine, &opts).await.unwrap();
        let job = &engine.jobs()[0];
        assert!(!job.externals.contains("tslib"));
        assert!(job.externals.contains("@angular/core"));
        assert_eq!(result.modules_inlined, 2);
    }

    #[tokio::test]
    async fn test_this_is_undefined_is_swallowed() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let entry = create_test_file(root, "build/index.js", "export const a = 1;");

        let engine = FakeEngine::with_diagnostics(vec![
            Diagnostic {
                code: Some("THIS_IS_UNDEFINED".to_string()),
                message: "The 'this' keyword is equivalent to 'undefined'".to_string(),
            },
            Diagnostic {
                code: Some("MISSING_GLOBAL_NAME".to_string()),
                message: "No name was provided for external module 'lodash'".to_string(),
            },
            Diagnostic { code: None, message: "plugin warning".to_string() },
        ]);
        let opts = options(root, entry, BundleFormat::Umd);

        let result = rollup_bundle_file(&engine, &opts).await.unwrap();
        assert_eq!(result.warnings, 2);
    }

    #[tokio::test]
    async fn test_engine_failure_propagates() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let entry = create_test_file(root, "build/index.js", "export const a = 1;");

        let engine = FakeEngine::failing("Unexpected token (1:7)");
        let opts = options(root, entry, BundleFormat::Es);

        let err = rollup_bundle_file(&engine, &opts).await.unwrap_err();
        assert!(err.to_string().contains("Unexpected token (1:7)"));
        assert!(!opts.dest.exists());
    }

    #[tokio::test]
    async fn test_missing_entry_fails_before_bundling() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let engine = FakeEngine::default();
        let opts = options(root, root.join("build/index.js"), BundleFormat::Es);

        assert!(rollup_bundle_file(&engine, &opts).await.is_err());
        assert!(engine.jobs().is_empty());
    }

    #[test]
    fn test_forward_diagnostics_counts_only_forwarded() {
        let diagnostics = vec![
            Diagnostic { code: Some("THIS_IS_UNDEFINED".to_string()), message: "a".to_string() },
            Diagnostic { code: Some("THIS_IS_UNDEFINED".to_string()), message: "b".to_string() },
        ];
        assert_eq!(forward_diagnostics(&diagnostics), 0);
        assert_eq!(forward_diagnostics(&[]), 0);
    }

    #[test]
    fn test_source_map_path() {
        assert_eq!(
            source_map_path(Path::new("dist/bundles/acme-ui.umd.js")),
            PathBuf::from("dist/bundles/acme-ui.umd.js.map")
        );
    }
}
