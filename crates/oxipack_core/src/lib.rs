//! Core utilities for oxipack.
//!
//! This crate provides the pieces of module-graph knowledge the bundling
//! steps need before handing a package to the bundler:
//! - Parsing import, re-export and require specifiers from JS/TS files
//! - Resolving module requests (relative paths and node_modules packages)
//! - Scanning the graph an entry file pulls in, split into inlined and
//!   external modules
//! - Locating and reading the package manifest

mod config;
mod constants;
mod graph;
mod parser;
mod resolver;
mod types;

// Re-export public API
pub use config::{BundleManifest, PackageManifest, find_package_root, read_package_manifest};
pub use constants::{
    COMMONJS_HELPERS, INDEX_FILES, JS_TS_EXTENSIONS, MAIN_FIELDS, RESOLVE_EXTENSIONS,
};
pub use graph::{ModuleGraphScan, scan_module_graph};
pub use parser::imports_for;
pub use resolver::resolve;
pub use types::{SpecKind, Specifier};
