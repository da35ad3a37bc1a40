//! Flattening of compiled JavaScript packages into distributable bundles.
//!
//! A package's ES2015 build is bundled twice: first into a single flat ES
//! module (FESM), then that FESM into a UMD bundle that registers itself as a
//! browser global. Third-party imports stay external unless the package lists
//! them as embedded, and every external gets a UMD global name.
//!
//! # Examples
//!
//! ```no_run
//! use clap::Parser;
//! use oxipack_flatten::{Config, flatten_to_fesm, flatten_to_umd, print_bundle_summary};
//! use std::io::{BufWriter, Write};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let mut cfg = Config::parse_from(["oxipack", "--root", "/path/to/package"]);
//! cfg.initialize()?;
//!
//! let engine = cfg.engine()?;
//! let mut ctx = cfg.build_context()?;
//! flatten_to_fesm(&mut ctx, &engine).await?;
//! flatten_to_umd(&mut ctx, &engine).await?;
//!
//! let mut stdout = BufWriter::new(std::io::stdout());
//! print_bundle_summary(&mut stdout, &ctx.entry_point.module_id, &ctx.artefacts.results)?;
//! stdout.flush()?;
//! # Ok(())
//! # }
//! ```

mod bundle;
mod config;
mod context;
mod engine;
mod external;
mod globals;
mod reporter;
mod rollup;
mod steps;
mod types;

#[cfg(test)]
mod testing;

// Re-export public API
pub use bundle::{forward_diagnostics, rollup_bundle_file, source_map_path};
pub use config::Config;
pub use context::{
    Artefacts, BuildContext, DEFAULT_ENTRY_FILE, EntryPoint, PackageDescriptor, StagingDirs,
    flatten_module_id,
};
pub use engine::{BundleEngine, BundleJob, BundleReport, Diagnostic, THIS_IS_UNDEFINED};
pub use external::is_external;
pub use globals::umd_global_name;
pub use reporter::print_bundle_summary;
pub use rollup::{Plugins, RollupCli};
pub use steps::{flatten_to_fesm, flatten_to_umd};
pub use types::{BundleFormat, BundleOptions, BundleResult};
