//! Drives the `rollup` executable as the bundling engine.
//!
//! Every job is turned into a throwaway ES module config file placed in the
//! package directory, so that the plugins it imports resolve from the
//! package's own `node_modules`. The config's `onwarn` hook prints each
//! warning as a marked JSON line on stderr, which is parsed back into
//! [`Diagnostic`]s once rollup exits.

use anyhow::{Context, Result, bail};
use log::{debug, trace};
use oxipack_core::{COMMONJS_HELPERS, MAIN_FIELDS};
use std::{
    fmt::Write as _,
    io::Write as _,
    path::{Path, PathBuf},
};
use tokio::{process::Command, sync::OnceCell};

use crate::engine::{BundleEngine, BundleJob, BundleReport, Diagnostic};

const DIAGNOSTIC_MARKER: &str = "@@oxipack:";

/// Rollup plugins registered in the generated config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plugins {
    /// `@rollup/plugin-node-resolve`, needed to inline embedded packages
    pub node_resolve: bool,
    /// `@rollup/plugin-commonjs`, needed when an embedded package is CommonJS
    pub commonjs: bool,
}

impl Default for Plugins {
    fn default() -> Self {
        Self { node_resolve: true, commonjs: true }
    }
}

#[derive(Debug)]
pub struct RollupCli {
    bin: PathBuf,
    plugins: Plugins,
    version: OnceCell<String>,
}

impl RollupCli {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into(), plugins: Plugins::default(), version: OnceCell::new() }
    }

    /// Uses the package's locally installed rollup, falling back to `PATH`.
    pub fn locate(working_directory: &Path) -> Self {
        let local = working_directory.join("node_modules").join(".bin").join("rollup");
        if local.is_file() {
            debug!("Using local rollup at {}", local.display());
            Self::new(local)
        } else {
            debug!("No local rollup under {}, using PATH", working_directory.display());
            Self::new("rollup")
        }
    }

    pub fn with_plugins(mut self, plugins: Plugins) -> Self {
        self.plugins = plugins;
        self
    }

    pub fn bin(&self) -> &Path {
        &self.bin
    }
}

impl BundleEngine for RollupCli {
    async fn version(&self) -> Result<String> {
        let version = self
            .version
            .get_or_try_init(|| async {
                let output = Command::new(&self.bin)
                    .arg("--version")
                    .output()
                    .await
                    .with_context(|| format!("Failed to run {}", self.bin.display()))?;
                if !output.status.success() {
                    bail!("{} --version exited with {}", self.bin.display(), output.status);
                }
                Ok::<_, anyhow::Error>(parse_version(&String::from_utf8_lossy(&output.stdout)))
            })
            .await?;
        Ok(version.clone())
    }

    async fn bundle(&self, job: &BundleJob) -> Result<BundleReport> {
        let config = render_config(job, self.plugins)?;
        trace!("Generated rollup config:\n{}", config);

        let mut config_file = tempfile::Builder::new()
            .prefix(".oxipack-rollup-")
            .suffix(".mjs")
            .tempfile_in(&job.working_directory)
            .with_context(|| {
                format!("Failed to create rollup config in {}", job.working_directory.display())
            })?;
        config_file.write_all(config.as_bytes())?;
        config_file.flush()?;

        if let Some(parent) = job.dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let output = Command::new(&self.bin)
            .arg("--config")
            .arg(config_file.path())
            .current_dir(&job.working_directory)
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.bin.display()))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let (diagnostics, other) = parse_diagnostics(&stderr);

        if !output.status.success() {
            bail!(
                "rollup failed to bundle {} ({}):\n{}",
                job.entry.display(),
                output.status,
                other.trim()
            );
        }

        for line in other.lines().filter(|l| !l.trim().is_empty()) {
            trace!("rollup: {}", line);
        }
        debug!("rollup reported {} diagnostics for {}", diagnostics.len(), job.dest.display());

        Ok(BundleReport { diagnostics })
    }
}

/// Renders the rollup config module for `job`.
///
/// `external` is rendered as a function carrying the same rules as
/// [`is_external`](crate::is_external), so ids the graph scan never saw are
/// classified too.
pub(crate) fn render_config(job: &BundleJob, plugins: Plugins) -> Result<String> {
    let mut out = String::new();

    writeln!(out, "import {{ isAbsolute }} from 'node:path';")?;
    if plugins.node_resolve {
        writeln!(out, "import {{ nodeResolve }} from '@rollup/plugin-node-resolve';")?;
    }
    if plugins.commonjs {
        writeln!(out, "import commonjs from '@rollup/plugin-commonjs';")?;
    }
    writeln!(out)?;
    writeln!(out, "const embedded = new Set({});", serde_json::to_string(&job.embedded)?)?;
    writeln!(out)?;
    writeln!(out, "const isExternal = (id) => {{")?;
    writeln!(out, "  if (id.startsWith('\\0')) return false;")?;
    writeln!(
        out,
        "  if (isAbsolute(id) || id.startsWith('.') || id.startsWith('/')) return false;"
    )?;
    writeln!(
        out,
        "  if (id.includes({})) return false;",
        serde_json::to_string(COMMONJS_HELPERS)?
    )?;
    writeln!(out, "  return !embedded.has(id);")?;
    writeln!(out, "}};")?;
    writeln!(out)?;
    writeln!(out, "const report = (warning) => {{")?;
    writeln!(
        out,
        "  process.stderr.write({} + JSON.stringify({{ code: warning.code ?? null, message: warning.message }}) + '\\n');",
        serde_json::to_string(DIAGNOSTIC_MARKER)?
    )?;
    writeln!(out, "}};")?;
    writeln!(out)?;

    let mut plugin_calls = Vec::new();
    if plugins.node_resolve {
        plugin_calls.push(format!(
            "nodeResolve({{ mainFields: {} }})",
            serde_json::to_string(MAIN_FIELDS)?
        ));
    }
    if plugins.commonjs {
        plugin_calls.push("commonjs({ include: 'node_modules/**' })".to_string());
    }

    writeln!(out, "export default {{")?;
    writeln!(out, "  input: {},", serde_json::to_string(&job.entry)?)?;
    writeln!(out, "  external: isExternal,")?;
    writeln!(out, "  plugins: [{}],", plugin_calls.join(", "))?;
    writeln!(out, "  onwarn: report,")?;
    writeln!(out, "  output: {{")?;
    writeln!(out, "    file: {},", serde_json::to_string(&job.dest)?)?;
    writeln!(out, "    format: {},", serde_json::to_string(job.format.as_str())?)?;
    writeln!(out, "    name: {},", serde_json::to_string(&job.module_name)?)?;
    writeln!(out, "    globals: {},", serde_json::to_string(&job.globals)?)?;
    writeln!(out, "    sourcemap: true,")?;
    writeln!(out, "  }},")?;
    writeln!(out, "}};")?;

    Ok(out)
}

/// Splits rollup's stderr into reported diagnostics and everything else.
pub(crate) fn parse_diagnostics(stderr: &str) -> (Vec<Diagnostic>, String) {
    let mut diagnostics = Vec::new();
    let mut other = String::new();

    for line in stderr.lines() {
        if let Some(json) = line.trim_start().strip_prefix(DIAGNOSTIC_MARKER)
            && let Ok(diagnostic) = serde_json::from_str::<Diagnostic>(json)
        {
            diagnostics.push(diagnostic);
            continue;
        }
        other.push_str(line);
        other.push('\n');
    }

    (diagnostics, other)
}

fn parse_version(stdout: &str) -> String {
    let line = stdout.lines().next().unwrap_or_default().trim();
    line.trim_start_matches("rollup").trim().trim_start_matches('v').to_string()
}
