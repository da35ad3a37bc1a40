use std::{
    env, fs,
    io::{self, Write},
    path::{Component, Path, PathBuf},
};

use colored::Colorize;
use log::{debug, trace};

use crate::types::{BundleFormat, BundleResult};

/// Relativize a path to the current working directory for clickable links
fn relativize_to_cwd(path: &Path) -> String {
    let cwd = match env::current_dir() {
        Ok(cwd) => cwd,
        Err(_) => {
            debug!("Failed to get current directory");
            return path.display().to_string();
        }
    };

    match make_relative(path, &cwd) {
        Some(rel_path) => {
            let result = rel_path.to_string_lossy().to_string();
            trace!("Relativized {:?} to '{}'", path, result);
            result
        }
        None => path.display().to_string(),
    }
}

/// Create a relative path from `base` to `target`
fn make_relative(target: &Path, base: &Path) -> Option<PathBuf> {
    let target_parts: Vec<Component> = target.components().collect();
    let base_parts: Vec<Component> = base.components().collect();

    if target_parts.first() != base_parts.first() {
        return None;
    }

    let common = target_parts.iter().zip(&base_parts).take_while(|(t, b)| t == b).count();

    let mut result = PathBuf::new();
    for _ in &base_parts[common..] {
        result.push("..");
    }
    for component in &target_parts[common..] {
        match component {
            Component::Normal(p) => result.push(p),
            Component::ParentDir => result.push(".."),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    if result.as_os_str().is_empty() { Some(PathBuf::from(".")) } else { Some(result) }
}

fn human_size(bytes: u64) -> String {
    match bytes {
        b if b >= 1024 * 1024 => format!("{:.1} MiB", b as f64 / (1024.0 * 1024.0)),
        b if b >= 1024 => format!("{:.1} KiB", b as f64 / 1024.0),
        b => format!("{} B", b),
    }
}

/// Prints one block per bundle written for `module_id`.
pub fn print_bundle_summary<W: Write>(
    writer: &mut W,
    module_id: &str,
    results: &[BundleResult],
) -> io::Result<()> {
    debug!("Printing summary for {} bundles", results.len());

    if results.is_empty() {
        writeln!(writer, "{} Nothing was bundled for {}", "●".bright_blue(), module_id.bold())?;
        writer.flush()?;
        return Ok(());
    }

    writeln!(writer, "{} Bundled {}\n", "✓".green().bold(), module_id.bold())?;

    for result in results {
        let label = match result.format {
            BundleFormat::Es => "FESM",
            BundleFormat::Umd => "UMD ",
        };
        let size = fs::metadata(&result.dest)
            .map(|m| human_size(m.len()))
            .unwrap_or_else(|_| "?".to_string());

        writeln!(
            writer,
            "{}  {} ({})",
            label.cyan().bold(),
            relativize_to_cwd(&result.dest).blue(),
            size.dimmed()
        )?;
        writeln!(
            writer,
            "      {} modules inlined, {} external",
            result.modules_inlined.to_string().cyan(),
            result.externals.len().to_string().cyan()
        )?;

        if result.format == BundleFormat::Umd {
            let externals: Vec<_> = result.externals.iter().collect();
            for (idx, id) in externals.iter().enumerate() {
                let prefix = if idx == externals.len() - 1 { "└──" } else { "├──" };
                let global = result.globals.get(*id).map(String::as_str).unwrap_or("?");
                writeln!(writer, "      {}  {} {} {}", prefix.dimmed(), id, "→".dimmed(), global)?;
            }
        }

        if result.warnings > 0 {
            writeln!(
                writer,
                "      {} {} warnings",
                "⚠".yellow().bold(),
                result.warnings.to_string().yellow()
            )?;
        }
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};

    #[test]
    fn test_make_relative_same_dir() {
        let result = make_relative(Path::new("/work/ui/dist/acme-ui.js"), Path::new("/work/ui/dist"));
        assert_eq!(result, Some(PathBuf::from("acme-ui.js")));
    }

    #[test]
    fn test_make_relative_child_dir() {
        let result = make_relative(
            Path::new("/work/ui/dist/bundles/acme-ui.umd.js"),
            Path::new("/work/ui"),
        );
        assert_eq!(result, Some(PathBuf::from("dist/bundles/acme-ui.umd.js")));
    }

    #[test]
    fn test_make_relative_parent_and_sibling() {
        assert_eq!(
            make_relative(Path::new("/work/ui/dist/acme-ui.js"), Path::new("/work/ui/src")),
            Some(PathBuf::from("../dist/acme-ui.js"))
        );
        assert_eq!(
            make_relative(Path::new("/work/file.js"), Path::new("/work/apps/web/src")),
            Some(PathBuf::from("../../../file.js"))
        );
    }

    #[test]
    fn test_make_relative_same_path() {
        assert_eq!(
            make_relative(Path::new("/work/ui"), Path::new("/work/ui")),
            Some(PathBuf::from("."))
        );
    }

    #[test]
    fn test_make_relative_needs_shared_root() {
        assert_eq!(make_relative(Path::new("dist/a.js"), Path::new("/work/ui")), None);
    }

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KiB");
        assert_eq!(human_size(3 * 1024 * 1024), "3.0 MiB");
    }

    #[test]
    fn test_print_bundle_summary() {
        colored::control::set_override(false);
        let result = BundleResult {
            dest: PathBuf::from("/nonexistent/dist/bundles/acme-ui.umd.js"),
            source_map: PathBuf::from("/nonexistent/dist/bundles/acme-ui.umd.js.map"),
            format: BundleFormat::Umd,
            externals: BTreeSet::from(["@angular/core".to_string(), "lodash".to_string()]),
            globals: BTreeMap::from([("@angular/core".to_string(), "ng.core".to_string())]),
            modules_inlined: 4,
            warnings: 1,
        };

        let mut out = Vec::new();
        print_bundle_summary(&mut out, "@acme/ui", &[result]).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains("Bundled @acme/ui"));
        assert!(out.contains("4 modules inlined, 2 external"));
        assert!(out.contains("├──  @angular/core → ng.core"));
        assert!(out.contains("└──  lodash → ?"));
        assert!(out.contains("1 warnings"));
    }

    #[test]
    fn test_print_empty_summary() {
        colored::control::set_override(false);
        let mut out = Vec::new();
        print_bundle_summary(&mut out, "@acme/ui", &[]).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("Nothing was bundled"));
    }
}
