//! File extensions shared by parsing, resolution and the module graph scan.
//!
//! Flattening runs on compiler output, so plain JavaScript is tried before
//! TypeScript when resolving an extensionless request.

/// Extensions of files whose imports are followed during a graph scan
pub const JS_TS_EXTENSIONS: &[&str] = &[
    "js",  // JavaScript
    "mjs", // JavaScript module
    "cjs", // JavaScript CommonJS
    "jsx", // JavaScript with JSX
    "ts",  // TypeScript
    "tsx", // TypeScript with JSX
    "mts", // TypeScript module
    "cts", // TypeScript CommonJS
];

/// Extensions to try when resolving module imports (in priority order)
pub const RESOLVE_EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "jsx", "ts", "tsx", "mts", "cts"];

/// Index file names to try when resolving directory imports
pub const INDEX_FILES: &[&str] = &[
    "index.js",
    "index.mjs",
    "index.cjs",
    "index.jsx",
    "index.ts",
    "index.tsx",
    "index.mts",
    "index.cts",
];

/// `package.json` fields naming a package's entry file, in lookup order.
///
/// The bundler's node resolution is configured with the same list, so the
/// scan and the bundle always start from the same file.
pub const MAIN_FIELDS: &[&str] = &["module", "main"];

/// Substring identifying the bundler's CommonJS interop helper module.
///
/// The CommonJS plugin injects these helpers into any embedded legacy module,
/// so they always have to travel with the bundle.
pub const COMMONJS_HELPERS: &str = "commonjsHelpers";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_extensions_prefer_javascript() {
        assert_eq!(RESOLVE_EXTENSIONS[0], "js");
        let first_ts = RESOLVE_EXTENSIONS.iter().position(|e| *e == "ts").unwrap();
        let last_js = RESOLVE_EXTENSIONS.iter().position(|e| *e == "jsx").unwrap();
        assert!(last_js < first_ts);
    }

    #[test]
    fn test_resolve_extensions_matches_js_ts_extensions() {
        assert_eq!(RESOLVE_EXTENSIONS.len(), JS_TS_EXTENSIONS.len());
        for ext in RESOLVE_EXTENSIONS {
            assert!(
                JS_TS_EXTENSIONS.contains(ext),
                "RESOLVE_EXTENSIONS contains '{}' which is not in JS_TS_EXTENSIONS",
                ext
            );
        }
    }

    #[test]
    fn test_index_files_follow_resolve_order() {
        assert_eq!(INDEX_FILES.len(), RESOLVE_EXTENSIONS.len());
        for (index_file, ext) in INDEX_FILES.iter().zip(RESOLVE_EXTENSIONS) {
            assert_eq!(*index_file, format!("index.{}", ext));
        }
    }
}
