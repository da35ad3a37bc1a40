use anyhow::{Context, Result, bail};
use dashmap::DashMap;
use log::{debug, trace, warn};
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast_visit::{Visit, walk};
use oxc_parser::{Parser as OxcParser, ParserReturn};
use oxc_span::SourceType;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::types::{SpecKind, Specifier};

/// Returns every module request a file makes at runtime.
///
/// Static imports, `export ... from` re-exports, `require()` calls and
/// dynamic `import()` with a string literal are reported, wherever they sit
/// in the file. Type-only imports and exports are erased by the compiler and
/// never reach the bundler, so they are skipped.
///
/// A file the parser cannot recover from is an error.
pub fn imports_for(
    file: &Path,
    cache: &DashMap<PathBuf, Vec<Specifier>>,
) -> Result<Vec<Specifier>> {
    let file_buf = file.to_path_buf();
    if let Some(v) = cache.get(&file_buf) {
        trace!("Cache hit for imports: {}", file.display());
        return Ok(v.clone());
    }
    trace!("Parsing file for imports: {}", file.display());
    let src =
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;

    let st = source_type_for(file);
    let allocator = Allocator::default();
    let ParserReturn { program, errors, panicked, .. } =
        OxcParser::new(&allocator, &src, st).parse();
    if panicked {
        bail!("Failed to parse {} ({} errors)", file.display(), errors.len());
    }
    if !errors.is_empty() {
        warn!(
            "{} parse errors in {}; requests in unparsed code are missing from the externals",
            errors.len(),
            file.display()
        );
    }

    let mut collector = ImportCollector { file, specs: Vec::new() };
    collector.visit_program(&program);
    let specs = collector.specs;

    debug!("Found {} import specifiers in {}", specs.len(), file.display());
    cache.insert(file_buf, specs.clone());
    Ok(specs)
}

/// Collects requests from the whole tree, including function bodies and
/// other nested scopes.
struct ImportCollector<'f> {
    file: &'f Path,
    specs: Vec<Specifier>,
}

impl ImportCollector<'_> {
    fn push(&mut self, request: &str, kind: SpecKind) {
        trace!("Found {:?} request '{}' in {}", kind, request, self.file.display());
        self.specs.push(Specifier { request: request.to_string(), kind });
    }
}

impl<'a> Visit<'a> for ImportCollector<'_> {
    fn visit_import_declaration(&mut self, decl: &ImportDeclaration<'a>) {
        if decl.import_kind.is_type() {
            trace!("Skipping type-only import declaration in {}", self.file.display());
            return;
        }

        // import { type Foo } from 'bar' is erased, import { type Foo, bar } is not
        let has_runtime_import = match &decl.specifiers {
            Some(specifiers) => {
                specifiers.is_empty()
                    || specifiers.iter().any(|spec| match spec {
                        ImportDeclarationSpecifier::ImportSpecifier(s) => !s.import_kind.is_type(),
                        ImportDeclarationSpecifier::ImportDefaultSpecifier(_) => true,
                        ImportDeclarationSpecifier::ImportNamespaceSpecifier(_) => true,
                    })
            }
            // import 'side-effect'
            None => true,
        };

        if has_runtime_import {
            self.push(decl.source.value.as_str(), SpecKind::Static);
        }
    }

    fn visit_export_named_declaration(&mut self, decl: &ExportNamedDeclaration<'a>) {
        if decl.export_kind.is_type() {
            return;
        }
        if let Some(source) = &decl.source {
            self.push(source.value.as_str(), SpecKind::ReExport);
        }
        // export const x = require('y')
        walk::walk_export_named_declaration(self, decl);
    }

    fn visit_export_all_declaration(&mut self, decl: &ExportAllDeclaration<'a>) {
        if decl.export_kind.is_type() {
            return;
        }
        self.push(decl.source.value.as_str(), SpecKind::ReExport);
    }

    fn visit_import_expression(&mut self, expr: &ImportExpression<'a>) {
        if let Expression::StringLiteral(sl) = &expr.source {
            self.push(sl.value.as_str(), SpecKind::Dynamic);
        }
        walk::walk_import_expression(self, expr);
    }

    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if let Expression::Identifier(callee) = &call.callee
            && callee.name.as_str() == "require"
            && let Some(Expression::StringLiteral(sl)) =
                call.arguments.first().and_then(|arg| arg.as_expression())
        {
            self.push(sl.value.as_str(), SpecKind::Static);
        }
        walk::walk_call_expression(self, call);
    }
}

fn source_type_for(path: &Path) -> SourceType {
    let ext = path.extension().and_then(|e| e.to_str());

    // Compiler output and flat bundles are ES modules; only .cjs/.cts are scripts
    SourceType::default()
        .with_jsx(matches!(ext, Some("tsx") | Some("jsx")))
        .with_typescript(matches!(ext, Some("ts") | Some("tsx") | Some("mts") | Some("cts")))
        .with_module(!matches!(ext, Some("cjs") | Some("cts")))
}
