//! AST-based JavaScript parser using oxc_parser.

use crate::parser::package_name;
use crate::types::{DepconfError, Result};
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast::visit::walk;
use oxc_ast::Visit;
use oxc_parser::Parser;
use oxc_span::SourceType;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, trace};

/// AST-based parser for extracting package names from JavaScript.
#[derive(Debug, Clone, Default)]
pub struct AstParser;

impl AstParser {
    /// Create a new AST parser.
    pub fn new() -> Self {
        Self
    }

    /// Read a local script and extract the packages it references.
    ///
    /// The file extension picks the language (`.ts`, `.tsx`, `.mjs`, ...);
    /// anything unrecognised is parsed as JavaScript with JSX enabled.
    pub fn extract_file(&self, path: &Path) -> Result<Vec<String>> {
        let content =
            std::fs::read_to_string(path).map_err(|source| DepconfError::LocalInput {
                path: path.to_path_buf(),
                source,
            })?;

        let mut source_type = SourceType::from_path(path).unwrap_or_default();
        if !source_type.is_typescript() {
            source_type = source_type.with_jsx(true);
        }

        self.extract_with_source_type(&content, source_type, &path.display().to_string())
    }

    /// Extract the sorted, deduplicated package base names referenced by
    /// JavaScript source text.
    pub fn extract(&self, content: &str) -> Result<Vec<String>> {
        let source_type = SourceType::default().with_jsx(true);
        self.extract_with_source_type(content, source_type, "<inline>")
    }

    /// Parse as a module first, then fall back to script grammar.
    ///
    /// Recoverable syntax errors are tolerated in both modes. Only when the
    /// parser gives up on both grammars is the run failed.
    pub fn extract_with_source_type(
        &self,
        content: &str,
        source_type: SourceType,
        origin: &str,
    ) -> Result<Vec<String>> {
        let module_error = match self.try_extract(content, source_type.with_module(true), origin) {
            Ok(packages) => return Ok(packages),
            Err(e) => e,
        };

        debug!("Module parse of {} failed ({}), retrying as script", origin, module_error);

        self.try_extract(content, source_type.with_module(false), origin)
            .map_err(|script_error| {
                DepconfError::Parse(format!(
                    "{origin}: module parse failed: {module_error}; script parse failed: {script_error}"
                ))
            })
    }

    fn try_extract(
        &self,
        content: &str,
        source_type: SourceType,
        origin: &str,
    ) -> std::result::Result<Vec<String>, String> {
        let allocator = Allocator::default();
        let parser_result = Parser::new(&allocator, content, source_type).parse();

        if parser_result.panicked {
            return Err(parser_result
                .errors
                .first()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unrecoverable syntax error".to_string()));
        }

        // A partial tree is still worth walking
        if !parser_result.errors.is_empty() {
            trace!(
                "Parse had {} errors for {}, continuing...",
                parser_result.errors.len(),
                origin
            );
        }

        let mut visitor = PackageVisitor::default();
        visitor.visit_program(&parser_result.program);

        let packages: Vec<String> = visitor.packages.into_iter().collect();
        debug!("Extracted {} packages from AST: {}", packages.len(), origin);

        Ok(packages)
    }
}

/// Visitor collecting module specifiers from import-like nodes.
///
/// Every other node kind falls through to the default walk, so literals
/// nested anywhere in the tree are still reached.
#[derive(Default)]
struct PackageVisitor {
    packages: BTreeSet<String>,
}

impl PackageVisitor {
    fn add_specifier(&mut self, specifier: &str, kind: &str) {
        match package_name(specifier) {
            Some(name) => {
                trace!("{} '{}' -> {}", kind, specifier, name);
                self.packages.insert(name);
            }
            None => trace!("{} '{}' is not an external package", kind, specifier),
        }
    }
}

impl<'a> Visit<'a> for PackageVisitor {
    fn visit_import_declaration(&mut self, decl: &ImportDeclaration<'a>) {
        self.add_specifier(decl.source.value.as_str(), "import");
        walk::walk_import_declaration(self, decl);
    }

    fn visit_export_all_declaration(&mut self, decl: &ExportAllDeclaration<'a>) {
        self.add_specifier(decl.source.value.as_str(), "export");
        walk::walk_export_all_declaration(self, decl);
    }

    fn visit_export_named_declaration(&mut self, decl: &ExportNamedDeclaration<'a>) {
        if let Some(ref source) = decl.source {
            self.add_specifier(source.value.as_str(), "export");
        }
        walk::walk_export_named_declaration(self, decl);
    }

    fn visit_call_expression(&mut self, expr: &CallExpression<'a>) {
        // require('package')
        if let Expression::Identifier(id) = &expr.callee {
            if id.name == "require" {
                if let Some(Argument::StringLiteral(lit)) = expr.arguments.first() {
                    self.add_specifier(lit.value.as_str(), "require");
                }
            }
        }

        walk::walk_call_expression(self, expr);
    }

    fn visit_import_expression(&mut self, expr: &ImportExpression<'a>) {
        // import('package')
        if let Expression::StringLiteral(lit) = &expr.source {
            self.add_specifier(lit.value.as_str(), "import()");
        }
        walk::walk_import_expression(self, expr);
    }
}
