//! Locate import/export specifier literals in JavaScript/TypeScript source.
//!
//! Three shapes are recognised:
//!
//! ```javascript
//! import x from './a';            // import source
//! export * from './b';            // re-export source
//! const c = require('./c');       // direct string argument of require()
//! const d = await import('./d');  // dynamic import source
//! ```
//!
//! Each match covers the literal's text only, without the quotes, so an
//! overwrite of the span keeps the author's quote style.
//!
//! JavaScript is parsed with JSX enabled. Sources rejected as modules are
//! retried as CommonJS scripts, where a top-level `return` is legal.

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Argument, CallExpression, ExportAllDeclaration, ExportNamedDeclaration, Expression,
    ImportDeclaration, ImportExpression, StringLiteral,
};
use oxc_ast_visit::{Visit, walk};
use oxc_parser::{ParseOptions, Parser};
use oxc_span::SourceType;
use std::path::Path;

/// One specifier literal: its text and byte range within the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecifierMatch {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Source text the parser rejected.
#[derive(Debug, Clone)]
pub struct ParseFailure {
    pub diagnostics: Vec<String>,
}

/// Source type used to parse the module at `path`.
///
/// JavaScript extensions always allow JSX; `.tsx` and its `m`/`c` variants
/// are TSX, the other TypeScript extensions plain TS. Unknown extensions
/// parse as JSX modules.
pub fn source_type_for_path(path: &Path) -> SourceType {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    let ext = name.rsplit_once('.').map_or("", |(_, ext)| ext);
    match ext {
        "tsx" | "mtsx" | "ctsx" => SourceType::tsx(),
        "ts" | "mts" | "cts" => SourceType::ts(),
        _ => SourceType::jsx(),
    }
}

/// Parse `source` and return every specifier literal, ordered by position.
///
/// # Errors
///
/// Fails when the source parses neither as a module nor as a script. The
/// diagnostics are those of the module parse.
pub fn find_specifiers(
    source: &str,
    source_type: SourceType,
) -> Result<Vec<SpecifierMatch>, ParseFailure> {
    let diagnostics = match collect(source, source_type, ParseOptions::default()) {
        Ok(matches) => return Ok(matches),
        Err(diagnostics) => diagnostics,
    };
    if !source_type.is_module() {
        return Err(ParseFailure { diagnostics });
    }

    let script = ParseOptions {
        allow_return_outside_function: true,
        ..ParseOptions::default()
    };
    collect(source, source_type.with_module(false), script).map_err(|_| ParseFailure { diagnostics })
}

fn collect(
    source: &str,
    source_type: SourceType,
    options: ParseOptions,
) -> Result<Vec<SpecifierMatch>, Vec<String>> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, source_type)
        .with_options(options)
        .parse();

    if ret.panicked || !ret.errors.is_empty() {
        return Err(ret.errors.iter().map(|e| e.to_string()).collect());
    }

    let mut collector = SpecifierCollector {
        source,
        matches: Vec::new(),
    };
    walk::walk_program(&mut collector, &ret.program);

    let mut matches = collector.matches;
    matches.sort_by_key(|m| m.start);
    Ok(matches)
}

fn import_source<'b, 'a>(decl: &'b ImportDeclaration<'a>) -> Option<&'b StringLiteral<'a>> {
    Some(&decl.source)
}

fn export_source<'b, 'a>(decl: &'b ExportNamedDeclaration<'a>) -> Option<&'b StringLiteral<'a>> {
    decl.source.as_ref()
}

fn require_arguments<'b, 'a>(
    call: &'b CallExpression<'a>,
) -> impl Iterator<Item = &'b StringLiteral<'a>> {
    let is_require =
        matches!(&call.callee, Expression::Identifier(ident) if ident.name.as_str() == "require");
    call.arguments
        .iter()
        .filter(move |_| is_require)
        .filter_map(|arg| match arg {
            Argument::StringLiteral(lit) => Some(&**lit),
            _ => None,
        })
}

fn dynamic_import_source<'b, 'a>(expr: &'b ImportExpression<'a>) -> Option<&'b StringLiteral<'a>> {
    match &expr.source {
        Expression::StringLiteral(lit) => Some(&**lit),
        _ => None,
    }
}

struct SpecifierCollector<'s> {
    source: &'s str,
    matches: Vec<SpecifierMatch>,
}

impl SpecifierCollector<'_> {
    fn push(&mut self, literal: Option<&StringLiteral<'_>>) {
        let Some(literal) = literal else {
            return;
        };
        let (start, end) = (literal.span.start as usize, literal.span.end as usize);
        // Span covers the quotes; empty literals have nothing to rewrite.
        if end < start + 2 || end > self.source.len() {
            return;
        }
        let bytes = self.source.as_bytes();
        if !matches!(bytes[start], b'\'' | b'"') {
            return;
        }
        let (start, end) = (start + 1, end - 1);
        if start == end {
            return;
        }
        self.matches.push(SpecifierMatch {
            text: self.source[start..end].to_string(),
            start,
            end,
        });
    }
}

impl<'a> Visit<'a> for SpecifierCollector<'_> {
    fn visit_import_declaration(&mut self, decl: &ImportDeclaration<'a>) {
        self.push(import_source(decl));
    }

    fn visit_export_named_declaration(&mut self, decl: &ExportNamedDeclaration<'a>) {
        self.push(export_source(decl));
        walk::walk_export_named_declaration(self, decl);
    }

    fn visit_export_all_declaration(&mut self, decl: &ExportAllDeclaration<'a>) {
        self.push(Some(&decl.source));
    }

    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        let literals: Vec<_> = require_arguments(call).collect();
        for literal in literals {
            self.push(Some(literal));
        }
        walk::walk_call_expression(self, call);
    }

    fn visit_import_expression(&mut self, expr: &ImportExpression<'a>) {
        self.push(dynamic_import_source(expr));
        walk::walk_import_expression(self, expr);
    }
}
