//! Application shell rewriting.
//!
//! The shell derives data file URLs from page paths at runtime. After upload
//! those files live at unrelated remote locations, so the derivations are
//! replaced with lookups into closed tables:
//!
//! 1. the function containing `"/page-data/"` gets a body that resolves a
//!    page path through the page data table, keeping any query suffix
//! 2. `"/page-data/app-data.json"` becomes its remote location
//! 3. in `"/page-data/sq/d/" + id`, the first argument of the enclosing call
//!    becomes a fragment table lookup (only when fragments exist)
//!
//! Shapes are located on the oxc AST, replaced in the source by span, and
//! the result is re-parsed and printed minified.

use std::cmp::Reverse;

use oxc::allocator::Allocator;
use oxc::ast::AstKind;
use oxc::ast::ast::{FormalParameters, Program, StringLiteral};
use oxc::ast_visit::Visit;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::diagnostics::OxcDiagnostic;
use oxc::parser::Parser;
use oxc::span::{GetSpan, SourceType, Span};
use oxc::syntax::operator::BinaryOperator;

use super::RewriteError;
use super::chunk::{ChunkMap, FRAGMENT_PREFIX};

const PAGE_DATA_MARKER: &str = "/page-data/";
const APP_DATA_MARKER: &str = "/page-data/app-data.json";

/// Rewrite the application shell against `chunks`.
///
/// Shapes that are not present are left alone. A shell that does not parse
/// is an error, as is an edit that leaves the program unparsable.
pub fn rewrite_bootstrap(source: &str, chunks: &ChunkMap) -> Result<String, RewriteError> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, SourceType::cjs()).parse();
    if parsed.panicked || !parsed.errors.is_empty() {
        return Err(RewriteError::Parse(describe(&parsed.errors)));
    }

    let tables = Tables::new(chunks)?;
    let mut finder = ShapeFinder::new(source, &tables);
    finder.visit_program(&parsed.program);

    if finder.edits.is_empty() {
        crate::debug!("rewrite"; "no bootstrap shapes matched");
        return Ok(print(&parsed.program));
    }
    crate::debug!("rewrite"; "{} bootstrap edits", finder.edits.len());

    let edited = apply_edits(source, finder.edits);
    let allocator = Allocator::default();
    let reparsed = Parser::new(&allocator, &edited, SourceType::cjs()).parse();
    if reparsed.panicked || !reparsed.errors.is_empty() {
        return Err(RewriteError::InvalidOutput(describe(&reparsed.errors)));
    }

    Ok(print(&reparsed.program))
}

fn print(program: &Program<'_>) -> String {
    Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .build(program)
        .code
}

fn describe(errors: &[OxcDiagnostic]) -> String {
    errors
        .first()
        .map_or_else(|| "parser aborted".to_string(), ToString::to_string)
}

// ============================================================================
// Tables
// ============================================================================

/// Replacement material rendered as JS source.
struct Tables {
    /// Page data table as an object literal, absent when there are no pages.
    pages: Option<String>,
    /// Quoted app data location.
    app_data: Option<String>,
    /// Fragment table as an object literal, absent when there are no fragments.
    fragments: Option<String>,
}

impl Tables {
    fn new(chunks: &ChunkMap) -> Result<Self, RewriteError> {
        let pages = chunks.page_data_table();
        let fragments = chunks.fragment_table();
        Ok(Self {
            pages: (!pages.is_empty())
                .then(|| serde_json::to_string(&pages))
                .transpose()?,
            app_data: chunks
                .get(APP_DATA_MARKER)
                .map(serde_json::to_string)
                .transpose()?,
            fragments: (!fragments.is_empty())
                .then(|| serde_json::to_string(&fragments))
                .transpose()?,
        })
    }
}

// ============================================================================
// Shape matching
// ============================================================================

/// What an enclosing node contributes to shape matching.
#[derive(Debug, Clone, Copy)]
enum Frame<'a> {
    /// `param` is the first parameter's bound name, if it binds a plain name.
    Function { param: Option<&'a str>, body: Option<Span> },
    Call { first_arg: Option<Span> },
    Concat { left: Span, right: Span },
    Other,
}

impl<'a> Frame<'a> {
    fn of(kind: AstKind<'a>) -> Self {
        match kind {
            AstKind::Function(func) => Self::Function {
                param: first_param(&func.params),
                body: func.body.as_ref().map(|body| body.span),
            },
            AstKind::ArrowFunctionExpression(arrow) => Self::Function {
                param: first_param(&arrow.params),
                body: Some(arrow.body.span),
            },
            AstKind::CallExpression(call) => Self::Call {
                first_arg: call.arguments.first().map(|arg| arg.span()),
            },
            AstKind::BinaryExpression(bin) if bin.operator == BinaryOperator::Addition => {
                Self::Concat {
                    left: bin.left.span(),
                    right: bin.right.span(),
                }
            }
            _ => Self::Other,
        }
    }
}

fn first_param<'a>(params: &FormalParameters<'a>) -> Option<&'a str> {
    params
        .items
        .first()
        .and_then(|param| param.pattern.get_identifier_name())
        .map(|name| name.as_str())
}

struct Edit {
    span: Span,
    text: String,
}

/// Walks the AST keeping a stack of enclosing frames.
struct ShapeFinder<'s, 'a> {
    source: &'s str,
    tables: &'s Tables,
    frames: Vec<Frame<'a>>,
    edits: Vec<Edit>,
}

impl<'s, 'a> ShapeFinder<'s, 'a> {
    fn new(source: &'s str, tables: &'s Tables) -> Self {
        Self {
            source,
            tables,
            frames: Vec::new(),
            edits: Vec::new(),
        }
    }

    fn text(&self, span: Span) -> &'s str {
        &self.source[span.start as usize..span.end as usize]
    }

    fn inspect(&mut self, lit: &StringLiteral<'_>) {
        let tables = self.tables;
        match lit.value.as_str() {
            PAGE_DATA_MARKER => self.page_resolver(),
            APP_DATA_MARKER => {
                if let Some(location) = &tables.app_data {
                    self.edits.push(Edit {
                        span: lit.span,
                        text: location.clone(),
                    });
                }
            }
            FRAGMENT_PREFIX => self.fragment_resolver(lit.span),
            _ => {}
        }
    }

    /// Replace the body of the nearest enclosing function.
    fn page_resolver(&mut self) {
        let tables = self.tables;
        let Some(table) = &tables.pages else {
            return;
        };
        let enclosing = self.frames.iter().rev().find_map(|frame| match *frame {
            Frame::Function { param, body } => Some((param, body)),
            _ => None,
        });
        let Some((param, Some(body))) = enclosing else {
            return;
        };
        let Some(request) = param else {
            crate::debug!("rewrite"; "page resolver parameter is not a plain name");
            return;
        };

        let text = format!(
            "{{return (function(request){{let [pathname, search] = request.split('?'); \
             if (pathname === '/') {{pathname += 'index'}} \
             return {table}[pathname] + (search ? '?' + search : '')}}({request}))}}"
        );
        self.edits.push(Edit { span: body, text });
    }

    /// Replace the first argument of the call around `"/page-data/sq/d/" + id`.
    fn fragment_resolver(&mut self, literal: Span) {
        let tables = self.tables;
        let Some(table) = &tables.fragments else {
            return;
        };
        let Some(Frame::Concat { left, right }) = self.frames.last().copied() else {
            return;
        };
        if left != literal {
            return;
        }
        let call_arg = self.frames.iter().rev().find_map(|frame| match *frame {
            Frame::Call { first_arg } => Some(first_arg),
            _ => None,
        });
        let Some(Some(arg)) = call_arg else {
            return;
        };
        if !(arg.start <= literal.start && literal.end <= arg.end) {
            return;
        }

        let id = self.text(right);
        let text = format!("({table}['{FRAGMENT_PREFIX}' + {id} + '.json'])");
        self.edits.push(Edit { span: arg, text });
    }
}

impl<'a> Visit<'a> for ShapeFinder<'_, 'a> {
    fn enter_node(&mut self, kind: AstKind<'a>) {
        if let AstKind::StringLiteral(lit) = kind {
            self.inspect(lit);
        }
        self.frames.push(Frame::of(kind));
    }

    fn leave_node(&mut self, _kind: AstKind<'a>) {
        self.frames.pop();
    }
}

/// Splice edits into `source`. Where edits nest, the outermost is kept.
fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|edit| (edit.span.start, Reverse(edit.span.end)));

    let mut out = String::with_capacity(source.len());
    let mut copied = 0usize;
    for edit in edits {
        let (start, end) = (edit.span.start as usize, edit.span.end as usize);
        if start < copied {
            continue;
        }
        out.push_str(&source[copied..start]);
        out.push_str(&edit.text);
        copied = end;
    }
    out.push_str(&source[copied..]);
    out
}
