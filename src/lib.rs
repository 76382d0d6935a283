//! Filter expressions for issue lists.
//!
//! A filter such as `milestone:current label:bug ~is:closed sort:-updated count:10` is compiled
//! into an [`Expr`] and evaluated against a [`FilterContext`], a read-only view of the issues,
//! milestones, labels and collaborators of a repository.
//!
//! ```
//! use issue_filter::{compile, evaluate, has_semantic_error, FilterContext};
//!
//! let (expr, diagnostics) = compile("id:buggy");
//! assert!(has_semantic_error(&diagnostics));
//!
//! let ctx = FilterContext::new(&[]);
//! assert!(evaluate(&expr, &ctx).is_empty());
//! ```
//!
//! Compiling never fails. Syntax errors make the whole filter match every issue, qualifiers with
//! content they do not understand match every issue, and malformed milestone aliases such as
//! `current+x` match none. Each of these is reported as a [`Diagnostic`]. An alias pointing past
//! the known milestones also matches none, but only the context can tell, so it is not reported.

pub mod config;
pub mod content;
pub mod context;
pub mod error;
pub mod expr;
pub mod milestone;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod qualifier;
pub mod scanner;
pub mod token_type;

pub use context::{FilterContext, IssueSource};
pub use error::{Diagnostic, DiagnosticKind, has_errors, has_semantic_error, render_diagnostics};
pub use expr::Expr;
pub use model::{Issue, Label, Milestone, Snapshot, User};
pub use pipeline::evaluate;

use parser::Parser;
use scanner::tokenize;

/// Compiles filter text into an expression and the diagnostics found along the way.
pub fn compile(source: &str) -> (Expr, Vec<Diagnostic>) {
    let tokens = tokenize(source);
    let mut diagnostics = Vec::new();
    let expr = Parser::new(&tokens, &mut diagnostics).parse();
    tracing::debug!(filter = source, %expr, diagnostics = diagnostics.len(), "compiled filter");
    (expr, diagnostics)
}
