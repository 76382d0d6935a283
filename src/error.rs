use ariadne::{self, Color, Config, Label, Report, ReportKind, Source};
use std::collections::HashSet;
use std::fmt;
use std::ops::Range;
use std::path::PathBuf;

use crate::scanner::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum DiagnosticKind {
    Syntax,
    Semantic,
}

/// A non-fatal problem found while compiling a filter. The compiled expression it travels with
/// is always usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Range<usize>,
    pub line: usize,
    pub column: usize,
}

impl Diagnostic {
    pub fn semantic(message: String, from: &Token, to: &Token) -> Self {
        Diagnostic {
            kind: DiagnosticKind::Semantic,
            message,
            span: from.span.start..to.span.end,
            line: from.line,
            column: from.column,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{} error: {} ({}:{})", self.kind, self.message, self.line, self.column)
    }
}

/// Returned by the parser's productions and turned into a diagnostic once parsing stops.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} ({line}:{column})")]
pub struct SyntaxError {
    pub message: String,
    pub span: Range<usize>,
    pub line: usize,
    pub column: usize,
}

impl SyntaxError {
    pub fn at(token: &Token, message: String) -> Self {
        SyntaxError { message, span: token.span.clone(), line: token.line, column: token.column }
    }
}

impl From<SyntaxError> for Diagnostic {
    fn from(error: SyntaxError) -> Self {
        Diagnostic {
            kind: DiagnosticKind::Syntax,
            message: error.message,
            span: error.span,
            line: error.line,
            column: error.column,
        }
    }
}

/// Errors of the command-line front end.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode snapshot {path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// True if any diagnostic is semantic, i.e. the filter parsed but some qualifier content was
/// rejected. A filter that failed to parse has only a syntax diagnostic; use [`has_errors`] to
/// flag both.
pub fn has_semantic_error(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(|d| d.kind == DiagnosticKind::Semantic)
}

/// True if the filter should be flagged as erroneous: any diagnostic, syntax or semantic.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    !diagnostics.is_empty()
}

/// Renders diagnostics as a labelled report over the filter text. Returns an empty string if
/// there is nothing to report.
pub fn render_diagnostics(source: &str, diagnostics: &[Diagnostic], color: bool) -> String {
    let source_name = "filter";
    let labels = format_diagnostics(source, diagnostics, source_name, color);

    if labels.is_empty() {
        return String::new()
    }

    let kind = if diagnostics.iter().any(|d| d.kind == DiagnosticKind::Syntax) {
        ReportKind::Error
    } else {
        ReportKind::Warning
    };

    let mut buffer = Vec::new();
    let written = Report::build(kind, (source_name, 0..0))
        .with_config(Config::default().with_color(color))
        .with_message("Invalid filter")
        .with_labels(labels)
        .finish()
        .write((source_name, Source::from(source)), &mut buffer);

    match written {
        Ok(()) => String::from_utf8_lossy(&buffer).into_owned(),
        // Writing into a Vec cannot fail; fall back to the plain messages anyway.
        Err(_) => diagnostics.iter().map(|d| format!("{d}\n")).collect(),
    }
}

/// Converts diagnostics into ariadne labels, one per distinct start position.
/// ariadne counts chars while spans are byte ranges, so spans are converted here.
fn format_diagnostics<'a>(source: &str, diagnostics: &[Diagnostic], source_name: &'a str, color: bool) -> Vec<Label<(&'a str, Range<usize>)>> {
    let mut labels = Vec::new();
    let mut reported = HashSet::<usize>::new();

    for diagnostic in diagnostics {
        // report only one diagnostic per position to declutter output
        if !reported.insert(diagnostic.span.start) {
            continue;
        }
        let start = char_offset(source, diagnostic.span.start);
        let end = char_offset(source, diagnostic.span.end).max(start);
        let mut label = Label::new((source_name, start..end)).with_message(&diagnostic.message);
        if color {
            label = label.with_color(match diagnostic.kind {
                DiagnosticKind::Syntax => Color::Red,
                DiagnosticKind::Semantic => Color::Yellow,
            });
        }
        labels.push(label);
    }
    labels
}

fn char_offset(source: &str, byte: usize) -> usize {
    source.char_indices().take_while(|(idx, _)| *idx < byte).count()
}
