//! Error types for script compilation.

use std::sync::Arc;

use oxc_diagnostics::{GraphicalReportHandler, GraphicalTheme, NamedSource, OxcDiagnostic};
use oxc_span::Span;
use serde::{Deserialize, Serialize};

/// Category of a compile failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScriptErrorKind {
    /// Malformed JavaScript/TypeScript source.
    Parse,
    /// Misuse of a compiler macro (duplicate call, mixed arguments, bad destructure, ...).
    MacroProtocol,
    /// A type argument that cannot be resolved to a literal or interface shape.
    TypeResolution,
    /// Inconsistent descriptor input (missing blocks, mismatched languages, exports in setup).
    InvalidInput,
    /// Conflicting text edits.
    Rewrite,
}

/// A fatal script compile error.
///
/// Carries the message, the offending file name and a rendered code frame
/// pointing at the node that caused it.
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("[@vizejs/atelier-script] {message}\n\n{filename}\n{code_frame}")]
pub struct ScriptCompileError {
    pub kind: ScriptErrorKind,
    pub message: String,
    pub filename: String,
    /// Absolute byte range in the document source.
    pub span: Option<(usize, usize)>,
    pub code_frame: String,
}

/// Result type for script compilation.
pub type ScriptResult<T> = Result<T, ScriptCompileError>;

impl ScriptCompileError {
    pub fn new(
        kind: ScriptErrorKind,
        message: impl Into<String>,
        filename: &str,
        source: &str,
        span: Option<(usize, usize)>,
    ) -> Self {
        let message = message.into();
        let code_frame = match span {
            Some((start, end)) => render_code_frame(filename, source, &message, start, end),
            None => String::new(),
        };
        Self {
            kind,
            message,
            filename: filename.to_string(),
            span,
            code_frame,
        }
    }
}

/// Render a code frame for `start..end` using oxc's graphical report handler.
pub fn render_code_frame(
    filename: &str,
    source: &str,
    message: &str,
    start: usize,
    end: usize,
) -> String {
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());
    let named_source = Arc::new(NamedSource::new(filename, source.to_string()));

    let end = end.clamp(start, source.len());
    let span = Span::new(start as u32, end as u32);
    let report = OxcDiagnostic::error(message.to_string())
        .with_label(span)
        .with_source_code(Arc::clone(&named_source));

    let mut buf = String::new();
    if handler.render_report(&mut buf, report.as_ref()).is_err() {
        buf.clear();
    }
    buf
}
