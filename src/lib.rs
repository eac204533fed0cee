//! Front end for a small block-structured teaching language.
//!
//! Source text is scanned into one or more programs (split at `$`), then each
//! program is checked against the grammar. Both phases report problems as
//! data and always run to completion.

pub mod config;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod report;
pub mod samples;
pub mod token;

use log::info;
use serde::Serialize;

use crate::error::SyntaxError;
use crate::token::ProgramStream;

pub use crate::lexer::scan;
pub use crate::parser::parse;

/// Scans `source` and renders the scan report alongside the stream.
pub fn scan_with_report(source: &str) -> (ProgramStream, String) {
    let stream = scan(source);
    let report = report::render(&stream);
    (stream, report)
}

/// Everything both phases produced for one source text.
#[derive(Debug, Clone, Serialize)]
pub struct Compilation {
    pub stream: ProgramStream,
    #[serde(skip)]
    pub report: String,
    pub syntax_errors: Vec<SyntaxError>,
}

impl Compilation {
    /// No warnings, no lexical errors, no grammar violations.
    pub fn is_success(&self) -> bool {
        self.stream.diagnostics().next().is_none() && self.syntax_errors.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.stream.has_errors() || !self.syntax_errors.is_empty()
    }
}

pub fn compile(source: &str) -> Compilation {
    let (stream, report) = scan_with_report(source);
    let syntax_errors = parse(&stream);
    info!(
        "scanned {} program(s), {} scanner diagnostic(s), {} syntax error(s)",
        stream.len(),
        stream.diagnostics().count(),
        syntax_errors.len()
    );

    Compilation {
        stream,
        report,
        syntax_errors,
    }
}
