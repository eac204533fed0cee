use serde::Serialize;
use std::fmt;

/// A 1-based line/column pair.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct Token {
    lexeme: String,
    kind: Kind,
    position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostic: Option<Diagnostic>,
}

impl Token {
    pub(crate) fn new(kind: Kind, lexeme: impl Into<String>, position: Position) -> Self {
        Self {
            lexeme: lexeme.into(),
            kind,
            position,
            diagnostic: None,
        }
    }

    pub(crate) fn with_diagnostic(mut self, diagnostic: Diagnostic) -> Self {
        self.diagnostic = Some(diagnostic);
        self
    }

    pub fn lexeme(&self) -> &str {
        &self.lexeme
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        self.diagnostic.as_ref()
    }

    /// Tokens the scanner already reported as errors, and the empty placeholders
    /// that only carry an end-of-input warning.
    pub(crate) fn is_trivia(&self) -> bool {
        match &self.diagnostic {
            Some(diagnostic) => diagnostic.is_error() || self.lexeme.is_empty(),
            None => false,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize)]
pub enum Kind {
    Identifier,       // a, foo
    Number,           // 42
    StringChar,       // one character of a "..." literal
    Punctuation,      // ( ) and diagnostic carriers
    Keyword,          // true, false

    // Statement keywords
    Print,            // print
    While,            // while
    If,               // if

    DataType,         // int, string, boolean
    BooleanOperator,  // ==, !=
    BooleanValue,     // True, False
    Addition,         // +
    Assignment,       // =

    OpeningBlock,     // {
    ClosingBlock,     // }
    EndOfProgram,     // $
}

impl Kind {
    /// The label shown in scan reports and parser messages.
    pub fn label(&self) -> &'static str {
        match self {
            Kind::Identifier => "ID",
            Kind::Number => "NUMBER",
            Kind::StringChar => "STRING",
            Kind::Punctuation => "PUNCTUATION",
            Kind::Keyword => "KEYWORD",
            Kind::Print => "Print Statement",
            Kind::While => "While Statement",
            Kind::If => "If statement",
            Kind::DataType => "DataType",
            Kind::BooleanOperator => "Boolean Operator",
            Kind::BooleanValue => "Boolean value",
            Kind::Addition => "Addition Sign",
            Kind::Assignment => "Equal Sign",
            Kind::OpeningBlock => "Opening Block",
            Kind::ClosingBlock => "Closing Block",
            Kind::EndOfProgram => "End of program",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub type Program = Vec<Token>;

/// Every program scanned from one source text, in order of appearance.
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
#[serde(transparent)]
pub struct ProgramStream {
    programs: Vec<Program>,
}

impl ProgramStream {
    pub(crate) fn new() -> Self {
        Self {
            programs: vec![Vec::new()],
        }
    }

    pub(crate) fn push(&mut self, token: Token) {
        if let Some(program) = self.programs.last_mut() {
            program.push(token);
        }
    }

    pub(crate) fn begin_program(&mut self) {
        self.programs.push(Vec::new());
    }

    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.programs.iter().flatten()
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = (&Token, &Diagnostic)> {
        self.tokens()
            .filter_map(|token| token.diagnostic().map(|diagnostic| (token, diagnostic)))
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics().any(|(_, diagnostic)| diagnostic.is_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivia_covers_errors_and_empty_warnings() {
        let position = Position::new(1, 1);
        let invalid = Token::new(Kind::Punctuation, "@", position)
            .with_diagnostic(Diagnostic::error("Invalid character"));
        let unclosed = Token::new(Kind::Punctuation, "", position)
            .with_diagnostic(Diagnostic::warning("Unclosed {"));
        let stray = Token::new(Kind::ClosingBlock, "}", position)
            .with_diagnostic(Diagnostic::warning("Unexpected closing symbol"));

        assert!(invalid.is_trivia());
        assert!(unclosed.is_trivia());
        assert!(!stray.is_trivia());
        assert!(!Token::new(Kind::Number, "1", position).is_trivia());
    }

    #[test]
    fn new_stream_holds_one_empty_program() {
        let stream = ProgramStream::new();
        assert_eq!(stream.len(), 1);
        assert!(stream.programs()[0].is_empty());
        assert!(!stream.has_errors());
    }
}
