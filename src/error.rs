use crate::token::{Position, Token};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompilerError {
    #[error("FileNotFoundError: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("IOError: {0}")]
    IO(#[from] std::io::Error),
    #[error("ConfigError: {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("SerializationError: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("UnknownSample: {0}")]
    UnknownSample(String),
}

/// A grammar violation found by the parser. Parsing goes on after one is
/// recorded; these are collected, not raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxError {
    pub(crate) program: usize,
    pub(crate) position: Option<Position>,
    pub(crate) lexeme: Option<String>,
    pub(crate) message: String,
}

impl SyntaxError {
    pub(crate) fn new(program: usize, token: Option<&Token>, message: String) -> Self {
        Self {
            program,
            position: token.map(|token| token.position()),
            lexeme: token.map(|token| token.lexeme().to_string()),
            message,
        }
    }

    /// 1-based index of the program the violation belongs to.
    pub fn program(&self) -> usize {
        self.program
    }

    /// Position of the offending token, `None` at end of input.
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub fn lexeme(&self) -> Option<&str> {
        self.lexeme.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::error::Error for SyntaxError {}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.position {
            Some(position) => write!(f, "Program {}, line {}: {}", self.program, position, self.message),
            None => write!(f, "Program {}, end of input: {}", self.program, self.message),
        }
    }
}
