use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::token::{Diagnostic, Kind, Position, ProgramStream, Token};

/// Characters the language admits outside string literals. Anything else is
/// reported as an invalid character.
static PERMITTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[A-Za-z0-9\s"'{}=!$()]$"#).expect("permitted character class is a valid pattern")
});

const BOOLEAN_VALUES: [&str; 2] = ["True", "False"];

/// Scans `source` into programs. Never fails: every lexical problem is
/// attached to a token as a diagnostic.
pub fn scan(source: &str) -> ProgramStream {
    Scanner::new(source).scan()
}

pub(crate) fn is_permitted(ch: char) -> bool {
    let mut buf = [0u8; 4];
    PERMITTED.is_match(ch.encode_utf8(&mut buf))
}

/// Kind of a lowercase word, reserved or not.
pub(crate) fn word_kind(word: &str) -> Kind {
    match word {
        "int" | "string" | "boolean" => Kind::DataType,
        "print" => Kind::Print,
        "while" => Kind::While,
        "if" => Kind::If,
        "true" | "false" => Kind::Keyword,
        _ => Kind::Identifier,
    }
}

struct Scanner {
    chars: Vec<char>,
    current: usize,
    line: usize,
    column: usize,
    in_comment: bool,
    string: Option<Vec<char>>,
    open_blocks: Vec<Position>,
    eop_found: bool,
    stream: ProgramStream,
}

impl Scanner {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            current: 0,
            line: 1,
            column: 1,
            in_comment: false,
            string: None,
            open_blocks: Vec::new(),
            eop_found: false,
            stream: ProgramStream::new(),
        }
    }

    fn at(&self) -> Option<char> {
        self.chars.get(self.current).copied()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.current + 1).copied()
    }

    fn here(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn advance(&mut self) {
        if let Some(ch) = self.at() {
            self.current += 1;
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn push(&mut self, kind: Kind, lexeme: impl Into<String>, position: Position) {
        self.stream.push(Token::new(kind, lexeme, position));
    }

    fn push_invalid(&mut self, ch: char, position: Position, reason: &str) {
        let shown = if ch.is_control() {
            ch.escape_default().to_string()
        } else {
            ch.to_string()
        };
        let message = format!("Invalid character \"{}\" ({})", shown, reason);
        debug!("invalid character {:?} at {}", ch, position);
        self.stream.push(
            Token::new(Kind::Punctuation, ch.to_string(), position)
                .with_diagnostic(Diagnostic::error(message)),
        );
    }

    fn push_warning(&mut self, message: String, position: Position) {
        debug!("{} at {}", message, position);
        self.stream
            .push(Token::new(Kind::Punctuation, "", position).with_diagnostic(Diagnostic::warning(message)));
    }

    fn scan(mut self) -> ProgramStream {
        while let Some(ch) = self.at() {
            let start = self.here();

            if self.string.is_some() {
                self.advance();
                self.scan_string_char(ch, start);
                continue;
            }

            if self.in_comment {
                if ch == '*' && self.peek() == Some('/') {
                    self.advance();
                    self.in_comment = false;
                    debug!("comment closed at {}", start);
                }
                self.advance();
                continue;
            }

            match ch {
                '"' => {
                    self.advance();
                    self.string = Some(Vec::new());
                }
                '/' if self.peek() == Some('*') => {
                    self.advance();
                    self.advance();
                    self.in_comment = true;
                    debug!("comment opened at {}", start);
                }
                '{' => {
                    self.advance();
                    self.push(Kind::OpeningBlock, "{", start);
                    self.open_blocks.push(start);
                }
                '}' => {
                    self.advance();
                    let token = Token::new(Kind::ClosingBlock, "}", start);
                    let token = match self.open_blocks.pop() {
                        Some(_) => token,
                        None => token.with_diagnostic(Diagnostic::warning("Unexpected closing symbol")),
                    };
                    self.stream.push(token);
                }
                '(' | ')' => {
                    self.advance();
                    self.push(Kind::Punctuation, ch.to_string(), start);
                }
                '=' | '!' if self.peek() == Some('=') => {
                    self.advance();
                    self.advance();
                    self.push(Kind::BooleanOperator, format!("{}=", ch), start);
                }
                '=' => {
                    self.advance();
                    self.push(Kind::Assignment, "=", start);
                }
                '+' => {
                    self.advance();
                    self.push(Kind::Addition, "+", start);
                }
                '$' => {
                    self.advance();
                    self.end_program(start);
                }
                c if c.is_ascii_digit() => self.scan_number(start),
                c if c.is_ascii_lowercase() => self.scan_word(start),
                c if c.is_ascii_uppercase() => self.scan_capitalized(start),
                c if c.is_whitespace() => self.advance(),
                c => {
                    // ' and a lone ! are in the alphabet but start no token.
                    let reason = if is_permitted(c) {
                        "Unexpected symbol"
                    } else {
                        "Invalid character"
                    };
                    self.advance();
                    self.push_invalid(c, start, reason);
                }
            }
        }

        self.finish()
    }

    fn scan_string_char(&mut self, ch: char, start: Position) {
        match ch {
            '"' => {
                let buffer = self.string.take().unwrap_or_default();
                for c in buffer {
                    self.push(Kind::StringChar, c.to_string(), start);
                }
            }
            c if c.is_ascii_lowercase() => {
                if let Some(buffer) = self.string.as_mut() {
                    buffer.push(c);
                }
            }
            c => self.push_invalid(c, start, "Invalid character"),
        }
    }

    fn end_program(&mut self, start: Position) {
        self.push(Kind::EndOfProgram, "$", start);
        self.eop_found = true;
        self.stream.begin_program();
        self.line += 1;
        self.column = 1;
        debug!("program {} ended at {}", self.stream.len() - 1, start);
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> String {
        let mut lexeme = String::new();
        while let Some(ch) = self.at().filter(|c| predicate(*c)) {
            lexeme.push(ch);
            self.advance();
        }
        lexeme
    }

    fn scan_number(&mut self, start: Position) {
        let number = self.take_while(|c| c.is_ascii_digit());
        self.push(Kind::Number, number, start);
    }

    fn scan_word(&mut self, start: Position) {
        let word = self.take_while(|c| c.is_ascii_lowercase());
        let kind = word_kind(&word);
        self.push(kind, word, start);
    }

    /// `True` and `False` are the only words that may start with a capital.
    fn scan_capitalized(&mut self, start: Position) {
        let end = self.chars[self.current..]
            .iter()
            .position(|c| !c.is_ascii_alphabetic())
            .map_or(self.chars.len(), |offset| self.current + offset);
        let word: String = self.chars[self.current..end].iter().collect();

        if BOOLEAN_VALUES.contains(&word.as_str()) {
            for _ in 0..word.len() {
                self.advance();
            }
            self.push(Kind::BooleanValue, word, start);
        } else if let Some(ch) = self.at() {
            self.advance();
            self.push_invalid(ch, start, "Unexpected symbol");
        }
    }

    fn finish(mut self) -> ProgramStream {
        let end = self.here();

        while let Some(opened) = self.open_blocks.pop() {
            self.push_warning(format!("Unclosed {{ opened at line {}", opened), end);
        }
        if self.in_comment {
            self.push_warning("Unclosed comment at the end of the source code".to_string(), end);
        }
        if self.string.take().is_some() {
            self.push_warning("Unclosed string literal at the end of the source code".to_string(), end);
        }
        if !self.eop_found {
            self.push_warning("No end-of-program sign ('$') found".to_string(), end);
        }

        self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Severity;
    use test_log::test;

    fn kinds(source: &str) -> Vec<Kind> {
        scan(source).tokens().map(|token| token.kind()).collect()
    }

    fn messages(stream: &ProgramStream) -> Vec<String> {
        stream
            .diagnostics()
            .map(|(_, diagnostic)| diagnostic.message.clone())
            .collect()
    }

    #[test]
    fn classifies_words() {
        assert_eq!(
            kinds("{int a string boolean print while if true x}$"),
            vec![
                Kind::OpeningBlock,
                Kind::DataType,
                Kind::Identifier,
                Kind::DataType,
                Kind::DataType,
                Kind::Print,
                Kind::While,
                Kind::If,
                Kind::Keyword,
                Kind::Identifier,
                Kind::ClosingBlock,
                Kind::EndOfProgram,
            ]
        );
    }

    #[test]
    fn words_and_numbers_are_greedy() {
        let stream = scan("abc 1234$");
        let lexemes: Vec<&str> = stream.tokens().map(|token| token.lexeme()).collect();
        assert_eq!(lexemes, vec!["abc", "1234", "$"]);
        assert_eq!(stream.programs()[0][0].kind(), Kind::Identifier);
        assert_eq!(stream.programs()[0][1].kind(), Kind::Number);
    }

    #[test]
    fn two_character_operators_consume_both() {
        let stream = scan("(a==b)(a!=b)a=b$");
        let tokens: Vec<(Kind, &str)> = stream.tokens().map(|t| (t.kind(), t.lexeme())).collect();
        assert_eq!(tokens[2], (Kind::BooleanOperator, "=="));
        assert_eq!(tokens[7], (Kind::BooleanOperator, "!="));
        assert_eq!(tokens[11], (Kind::Assignment, "="));
        assert!(!stream.has_errors());
    }

    #[test]
    fn boolean_values_need_exact_capitalized_word() {
        let stream = scan("True False Trve$");
        let program = &stream.programs()[0];
        assert_eq!(program[0].kind(), Kind::BooleanValue);
        assert_eq!(program[1].kind(), Kind::BooleanValue);
        assert_eq!(program[2].lexeme(), "T");
        assert_eq!(program[2].diagnostic().map(|d| d.severity), Some(Severity::Error));
        assert_eq!(program[3].lexeme(), "rve");
    }

    #[test]
    fn tracks_lines_and_columns() {
        let stream = scan("{\n  int a\n}$");
        let positions: Vec<Position> = stream.tokens().map(|token| token.position()).collect();
        assert_eq!(
            positions,
            vec![
                Position::new(1, 1),
                Position::new(2, 3),
                Position::new(2, 7),
                Position::new(3, 1),
                Position::new(3, 2),
            ]
        );
    }

    #[test]
    fn string_characters_share_the_closing_position() {
        let stream = scan("\"ab\"$");
        let program = &stream.programs()[0];
        assert_eq!(program[0].kind(), Kind::StringChar);
        assert_eq!(program[0].lexeme(), "a");
        assert_eq!(program[1].lexeme(), "b");
        assert_eq!(program[0].position(), Position::new(1, 4));
        assert_eq!(program[1].position(), Position::new(1, 4));
    }

    #[test]
    fn string_recovers_per_character() {
        let stream = scan("\"a B1c\"$");
        assert_eq!(messages(&stream).len(), 3);
        let strings: String = stream
            .tokens()
            .filter(|token| token.kind() == Kind::StringChar)
            .map(|token| token.lexeme())
            .collect();
        assert_eq!(strings, "ac");
    }

    #[test]
    fn quote_inside_comment_is_comment_text() {
        let stream = scan("/* say \"hi */ {}$");
        assert_eq!(
            stream.tokens().map(|t| t.kind()).collect::<Vec<_>>(),
            vec![Kind::OpeningBlock, Kind::ClosingBlock, Kind::EndOfProgram]
        );
        assert!(messages(&stream).is_empty());
    }

    #[test]
    fn comments_still_count_lines() {
        let stream = scan("/* one\ntwo */ x$");
        assert_eq!(stream.programs()[0][0].position(), Position::new(2, 8));
    }

    #[test]
    fn unclosed_string_is_reported() {
        let stream = scan("{\"abc$");
        assert!(messages(&stream).contains(&"Unclosed string literal at the end of the source code".to_string()));
        assert!(!stream.tokens().any(|token| token.kind() == Kind::StringChar));
    }

    #[test]
    fn permitted_set_matches_language_alphabet() {
        for ch in ['a', 'Z', '7', ' ', '\n', '"', '\'', '{', '}', '=', '!', '$', '(', ')'] {
            assert!(is_permitted(ch), "{ch:?} should be permitted");
        }
        for ch in ['@', ';', '-', '*', '/', '#', 'é'] {
            assert!(!is_permitted(ch), "{ch:?} should not be permitted");
        }
    }

    #[test]
    fn stray_permitted_symbols_are_errors() {
        let stream = scan("' !$");
        assert_eq!(
            messages(&stream),
            vec![
                "Invalid character \"'\" (Unexpected symbol)".to_string(),
                "Invalid character \"!\" (Unexpected symbol)".to_string(),
            ]
        );
        assert!(stream.has_errors());
    }

    #[test]
    fn newline_inside_string_is_reported_and_counted() {
        let stream = scan("\"a\nb\"$");
        let errors: Vec<(&Token, &Diagnostic)> = stream.diagnostics().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0.position(), Position::new(1, 3));
        assert_eq!(errors[0].1.message, "Invalid character \"\\n\" (Invalid character)");

        let strings: Vec<(&str, Position)> = stream
            .tokens()
            .filter(|token| token.kind() == Kind::StringChar)
            .map(|token| (token.lexeme(), token.position()))
            .collect();
        assert_eq!(strings, vec![("a", Position::new(2, 2)), ("b", Position::new(2, 2))]);
    }
}
