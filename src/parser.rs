use log::{debug, trace};

use crate::error::SyntaxError;
use crate::token::{Kind, Program, ProgramStream, Token};

/// Deepest block or parenthesis nesting the parser descends into.
pub const MAX_DEPTH: usize = 256;

/// Checks every program in `stream` against the grammar. An empty result
/// means the stream was accepted.
pub fn parse(stream: &ProgramStream) -> Vec<SyntaxError> {
    Parser::new(stream).parse()
}

/// Recursive-descent checker over a scanned stream.
///
/// The cursor is a (program, token) pair that walks across program
/// boundaries. Tokens the scanner already rejected, and the empty tokens that
/// only carry end-of-input warnings, are stepped over.
///
/// Recovery: a failed [`Parser::eat`] reports without consuming, an invalid
/// statement reports and skips one token, and a program that does not end in
/// `$` is skipped up to and including the next `$`. Every loop below consumes
/// at least one token per turn. Nesting past [`MAX_DEPTH`] is reported once
/// and skipped up to its matching close.
pub struct Parser<'a> {
    programs: &'a [Program],
    program: usize,
    index: usize,
    program_number: usize,
    depth: usize,
    diagnostics: Vec<SyntaxError>,
}

#[derive(Debug, Clone, Copy)]
enum Nesting {
    Block,
    Paren,
}

impl Nesting {
    fn opens(self, token: &Token) -> bool {
        match self {
            Nesting::Block => token.kind() == Kind::OpeningBlock,
            Nesting::Paren => token.kind() == Kind::Punctuation && token.lexeme() == "(",
        }
    }

    fn closes(self, token: &Token) -> bool {
        match self {
            Nesting::Block => token.kind() == Kind::ClosingBlock,
            Nesting::Paren => token.kind() == Kind::Punctuation && token.lexeme() == ")",
        }
    }

    /// Tokens a skip never crosses.
    fn stops_at(self, token: &Token) -> bool {
        match self {
            Nesting::Block => token.kind() == Kind::EndOfProgram,
            Nesting::Paren => matches!(token.kind(), Kind::EndOfProgram | Kind::ClosingBlock),
        }
    }
}

impl<'a> Parser<'a> {
    pub fn new(stream: &'a ProgramStream) -> Self {
        let mut parser = Self {
            programs: stream.programs(),
            program: 0,
            index: 0,
            program_number: 1,
            depth: 0,
            diagnostics: Vec::new(),
        };
        parser.settle();
        parser
    }

    pub fn parse(mut self) -> Vec<SyntaxError> {
        loop {
            self.parse_program();
            if self.current().is_none() {
                break;
            }
        }
        self.diagnostics
    }

    fn current(&self) -> Option<&'a Token> {
        self.programs
            .get(self.program)
            .and_then(|program| program.get(self.index))
    }

    fn current_kind(&self) -> Option<Kind> {
        self.current().map(|token| token.kind())
    }

    fn at(&self, kind: Kind) -> bool {
        self.current_kind() == Some(kind)
    }

    fn at_symbol(&self, symbol: &str) -> bool {
        self.current()
            .is_some_and(|token| token.kind() == Kind::Punctuation && token.lexeme() == symbol)
    }

    /// Moves the cursor onto the next token the grammar should see.
    fn settle(&mut self) {
        while let Some(program) = self.programs.get(self.program) {
            match program.get(self.index) {
                Some(token) if token.is_trivia() => self.index += 1,
                Some(_) => return,
                None => {
                    self.program += 1;
                    self.index = 0;
                }
            }
        }
    }

    fn advance(&mut self) {
        if self.current().is_some() {
            self.index += 1;
            self.settle();
        }
    }

    fn describe_current(&self) -> String {
        match self.current() {
            Some(token) if token.kind() == Kind::Punctuation => {
                format!("{} '{}'", token.kind(), token.lexeme())
            }
            Some(token) => token.kind().to_string(),
            None => "end of input".to_string(),
        }
    }

    fn report(&mut self, message: String) {
        let error = SyntaxError::new(self.program_number, self.current(), message);
        debug!("{}", error);
        self.diagnostics.push(error);
    }

    fn eat(&mut self, expecting: Kind) -> bool {
        if self.at(expecting) {
            self.advance();
            return true;
        }
        let message = format!("Expected {} but found {}", expecting, self.describe_current());
        self.report(message);
        false
    }

    fn eat_symbol(&mut self, symbol: &str) -> bool {
        if self.at_symbol(symbol) {
            self.advance();
            return true;
        }
        let message = format!("Expected '{}' but found {}", symbol, self.describe_current());
        self.report(message);
        false
    }

    /// Descends one level, or reports and skips the whole nested group when
    /// that would go past [`MAX_DEPTH`]. Callers that get `true` must call
    /// [`Parser::leave`].
    fn enter(&mut self, nesting: Nesting) -> bool {
        if self.depth < MAX_DEPTH {
            self.depth += 1;
            return true;
        }
        self.report("Nesting too deep".to_string());
        self.skip_nested(nesting);
        false
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Skips from an opening token past its matching close, stopping early
    /// before `$` (and before `}` inside parentheses).
    fn skip_nested(&mut self, nesting: Nesting) {
        if !self.current().is_some_and(|token| nesting.opens(token)) {
            return;
        }
        let mut level = 0usize;
        while let Some(token) = self.current() {
            if nesting.stops_at(token) {
                break;
            }
            self.advance();
            if nesting.opens(token) {
                level += 1;
            } else if nesting.closes(token) {
                level -= 1;
                if level == 0 {
                    break;
                }
            }
        }
        debug!("skipped nested group in program {}", self.program_number);
    }

    fn parse_program(&mut self) {
        self.program_number = self.program.min(self.programs.len().saturating_sub(1)) + 1;
        trace!("Parsing Program {}...", self.program_number);

        while self.at(Kind::OpeningBlock) {
            self.parse_block();
        }

        if self.at(Kind::EndOfProgram) {
            self.advance();
            trace!("Program {} Parsed Successfully!", self.program_number);
        } else {
            let message = format!("Expected {} but found {}", Kind::EndOfProgram, self.describe_current());
            self.report(message);
            self.synchronize();
        }
    }

    /// Skips past the next end-of-program token.
    fn synchronize(&mut self) {
        while let Some(token) = self.current() {
            self.advance();
            if token.kind() == Kind::EndOfProgram {
                break;
            }
        }
    }

    fn parse_block(&mut self) {
        if !self.enter(Nesting::Block) {
            return;
        }
        trace!("Parsing Block...");
        self.eat(Kind::OpeningBlock);

        while let Some(kind) = self.current_kind() {
            if matches!(kind, Kind::ClosingBlock | Kind::EndOfProgram) {
                break;
            }
            self.parse_statement();
        }

        self.eat(Kind::ClosingBlock);
        self.leave();
        trace!("Block Parsed");
    }

    fn parse_statement(&mut self) {
        match self.current_kind() {
            Some(Kind::Print) => self.parse_print_statement(),
            Some(Kind::Identifier) => self.parse_assignment_statement(),
            Some(Kind::DataType) => self.parse_var_decl(),
            Some(Kind::While) => {
                trace!("Parsing While Statement...");
                self.eat(Kind::While);
                self.parse_boolean_expr();
                self.parse_block();
            }
            Some(Kind::If) => {
                trace!("Parsing If Statement...");
                self.eat(Kind::If);
                self.parse_boolean_expr();
                self.parse_block();
            }
            Some(Kind::OpeningBlock) => self.parse_block(),
            _ => {
                self.report("Invalid Statement".to_string());
                self.advance();
            }
        }
    }

    fn parse_print_statement(&mut self) {
        trace!("Parsing Print Statement...");
        self.eat(Kind::Print);
        self.eat_symbol("(");
        self.parse_expr();
        self.eat_symbol(")");
    }

    fn parse_assignment_statement(&mut self) {
        trace!("Parsing Assignment Statement...");
        self.eat(Kind::Identifier);
        self.eat(Kind::Assignment);
        self.parse_expr();
    }

    fn parse_var_decl(&mut self) {
        trace!("Parsing Variable Declaration...");
        self.eat(Kind::DataType);
        self.eat(Kind::Identifier);
    }

    fn parse_expr(&mut self) {
        match self.current_kind() {
            Some(Kind::Number) => {
                self.advance();
                while self.at(Kind::Addition) {
                    self.advance();
                    if self.at(Kind::Number) {
                        self.advance();
                    } else {
                        self.parse_expr();
                        break;
                    }
                }
            }
            Some(Kind::StringChar) => {
                while self.at(Kind::StringChar) {
                    self.advance();
                }
            }
            Some(Kind::BooleanValue) | Some(Kind::Identifier) => self.advance(),
            Some(Kind::Punctuation) if self.at_symbol("(") => self.parse_boolean_expr(),
            _ => self.report("Invalid Expression".to_string()),
        }
    }

    fn parse_boolean_expr(&mut self) {
        if !self.enter(Nesting::Paren) {
            return;
        }
        trace!("Parsing Boolean Expression...");
        self.eat_symbol("(");
        self.parse_expr();
        self.eat(Kind::BooleanOperator);
        self.parse_expr();
        self.eat_symbol(")");
        self.leave();
    }
}
