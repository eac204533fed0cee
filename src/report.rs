use std::fmt::Write;

use crate::token::{Kind, ProgramStream, Severity, Token};

/// Renders the scanner's human readable report, one section per program.
pub fn render(stream: &ProgramStream) -> String {
    let mut output = String::new();

    for (index, program) in stream.programs().iter().enumerate() {
        let _ = writeln!(output, "Program {}:", index + 1);
        let mut clean = true;

        for token in program {
            if token.diagnostic().is_some() {
                clean = false;
            }
            let _ = writeln!(output, "{}", describe(token));
        }

        if clean {
            output.push_str("No errors or warnings found.\n\n");
        }
    }

    output
}

fn describe(token: &Token) -> String {
    let position = token.position();
    match token.diagnostic() {
        Some(diagnostic) => match diagnostic.severity {
            Severity::Warning => format!("Warning: {} at line {}", diagnostic.message, position),
            Severity::Error => format!("Error - {} at line {}", diagnostic.message, position),
        },
        None if token.kind() == Kind::Keyword => {
            format!("Keyword \"{}\", found at ({})", token.lexeme(), position)
        }
        None => format!(
            "Debug-Lexer- [ {} ], Type: {}, found at ({})",
            token.lexeme(),
            token.kind(),
            position
        ),
    }
}
