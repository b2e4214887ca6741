//! Parse diagnostics.

use std::fmt;

/// A line-numbered diagnostic produced while lexing or parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub line: u32,
    pub message: String,
}

impl Diagnostic {
    pub fn new(line: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }

    /// The classic parser error message.
    pub fn syntax(line: u32) -> Self {
        Self {
            line,
            message: format!("syntax error at line {}", line),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
