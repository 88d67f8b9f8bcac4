//! Front-end diagnostics
//!
//! Every problem found while tokenizing or parsing is a [`Diagnostic`]. None of
//! them abort the parse: lexical errors skip one character, syntax errors skip
//! to the next statement boundary, and unresolved references degrade to an
//! empty argument binding. All of them are returned next to the best-effort AST.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A character no token starts with
    #[error("Lexical error at line {line}, column {column}: unexpected character '{character}'")]
    LexicalError {
        character: char,
        line: usize,
        column: usize,
    },

    /// A token the grammar cannot accept at this point
    #[error("Syntax error at line {line} before '{lexeme}': expected {expected}")]
    SyntaxError {
        line: usize,
        column: usize,
        lexeme: String,
        expected: String,
    },

    /// Call whose callee is unknown or whose arity does not match (non-fatal)
    #[error("Unresolved reference '{name}' at line {line}: {reason}")]
    UnresolvedReference {
        name: String,
        line: usize,
        reason: String,
    },
}

impl Diagnostic {
    /// False for warnings that only leave a binding empty.
    pub fn is_error(&self) -> bool {
        !matches!(self, Diagnostic::UnresolvedReference { .. })
    }

    pub fn line(&self) -> usize {
        match self {
            Diagnostic::LexicalError { line, .. }
            | Diagnostic::SyntaxError { line, .. }
            | Diagnostic::UnresolvedReference { line, .. } => *line,
        }
    }
}
