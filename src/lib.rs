//! # Introduction
//!
//! cppscope is the front end of a C++ memory visualizer. It parses a teaching
//! subset of C++ and produces an AST in which every declared entity carries
//! its lexical scope and a synthetic memory id, together with the function
//! and class tables built along the way.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Lexer → Parser (+ scope resolver, id allocator, registry) → ParseOutput
//! ```
//!
//! 1. [`parser::lexer`] turns source text into tokens and reports stray
//!    characters.
//! 2. [`parser::parse`] builds the AST by recursive descent. Semantic work
//!    happens as each construct is recognized: scopes are opened around
//!    bodies, ids are allocated for declarations, and calls are bound to
//!    parameter names against what has been declared so far.
//! 3. [`semantic`] holds the per-parse state: the [`semantic::scope::ScopeStack`],
//!    the [`semantic::ids::IdAllocator`] and the [`semantic::registry::Registry`].
//!
//! Errors never abort a parse. The returned [`ParseOutput`] carries the
//! best-effort AST together with every diagnostic.
//!
//! ```
//! let output = cppscope::parse_source("int main() { int x = 1; return x; }");
//! assert!(output.diagnostics.is_empty());
//! assert_eq!(output.ast.len(), 1);
//! ```

pub mod config;
pub mod parser;
pub mod semantic;

pub use config::FrontendConfig;
pub use parser::errors::Diagnostic;
pub use parser::parse::{ParseOutput, Parser};

use log::debug;
use parser::lexer::Lexer;

/// Tokenize and parse `source` with the default configuration.
pub fn parse_source(source: &str) -> ParseOutput {
    parse_source_with(source, &FrontendConfig::default())
}

/// Tokenize and parse `source`.
///
/// Every call starts from fresh state, so repeated calls on the same input
/// produce identical output.
pub fn parse_source_with(source: &str, config: &FrontendConfig) -> ParseOutput {
    let mut lexer = Lexer::new(source);
    let tokens = lexer.tokenize();

    if config.log_tokens {
        for token in &tokens {
            debug!(
                "{:>4}:{:<3} {:<14} {}",
                token.location.line,
                token.location.column,
                token.kind.name(),
                token
            );
        }
    }

    Parser::with_config(tokens, config)
        .with_diagnostics(lexer.errors().to_vec())
        .parse_program()
}
