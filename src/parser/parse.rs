//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure:
//! token helpers, scoped acquisition of lexical scopes, error recovery, and the
//! main parse entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, and coordination
//! - `declarations`: functions, `main`, classes and variable declarators
//! - `statements`: assignments, calls, object declarations, control flow
//! - `expressions`: value expressions with precedence climbing
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared [`ParserState`]. Resolution happens while
//! parsing: scopes are pushed before a body is read, ids are allocated as
//! declarations complete, and calls bind against whatever the registry holds
//! at that point.

use crate::config::FrontendConfig;
use crate::parser::ast::{SourceLocation, Stmt};
use crate::parser::errors::Diagnostic;
use crate::parser::lexer::{Token, TokenKind};
use crate::semantic::registry::{ClassTable, FunctionTable};
use crate::semantic::scope::ScopeId;
use crate::semantic::ParserState;
use log::{debug, warn};
use serde::Serialize;

pub type ParseResult<T> = Result<T, Diagnostic>;

/// Everything one parse produces.
#[derive(Debug, Clone, Serialize)]
pub struct ParseOutput {
    pub ast: Vec<Stmt>,
    pub functions: FunctionTable,
    pub classes: ClassTable,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseOutput {
    /// Lexical and syntax errors (unresolved references excluded).
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }

    /// `Err` with the error diagnostics when any were recorded.
    pub fn into_result(self) -> Result<ParseOutput, Vec<Diagnostic>> {
        if self.has_errors() {
            Err(self.errors().cloned().collect())
        } else {
            Ok(self)
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Recursive descent parser for the C++ subset
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    pub(crate) state: ParserState,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self::with_config(tokens, &FrontendConfig::default())
    }

    pub fn with_config(mut tokens: Vec<Token>, config: &FrontendConfig) -> Self {
        if !matches!(tokens.last(), Some(Token { kind: TokenKind::Eof, .. })) {
            let location = tokens.last().map(|t| t.location).unwrap_or_default();
            tokens.push(Token::new(TokenKind::Eof, location));
        }
        Self {
            tokens,
            position: 0,
            state: ParserState::new(config),
        }
    }

    /// Seed the diagnostics list (lexical errors found before parsing).
    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.state.diagnostics.extend(diagnostics);
        self
    }

    /// Parse the entire program.
    ///
    /// Never fails: errors are recorded and the parser resynchronizes at the
    /// next statement boundary. When nothing parsed but errors were seen, the
    /// AST is a single [`Stmt::ParseError`] sentinel.
    pub fn parse_program(mut self) -> ParseOutput {
        debug!("parsing {} tokens", self.tokens.len());
        let mut ast = Vec::new();

        while !self.is_at_end() {
            let start = self.position;
            match self.parse_statement() {
                Ok(stmt) => ast.push(stmt),
                Err(error) => self.recover(error, start),
            }
        }

        let ParserState {
            registry,
            diagnostics,
            ..
        } = self.state;

        let errors: Vec<String> = diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(ToString::to_string)
            .collect();
        if ast.is_empty() && !errors.is_empty() {
            ast.push(Stmt::ParseError {
                message: format!("Failed to parse source: {} error(s)", errors.len()),
                errors,
            });
        }

        let (functions, classes) = registry.into_tables();
        ParseOutput {
            ast,
            functions,
            classes,
            diagnostics,
        }
    }

    /// Statements up to (not including) the closing `}` of a block.
    pub(crate) fn parse_block_body(&mut self) -> Vec<Stmt> {
        let mut body = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            let start = self.position;
            match self.parse_statement() {
                Ok(stmt) => body.push(stmt),
                Err(error) => self.recover(error, start),
            }
        }
        body
    }

    /// Run `parse` with `scope` open; the scope is closed again whether or
    /// not `parse` succeeds.
    pub(crate) fn scoped<T>(
        &mut self,
        scope: ScopeId,
        parse: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        self.state.scopes.push(scope);
        let result = parse(self);
        self.state.scopes.pop();
        result
    }

    pub(crate) fn current_scope(&self) -> ScopeId {
        self.state.scopes.current()
    }

    // ===== Error handling =====

    /// Record `error` raised by the statement that began at token `start`
    /// and move on to the next statement.
    pub(crate) fn recover(&mut self, error: Diagnostic, start: usize) {
        warn!("{}", error);
        self.state.diagnostics.push(error);
        if !self.at_next_statement(start) {
            self.synchronize();
        }
    }

    /// True when the failed statement ran into a token that opens a statement
    /// at the start of a later line, as with a missing `;`. The parser has
    /// already moved past `start`, so resuming here makes progress.
    fn at_next_statement(&self, start: usize) -> bool {
        let Some(first) = self.tokens.get(start) else {
            return false;
        };
        let line = self.current_line();
        self.position > start
            && line > first.location.line
            && self.previous().location.line < line
            && matches!(
                self.peek_kind(),
                TokenKind::Type(_)
                    | TokenKind::Class
                    | TokenKind::Struct
                    | TokenKind::If
                    | TokenKind::While
                    | TokenKind::Return
                    | TokenKind::Delete
                    | TokenKind::Ident(_)
            )
    }

    pub(crate) fn report(&mut self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
        self.state.diagnostics.push(diagnostic);
    }

    /// Skip to the next statement boundary: past a `;` at the current nesting
    /// level, past a balanced `{ ... }` group, or up to a `}` that closes the
    /// enclosing block. Always consumes at least one token.
    fn synchronize(&mut self) {
        let start = self.position;
        let mut depth = 0usize;

        while !self.is_at_end() {
            match self.peek_kind() {
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        self.match_token(&TokenKind::Semicolon);
                        return;
                    }
                }
                _ => {}
            }
            self.advance();
        }

        if self.position == start && !self.is_at_end() {
            self.advance();
        }
    }

    /// Syntax error at the current token.
    pub(crate) fn error_expected(&self, expected: impl Into<String>) -> Diagnostic {
        let token = self.peek();
        Diagnostic::SyntaxError {
            line: token.location.line,
            column: token.location.column,
            lexeme: token.kind.lexeme(),
            expected: expected.into(),
        }
    }

    // ===== Helper methods =====

    pub(crate) fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(kind)
    }

    pub(crate) fn check_ahead(&self, n: usize, kind: &TokenKind) -> bool {
        self.peek_ahead(n)
            .is_some_and(|k| std::mem::discriminant(k) == std::mem::discriminant(kind))
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&TokenKind> {
        self.tokens.get(self.position + n).map(|t| &t.kind)
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location
    }

    pub(crate) fn current_line(&self) -> usize {
        self.peek().location.line
    }

    pub(crate) fn expect_token(&mut self, kind: &TokenKind, expected: &str) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance().clone())
        } else {
            Err(self.error_expected(expected))
        }
    }

    pub(crate) fn expect_lparen(&mut self, ctx: &str) -> ParseResult<Token> {
        self.expect_token(&TokenKind::LParen, &format!("'(' {ctx}"))
    }

    pub(crate) fn expect_rparen(&mut self, ctx: &str) -> ParseResult<Token> {
        self.expect_token(&TokenKind::RParen, &format!("')' {ctx}"))
    }

    pub(crate) fn expect_lbrace(&mut self, ctx: &str) -> ParseResult<Token> {
        self.expect_token(&TokenKind::LBrace, &format!("'{{' {ctx}"))
    }

    pub(crate) fn expect_rbrace(&mut self, ctx: &str) -> ParseResult<Token> {
        self.expect_token(&TokenKind::RBrace, &format!("'}}' {ctx}"))
    }

    pub(crate) fn expect_semicolon(&mut self, ctx: &str) -> ParseResult<Token> {
        self.expect_token(&TokenKind::Semicolon, &format!("';' {ctx}"))
    }

    pub(crate) fn expect_identifier(&mut self, ctx: &str) -> ParseResult<String> {
        if let TokenKind::Ident(name) = self.peek_kind() {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.error_expected(format!("identifier {ctx}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::Lexer;

    fn parse(source: &str) -> ParseOutput {
        let tokens = Lexer::new(source).tokenize();
        Parser::new(tokens).parse_program()
    }

    #[test]
    fn test_parse_simple_main() {
        let output = parse("int main() { return 0; }");

        assert!(output.diagnostics.is_empty());
        assert_eq!(output.ast.len(), 1);
        match &output.ast[0] {
            Stmt::MainDecl(main) => {
                assert_eq!(main.scope, ScopeId::main());
                assert_eq!(main.body.len(), 1);
            }
            other => panic!("Expected main function, got {:?}", other),
        }
        assert!(output.functions.is_empty());
    }

    #[test]
    fn test_recovers_at_next_statement() {
        let output = parse("int x = ;\nint y = 2;");

        assert_eq!(output.ast.len(), 1);
        assert!(matches!(&output.ast[0], Stmt::Declaration(d) if d.declarations[0].name == "y"));
        assert!(matches!(
            output.diagnostics[0],
            Diagnostic::SyntaxError { line: 1, .. }
        ));
    }

    #[test]
    fn test_missing_semicolon_keeps_next_statement() {
        let output = parse("int x = 5\nint y = 2;\nint z = 3;");

        let names: Vec<&str> = output
            .ast
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::Declaration(d) => Some(d.declarations[0].name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["y", "z"]);
        assert_eq!(output.errors().count(), 1);
        assert!(matches!(
            &output.diagnostics[0],
            Diagnostic::SyntaxError { line: 2, lexeme, .. } if lexeme == "int"
        ));
    }

    #[test]
    fn test_missing_semicolon_in_block() {
        let output = parse("int main() {\n    int a = 1\n    a = 2;\n    return a;\n}");

        assert_eq!(output.errors().count(), 1);
        match &output.ast[0] {
            Stmt::MainDecl(main) => {
                assert_eq!(main.body.len(), 2);
                assert!(matches!(&main.body[0], Stmt::Assignment { name, .. } if name == "a"));
                assert!(matches!(main.body[1], Stmt::Return { .. }));
            }
            other => panic!("Expected main function, got {:?}", other),
        }
    }

    #[test]
    fn test_stray_closing_brace_is_skipped() {
        let output = parse("} int z;");

        assert_eq!(output.ast.len(), 1);
        assert_eq!(output.errors().count(), 1);
    }

    #[test]
    fn test_sentinel_when_nothing_parses() {
        let output = parse("= = ;");

        assert_eq!(output.ast.len(), 1);
        match &output.ast[0] {
            Stmt::ParseError { errors, message } => {
                assert!(!errors.is_empty());
                assert!(message.starts_with("Failed to parse"));
            }
            other => panic!("Expected sentinel, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_input_has_no_sentinel() {
        let output = parse("// nothing here\n");
        assert!(output.ast.is_empty());
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_into_result() {
        assert!(parse("int a;").into_result().is_ok());

        let errors = parse("int a").into_result().unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_scopes_balanced_after_errors() {
        let tokens = Lexer::new("int f(int a) { if (a < ) { int b; } }").tokenize();
        let mut parser = Parser::new(tokens);
        while !parser.is_at_end() {
            let start = parser.position;
            if let Err(error) = parser.parse_statement() {
                parser.recover(error, start);
            }
        }
        assert_eq!(parser.state.scopes.depth(), 0);
        assert!(!parser.state.diagnostics.is_empty());
    }
}
