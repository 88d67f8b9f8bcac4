//! Lexer (tokenizer) for the C++ subset
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the parser.
//! `#include` lines, `using namespace std;`, and comments are skipped rather
//! than tokenized. An unrecognized character is recorded as a
//! [`Diagnostic::LexicalError`] and exactly that one character is skipped, so a
//! single stray byte never costs the rest of the file.

use super::ast::{Number, SourceLocation};
use super::errors::Diagnostic;
use log::{trace, warn};
use serde::Serialize;
use std::fmt;

/// Keywords that name a primitive (non-class) type.
pub const PRIMITIVE_TYPES: &[&str] =
    &["int", "float", "double", "char", "string", "void", "bool", "long"];

/// Returns true when `name` is one of the [`PRIMITIVE_TYPES`].
pub fn is_primitive_type(name: &str) -> bool {
    PRIMITIVE_TYPES.contains(&name)
}

/// Token classification.
///
/// Literal and identifier variants carry their processed value; everything
/// else is a bare marker. Positions live on the wrapping [`Token`].
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(Number),
    StringLiteral(String),
    CharLiteral(String),

    // Identifiers
    Ident(String),

    // Keywords
    Type(String),
    Main,
    Class,
    Struct,
    New,
    Delete,
    If,
    Else,
    While,
    Return,
    Public,
    Private,
    Protected,
    Nullptr,

    // Assignment
    Equals,       // =
    PlusEquals,   // +=
    MinusEquals,  // -=
    TimesEquals,  // *=
    DivideEquals, // /=
    Increment,    // ++
    Decrement,    // --

    // Arithmetic
    Plus,    // +
    Minus,   // -
    Slash,   // /
    Percent, // %

    // Comparison
    EqEq,  // ==
    NotEq, // !=
    Lt,    // <
    Le,    // <=
    Gt,    // >
    Ge,    // >=
    Bang,  // !

    // Pointers and member access
    Pointer, // *
    Address, // &
    Arrow,   // ->
    Dot,     // .

    Tilde, // ~
    Colon, // :

    // Punctuation
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
    Semicolon, // ;
    Comma,     // ,

    Eof,
}

impl TokenKind {
    /// Upper-case kind name, as shown in token dumps and syntax errors.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Number(_) => "NUMBER",
            TokenKind::StringLiteral(_) => "STRING_LITERAL",
            TokenKind::CharLiteral(_) => "CHAR_LITERAL",
            TokenKind::Ident(_) => "IDENTIFIER",
            TokenKind::Type(_) => "TYPE",
            TokenKind::Main => "MAIN",
            TokenKind::Class => "CLASS",
            TokenKind::Struct => "STRUCT",
            TokenKind::New => "NEW",
            TokenKind::Delete => "DELETE",
            TokenKind::If => "IF",
            TokenKind::Else => "ELSE",
            TokenKind::While => "WHILE",
            TokenKind::Return => "RETURN",
            TokenKind::Public => "PUBLIC",
            TokenKind::Private => "PRIVATE",
            TokenKind::Protected => "PROTECTED",
            TokenKind::Nullptr => "NULLPTR",
            TokenKind::Equals => "EQUALS",
            TokenKind::PlusEquals => "PLUS_EQUALS",
            TokenKind::MinusEquals => "MINUS_EQUALS",
            TokenKind::TimesEquals => "TIMES_EQUALS",
            TokenKind::DivideEquals => "DIVIDE_EQUALS",
            TokenKind::Increment => "INCREMENT",
            TokenKind::Decrement => "DECREMENT",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Slash => "DIVIDE",
            TokenKind::Percent => "MODULO",
            TokenKind::EqEq => "EQ",
            TokenKind::NotEq => "NE",
            TokenKind::Lt => "LT",
            TokenKind::Le => "LE",
            TokenKind::Gt => "GT",
            TokenKind::Ge => "GE",
            TokenKind::Bang => "NOT",
            TokenKind::Pointer => "POINTER",
            TokenKind::Address => "ADDRESS",
            TokenKind::Arrow => "ARROW",
            TokenKind::Dot => "DOT",
            TokenKind::Tilde => "TILDE",
            TokenKind::Colon => "COLON",
            TokenKind::LParen => "LPAREN",
            TokenKind::RParen => "RPAREN",
            TokenKind::LBrace => "LBRACE",
            TokenKind::RBrace => "RBRACE",
            TokenKind::LBracket => "LBRACKET",
            TokenKind::RBracket => "RBRACKET",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::Comma => "COMMA",
            TokenKind::Eof => "EOF",
        }
    }

    /// Source spelling of the token (literal value for literals).
    pub fn lexeme(&self) -> String {
        match self {
            TokenKind::Number(n) => n.to_string(),
            TokenKind::StringLiteral(s) => format!("\"{}\"", s),
            TokenKind::CharLiteral(c) => format!("'{}'", c),
            TokenKind::Ident(s) | TokenKind::Type(s) => s.clone(),
            TokenKind::Main => "main".to_string(),
            TokenKind::Class => "class".to_string(),
            TokenKind::Struct => "struct".to_string(),
            TokenKind::New => "new".to_string(),
            TokenKind::Delete => "delete".to_string(),
            TokenKind::If => "if".to_string(),
            TokenKind::Else => "else".to_string(),
            TokenKind::While => "while".to_string(),
            TokenKind::Return => "return".to_string(),
            TokenKind::Public => "public".to_string(),
            TokenKind::Private => "private".to_string(),
            TokenKind::Protected => "protected".to_string(),
            TokenKind::Nullptr => "nullptr".to_string(),
            TokenKind::Equals => "=".to_string(),
            TokenKind::PlusEquals => "+=".to_string(),
            TokenKind::MinusEquals => "-=".to_string(),
            TokenKind::TimesEquals => "*=".to_string(),
            TokenKind::DivideEquals => "/=".to_string(),
            TokenKind::Increment => "++".to_string(),
            TokenKind::Decrement => "--".to_string(),
            TokenKind::Plus => "+".to_string(),
            TokenKind::Minus => "-".to_string(),
            TokenKind::Slash => "/".to_string(),
            TokenKind::Percent => "%".to_string(),
            TokenKind::EqEq => "==".to_string(),
            TokenKind::NotEq => "!=".to_string(),
            TokenKind::Lt => "<".to_string(),
            TokenKind::Le => "<=".to_string(),
            TokenKind::Gt => ">".to_string(),
            TokenKind::Ge => ">=".to_string(),
            TokenKind::Bang => "!".to_string(),
            TokenKind::Pointer => "*".to_string(),
            TokenKind::Address => "&".to_string(),
            TokenKind::Arrow => "->".to_string(),
            TokenKind::Dot => ".".to_string(),
            TokenKind::Tilde => "~".to_string(),
            TokenKind::Colon => ":".to_string(),
            TokenKind::LParen => "(".to_string(),
            TokenKind::RParen => ")".to_string(),
            TokenKind::LBrace => "{".to_string(),
            TokenKind::RBrace => "}".to_string(),
            TokenKind::LBracket => "[".to_string(),
            TokenKind::RBracket => "]".to_string(),
            TokenKind::Semicolon => ";".to_string(),
            TokenKind::Comma => ",".to_string(),
            TokenKind::Eof => "end of file".to_string(),
        }
    }
}

/// A classified token with the position of its first character.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: SourceLocation,
}

impl Token {
    pub fn new(kind: TokenKind, location: SourceLocation) -> Self {
        Self { kind, location }
    }

    pub fn line(&self) -> usize {
        self.location.line
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TokenKind::Eof => write!(f, "end of file"),
            kind => write!(f, "'{}'", kind.lexeme()),
        }
    }
}

/// Serializable view of a token for `--tokens` dumps: `{type, value, line}`.
#[derive(Debug, Clone, Serialize)]
pub struct TokenRecord {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: String,
    pub line: usize,
}

impl From<&Token> for TokenRecord {
    fn from(token: &Token) -> Self {
        let value = match &token.kind {
            TokenKind::StringLiteral(s) | TokenKind::CharLiteral(s) => s.clone(),
            kind => kind.lexeme(),
        };
        TokenRecord {
            kind: token.kind.name(),
            value,
            line: token.line(),
        }
    }
}

/// Lexer for C++ subset source code
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    errors: Vec<Diagnostic>,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            errors: Vec::new(),
        }
    }

    /// Tokenize the entire input.
    ///
    /// Each call rescans from the start; diagnostics from the previous scan are
    /// discarded. The returned stream always ends with [`TokenKind::Eof`].
    pub fn tokenize(&mut self) -> Vec<Token> {
        self.position = 0;
        self.line = 1;
        self.column = 1;
        self.errors.clear();

        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments();

            if self.is_at_end() {
                tokens.push(Token::new(TokenKind::Eof, self.current_location()));
                break;
            }

            if self.skip_include_directive() || self.skip_using_directive() {
                continue;
            }

            if let Some(token) = self.next_token() {
                trace!("lexed {} at line {}", token.kind.name(), token.line());
                tokens.push(token);
            }
        }

        tokens
    }

    /// Lexical diagnostics collected by the last [`Lexer::tokenize`] call.
    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    /// Get next token, or record an error and skip one character.
    fn next_token(&mut self) -> Option<Token> {
        let loc = self.current_location();
        let ch = self.advance()?;

        let kind = match ch {
            '"' => return self.string_literal(loc),
            '\'' => return self.char_literal(loc),
            '0'..='9' => self.number_literal(ch),
            'a'..='z' | 'A'..='Z' | '_' => self.identifier_or_keyword(ch),

            '+' => {
                if self.match_char('+') {
                    TokenKind::Increment
                } else if self.match_char('=') {
                    TokenKind::PlusEquals
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.match_char('>') {
                    TokenKind::Arrow
                } else if self.match_char('-') {
                    TokenKind::Decrement
                } else if self.match_char('=') {
                    TokenKind::MinusEquals
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.match_char('=') {
                    TokenKind::TimesEquals
                } else {
                    TokenKind::Pointer
                }
            }
            '/' => {
                if self.match_char('=') {
                    TokenKind::DivideEquals
                } else {
                    TokenKind::Slash
                }
            }
            '=' => {
                if self.match_char('=') {
                    TokenKind::EqEq
                } else {
                    TokenKind::Equals
                }
            }
            '!' => {
                if self.match_char('=') {
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if self.match_char('=') {
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.match_char('=') {
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '%' => TokenKind::Percent,
            '&' => TokenKind::Address,
            '.' => TokenKind::Dot,
            '~' => TokenKind::Tilde,
            ':' => TokenKind::Colon,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,

            _ => {
                self.report_unexpected(ch, loc);
                return None;
            }
        };

        Some(Token::new(kind, loc))
    }

    fn report_unexpected(&mut self, ch: char, loc: SourceLocation) {
        let error = Diagnostic::LexicalError {
            character: ch,
            line: loc.line,
            column: loc.column,
        };
        warn!("{}", error);
        self.errors.push(error);
    }

    /// Parse string literal; the surrounding quotes are stripped and escape
    /// sequences are kept verbatim.
    fn string_literal(&mut self, loc: SourceLocation) -> Option<Token> {
        let saved = self.save();
        let mut string = String::new();

        while let Some(ch) = self.peek() {
            match ch {
                '"' => {
                    self.advance();
                    return Some(Token::new(TokenKind::StringLiteral(string), loc));
                }
                '\\' => {
                    self.advance();
                    string.push('\\');
                    match self.advance() {
                        Some(escaped) if escaped != '\n' => string.push(escaped),
                        _ => break,
                    }
                }
                '\n' => break,
                _ => {
                    string.push(ch);
                    self.advance();
                }
            }
        }

        // Unterminated: only the opening quote is rejected
        self.restore(saved);
        self.report_unexpected('"', loc);
        None
    }

    /// Parse character literal: one character or one escape pair between quotes.
    fn char_literal(&mut self, loc: SourceLocation) -> Option<Token> {
        let saved = self.save();
        let mut value = String::new();

        match self.advance() {
            Some('\\') => {
                value.push('\\');
                if let Some(escaped) = self.advance() {
                    value.push(escaped);
                }
            }
            Some(ch) if ch != '\'' && ch != '\n' => value.push(ch),
            _ => {}
        }

        if value.is_empty() || value == "\\" || self.advance() != Some('\'') {
            self.restore(saved);
            self.report_unexpected('\'', loc);
            return None;
        }

        Some(Token::new(TokenKind::CharLiteral(value), loc))
    }

    /// Parse numeric literal: `digits[.digits][(e|E)[+|-]digits]`.
    ///
    /// Integral unless a fraction or exponent is present.
    fn number_literal(&mut self, first_digit: char) -> TokenKind {
        let mut num_str = String::new();
        num_str.push(first_digit);
        self.take_digits(&mut num_str);

        let mut is_float = false;

        if self.peek() == Some('.') && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            num_str.push('.');
            self.advance();
            self.take_digits(&mut num_str);
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            let sign = matches!(self.peek_ahead(1), Some('+') | Some('-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_ahead(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                for _ in 0..digit_at {
                    if let Some(ch) = self.advance() {
                        num_str.push(ch);
                    }
                }
                self.take_digits(&mut num_str);
            }
        }

        let value = if is_float {
            Number::Float(num_str.parse::<f64>().unwrap_or(f64::INFINITY))
        } else {
            match num_str.parse::<i64>() {
                Ok(n) => Number::Int(n),
                // Out of i64 range: keep the magnitude as a float
                Err(_) => Number::Float(num_str.parse::<f64>().unwrap_or(f64::INFINITY)),
            }
        };

        TokenKind::Number(value)
    }

    fn take_digits(&mut self, buf: &mut String) {
        while let Some(ch) = self.peek() {
            if !ch.is_ascii_digit() {
                break;
            }
            buf.push(ch);
            self.advance();
        }
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(&mut self, first_char: char) -> TokenKind {
        let mut ident = String::new();
        ident.push(first_char);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match ident.as_str() {
            "main" => TokenKind::Main,
            "class" => TokenKind::Class,
            "struct" => TokenKind::Struct,
            "new" => TokenKind::New,
            "delete" => TokenKind::Delete,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "return" => TokenKind::Return,
            "public" => TokenKind::Public,
            "private" => TokenKind::Private,
            "protected" => TokenKind::Protected,
            "nullptr" | "NULL" => TokenKind::Nullptr,
            _ if is_primitive_type(&ident) => TokenKind::Type(ident),
            _ => TokenKind::Ident(ident),
        }
    }

    /// Skip whitespace and comments
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') | Some('\n') => {
                    self.advance();
                }
                Some('/') if self.peek_ahead(1) == Some('/') => self.skip_line(),
                Some('/') if self.peek_ahead(1) == Some('*') => self.skip_block_comment(),
                _ => break,
            }
        }
    }

    /// Skip to the end of the current line (the newline stays for line counting).
    fn skip_line(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Skip multi-line comment; an unterminated one runs to end of input.
    fn skip_block_comment(&mut self) {
        self.advance(); // skip '/'
        self.advance(); // skip '*'

        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_ahead(1) == Some('/') {
                self.advance();
                self.advance();
                return;
            }
            self.advance();
        }
    }

    /// Skip `#include <...>` / `#include "..."` through end of line.
    fn skip_include_directive(&mut self) -> bool {
        if self.peek() != Some('#') {
            return false;
        }

        let mut offset = 1;
        while matches!(self.peek_ahead(offset), Some(' ') | Some('\t')) {
            offset += 1;
        }
        if !self.lookahead_is(offset, "include") {
            return false;
        }

        self.skip_line();
        true
    }

    /// Skip `using namespace std;`.
    fn skip_using_directive(&mut self) -> bool {
        if !self.lookahead_is(0, "using") {
            return false;
        }

        let mut offset = "using".len();
        for word in ["namespace", "std"] {
            let start = offset;
            while matches!(self.peek_ahead(offset), Some(' ') | Some('\t')) {
                offset += 1;
            }
            if offset == start || !self.lookahead_is(offset, word) {
                return false;
            }
            offset += word.len();
        }
        while matches!(self.peek_ahead(offset), Some(' ') | Some('\t')) {
            offset += 1;
        }
        if self.peek_ahead(offset) != Some(';') {
            return false;
        }

        for _ in 0..=offset {
            self.advance();
        }
        true
    }

    /// True when `word` starts `offset` characters ahead and is not followed by
    /// another identifier character.
    fn lookahead_is(&self, offset: usize, word: &str) -> bool {
        let matches_word = word
            .chars()
            .enumerate()
            .all(|(i, c)| self.peek_ahead(offset + i) == Some(c));
        let boundary = !self
            .peek_ahead(offset + word.len())
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
        matches_word && boundary
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = *self.input.get(self.position)?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    fn save(&self) -> (usize, usize, usize) {
        (self.position, self.line, self.column)
    }

    fn restore(&mut self, (position, line, column): (usize, usize, usize)) {
        self.position = position;
        self.line = line;
        self.column = column;
    }

    /// Check if at end of input
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Get current source location
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_simple_tokens() {
        let tokens = kinds("int main() { return 0; }");

        assert_eq!(tokens[0], TokenKind::Type("int".to_string()));
        assert_eq!(tokens[1], TokenKind::Main);
        assert_eq!(tokens[2], TokenKind::LParen);
        assert_eq!(tokens[3], TokenKind::RParen);
        assert_eq!(tokens[4], TokenKind::LBrace);
        assert_eq!(tokens[5], TokenKind::Return);
        assert_eq!(tokens[6], TokenKind::Number(Number::Int(0)));
        assert_eq!(tokens[7], TokenKind::Semicolon);
        assert_eq!(tokens[8], TokenKind::RBrace);
        assert_eq!(tokens[9], TokenKind::Eof);
    }

    #[test]
    fn test_longest_match_operators() {
        let tokens = kinds("-> - <= < >= > == = != ! ++ += -- -=");

        assert_eq!(
            tokens,
            vec![
                TokenKind::Arrow,
                TokenKind::Minus,
                TokenKind::Le,
                TokenKind::Lt,
                TokenKind::Ge,
                TokenKind::Gt,
                TokenKind::EqEq,
                TokenKind::Equals,
                TokenKind::NotEq,
                TokenKind::Bang,
                TokenKind::Increment,
                TokenKind::PlusEquals,
                TokenKind::Decrement,
                TokenKind::MinusEquals,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers_int_and_float() {
        let tokens = kinds("42 3.5 1e3 2E-2 7.");

        assert_eq!(tokens[0], TokenKind::Number(Number::Int(42)));
        assert_eq!(tokens[1], TokenKind::Number(Number::Float(3.5)));
        assert_eq!(tokens[2], TokenKind::Number(Number::Float(1000.0)));
        assert_eq!(tokens[3], TokenKind::Number(Number::Float(0.02)));
        // A trailing dot is member access, not a fraction
        assert_eq!(tokens[4], TokenKind::Number(Number::Int(7)));
        assert_eq!(tokens[5], TokenKind::Dot);
    }

    #[test]
    fn test_literals_keep_escapes_verbatim() {
        let tokens = kinds(r#""a\nb" 'x' '\n'"#);

        assert_eq!(tokens[0], TokenKind::StringLiteral(r"a\nb".to_string()));
        assert_eq!(tokens[1], TokenKind::CharLiteral("x".to_string()));
        assert_eq!(tokens[2], TokenKind::CharLiteral(r"\n".to_string()));
    }

    #[test]
    fn test_directives_and_comments_skipped() {
        let source =
            "#include <iostream>\nusing namespace std;\n// note\nint x; /* block\n */ int y;";
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize();

        assert!(lexer.errors().is_empty());
        assert_eq!(tokens[0].kind, TokenKind::Type("int".to_string()));
        assert_eq!(tokens[0].line(), 4);
        assert_eq!(tokens[1].kind, TokenKind::Ident("x".to_string()));
        assert_eq!(tokens[3].kind, TokenKind::Type("int".to_string()));
        assert_eq!(tokens[3].line(), 5);
    }

    #[test]
    fn test_using_prefix_is_an_identifier() {
        let tokens = kinds("usingx = 1;");
        assert_eq!(tokens[0], TokenKind::Ident("usingx".to_string()));
    }

    #[test]
    fn test_unexpected_character_skips_one() {
        let mut lexer = Lexer::new("int a@ = 1;\nint $b;");
        let tokens = lexer.tokenize();

        assert_eq!(lexer.errors().len(), 2);
        assert!(matches!(
            lexer.errors()[0],
            Diagnostic::LexicalError { character: '@', line: 1, .. }
        ));
        assert!(matches!(
            lexer.errors()[1],
            Diagnostic::LexicalError { character: '$', line: 2, .. }
        ));
        assert_eq!(tokens[1].kind, TokenKind::Ident("a".to_string()));
        assert_eq!(tokens[2].kind, TokenKind::Equals);
        assert_eq!(tokens[6].kind, TokenKind::Ident("b".to_string()));
    }

    #[test]
    fn test_lines_are_monotonic() {
        let tokens = Lexer::new("int a;\n\n\nint b;\nb = a;").tokenize();
        let lines: Vec<usize> = tokens.iter().map(Token::line).collect();

        assert!(lines.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(tokens[3].line(), 4);
        assert_eq!(tokens[6].line(), 5);
    }

    #[test]
    fn test_tokenize_is_restartable() {
        let mut lexer = Lexer::new("int x = 1; #");
        let first = lexer.tokenize();
        let second = lexer.tokenize();

        assert_eq!(first, second);
        assert_eq!(lexer.errors().len(), 1);
    }

    #[test]
    fn test_token_record_view() {
        let tokens = Lexer::new("char c = 'z';").tokenize();
        let record = TokenRecord::from(&tokens[3]);

        assert_eq!(record.kind, "CHAR_LITERAL");
        assert_eq!(record.value, "z");
        assert_eq!(record.line, 1);
    }
}
