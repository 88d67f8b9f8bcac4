//! Expression parsing
//!
//! Precedence climbing, loosest first:
//! equality, relational, additive, multiplicative, unary, postfix
//! (member access, indexing, method calls), primary (literals, names, calls,
//! `new`, grouping). Argument lists are comma separated. Assignment is a
//! statement form and is handled in `statements`.

use crate::parser::ast::{
    AccessOperator, ArgBinding, ArithmeticOp, ComparisonOp, ConstructorKind, Expr,
};
use crate::parser::errors::Diagnostic;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseResult, Parser};
use crate::semantic::registry::BindError;

/// Arguments of a constructor invocation and their binding.
pub(crate) struct ConstructorCall {
    pub kind: ConstructorKind,
    pub args: Vec<Expr>,
    pub arg_param_map: Vec<ArgBinding>,
}

impl Parser {
    /// Parse a value expression.
    pub(crate) fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_equality()
    }

    /// Parse equality: `==`, `!=`
    fn parse_equality(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_relational()?;

        loop {
            let operator = match self.peek_kind() {
                TokenKind::EqEq => ComparisonOp::Eq,
                TokenKind::NotEq => ComparisonOp::Ne,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            left = Expr::Comparison {
                left: Box::new(left),
                operator,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parse relational: `<`, `<=`, `>`, `>=`
    fn parse_relational(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_additive()?;

        loop {
            let operator = match self.peek_kind() {
                TokenKind::Lt => ComparisonOp::Lt,
                TokenKind::Le => ComparisonOp::Le,
                TokenKind::Gt => ComparisonOp::Gt,
                TokenKind::Ge => ComparisonOp::Ge,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = Expr::Comparison {
                left: Box::new(left),
                operator,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parse additive: `+`, `-`
    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let operator = match self.peek_kind() {
                TokenKind::Plus => ArithmeticOp::Add,
                TokenKind::Minus => ArithmeticOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary {
                left: Box::new(left),
                operator,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parse multiplicative: `*`, `/`, `%`
    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;

        loop {
            let operator = match self.peek_kind() {
                TokenKind::Pointer => ArithmeticOp::Mul,
                TokenKind::Slash => ArithmeticOp::Div,
                TokenKind::Percent => ArithmeticOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary {
                left: Box::new(left),
                operator,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parse unary: `-literal`, `&name`
    fn parse_unary(&mut self) -> ParseResult<Expr> {
        match self.peek_kind() {
            TokenKind::Minus => {
                self.advance();
                match self.peek_kind() {
                    TokenKind::Number(n) => {
                        let value = n.negate();
                        self.advance();
                        Ok(Expr::Number { value })
                    }
                    _ => Err(self.error_expected("number after unary '-'")),
                }
            }
            TokenKind::Address => {
                self.advance();
                let name = self.expect_identifier("after '&'")?;
                Ok(Expr::Address {
                    name,
                    scope: self.current_scope(),
                })
            }
            _ => self.parse_postfix(),
        }
    }

    /// Parse postfix: `.member`, `->member`, `.method(args)`, `[index]`
    pub(crate) fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            let operator = match self.peek_kind() {
                TokenKind::Dot => AccessOperator::Dot,
                TokenKind::Arrow => AccessOperator::Arrow,
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect_token(&TokenKind::RBracket, "']' after array index")?;
                    expr = Expr::ArrayAccess {
                        array: Box::new(expr),
                        index: Box::new(index),
                    };
                    continue;
                }
                _ => break,
            };
            self.advance();

            let line = self.current_line();
            let member = self.expect_identifier("after member access operator")?;

            if self.match_token(&TokenKind::LParen) {
                let args = self.parse_arguments(&TokenKind::RParen, "')' after method arguments")?;
                let class_hint = self.class_of(&expr);
                let result =
                    self.state.registry.bind_method_call(class_hint.as_deref(), &member, &args);
                let arg_param_map = self.bind_or_report(&member, line, result);
                expr = Expr::MethodCall {
                    object: Box::new(expr),
                    method: member,
                    operator,
                    args,
                    arg_param_map,
                };
            } else {
                expr = Expr::MemberAccess {
                    object: Box::new(expr),
                    member,
                    operator,
                };
            }
        }

        Ok(expr)
    }

    /// Parse primary expressions
    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let expr = match self.peek_kind() {
            TokenKind::Number(n) => Expr::Number { value: *n },
            TokenKind::StringLiteral(s) => Expr::Str { value: s.clone() },
            TokenKind::CharLiteral(c) => Expr::Char { value: c.clone() },
            TokenKind::Nullptr => Expr::Nullptr,
            TokenKind::Ident(name) => {
                let name = name.clone();
                let line = self.current_line();
                self.advance();

                if self.match_token(&TokenKind::LParen) {
                    let args =
                        self.parse_arguments(&TokenKind::RParen, "')' after call arguments")?;
                    let result = self.state.registry.bind_function_call(&name, &args);
                    let arg_param_map = self.bind_or_report(&name, line, result);
                    return Ok(Expr::FunctionCall {
                        name,
                        args,
                        arg_param_map,
                    });
                }

                return Ok(self.variable(name));
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect_rparen("after expression")?;
                return Ok(inner);
            }
            TokenKind::New => return self.parse_new(),
            _ => return Err(self.error_expected("expression")),
        };

        self.advance();
        Ok(expr)
    }

    /// Parse `new T[n]`, `new C`, `new C{args}`, `new C(args)`
    fn parse_new(&mut self) -> ParseResult<Expr> {
        let line = self.current_line();
        self.advance(); // consume 'new'

        let data_type = match self.peek_kind() {
            TokenKind::Type(t) | TokenKind::Ident(t) => t.clone(),
            _ => return Err(self.error_expected("type after 'new'")),
        };
        self.advance();

        if self.check(&TokenKind::LBracket) {
            let size = self.parse_array_size()?;
            return Ok(Expr::NewArray { data_type, size });
        }

        let call = self.parse_constructor_call(&data_type, line)?;
        Ok(Expr::NewObject {
            class_type: data_type,
            constructor_type: call.kind,
            constructor_args: call.args,
            arg_param_map: call.arg_param_map,
        })
    }

    /// Optional `{args}` / `(args)` after a class name, bound against the
    /// class's constructors. No arguments is the default constructor.
    pub(crate) fn parse_constructor_call(
        &mut self,
        class_type: &str,
        line: usize,
    ) -> ParseResult<ConstructorCall> {
        let args = if self.match_token(&TokenKind::LBrace) {
            self.parse_arguments(&TokenKind::RBrace, "'}' after constructor arguments")?
        } else if self.match_token(&TokenKind::LParen) {
            self.parse_arguments(&TokenKind::RParen, "')' after constructor arguments")?
        } else {
            Vec::new()
        };

        if args.is_empty() {
            return Ok(ConstructorCall {
                kind: ConstructorKind::Default,
                args,
                arg_param_map: Vec::new(),
            });
        }

        let result = self.state.registry.bind_constructor_call(class_type, &args);
        let arg_param_map = self.bind_or_report(class_type, line, result);
        Ok(ConstructorCall {
            kind: ConstructorKind::Parameterized,
            args,
            arg_param_map,
        })
    }

    /// Comma-separated expressions up to and including `close`; the opening
    /// delimiter has already been consumed.
    pub(crate) fn parse_arguments(
        &mut self,
        close: &TokenKind,
        expected: &str,
    ) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();

        if !self.check(close) {
            loop {
                args.push(self.parse_expression()?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect_token(close, expected)?;
        Ok(args)
    }

    /// `[N]` with a non-negative integer literal.
    pub(crate) fn parse_array_size(&mut self) -> ParseResult<u64> {
        self.expect_token(&TokenKind::LBracket, "'['")?;
        let size = match self.peek_kind() {
            TokenKind::Number(n) => n.as_size(),
            _ => None,
        };
        let size = size.ok_or_else(|| self.error_expected("non-negative integer size"))?;
        self.advance();
        self.expect_token(&TokenKind::RBracket, "']' after array size")?;
        Ok(size)
    }

    /// Variable reference in the current scope, typed when the name is a
    /// visible object or class pointer.
    pub(crate) fn variable(&self, name: String) -> Expr {
        let class_type = self
            .state
            .scopes
            .class_type_of(&name)
            .map(str::to_string);
        Expr::Variable {
            name,
            scope: self.current_scope(),
            class_type,
        }
    }

    /// Class of the object an expression denotes, when it can be tracked:
    /// typed variables and members declared as class references.
    pub(crate) fn class_of(&self, expr: &Expr) -> Option<String> {
        match expr {
            Expr::Variable { class_type, .. } => class_type.clone(),
            Expr::MemberAccess { object, member, .. } => {
                let owner = self.class_of(object)?;
                let class = self.state.registry.lookup_class(&owner)?;
                class
                    .member_variable(member)?
                    .class_type()
                    .map(str::to_string)
            }
            Expr::NewObject { class_type, .. } => Some(class_type.clone()),
            _ => None,
        }
    }

    /// Unwrap a binding, degrading to an empty map with a warning.
    pub(crate) fn bind_or_report(
        &mut self,
        name: &str,
        line: usize,
        result: Result<Vec<ArgBinding>, BindError>,
    ) -> Vec<ArgBinding> {
        match result {
            Ok(map) => map,
            Err(reason) => {
                self.report(Diagnostic::UnresolvedReference {
                    name: name.to_string(),
                    line,
                    reason: reason.to_string(),
                });
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::Number;
    use crate::parser::lexer::Lexer;
    use crate::semantic::scope::ScopeId;

    fn parse_expr(source: &str) -> Expr {
        let tokens = Lexer::new(source).tokenize();
        let mut parser = Parser::new(tokens);
        parser.parse_expression().expect("Failed to parse expression")
    }

    fn var(name: &str) -> Expr {
        Expr::Variable {
            name: name.to_string(),
            scope: ScopeId::Global,
            class_type: None,
        }
    }

    fn int(n: i64) -> Expr {
        Expr::Number {
            value: Number::Int(n),
        }
    }

    #[test]
    fn test_arithmetic_binds_tighter_than_comparison() {
        let expr = parse_expr("a + 2 * b < 10");

        match expr {
            Expr::Comparison {
                left,
                operator: ComparisonOp::Lt,
                right,
            } => {
                assert_eq!(*right, int(10));
                match *left {
                    Expr::Binary {
                        operator: ArithmeticOp::Add,
                        right: product,
                        ..
                    } => assert!(matches!(
                        *product,
                        Expr::Binary {
                            operator: ArithmeticOp::Mul,
                            ..
                        }
                    )),
                    other => panic!("Expected addition, got {:?}", other),
                }
            }
            other => panic!("Expected comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_member_access_binds_tighter_than_comparison() {
        let expr = parse_expr("p->next != nullptr");

        assert_eq!(
            expr,
            Expr::Comparison {
                left: Box::new(Expr::MemberAccess {
                    object: Box::new(var("p")),
                    member: "next".to_string(),
                    operator: AccessOperator::Arrow,
                }),
                operator: ComparisonOp::Ne,
                right: Box::new(Expr::Nullptr),
            }
        );
    }

    #[test]
    fn test_grouping_and_negative_literal() {
        let expr = parse_expr("(x - -3) / 2");

        match expr {
            Expr::Binary {
                left,
                operator: ArithmeticOp::Div,
                ..
            } => assert_eq!(
                *left,
                Expr::Binary {
                    left: Box::new(var("x")),
                    operator: ArithmeticOp::Sub,
                    right: Box::new(int(-3)),
                }
            ),
            other => panic!("Expected division, got {:?}", other),
        }
    }

    #[test]
    fn test_index_chain() {
        let expr = parse_expr("m[i][1]");

        match expr {
            Expr::ArrayAccess { array, index } => {
                assert_eq!(*index, int(1));
                assert!(matches!(*array, Expr::ArrayAccess { .. }));
            }
            other => panic!("Expected array access, got {:?}", other),
        }
    }

    #[test]
    fn test_new_forms() {
        assert_eq!(
            parse_expr("new int[5]"),
            Expr::NewArray {
                data_type: "int".to_string(),
                size: 5,
            }
        );

        match parse_expr("new Node{1, nullptr}") {
            Expr::NewObject {
                class_type,
                constructor_type,
                constructor_args,
                arg_param_map,
            } => {
                assert_eq!(class_type, "Node");
                assert_eq!(constructor_type, ConstructorKind::Parameterized);
                assert_eq!(constructor_args.len(), 2);
                // Node is not declared here
                assert!(arg_param_map.is_empty());
            }
            other => panic!("Expected new object, got {:?}", other),
        }

        assert!(matches!(
            parse_expr("new Node"),
            Expr::NewObject {
                constructor_type: ConstructorKind::Default,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_call_is_unbound() {
        let tokens = Lexer::new("f(1, 2)").tokenize();
        let mut parser = Parser::new(tokens);
        let expr = parser.parse_expression().unwrap();

        assert!(matches!(
            expr,
            Expr::FunctionCall { ref arg_param_map, .. } if arg_param_map.is_empty()
        ));
        assert!(matches!(
            parser.state.diagnostics[0],
            Diagnostic::UnresolvedReference { ref name, .. } if name == "f"
        ));
    }

    #[test]
    fn test_array_size_rejects_float() {
        let tokens = Lexer::new("new int[2.5]").tokenize();
        let mut parser = Parser::new(tokens);
        assert!(parser.parse_expression().is_err());
    }
}
