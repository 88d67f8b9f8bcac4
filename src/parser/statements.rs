//! Statement parsing
//!
//! Dispatches on the leading tokens of a statement. Statements that start
//! with a name are told apart by what follows it: another name is an object
//! declaration, `*` and a name is a class pointer declaration, anything else
//! is parsed as an expression and then classified by the token after it
//! (`=`, a compound operator, or `;` after a call).

use crate::parser::ast::{Allocation, CompoundOp, Expr, Stmt};
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseResult, Parser};
use crate::semantic::propagate::{propagate_all, propagate_bindings, propagate_scope};
use crate::semantic::scope::ScopeId;

impl Parser {
    /// Parse a statement
    pub(crate) fn parse_statement(&mut self) -> ParseResult<Stmt> {
        match self.peek_kind() {
            TokenKind::Type(_) => {
                if self.check_ahead(1, &TokenKind::Main) {
                    self.parse_main()
                } else if matches!(self.peek_ahead(1), Some(TokenKind::Ident(_)))
                    && self.check_ahead(2, &TokenKind::LParen)
                {
                    self.parse_function_definition()
                } else {
                    self.parse_declaration()
                }
            }
            TokenKind::Class | TokenKind::Struct => self.parse_class(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Delete => self.parse_delete(),
            TokenKind::Ident(_) => match self.peek_ahead(1) {
                Some(TokenKind::Ident(_)) => self.parse_object_declaration(),
                Some(TokenKind::Pointer)
                    if matches!(self.peek_ahead(2), Some(TokenKind::Ident(_))) =>
                {
                    self.parse_class_pointer_declaration()
                }
                _ => self.parse_expression_statement(),
            },
            _ => Err(self.error_expected("statement")),
        }
    }

    /// Parse a body in its own scope: `{ stmts }` or a single statement.
    pub(crate) fn parse_body(&mut self, scope: ScopeId, ctx: &str) -> ParseResult<Vec<Stmt>> {
        self.scoped(scope, |p| {
            if p.match_token(&TokenKind::LBrace) {
                let body = p.parse_block_body();
                p.expect_rbrace(ctx)?;
                Ok(body)
            } else {
                Ok(vec![p.parse_statement()?])
            }
        })
    }

    /// Parse if statement
    fn parse_if(&mut self) -> ParseResult<Stmt> {
        let line = self.current_line();
        self.advance(); // consume 'if'

        let scope = self.current_scope();
        let condition = self.parse_condition(&scope, "after 'if'")?;
        let if_body = self.parse_body(ScopeId::IfBody, "after if body")?;

        let else_body = if self.match_token(&TokenKind::Else) {
            Some(self.parse_body(ScopeId::ElseBody, "after else body")?)
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            if_body,
            else_body,
            scope,
            line,
        })
    }

    /// Parse while loop
    fn parse_while(&mut self) -> ParseResult<Stmt> {
        let line = self.current_line();
        self.advance(); // consume 'while'

        let scope = self.current_scope();
        let condition = self.parse_condition(&scope, "after 'while'")?;
        let body = self.parse_body(ScopeId::WhileBody, "after while body")?;

        Ok(Stmt::While {
            condition,
            body,
            scope,
            line,
        })
    }

    /// `( expr )`, resolved in the enclosing scope rather than the body's.
    fn parse_condition(&mut self, enclosing: &ScopeId, ctx: &str) -> ParseResult<Expr> {
        self.expect_lparen(ctx)?;
        let mut condition = self.parse_expression()?;
        self.expect_rparen("after condition")?;
        propagate_scope(&mut condition, enclosing);
        Ok(condition)
    }

    /// Parse return statement
    fn parse_return(&mut self) -> ParseResult<Stmt> {
        let line = self.current_line();
        self.advance(); // consume 'return'
        let scope = self.current_scope();

        let value = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            let mut value = self.parse_expression()?;
            propagate_scope(&mut value, &scope);
            Some(value)
        };

        self.expect_semicolon("after return")?;
        Ok(Stmt::Return { value, scope, line })
    }

    /// Parse `delete expr;` / `delete[] expr;`
    fn parse_delete(&mut self) -> ParseResult<Stmt> {
        let line = self.current_line();
        self.advance(); // consume 'delete'
        let scope = self.current_scope();

        let array = if self.match_token(&TokenKind::LBracket) {
            self.expect_token(&TokenKind::RBracket, "']' after 'delete['")?;
            true
        } else {
            false
        };

        let mut target = self.parse_postfix()?;
        propagate_scope(&mut target, &scope);
        self.expect_semicolon("after delete")?;

        Ok(Stmt::Delete {
            target,
            array,
            scope,
            line,
        })
    }

    /// Parse `Class name;`, `Class name(args);`, `Class name{args};`
    fn parse_object_declaration(&mut self) -> ParseResult<Stmt> {
        let line = self.current_line();
        let scope = self.current_scope();
        let class_type = self.expect_identifier("for class type")?;
        let name = self.expect_identifier("for object name")?;

        let mut call = self.parse_constructor_call(&class_type, line)?;
        self.expect_semicolon("after object declaration")?;

        propagate_all(&mut call.args, &scope);
        propagate_bindings(&mut call.arg_param_map, &scope);
        let memory_id = self.state.ids.allocate();
        self.state.scopes.declare_object(&name, &class_type);

        Ok(Stmt::ObjectDeclaration {
            class_type,
            name,
            constructor_type: call.kind,
            constructor_args: call.args,
            arg_param_map: call.arg_param_map,
            scope,
            memory_id,
            line,
        })
    }

    /// Parse `Class* name;`, `Class* name = new Class{..};`, `Class* name = expr;`
    fn parse_class_pointer_declaration(&mut self) -> ParseResult<Stmt> {
        let line = self.current_line();
        let scope = self.current_scope();
        let class_type = self.expect_identifier("for class type")?;
        self.expect_token(&TokenKind::Pointer, "'*'")?;
        let name = self.expect_identifier("for pointer name")?;

        let mut stmt_allocation = None;
        let mut allocated_type = None;
        let mut constructor_type = None;
        let mut constructor_args = Vec::new();
        let mut arg_param_map = Vec::new();
        let mut value = None;

        if self.match_token(&TokenKind::Equals) {
            let allocates_object = self.check(&TokenKind::New)
                && matches!(self.peek_ahead(1), Some(TokenKind::Ident(_)))
                && !self.check_ahead(2, &TokenKind::LBracket);

            if allocates_object {
                let new_line = self.current_line();
                self.advance(); // consume 'new'
                let allocated = self.expect_identifier("after 'new'")?;
                let call = self.parse_constructor_call(&allocated, new_line)?;

                stmt_allocation = Some(Allocation::New);
                allocated_type = Some(allocated);
                constructor_type = Some(call.kind);
                constructor_args = call.args;
                arg_param_map = call.arg_param_map;
            } else {
                value = Some(self.parse_expression()?);
            }
        }

        self.expect_semicolon("after pointer declaration")?;

        propagate_all(&mut constructor_args, &scope);
        propagate_bindings(&mut arg_param_map, &scope);
        if let Some(value) = value.as_mut() {
            propagate_scope(value, &scope);
        }
        let memory_id = self.state.ids.allocate();
        self.state.scopes.declare_object(&name, &class_type);

        Ok(Stmt::ClassPointerDeclaration {
            class_type,
            name,
            allocation: stmt_allocation,
            allocated_type,
            constructor_type,
            constructor_args,
            arg_param_map,
            value,
            scope,
            memory_id,
            line,
        })
    }

    /// Assignments and calls that start with an expression.
    fn parse_expression_statement(&mut self) -> ParseResult<Stmt> {
        let line = self.current_line();
        let scope = self.current_scope();
        let target = self.parse_postfix()?;

        let compound = match self.peek_kind() {
            TokenKind::Increment => Some(CompoundOp::Increment),
            TokenKind::Decrement => Some(CompoundOp::Decrement),
            TokenKind::PlusEquals => Some(CompoundOp::AddAssign),
            TokenKind::MinusEquals => Some(CompoundOp::SubAssign),
            TokenKind::TimesEquals => Some(CompoundOp::MulAssign),
            TokenKind::DivideEquals => Some(CompoundOp::DivAssign),
            _ => None,
        };

        if let Some(operator) = compound {
            let name = match &target {
                Expr::Variable { name, .. } => name.clone(),
                _ => return Err(self.error_expected("variable before compound assignment")),
            };
            self.advance();

            let value = match operator {
                CompoundOp::Increment | CompoundOp::Decrement => None,
                _ => {
                    let mut value = self.parse_expression()?;
                    propagate_scope(&mut value, &scope);
                    Some(value)
                }
            };
            self.expect_semicolon("after compound assignment")?;

            return Ok(Stmt::CompoundAssignment {
                name,
                operator,
                value,
                scope,
                line,
            });
        }

        if self.match_token(&TokenKind::Equals) {
            let mut value = self.parse_expression()?;
            self.expect_semicolon("after assignment")?;
            propagate_scope(&mut value, &scope);
            return self.assignment(target, value, scope, line);
        }

        if !self.check(&TokenKind::Semicolon) {
            return Err(self.error_expected("'=', compound assignment or ';'"));
        }
        let stmt = self.call_statement(target, scope, line)?;
        self.advance(); // consume ';'
        Ok(stmt)
    }

    /// Classify `target = value` by the shape of the target.
    fn assignment(
        &self,
        mut target: Expr,
        value: Expr,
        scope: ScopeId,
        line: usize,
    ) -> ParseResult<Stmt> {
        propagate_scope(&mut target, &scope);
        let root = target.root_name().map(str::to_string);

        match (target, root) {
            (Expr::Variable { name, .. }, _) => Ok(Stmt::Assignment {
                name,
                value,
                scope,
                line,
            }),
            (
                Expr::MemberAccess {
                    object,
                    member,
                    operator,
                },
                Some(root),
            ) => Ok(Stmt::MemberAssignment {
                object: root,
                object_expr: *object,
                member,
                operator,
                value,
                scope,
                line,
            }),
            (target @ Expr::ArrayAccess { .. }, Some(root)) => Ok(Stmt::IndexAssignment {
                name: root,
                target,
                value,
                scope,
                line,
            }),
            _ => Err(self.error_expected("assignable expression before '='")),
        }
    }

    /// A function or method call used as a statement.
    fn call_statement(&self, mut call: Expr, scope: ScopeId, line: usize) -> ParseResult<Stmt> {
        propagate_scope(&mut call, &scope);

        match call {
            Expr::FunctionCall {
                name,
                args,
                arg_param_map,
            } => Ok(Stmt::FunctionCall {
                name,
                args,
                arg_param_map,
                scope,
                line,
            }),
            Expr::MethodCall {
                object,
                method,
                operator,
                args,
                arg_param_map,
            } => Ok(Stmt::MethodCall {
                object: *object,
                method,
                operator,
                args,
                arg_param_map,
                scope,
                line,
            }),
            _ => Err(self.error_expected("assignment or call")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::AccessOperator;
    use crate::parser::lexer::Lexer;
    use crate::parser::parse::ParseOutput;

    fn parse(source: &str) -> ParseOutput {
        Parser::new(Lexer::new(source).tokenize()).parse_program()
    }

    fn main_body(output: &ParseOutput) -> &[Stmt] {
        output
            .ast
            .iter()
            .find_map(|stmt| match stmt {
                Stmt::MainDecl(main) => Some(main.body.as_slice()),
                _ => None,
            })
            .expect("Expected main function")
    }

    #[test]
    fn test_assignment_forms() {
        let output = parse(
            "int main() { int x; int a[3]; x = 1; a[0] = x; x++; x += 2; p->next->data = 3; }",
        );
        let body = main_body(&output);

        assert!(matches!(&body[2], Stmt::Assignment { name, .. } if name == "x"));
        assert!(matches!(&body[3], Stmt::IndexAssignment { name, .. } if name == "a"));
        assert!(matches!(
            &body[4],
            Stmt::CompoundAssignment {
                operator: CompoundOp::Increment,
                value: None,
                ..
            }
        ));
        assert!(matches!(
            &body[5],
            Stmt::CompoundAssignment {
                operator: CompoundOp::AddAssign,
                value: Some(_),
                ..
            }
        ));
        match &body[6] {
            Stmt::MemberAssignment {
                object,
                object_expr,
                member,
                operator,
                scope,
                ..
            } => {
                assert_eq!(object, "p");
                assert_eq!(member, "data");
                assert_eq!(*operator, AccessOperator::Arrow);
                assert!(matches!(
                    object_expr,
                    Expr::MemberAccess { member, .. } if member == "next"
                ));
                assert_eq!(*scope, ScopeId::main());
            }
            other => panic!("Expected member assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_member_call_is_method_call_not_assignment() {
        let output = parse("int main() { list.push(1); }");
        let body = main_body(&output);

        assert!(matches!(
            &body[0],
            Stmt::MethodCall { method, operator: AccessOperator::Dot, .. } if method == "push"
        ));
    }

    #[test]
    fn test_condition_scoped_to_enclosing() {
        let output = parse("int main() { int i = 0; while (i < 3) { int j = i; i++; } }");
        let body = main_body(&output);

        match &body[1] {
            Stmt::While {
                condition,
                body,
                scope,
                ..
            } => {
                assert_eq!(*scope, ScopeId::main());
                match condition {
                    Expr::Comparison { left, .. } => assert!(matches!(
                        left.as_ref(),
                        Expr::Variable { scope, .. } if *scope == ScopeId::main()
                    )),
                    other => panic!("Expected comparison, got {:?}", other),
                }
                match &body[0] {
                    Stmt::Declaration(decl) => {
                        assert_eq!(decl.declarations[0].scope, ScopeId::WhileBody);
                    }
                    other => panic!("Expected declaration, got {:?}", other),
                }
            }
            other => panic!("Expected while loop, got {:?}", other),
        }
    }

    #[test]
    fn test_if_else_scopes() {
        let output =
            parse("int main() { int a; if (a == 1) { int b; } else if (a > 1) { int c; } }");
        let body = main_body(&output);

        match &body[1] {
            Stmt::If {
                if_body, else_body, ..
            } => {
                assert_eq!(if_body[0].scope(), Some(&ScopeId::IfBody));
                let else_body = else_body.as_ref().expect("Expected else branch");
                match &else_body[0] {
                    Stmt::If { scope, if_body, .. } => {
                        assert_eq!(*scope, ScopeId::ElseBody);
                        assert_eq!(if_body[0].scope(), Some(&ScopeId::IfBody));
                    }
                    other => panic!("Expected nested if, got {:?}", other),
                }
            }
            other => panic!("Expected if statement, got {:?}", other),
        }
    }

    #[test]
    fn test_delete_forms() {
        let output = parse("int main() { int* a = new int[4]; delete[] a; delete p->next; }");
        let body = main_body(&output);

        assert!(matches!(&body[1], Stmt::Delete { array: true, .. }));
        assert!(matches!(
            &body[2],
            Stmt::Delete { array: false, target: Expr::MemberAccess { .. }, .. }
        ));
    }

    #[test]
    fn test_non_call_expression_statement_is_error() {
        let output = parse("int main() { x; int y; }");

        assert_eq!(output.errors().count(), 1);
        assert_eq!(main_body(&output).len(), 1);
    }
}
