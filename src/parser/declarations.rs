//! Declaration parsing
//!
//! Variable declarations, free functions, `main`, and class/struct bodies
//! with their members. Every declared entity receives its memory id here.

use crate::parser::ast::{
    Access, Allocation, ArrayValues, ClassDecl, ClassKeyword, ClassMember, ConstructorDecl,
    ConstructorKind, Declaration, Declarator, DeclaratorForm, DestructorDecl, Expr,
    FunctionDecl, MainDecl, MemberVariable, MethodDecl, Param, Stmt,
};
use crate::parser::errors::Diagnostic;
use crate::parser::lexer::{is_primitive_type, TokenKind};
use crate::parser::parse::{ParseResult, Parser};
use crate::semantic::ids::MAX_ARRAY_IDS;
use crate::semantic::propagate::{propagate_all, propagate_bindings, propagate_scope};
use crate::semantic::scope::ScopeId;

impl Parser {
    /// Parse `TYPE declarator (, declarator)* ;`
    pub(crate) fn parse_declaration(&mut self) -> ParseResult<Stmt> {
        let line = self.current_line();
        let data_type = self.parse_type_name("at start of declaration")?;

        let mut declarations = Vec::new();
        loop {
            declarations.push(self.parse_declarator(&data_type)?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        self.expect_semicolon("after declaration")?;
        Ok(Stmt::Declaration(Declaration {
            data_type,
            declarations,
            line,
        }))
    }

    /// A primitive type keyword
    fn parse_type_name(&mut self, ctx: &str) -> ParseResult<String> {
        match self.peek_kind() {
            TokenKind::Type(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error_expected(format!("type {ctx}"))),
        }
    }

    /// A primitive type keyword or a class name
    fn parse_type_or_class_name(&mut self, ctx: &str) -> ParseResult<String> {
        match self.peek_kind() {
            TokenKind::Type(name) | TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error_expected(format!("type {ctx}"))),
        }
    }

    /// Parse one declarator of a declaration list
    fn parse_declarator(&mut self, data_type: &str) -> ParseResult<Declarator> {
        let scope = self.current_scope();
        let line = self.current_line();

        if self.match_token(&TokenKind::Pointer) {
            let name = self.expect_identifier("after '*'")?;
            let form = if self.match_token(&TokenKind::Equals) {
                self.parse_pointer_initializer(&scope)?
            } else {
                DeclaratorForm::Pointer {
                    points_to: None,
                    value: None,
                }
            };
            let memory_id = self.state.ids.allocate();
            return Ok(Declarator {
                name,
                form,
                scope,
                memory_id,
                line,
            });
        }

        let name = self.expect_identifier("in declaration")?;

        if self.check(&TokenKind::LBracket) {
            let dimensions = self.parse_dimensions()?;
            let values = if self.match_token(&TokenKind::Equals) {
                Some(self.parse_array_values(&scope)?)
            } else {
                None
            };
            let memory_id = self
                .state
                .ids
                .allocate_array(data_type, &dimensions)
                .ok_or_else(|| {
                    self.error_expected(format!("array of at most {MAX_ARRAY_IDS} ids"))
                })?;
            return Ok(Declarator {
                name,
                form: DeclaratorForm::Array { dimensions, values },
                scope,
                memory_id,
                line,
            });
        }

        let value = if self.match_token(&TokenKind::Equals) {
            let mut value = self.parse_expression()?;
            propagate_scope(&mut value, &scope);
            Some(value)
        } else {
            None
        };

        let memory_id = self.state.ids.allocate();
        Ok(Declarator {
            name,
            form: DeclaratorForm::Scalar { value },
            scope,
            memory_id,
            line,
        })
    }

    /// Right-hand side of `*p = ...`
    fn parse_pointer_initializer(&mut self, scope: &ScopeId) -> ParseResult<DeclaratorForm> {
        if self.match_token(&TokenKind::Address) {
            let target = self.expect_identifier("after '&'")?;
            return Ok(DeclaratorForm::Pointer {
                points_to: Some(target),
                value: None,
            });
        }

        if self.check(&TokenKind::New) {
            let line = self.current_line();
            self.advance(); // consume 'new'
            let allocated_type = self.parse_type_or_class_name("after 'new'")?;

            if self.check(&TokenKind::LBracket) {
                let array_size = self.parse_array_size()?;
                return Ok(DeclaratorForm::HeapArray {
                    allocation: Allocation::New,
                    allocated_type,
                    array_size,
                });
            }

            if is_primitive_type(&allocated_type) {
                return Ok(DeclaratorForm::HeapScalar {
                    allocation: Allocation::New,
                    allocated_type,
                });
            }

            let mut call = self.parse_constructor_call(&allocated_type, line)?;
            propagate_all(&mut call.args, scope);
            propagate_bindings(&mut call.arg_param_map, scope);
            return Ok(DeclaratorForm::HeapObject {
                allocation: Allocation::New,
                allocated_type,
                constructor_type: call.kind,
                constructor_args: call.args,
                arg_param_map: call.arg_param_map,
            });
        }

        let mut value = self.parse_expression()?;
        propagate_scope(&mut value, scope);
        Ok(DeclaratorForm::Pointer {
            points_to: None,
            value: Some(value),
        })
    }

    /// `[N]` or `[R][C]`
    fn parse_dimensions(&mut self) -> ParseResult<Vec<u64>> {
        let mut dimensions = Vec::new();
        while self.check(&TokenKind::LBracket) {
            if dimensions.len() == 2 {
                return Err(self.error_expected("at most two array dimensions"));
            }
            dimensions.push(self.parse_array_size()?);
        }
        Ok(dimensions)
    }

    /// `{a, b, c}` or `{{a, b}, {c, d}}`
    fn parse_array_values(&mut self, scope: &ScopeId) -> ParseResult<ArrayValues> {
        self.expect_lbrace("to open array initializer")?;

        let values = if self.check(&TokenKind::LBrace) {
            let mut rows = Vec::new();
            loop {
                self.expect_lbrace("to open array row")?;
                let mut row = self.parse_arguments(&TokenKind::RBrace, "'}' after array row")?;
                propagate_all(&mut row, scope);
                rows.push(row);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect_rbrace("after array initializer")?;
            ArrayValues::Nested(rows)
        } else {
            let mut values =
                self.parse_arguments(&TokenKind::RBrace, "'}' after array initializer")?;
            propagate_all(&mut values, scope);
            ArrayValues::Flat(values)
        };

        Ok(values)
    }

    /// Parse `TYPE name ( params ) { body }`
    ///
    /// The signature is registered before the body is parsed so that
    /// recursive calls bind; the full declaration replaces it afterwards.
    pub(crate) fn parse_function_definition(&mut self) -> ParseResult<Stmt> {
        let line = self.current_line();
        let return_type = self.parse_type_name("for function return")?;
        let name = self.expect_identifier("for function name")?;
        let memory_id = self.state.ids.allocate();

        let decl = self.scoped(ScopeId::Function(name.clone()), |p| {
            p.expect_lparen("after function name")?;
            let params = p.parse_parameters()?;
            p.expect_lbrace("before function body")?;

            let mut decl = FunctionDecl {
                name: name.clone(),
                return_type,
                params,
                body: Vec::new(),
                scope: ScopeId::Global,
                memory_id,
                line,
            };
            p.state.registry.register_function(decl.clone());

            decl.body = p.parse_block_body();
            p.expect_rbrace("after function body")?;
            p.state.registry.register_function(decl.clone());
            Ok(decl)
        })?;

        Ok(Stmt::FunctionDecl(decl))
    }

    /// Parse `TYPE main ( [void] ) { body }`
    pub(crate) fn parse_main(&mut self) -> ParseResult<Stmt> {
        let line = self.current_line();
        let return_type = self.parse_type_name("for main")?;

        if self.state.seen_main {
            let location = self.current_location();
            self.report(Diagnostic::SyntaxError {
                line: location.line,
                column: location.column,
                lexeme: "main".to_string(),
                expected: "a single main function".to_string(),
            });
        }
        self.state.seen_main = true;
        self.advance(); // consume 'main'

        let body = self.scoped(ScopeId::main(), |p| {
            p.expect_lparen("after 'main'")?;
            if !p.check(&TokenKind::RParen) && p.parameter_list_is_empty() {
                p.advance(); // (void)
            }
            p.expect_rparen("after 'main('")?;
            p.expect_lbrace("before main body")?;
            let body = p.parse_block_body();
            p.expect_rbrace("after main body")?;
            Ok(body)
        })?;

        Ok(Stmt::MainDecl(MainDecl {
            return_type,
            body,
            scope: ScopeId::main(),
            line,
        }))
    }

    /// True at `)` or `void )`: the parameter list about to be parsed is empty.
    fn parameter_list_is_empty(&self) -> bool {
        self.check(&TokenKind::RParen)
            || (matches!(self.peek_kind(), TokenKind::Type(t) if t == "void")
                && self.check_ahead(1, &TokenKind::RParen))
    }

    /// Parameters after `(`, through the closing `)`.
    ///
    /// Each parameter gets an id in the current (callee) scope.
    pub(crate) fn parse_parameters(&mut self) -> ParseResult<Vec<Param>> {
        let mut params = Vec::new();

        if self.parameter_list_is_empty() {
            if !self.check(&TokenKind::RParen) {
                self.advance(); // void
            }
        } else {
            loop {
                params.push(self.parse_parameter()?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect_rparen("after parameters")?;
        Ok(params)
    }

    fn parse_parameter(&mut self) -> ParseResult<Param> {
        let line = self.current_line();
        let data_type = self.parse_type_or_class_name("for parameter")?;
        let pointer = self.match_token(&TokenKind::Pointer);
        let name = self.expect_identifier("for parameter name")?;

        let scope = self.current_scope();
        let memory_id = self.state.ids.allocate();
        if !is_primitive_type(&data_type) {
            self.state.scopes.declare_object(&name, &data_type);
        }

        Ok(Param {
            data_type,
            name,
            pointer,
            scope,
            memory_id,
            line,
        })
    }

    /// Parse `class|struct Name { members } ;`
    pub(crate) fn parse_class(&mut self) -> ParseResult<Stmt> {
        let line = self.current_line();
        let scope = self.current_scope();
        let keyword = if self.match_token(&TokenKind::Struct) {
            ClassKeyword::Struct
        } else {
            self.expect_token(&TokenKind::Class, "'class' or 'struct'")?;
            ClassKeyword::Class
        };
        let name = self.expect_identifier("after class keyword")?;
        self.expect_lbrace("to open class body")?;

        self.state.registry.begin_class(&name, keyword, line);
        let members = self.scoped(ScopeId::Class(name.clone()), |p| {
            let members = p.parse_class_members(&name, keyword);
            p.expect_rbrace("to close class body")?;
            Ok(members)
        });
        let members = match members {
            Ok(members) => members,
            Err(error) => {
                self.state.registry.remove_class(&name);
                return Err(error);
            }
        };
        if let Err(error) = self.expect_semicolon("after class declaration") {
            self.report(error);
        }

        let decl = ClassDecl {
            name,
            keyword,
            members,
            scope,
            line,
        };
        self.state.registry.register_class(&decl);
        Ok(Stmt::ClassDecl(decl))
    }

    /// Members up to the closing `}`. The access level starts at the
    /// keyword's default and is updated by each specifier in this body only.
    fn parse_class_members(&mut self, class: &str, keyword: ClassKeyword) -> Vec<ClassMember> {
        let mut access = keyword.default_access();
        let mut members = Vec::new();

        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            let start = self.position;
            match self.parse_class_member(class, &mut access) {
                Ok(member) => {
                    self.state.registry.add_class_member(class, &member);
                    members.push(member);
                }
                Err(error) => self.recover(error, start),
            }
        }

        members
    }

    fn parse_class_member(&mut self, class: &str, access: &mut Access) -> ParseResult<ClassMember> {
        let line = self.current_line();

        let specifier = match self.peek_kind() {
            TokenKind::Public => Some(Access::Public),
            TokenKind::Private => Some(Access::Private),
            TokenKind::Protected => Some(Access::Protected),
            _ => None,
        };
        if let Some(level) = specifier {
            self.advance();
            self.expect_token(&TokenKind::Colon, "':' after access specifier")?;
            *access = level;
            return Ok(ClassMember::AccessSpecifier { access: level, line });
        }

        match self.peek_kind() {
            TokenKind::Tilde => self.parse_destructor(class),
            TokenKind::Ident(name) if name == class && self.check_ahead(1, &TokenKind::LParen) => {
                self.parse_constructor(class)
            }
            TokenKind::Type(_) | TokenKind::Ident(_) => self.parse_member(class, *access),
            _ => Err(self.error_expected("class member")),
        }
    }

    /// `{ body }`, or `;` for a declaration without definition.
    fn parse_optional_body(&mut self, ctx: &str) -> ParseResult<Option<Vec<Stmt>>> {
        if self.match_token(&TokenKind::Semicolon) {
            return Ok(None);
        }
        self.expect_lbrace(ctx)?;
        let body = self.parse_block_body();
        self.expect_rbrace(ctx)?;
        Ok(Some(body))
    }

    fn parse_constructor(&mut self, class: &str) -> ParseResult<ClassMember> {
        let line = self.current_line();
        self.advance(); // class name
        self.expect_lparen("after constructor name")?;

        let (kind, scope) = if self.parameter_list_is_empty() {
            (ConstructorKind::Default, ScopeId::Constructor(class.to_string()))
        } else {
            (
                ConstructorKind::Parameterized,
                ScopeId::ParameterizedConstructor(class.to_string()),
            )
        };

        let (params, body) = self.scoped(scope.clone(), |p| {
            let params = p.parse_parameters()?;
            let body = p.parse_optional_body("around constructor body")?;
            Ok((params, body))
        })?;

        Ok(ClassMember::Constructor(ConstructorDecl {
            class_name: class.to_string(),
            kind,
            params,
            body,
            scope,
            line,
        }))
    }

    fn parse_destructor(&mut self, class: &str) -> ParseResult<ClassMember> {
        let line = self.current_line();
        self.advance(); // '~'

        match self.peek_kind() {
            TokenKind::Ident(name) if name == class => {
                self.advance();
            }
            _ => return Err(self.error_expected(format!("'{class}' after '~'"))),
        }
        self.expect_lparen("after destructor name")?;
        self.expect_rparen("in destructor")?;

        let scope = ScopeId::Destructor(class.to_string());
        let body = self.scoped(scope.clone(), |p| {
            p.parse_optional_body("around destructor body")
        })?;

        Ok(ClassMember::Destructor(DestructorDecl {
            class_name: class.to_string(),
            body,
            scope,
            line,
        }))
    }

    /// Member variable or member function, told apart by `(` after the name.
    fn parse_member(&mut self, class: &str, access: Access) -> ParseResult<ClassMember> {
        let line = self.current_line();
        let data_type = self.parse_type_or_class_name("for class member")?;
        let pointer = self.match_token(&TokenKind::Pointer);
        let name = self.expect_identifier("for member name")?;

        if self.match_token(&TokenKind::LParen) {
            let scope = ScopeId::Method {
                class: class.to_string(),
                method: name.clone(),
            };
            let (params, body) = self.scoped(scope.clone(), |p| {
                let params = p.parse_parameters()?;
                let body = p.parse_optional_body("around method body")?;
                Ok((params, body))
            })?;

            let return_type = if pointer {
                format!("{}*", data_type)
            } else {
                data_type
            };
            return Ok(ClassMember::Method(MethodDecl {
                name,
                return_type,
                belongs_to_class: class.to_string(),
                access,
                params,
                body,
                scope,
                line,
            }));
        }

        let scope = self.current_scope();
        let mut default_value = None;
        let mut points_to = None;
        if self.match_token(&TokenKind::Equals) {
            if self.match_token(&TokenKind::Address) {
                points_to = Some(self.expect_identifier("after '&'")?);
            } else {
                let mut value: Expr = self.parse_expression()?;
                propagate_scope(&mut value, &scope);
                default_value = Some(value);
            }
        }
        self.expect_semicolon("after member variable")?;

        let self_referential = pointer && data_type == class;
        let data_type = if is_primitive_type(&data_type) {
            data_type
        } else {
            format!("class:{}", data_type)
        };
        let memory_id = self.state.ids.allocate();

        Ok(ClassMember::MemberVariable(MemberVariable {
            data_type,
            name,
            access,
            pointer,
            self_referential,
            default_value,
            points_to,
            scope,
            memory_id,
            line,
        }))
    }
}
