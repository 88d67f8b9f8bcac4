// AST (Abstract Syntax Tree) definitions for the C++ subset front end
//
// Every node that names storage carries the ScopeId it was resolved in;
// declarations also carry their memory id and source line. Nodes serialize
// with a `type` discriminator so downstream tools can switch on it.

use crate::semantic::ids::MemoryId;
use crate::semantic::scope::ScopeId;
use serde::Serialize;
use std::fmt;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Numeric literal value; floating when the source had a fraction or exponent
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn negate(self) -> Self {
        match self {
            Number::Int(n) => Number::Int(-n),
            Number::Float(f) => Number::Float(-f),
        }
    }

    /// Non-negative integral value, as required for array dimensions.
    pub fn as_size(self) -> Option<u64> {
        match self {
            Number::Int(n) => u64::try_from(n).ok(),
            Number::Float(_) => None,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{}", n),
            Number::Float(x) => write!(f, "{:?}", x),
        }
    }
}

/// `.` or `->`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessOperator {
    Dot,
    Arrow,
}

/// Comparison operators (conditions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComparisonOp {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArithmeticOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Mod,
}

/// In-place update operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompoundOp {
    #[serde(rename = "++")]
    Increment,
    #[serde(rename = "--")]
    Decrement,
    #[serde(rename = "+=")]
    AddAssign,
    #[serde(rename = "-=")]
    SubAssign,
    #[serde(rename = "*=")]
    MulAssign,
    #[serde(rename = "/=")]
    DivAssign,
}

/// Which constructor a declaration or `new` invokes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructorKind {
    Default,
    Parameterized,
}

/// Heap allocation marker (`"allocation": "new"`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Allocation {
    New,
}

/// Member access level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Public,
    Private,
    Protected,
}

/// `class` or `struct`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKeyword {
    Class,
    Struct,
}

impl ClassKeyword {
    /// Access level of members declared before any specifier.
    pub fn default_access(self) -> Access {
        match self {
            ClassKeyword::Class => Access::Private,
            ClassKeyword::Struct => Access::Public,
        }
    }
}

/// One argument bound to the callee's parameter (or member) name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArgBinding {
    pub param_name: String,
    pub arg_value: Expr,
}

/// Value expressions
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expr {
    Number {
        value: Number,
    },
    #[serde(rename = "string")]
    Str {
        value: String,
    },
    Char {
        value: String,
    },
    Nullptr,
    Variable {
        name: String,
        scope: ScopeId,
        #[serde(skip_serializing_if = "Option::is_none")]
        class_type: Option<String>,
    },
    MemberAccess {
        object: Box<Expr>,
        member: String,
        operator: AccessOperator,
    },
    ArrayAccess {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    Comparison {
        left: Box<Expr>,
        operator: ComparisonOp,
        right: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        operator: ArithmeticOp,
        right: Box<Expr>,
    },
    FunctionCall {
        name: String,
        args: Vec<Expr>,
        arg_param_map: Vec<ArgBinding>,
    },
    MethodCall {
        object: Box<Expr>,
        method: String,
        operator: AccessOperator,
        args: Vec<Expr>,
        arg_param_map: Vec<ArgBinding>,
    },
    NewObject {
        class_type: String,
        constructor_type: ConstructorKind,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        constructor_args: Vec<Expr>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        arg_param_map: Vec<ArgBinding>,
    },
    NewArray {
        data_type: String,
        size: u64,
    },
    Address {
        name: String,
        scope: ScopeId,
    },
}

impl Expr {
    /// Name of the variable at the root of an access chain (`a` in `a->b.c[i]`).
    pub fn root_name(&self) -> Option<&str> {
        match self {
            Expr::Variable { name, .. } | Expr::Address { name, .. } => Some(name.as_str()),
            Expr::MemberAccess { object, .. } => object.root_name(),
            Expr::ArrayAccess { array, .. } => array.root_name(),
            _ => None,
        }
    }
}

/// Initializer list of an array declarator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArrayValues {
    Flat(Vec<Expr>),
    Nested(Vec<Vec<Expr>>),
}

/// Shape of one declarator; the forms are mutually exclusive
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum DeclaratorForm {
    /// `x` or `x = value`
    Scalar {
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<Expr>,
    },
    /// `*p`, `*p = &x`, `*p = value`
    Pointer {
        #[serde(skip_serializing_if = "Option::is_none")]
        points_to: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<Expr>,
    },
    /// `*p = new T`
    HeapScalar {
        allocation: Allocation,
        allocated_type: String,
    },
    /// `*p = new C` / `*p = new C{args}`
    HeapObject {
        allocation: Allocation,
        allocated_type: String,
        constructor_type: ConstructorKind,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        constructor_args: Vec<Expr>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        arg_param_map: Vec<ArgBinding>,
    },
    /// `*p = new T[n]`
    HeapArray {
        allocation: Allocation,
        allocated_type: String,
        array_size: u64,
    },
    /// `a[n]`, `m[r][c]`, optionally brace-initialized
    Array {
        dimensions: Vec<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        values: Option<ArrayValues>,
    },
}

/// One name introduced by a `TYPE var_list ;` declaration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Declarator {
    pub name: String,
    #[serde(flatten)]
    pub form: DeclaratorForm,
    pub scope: ScopeId,
    #[serde(rename = "id")]
    pub memory_id: MemoryId,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Declaration {
    pub data_type: String,
    pub declarations: Vec<Declarator>,
    pub line: usize,
}

/// Function, method or constructor parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub data_type: String,
    pub name: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub pointer: bool,
    pub scope: ScopeId,
    #[serde(rename = "id")]
    pub memory_id: MemoryId,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDecl {
    pub name: String,
    pub return_type: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub scope: ScopeId,
    #[serde(rename = "id")]
    pub memory_id: MemoryId,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MainDecl {
    pub return_type: String,
    pub body: Vec<Stmt>,
    pub scope: ScopeId,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberVariable {
    /// Primitive type name, or `class:<Name>` for aggregate references
    pub data_type: String,
    pub name: String,
    pub access: Access,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub pointer: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub self_referential: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Expr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_to: Option<String>,
    pub scope: ScopeId,
    #[serde(rename = "id")]
    pub memory_id: MemoryId,
    pub line: usize,
}

impl MemberVariable {
    /// Class named by an aggregate member type (`class:Node` → `Node`).
    pub fn class_type(&self) -> Option<&str> {
        self.data_type.strip_prefix("class:")
    }
}

/// Member function; `body` is `None` for a prototype
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodDecl {
    pub name: String,
    pub return_type: String,
    pub belongs_to_class: String,
    pub access: Access,
    pub params: Vec<Param>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<Stmt>>,
    pub scope: ScopeId,
    pub line: usize,
}

/// Constructor; `body` is `None` for a declaration without definition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstructorDecl {
    #[serde(rename = "name")]
    pub class_name: String,
    pub kind: ConstructorKind,
    pub params: Vec<Param>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<Stmt>>,
    pub scope: ScopeId,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DestructorDecl {
    #[serde(rename = "name")]
    pub class_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<Stmt>>,
    pub scope: ScopeId,
    pub line: usize,
}

/// Entries of a class body, in source order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassMember {
    /// `public:` etc. Declares no storage.
    AccessSpecifier { access: Access, line: usize },
    MemberVariable(MemberVariable),
    #[serde(rename = "member_function")]
    Method(MethodDecl),
    Constructor(ConstructorDecl),
    Destructor(DestructorDecl),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassDecl {
    pub name: String,
    pub keyword: ClassKeyword,
    pub members: Vec<ClassMember>,
    pub scope: ScopeId,
    pub line: usize,
}

impl ClassDecl {
    pub fn member_variables(&self) -> impl Iterator<Item = &MemberVariable> {
        self.members.iter().filter_map(|m| match m {
            ClassMember::MemberVariable(v) => Some(v),
            _ => None,
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.members.iter().filter_map(|m| match m {
            ClassMember::Method(f) => Some(f),
            _ => None,
        })
    }
}

/// Statements (top-level and nested)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Stmt {
    Declaration(Declaration),
    #[serde(rename = "function_declaration")]
    FunctionDecl(FunctionDecl),
    #[serde(rename = "main_function")]
    MainDecl(MainDecl),
    #[serde(rename = "class_declaration")]
    ClassDecl(ClassDecl),
    Assignment {
        name: String,
        value: Expr,
        scope: ScopeId,
        line: usize,
    },
    CompoundAssignment {
        name: String,
        operator: CompoundOp,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<Expr>,
        scope: ScopeId,
        line: usize,
    },
    IndexAssignment {
        name: String,
        target: Expr,
        value: Expr,
        scope: ScopeId,
        line: usize,
    },
    MemberAssignment {
        /// Root variable of the access chain
        object: String,
        /// Full object expression (`head->next` in `head->next->data = 1`)
        object_expr: Expr,
        member: String,
        operator: AccessOperator,
        value: Expr,
        scope: ScopeId,
        line: usize,
    },
    MethodCall {
        object: Expr,
        method: String,
        operator: AccessOperator,
        args: Vec<Expr>,
        arg_param_map: Vec<ArgBinding>,
        scope: ScopeId,
        line: usize,
    },
    FunctionCall {
        name: String,
        args: Vec<Expr>,
        arg_param_map: Vec<ArgBinding>,
        scope: ScopeId,
        line: usize,
    },
    ObjectDeclaration {
        class_type: String,
        name: String,
        constructor_type: ConstructorKind,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        constructor_args: Vec<Expr>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        arg_param_map: Vec<ArgBinding>,
        scope: ScopeId,
        #[serde(rename = "id")]
        memory_id: MemoryId,
        line: usize,
    },
    ClassPointerDeclaration {
        class_type: String,
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        allocation: Option<Allocation>,
        #[serde(skip_serializing_if = "Option::is_none")]
        allocated_type: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        constructor_type: Option<ConstructorKind>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        constructor_args: Vec<Expr>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        arg_param_map: Vec<ArgBinding>,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<Expr>,
        scope: ScopeId,
        #[serde(rename = "id")]
        memory_id: MemoryId,
        line: usize,
    },
    #[serde(rename = "delete_statement")]
    Delete {
        target: Expr,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        array: bool,
        scope: ScopeId,
        line: usize,
    },
    #[serde(rename = "if_statement")]
    If {
        condition: Expr,
        if_body: Vec<Stmt>,
        #[serde(skip_serializing_if = "Option::is_none")]
        else_body: Option<Vec<Stmt>>,
        scope: ScopeId,
        line: usize,
    },
    #[serde(rename = "while_statement")]
    While {
        condition: Expr,
        body: Vec<Stmt>,
        scope: ScopeId,
        line: usize,
    },
    #[serde(rename = "return_statement")]
    Return {
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<Expr>,
        scope: ScopeId,
        line: usize,
    },
    /// Sentinel produced when nothing could be parsed
    ParseError { errors: Vec<String>, message: String },
}

impl Stmt {
    /// Source line of the statement (the sentinel has none)
    pub fn line(&self) -> Option<usize> {
        match self {
            Stmt::Declaration(d) => Some(d.line),
            Stmt::FunctionDecl(f) => Some(f.line),
            Stmt::MainDecl(m) => Some(m.line),
            Stmt::ClassDecl(c) => Some(c.line),
            Stmt::Assignment { line, .. }
            | Stmt::CompoundAssignment { line, .. }
            | Stmt::IndexAssignment { line, .. }
            | Stmt::MemberAssignment { line, .. }
            | Stmt::MethodCall { line, .. }
            | Stmt::FunctionCall { line, .. }
            | Stmt::ObjectDeclaration { line, .. }
            | Stmt::ClassPointerDeclaration { line, .. }
            | Stmt::Delete { line, .. }
            | Stmt::If { line, .. }
            | Stmt::While { line, .. }
            | Stmt::Return { line, .. } => Some(*line),
            Stmt::ParseError { .. } => None,
        }
    }

    /// Scope the statement itself executes in.
    ///
    /// A declaration group reports the scope of its first declarator.
    pub fn scope(&self) -> Option<&ScopeId> {
        match self {
            Stmt::Declaration(d) => d.declarations.first().map(|decl| &decl.scope),
            Stmt::FunctionDecl(f) => Some(&f.scope),
            Stmt::MainDecl(m) => Some(&m.scope),
            Stmt::ClassDecl(c) => Some(&c.scope),
            Stmt::Assignment { scope, .. }
            | Stmt::CompoundAssignment { scope, .. }
            | Stmt::IndexAssignment { scope, .. }
            | Stmt::MemberAssignment { scope, .. }
            | Stmt::MethodCall { scope, .. }
            | Stmt::FunctionCall { scope, .. }
            | Stmt::ObjectDeclaration { scope, .. }
            | Stmt::ClassPointerDeclaration { scope, .. }
            | Stmt::Delete { scope, .. }
            | Stmt::If { scope, .. }
            | Stmt::While { scope, .. }
            | Stmt::Return { scope, .. } => Some(scope),
            Stmt::ParseError { .. } => None,
        }
    }
}
