//! Function and class registry
//!
//! Filled in while parsing, and consulted mid-parse to bind call arguments
//! to parameter names. Only declarations that precede a call site are
//! visible to it.

use crate::parser::ast::{
    ArgBinding, ClassDecl, ClassKeyword, ClassMember, ConstructorDecl, ConstructorKind,
    DestructorDecl, Expr, FunctionDecl, MemberVariable, MethodDecl, Param,
};
use log::{debug, warn};
use rustc_hash::FxHashMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Name-keyed table that also remembers declaration order.
///
/// Re-registering a name replaces the entry but keeps its original position.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolTable<T> {
    entries: FxHashMap<String, T>,
    order: Vec<String>,
}

impl<T> Default for SymbolTable<T> {
    fn default() -> Self {
        Self {
            entries: FxHashMap::default(),
            order: Vec::new(),
        }
    }
}

impl<T> SymbolTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: String, value: T) -> Option<T> {
        if !self.entries.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.entries.insert(name, value)
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        self.entries.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<T> {
        let removed = self.entries.remove(name)?;
        self.order.retain(|entry| entry != name);
        Some(removed)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.order
            .iter()
            .filter_map(|name| self.entries.get(name).map(|value| (name.as_str(), value)))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

impl<T: Serialize> Serialize for SymbolTable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

pub type FunctionTable = SymbolTable<FunctionDecl>;
pub type ClassTable = SymbolTable<ClassInfo>;

/// Registered view of a class: every member in source order, plus the
/// constructors and destructors picked out of them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassInfo {
    pub name: String,
    pub keyword: ClassKeyword,
    pub members: Vec<ClassMember>,
    pub constructors: Vec<ConstructorDecl>,
    pub destructors: Vec<DestructorDecl>,
    pub line: usize,
}

impl ClassInfo {
    /// Empty entry for a class whose body has not been read yet.
    pub fn new(name: &str, keyword: ClassKeyword, line: usize) -> Self {
        ClassInfo {
            name: name.to_string(),
            keyword,
            members: Vec::new(),
            constructors: Vec::new(),
            destructors: Vec::new(),
            line,
        }
    }

    /// Build the table entry for a parsed class.
    ///
    /// At most one default constructor and one parameterized constructor per
    /// arity are kept; later duplicates stay in `members` only.
    pub fn from_decl(decl: &ClassDecl) -> Self {
        let mut info = ClassInfo::new(&decl.name, decl.keyword, decl.line);
        for member in &decl.members {
            if !info.push_member(member.clone()) {
                if let ClassMember::Constructor(ctor) = member {
                    warn!(
                        "class {}: duplicate {:?} constructor ({} params) at line {} ignored",
                        decl.name,
                        ctor.kind,
                        ctor.params.len(),
                        ctor.line
                    );
                }
            }
        }
        info
    }

    /// Append `member`, filing constructors and destructors. False when the
    /// member is a constructor that duplicates one already filed.
    pub fn push_member(&mut self, member: ClassMember) -> bool {
        let mut filed = true;
        match &member {
            ClassMember::Constructor(ctor) => {
                let duplicate = self.constructors.iter().any(|existing| {
                    existing.kind == ctor.kind && existing.params.len() == ctor.params.len()
                });
                if duplicate {
                    filed = false;
                } else {
                    self.constructors.push(ctor.clone());
                }
            }
            ClassMember::Destructor(dtor) => self.destructors.push(dtor.clone()),
            ClassMember::AccessSpecifier { .. }
            | ClassMember::MemberVariable(_)
            | ClassMember::Method(_) => {}
        }
        self.members.push(member);
        filed
    }

    pub fn member_variables(&self) -> impl Iterator<Item = &MemberVariable> {
        self.members.iter().filter_map(|m| match m {
            ClassMember::MemberVariable(v) => Some(v),
            _ => None,
        })
    }

    pub fn member_variable(&self, name: &str) -> Option<&MemberVariable> {
        self.member_variables().find(|v| v.name == name)
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.members.iter().filter_map(|m| match m {
            ClassMember::Method(f) => Some(f),
            _ => None,
        })
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods().any(|m| m.name == name)
    }

    pub fn parameterized_constructors(&self) -> impl Iterator<Item = &ConstructorDecl> {
        self.constructors
            .iter()
            .filter(|c| c.kind == ConstructorKind::Parameterized)
    }
}

/// Why a call site got an empty argument binding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("function '{0}' is not declared before this call")]
    UnknownFunction(String),

    #[error("class '{0}' is not declared before this use")]
    UnknownClass(String),

    #[error("no declared class has a method '{0}'")]
    UnknownMethod(String),

    #[error("expected {} argument(s), found {found}", format_arities(.expected))]
    ArityMismatch { expected: Vec<usize>, found: usize },
}

fn format_arities(arities: &[usize]) -> String {
    arities
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Pair each argument with the parameter at the same position.
///
/// `None` when the counts differ.
pub fn bind_arguments(params: &[Param], args: &[Expr]) -> Option<Vec<ArgBinding>> {
    bind_names(params.iter().map(|p| p.name.as_str()), args)
}

fn bind_names<'a>(
    names: impl ExactSizeIterator<Item = &'a str>,
    args: &[Expr],
) -> Option<Vec<ArgBinding>> {
    if names.len() != args.len() {
        return None;
    }
    Some(
        names
            .zip(args)
            .map(|(name, arg)| ArgBinding {
                param_name: name.to_string(),
                arg_value: arg.clone(),
            })
            .collect(),
    )
}

/// Functions and classes declared so far in one parse.
#[derive(Debug, Default)]
pub struct Registry {
    functions: FunctionTable,
    classes: ClassTable,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_function(&mut self, decl: FunctionDecl) {
        debug!(
            "register function {}({} params) at line {}",
            decl.name,
            decl.params.len(),
            decl.line
        );
        self.functions.insert(decl.name.clone(), decl);
    }

    pub fn register_class(&mut self, decl: &ClassDecl) {
        let info = ClassInfo::from_decl(decl);
        debug!(
            "register class {} ({} members, {} constructors)",
            info.name,
            info.members.len(),
            info.constructors.len()
        );
        self.classes.insert(info.name.clone(), info);
    }

    /// Make a class visible while its body is parsed, so its own methods
    /// and constructors can refer to it. Members are added as they complete.
    pub fn begin_class(&mut self, name: &str, keyword: ClassKeyword, line: usize) {
        self.classes.insert(name.to_string(), ClassInfo::new(name, keyword, line));
    }

    pub fn add_class_member(&mut self, class: &str, member: &ClassMember) {
        if let Some(info) = self.classes.get_mut(class) {
            info.push_member(member.clone());
        }
    }

    /// Drop a class whose body failed to parse.
    pub fn remove_class(&mut self, name: &str) {
        if self.classes.remove(name).is_some() {
            debug!("dropped incomplete class {}", name);
        }
    }

    pub fn lookup_function(&self, name: &str) -> Option<&FunctionDecl> {
        self.functions.get(name)
    }

    pub fn lookup_class(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.get(name)
    }

    /// Class a method call resolves against: the object's class when it is
    /// registered, otherwise the first class declaring a method of that name.
    pub fn method_owner(&self, class_hint: Option<&str>, method: &str) -> Option<&ClassInfo> {
        class_hint
            .and_then(|name| self.classes.get(name))
            .or_else(|| {
                self.classes
                    .iter()
                    .map(|(_, info)| info)
                    .find(|info| info.has_method(method))
            })
    }

    pub fn bind_function_call(
        &self,
        name: &str,
        args: &[Expr],
    ) -> Result<Vec<ArgBinding>, BindError> {
        let function = self
            .lookup_function(name)
            .ok_or_else(|| BindError::UnknownFunction(name.to_string()))?;

        bind_arguments(&function.params, args).ok_or_else(|| BindError::ArityMismatch {
            expected: vec![function.params.len()],
            found: args.len(),
        })
    }

    /// Bind against the overload whose parameter count matches.
    pub fn bind_method_call(
        &self,
        class_hint: Option<&str>,
        method: &str,
        args: &[Expr],
    ) -> Result<Vec<ArgBinding>, BindError> {
        let owner = self
            .method_owner(class_hint, method)
            .ok_or_else(|| BindError::UnknownMethod(method.to_string()))?;

        let overloads: Vec<&MethodDecl> = owner.methods().filter(|m| m.name == method).collect();
        if overloads.is_empty() {
            return Err(BindError::UnknownMethod(format!("{}.{}", owner.name, method)));
        }

        overloads
            .iter()
            .find_map(|m| bind_arguments(&m.params, args))
            .ok_or_else(|| BindError::ArityMismatch {
                expected: overloads.iter().map(|m| m.params.len()).collect(),
                found: args.len(),
            })
    }

    /// Bind constructor arguments.
    ///
    /// No arguments means the default constructor. Otherwise the first
    /// parameterized constructor with a matching arity wins; a class without
    /// any parameterized constructor binds positionally to its member
    /// variables (aggregate initialization).
    pub fn bind_constructor_call(
        &self,
        class_name: &str,
        args: &[Expr],
    ) -> Result<Vec<ArgBinding>, BindError> {
        let class = self
            .lookup_class(class_name)
            .ok_or_else(|| BindError::UnknownClass(class_name.to_string()))?;

        if args.is_empty() {
            return Ok(Vec::new());
        }

        let constructors: Vec<&ConstructorDecl> = class.parameterized_constructors().collect();
        if constructors.is_empty() {
            let members: Vec<&str> = class.member_variables().map(|v| v.name.as_str()).collect();
            let expected = members.len();
            return bind_names(members.into_iter(), args).ok_or(BindError::ArityMismatch {
                expected: vec![expected],
                found: args.len(),
            });
        }

        constructors
            .iter()
            .find_map(|c| bind_arguments(&c.params, args))
            .ok_or_else(|| BindError::ArityMismatch {
                expected: constructors.iter().map(|c| c.params.len()).collect(),
                found: args.len(),
            })
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    pub fn classes(&self) -> &ClassTable {
        &self.classes
    }

    pub fn into_tables(self) -> (FunctionTable, ClassTable) {
        (self.functions, self.classes)
    }

    pub fn clear(&mut self) {
        self.functions.clear();
        self.classes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::{Access, Number};
    use crate::semantic::ids::MemoryId;
    use crate::semantic::scope::ScopeId;

    fn param(name: &str) -> Param {
        Param {
            data_type: "int".to_string(),
            name: name.to_string(),
            pointer: false,
            scope: ScopeId::Global,
            memory_id: MemoryId::Single(0),
            line: 1,
        }
    }

    fn num(n: i64) -> Expr {
        Expr::Number {
            value: Number::Int(n),
        }
    }

    fn function(name: &str, params: &[&str]) -> FunctionDecl {
        FunctionDecl {
            name: name.to_string(),
            return_type: "int".to_string(),
            params: params.iter().map(|p| param(p)).collect(),
            body: Vec::new(),
            scope: ScopeId::Global,
            memory_id: MemoryId::Single(1),
            line: 1,
        }
    }

    fn member(name: &str) -> ClassMember {
        ClassMember::MemberVariable(MemberVariable {
            data_type: "int".to_string(),
            name: name.to_string(),
            access: Access::Public,
            pointer: false,
            self_referential: false,
            default_value: None,
            points_to: None,
            scope: ScopeId::Class("C".to_string()),
            memory_id: MemoryId::Single(2),
            line: 1,
        })
    }

    fn constructor(class: &str, params: &[&str], line: usize) -> ClassMember {
        ClassMember::Constructor(ConstructorDecl {
            class_name: class.to_string(),
            kind: if params.is_empty() {
                ConstructorKind::Default
            } else {
                ConstructorKind::Parameterized
            },
            params: params.iter().map(|p| param(p)).collect(),
            body: Some(Vec::new()),
            scope: ScopeId::Constructor(class.to_string()),
            line,
        })
    }

    fn method(class: &str, name: &str, params: &[&str]) -> ClassMember {
        ClassMember::Method(MethodDecl {
            name: name.to_string(),
            return_type: "void".to_string(),
            belongs_to_class: class.to_string(),
            access: Access::Public,
            params: params.iter().map(|p| param(p)).collect(),
            body: None,
            scope: ScopeId::Method {
                class: class.to_string(),
                method: name.to_string(),
            },
            line: 1,
        })
    }

    fn class(name: &str, members: Vec<ClassMember>) -> ClassDecl {
        ClassDecl {
            name: name.to_string(),
            keyword: ClassKeyword::Class,
            members,
            scope: ScopeId::Global,
            line: 1,
        }
    }

    #[test]
    fn test_bind_arguments_arity() {
        let params = vec![param("a"), param("b")];

        let map = bind_arguments(&params, &[num(1), num(2)]).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map[0].param_name, "a");
        assert_eq!(map[1].arg_value, num(2));

        assert!(bind_arguments(&params, &[num(1)]).is_none());
    }

    #[test]
    fn test_function_binding() {
        let mut registry = Registry::new();
        registry.register_function(function("add", &["a", "b"]));

        assert_eq!(registry.bind_function_call("add", &[num(1), num(2)]).unwrap().len(), 2);
        assert_eq!(
            registry.bind_function_call("add", &[num(1)]),
            Err(BindError::ArityMismatch {
                expected: vec![2],
                found: 1
            })
        );
        assert_eq!(
            registry.bind_function_call("later", &[]),
            Err(BindError::UnknownFunction("later".to_string()))
        );
    }

    #[test]
    fn test_constructor_first_matching_arity_wins() {
        let mut registry = Registry::new();
        registry.register_class(&class(
            "C",
            vec![
                member("x"),
                constructor("C", &["a"], 2),
                constructor("C", &["p", "q"], 3),
                constructor("C", &["r", "s"], 4),
            ],
        ));

        let info = registry.lookup_class("C").unwrap();
        assert_eq!(info.constructors.len(), 2);
        assert_eq!(info.members.len(), 4);

        let map = registry.bind_constructor_call("C", &[num(1), num(2)]).unwrap();
        assert_eq!(map[0].param_name, "p");
        assert_eq!(map[1].param_name, "q");

        assert!(matches!(
            registry.bind_constructor_call("C", &[num(1), num(2), num(3)]),
            Err(BindError::ArityMismatch { found: 3, .. })
        ));
        assert_eq!(registry.bind_constructor_call("C", &[]), Ok(Vec::new()));
    }

    #[test]
    fn test_aggregate_initialization() {
        let mut registry = Registry::new();
        registry.register_class(&class("Node", vec![member("data"), member("next")]));

        let map = registry.bind_constructor_call("Node", &[num(1), Expr::Nullptr]).unwrap();
        assert_eq!(map[0].param_name, "data");
        assert_eq!(map[1].param_name, "next");
        assert_eq!(map[1].arg_value, Expr::Nullptr);

        assert!(registry.bind_constructor_call("Node", &[num(1)]).is_err());
        assert_eq!(
            registry.bind_constructor_call("Missing", &[num(1)]),
            Err(BindError::UnknownClass("Missing".to_string()))
        );
    }

    #[test]
    fn test_method_binding_prefers_object_class() {
        let mut registry = Registry::new();
        registry.register_class(&class("A", vec![method("A", "set", &["a"])]));
        registry.register_class(&class("B", vec![method("B", "set", &["b"])]));

        let map = registry.bind_method_call(Some("B"), "set", &[num(1)]).unwrap();
        assert_eq!(map[0].param_name, "b");

        // Unknown object class: first class in declaration order
        let map = registry.bind_method_call(None, "set", &[num(1)]).unwrap();
        assert_eq!(map[0].param_name, "a");

        assert!(matches!(
            registry.bind_method_call(None, "missing", &[]),
            Err(BindError::UnknownMethod(_))
        ));
    }

    #[test]
    fn test_method_overloads_by_arity() {
        let mut registry = Registry::new();
        registry.register_class(&class(
            "P",
            vec![method("P", "move", &["dx"]), method("P", "move", &["dx", "dy"])],
        ));

        let map = registry.bind_method_call(Some("P"), "move", &[num(1), num(2)]).unwrap();
        assert_eq!(map[1].param_name, "dy");

        let err = registry.bind_method_call(Some("P"), "move", &[]).unwrap_err();
        assert_eq!(err.to_string(), "expected 1 or 2 argument(s), found 0");
    }

    #[test]
    fn test_table_keeps_declaration_order() {
        let mut registry = Registry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.register_function(function(name, &[]));
        }
        registry.register_function(function("alpha", &["x"]));

        let names: Vec<&str> = registry.functions().names().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(registry.lookup_function("alpha").unwrap().params.len(), 1);

        let json = serde_json::to_string(registry.functions()).unwrap();
        let zeta = json.find("\"zeta\"").unwrap();
        let alpha = json.find("\"alpha\"").unwrap();
        assert!(zeta < alpha);
    }

    #[test]
    fn test_class_visible_while_open() {
        let mut registry = Registry::new();
        registry.register_class(&class("Before", vec![member("b")]));
        registry.begin_class("Node", ClassKeyword::Class, 3);
        assert_eq!(registry.lookup_class("Node").map(|c| c.members.len()), Some(0));

        registry.add_class_member("Node", &member("data"));
        registry.add_class_member("Node", &constructor("Node", &["d"], 4));
        registry.add_class_member("Node", &constructor("Node", &["e"], 5));

        let info = registry.lookup_class("Node").unwrap();
        assert_eq!(info.members.len(), 3);
        assert_eq!(info.constructors.len(), 1);
        let map = registry.bind_constructor_call("Node", &[num(1)]).unwrap();
        assert_eq!(map[0].param_name, "d");

        registry.remove_class("Node");
        assert!(registry.lookup_class("Node").is_none());
        let names: Vec<&str> = registry.classes().names().collect();
        assert_eq!(names, vec!["Before"]);
    }
}
