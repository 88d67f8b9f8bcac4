//! Lexical scopes
//!
//! [`ScopeId`] names a lexical region; [`ScopeStack`] tracks the regions that
//! are open while the parser is inside them. Each open region also owns a
//! frame recording which names were declared as class objects or class
//! pointers there, so variable references can pick up their class type.

use log::debug;
use rustc_hash::FxHashMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// A named lexical region.
///
/// Renders (and serializes) as its string tag: `global`, `function:add`,
/// `function:Node.print`, `class:Node`, `constructor:Node`,
/// `parameterized_constructor:Node`, `destructor:Node`, `if_body`,
/// `else_body`, `while_body`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ScopeId {
    #[default]
    Global,
    Function(String),
    Method {
        class: String,
        method: String,
    },
    Class(String),
    Constructor(String),
    ParameterizedConstructor(String),
    Destructor(String),
    IfBody,
    ElseBody,
    WhileBody,
}

impl ScopeId {
    pub fn main() -> Self {
        ScopeId::Function("main".to_string())
    }

    pub fn is_global(&self) -> bool {
        matches!(self, ScopeId::Global)
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeId::Global => write!(f, "global"),
            ScopeId::Function(name) => write!(f, "function:{}", name),
            ScopeId::Method { class, method } => write!(f, "function:{}.{}", class, method),
            ScopeId::Class(name) => write!(f, "class:{}", name),
            ScopeId::Constructor(class) => write!(f, "constructor:{}", class),
            ScopeId::ParameterizedConstructor(class) => {
                write!(f, "parameterized_constructor:{}", class)
            }
            ScopeId::Destructor(class) => write!(f, "destructor:{}", class),
            ScopeId::IfBody => write!(f, "if_body"),
            ScopeId::ElseBody => write!(f, "else_body"),
            ScopeId::WhileBody => write!(f, "while_body"),
        }
    }
}

impl Serialize for ScopeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Default)]
struct Frame {
    scope: ScopeId,
    /// object / class-pointer name -> class name
    objects: FxHashMap<String, String>,
}

/// Stack of open scopes. Empty means `global`.
#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<Frame>,
    globals: FxHashMap<String, String>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Innermost open scope, or [`ScopeId::Global`] when none is open.
    pub fn current(&self) -> ScopeId {
        self.frames
            .last()
            .map(|frame| frame.scope.clone())
            .unwrap_or(ScopeId::Global)
    }

    pub fn push(&mut self, scope: ScopeId) {
        debug!("enter scope {} (depth {})", scope, self.frames.len() + 1);
        self.frames.push(Frame {
            scope,
            objects: FxHashMap::default(),
        });
    }

    /// Close the innermost scope.
    ///
    /// # Panics
    ///
    /// Panics when no scope is open: every pop must pair with an earlier push.
    pub fn pop(&mut self) -> ScopeId {
        match self.frames.pop() {
            Some(frame) => {
                debug!("leave scope {} (depth {})", frame.scope, self.frames.len());
                frame.scope
            }
            None => panic!("scope stack underflow: pop without a matching push"),
        }
    }

    /// Number of open scopes (0 at top level).
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Record that `name` holds an instance of (or pointer to) `class_type`
    /// in the innermost scope.
    pub fn declare_object(&mut self, name: &str, class_type: &str) {
        let objects = match self.frames.last_mut() {
            Some(frame) => &mut frame.objects,
            None => &mut self.globals,
        };
        objects.insert(name.to_string(), class_type.to_string());
    }

    /// Class type of the nearest visible object declaration named `name`.
    pub fn class_type_of(&self, name: &str) -> Option<&str> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.objects.get(name))
            .or_else(|| self.globals.get(name))
            .map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.globals.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_tags() {
        assert_eq!(ScopeId::Global.to_string(), "global");
        assert_eq!(ScopeId::main().to_string(), "function:main");
        assert_eq!(
            ScopeId::Method {
                class: "Node".to_string(),
                method: "print".to_string()
            }
            .to_string(),
            "function:Node.print"
        );
        assert_eq!(
            ScopeId::ParameterizedConstructor("Node".to_string()).to_string(),
            "parameterized_constructor:Node"
        );
        assert_eq!(ScopeId::WhileBody.to_string(), "while_body");
    }

    #[test]
    fn test_scope_serializes_as_tag() {
        let json = serde_json::to_string(&ScopeId::Class("Node".to_string())).unwrap();
        assert_eq!(json, "\"class:Node\"");
    }

    #[test]
    fn test_push_pop_pairing() {
        let mut scopes = ScopeStack::new();
        assert_eq!(scopes.current(), ScopeId::Global);

        scopes.push(ScopeId::main());
        scopes.push(ScopeId::IfBody);
        assert_eq!(scopes.current(), ScopeId::IfBody);
        assert_eq!(scopes.depth(), 2);

        assert_eq!(scopes.pop(), ScopeId::IfBody);
        assert_eq!(scopes.current(), ScopeId::main());
        scopes.pop();
        assert_eq!(scopes.current(), ScopeId::Global);
    }

    #[test]
    #[should_panic(expected = "underflow")]
    fn test_pop_empty_panics() {
        ScopeStack::new().pop();
    }

    #[test]
    fn test_object_types_follow_nesting() {
        let mut scopes = ScopeStack::new();
        scopes.declare_object("g", "Global");
        scopes.push(ScopeId::main());
        scopes.declare_object("head", "Node");
        scopes.push(ScopeId::WhileBody);
        scopes.declare_object("head", "List");

        assert_eq!(scopes.class_type_of("head"), Some("List"));
        assert_eq!(scopes.class_type_of("g"), Some("Global"));

        scopes.pop();
        assert_eq!(scopes.class_type_of("head"), Some("Node"));
        scopes.pop();
        assert_eq!(scopes.class_type_of("head"), None);
        assert_eq!(scopes.class_type_of("g"), Some("Global"));
    }
}
