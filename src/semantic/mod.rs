//! Scope resolution, memory-id allocation and the symbol registry
//!
//! All mutable state of one parse lives in [`ParserState`], which is built
//! fresh for every invocation.

pub mod ids;
pub mod propagate;
pub mod registry;
pub mod scope;

use crate::config::FrontendConfig;
use crate::parser::errors::Diagnostic;
use ids::IdAllocator;
use registry::Registry;
use scope::ScopeStack;

/// Resolver and registry state threaded through one parse.
#[derive(Debug, Default)]
pub struct ParserState {
    pub scopes: ScopeStack,
    pub ids: IdAllocator,
    pub registry: Registry,
    pub diagnostics: Vec<Diagnostic>,
    pub seen_main: bool,
}

impl ParserState {
    pub fn new(config: &FrontendConfig) -> Self {
        Self {
            ids: IdAllocator::new(config.memory_id_base),
            ..Self::default()
        }
    }

    /// Drop everything from a previous parse; ids restart at the base.
    pub fn reset(&mut self) {
        self.scopes.clear();
        self.ids.reset();
        self.registry.clear();
        self.diagnostics.clear();
        self.seen_main = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::ids::MemoryId;
    use crate::semantic::scope::ScopeId;

    #[test]
    fn test_reset_restores_fresh_state() {
        let config = FrontendConfig::default().with_id_base(42);
        let mut state = ParserState::new(&config);

        state.scopes.push(ScopeId::main());
        state.scopes.declare_object("head", "Node");
        state.ids.allocate();
        state.seen_main = true;
        state.diagnostics.push(Diagnostic::LexicalError {
            character: '$',
            line: 1,
            column: 1,
        });

        state.reset();

        assert_eq!(state.scopes.depth(), 0);
        assert_eq!(state.scopes.class_type_of("head"), None);
        assert!(state.diagnostics.is_empty());
        assert!(!state.seen_main);
        assert_eq!(state.ids.allocate(), MemoryId::Single(42));
    }
}
