//! Front-end configuration

use crate::semantic::ids::DEFAULT_ID_BASE;

/// Knobs for one parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontendConfig {
    /// First memory id handed out.
    pub memory_id_base: u64,
    /// Log every token at debug level before parsing.
    pub log_tokens: bool,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            memory_id_base: DEFAULT_ID_BASE,
            log_tokens: false,
        }
    }
}

impl FrontendConfig {
    pub fn with_id_base(mut self, base: u64) -> Self {
        self.memory_id_base = base;
        self
    }

    pub fn with_log_tokens(mut self, enabled: bool) -> Self {
        self.log_tokens = enabled;
        self
    }
}
