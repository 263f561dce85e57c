//! Correction memory: remembered fixes replayed on later imports.

mod memory;
mod rule;
mod store;

pub use memory::{CorrectionMemory, SaveOutcome};
pub use rule::{CorrectionRule, MatchMode, RuleIdentity};
pub use store::{
    cookie_consent, is_help_dismissed, set_cookie_consent, set_help_dismissed, FileStore,
    KeyValueStore, MemoryStore,
};
