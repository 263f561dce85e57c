//! Validation engine: applies the rule registry to imported rows.

mod engine;
mod violation;

pub use engine::{ValidationEngine, ValidationSummary};
pub use violation::{Violation, ViolationKind};
