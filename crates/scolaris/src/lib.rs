//! Scolaris: validation and correction-memory engine for school-administration
//! spreadsheet imports.
//!
//! Scolaris takes delimited exports from legacy school-administration systems,
//! checks every row against a configurable rule registry, detects systematic
//! errors across rows, and remembers user-approved corrections so they can be
//! replayed on the next import.
//!
//! # Core Principles
//!
//! - **Rule-driven**: column definitions, format rules, and business rules are
//!   supplied by configuration, not hard-coded
//! - **Non-destructive**: applying corrections always produces a new table,
//!   the input is never modified
//! - **Full audit trail**: every corrected cell lands in an append-only
//!   change log
//!
//! # Example
//!
//! ```no_run
//! use scolaris::{ImportSession, SessionConfig};
//!
//! let mut session = ImportSession::new(SessionConfig::default());
//! session.load_file("pupils.csv").unwrap();
//! let violations = session.validate().unwrap();
//!
//! println!("Findings: {}", violations.len());
//! println!("Rows: {}", session.table().unwrap().row_count());
//! ```

pub mod analysis;
pub mod changelog;
pub mod correction;
pub mod error;
pub mod export;
pub mod input;
pub mod rules;
pub mod session;
pub mod validation;
pub mod worker;

pub use analysis::{AnalysisPattern, FixAction, PatternAnalyzer};
pub use changelog::{ChangeLog, ChangeLogEntry, ChangeLogSummary, ChangeType};
pub use correction::{
    CorrectionMemory, CorrectionRule, FileStore, KeyValueStore, MatchMode, MemoryStore,
};
pub use error::{ImportError, Result};
pub use export::CleanedExport;
pub use input::{HeaderMapping, ImportTable, Parser, ParserConfig, SourceMetadata};
pub use rules::{
    BusinessRule, BusinessRuleKind, ColumnDefinition, ExpectedType, FormatRule, FormatRuleSet,
    RuleRegistry,
};
pub use session::{ImportSession, SessionConfig};
pub use validation::{ValidationEngine, ValidationSummary, Violation, ViolationKind};
pub use worker::{ImportWorker, RequestKind, Ticket, WorkerRequest, WorkerResponse};
