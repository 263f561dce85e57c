//! Pattern analysis: detecting systematic, bulk-fixable errors.

mod analyzer;
mod pattern;

pub use analyzer::{PatternAnalyzer, MIN_GROUP_SIZE};
pub use pattern::{AnalysisPattern, FixAction};
