//! Input layer: parsed tables, source metadata, and header mapping.

mod mapping;
mod parser;
mod source;

pub use mapping::HeaderMapping;
pub use parser::{Parser, ParserConfig};
pub use source::{ImportTable, SourceMetadata};
