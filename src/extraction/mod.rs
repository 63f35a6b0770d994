//! Single-parse extraction of per-file facts.
//!
//! Every metric pass reads the same [`FileFact`] values; no pass parses a
//! file again.

pub mod extractor;
pub mod types;

pub use extractor::{LineIndex, SyntaxExtractor};
pub use types::{
    AssignedCall, ClassFact, FileFact, FunctionFact, ImportFact, ImportKind, LineCounts,
    UsageCounts,
};
