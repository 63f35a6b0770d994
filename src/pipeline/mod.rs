//! Analysis run orchestration.
//!
//! A run moves through `Walking`, `Extracting`, `Analyzing` and
//! `Aggregating` before it is `Done`. Fatal errors end it in `Failed`, a
//! cancellation request in `Cancelled`; neither produces metrics.

pub mod coordinator;
pub mod result;
pub mod state;

pub use coordinator::{analyze, AnalysisCoordinator};
pub use result::{AnalysisOptions, AnalysisResult, DEFAULT_PER_FILE_TIMEOUT_MS};
pub use state::{AnalysisState, CancellationToken, StateMachine};
