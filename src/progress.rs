//! Progress reporting for analysis runs.
//!
//! Observers receive state changes, per-file extraction events and pass
//! summaries as soon as they are available, which lets a streaming transport
//! forward partial results before the run completes.
//!
//! ```rust
//! use repo_vitals::progress::{AnalysisObserver, RecordingObserver};
//! use repo_vitals::pipeline::AnalysisState;
//!
//! let recorder = RecordingObserver::new();
//! recorder.state_changed(AnalysisState::Idle, AnalysisState::Walking);
//! assert_eq!(recorder.states(), vec![AnalysisState::Walking]);
//! ```

pub mod implementations;
pub mod traits;

pub use implementations::{CliObserver, ProgressEvent, RecordingObserver, SilentObserver};
pub use traits::AnalysisObserver;
