//! Serializable reports and timing traces emitted by the tools.
//!
//! Timings are collected per stage while a frame is processed; the reports
//! bundle them with the results so a single JSON file describes a run.

pub mod reports;
pub mod timing;

pub use reports::{CornerReport, InputDescriptor, MatchedPair, RegistrationReport};
pub use timing::{StageTiming, TimingBreakdown};
