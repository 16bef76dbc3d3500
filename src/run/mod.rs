//! Run orchestration: variant building, transcription fan-out, matching,
//! reporting.

pub mod orchestrator;
pub mod report;

pub use orchestrator::{Orchestrator, RunOutcome, RunPhase};
pub use report::{TranscriptionRecord, render_report};
