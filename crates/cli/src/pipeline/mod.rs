//! Merge run orchestration: background worker, cancellation, progress events.

mod cancel;
mod events;
mod orchestrator;
mod stats;

pub use cancel::CancelToken;
pub use events::RunEvent;
pub use orchestrator::{Pipeline, PipelineConfig};
pub use stats::PipelineStats;
