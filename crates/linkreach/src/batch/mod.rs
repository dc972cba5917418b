//! Resumable batch processing over a record store.

pub mod cancel;
pub mod pacing;
pub mod plan;
pub mod processor;
pub mod progress;

pub use cancel::CancelFlag;
pub use pacing::Pacing;
pub use plan::{plan_batch, BatchPlan, PlanStep};
pub use processor::{BatchProcessor, BatchSummary};
pub use progress::{LogProgress, NoopProgress, ProgressEvent, ProgressReporter};
