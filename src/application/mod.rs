pub mod orchestrator;
pub mod pipeline;

pub use orchestrator::{AbortHandle, RefreshOptions, RefreshOrchestrator, RefreshPass};
pub use pipeline::{PipelineOptions, PipelineRunner};
