// Orchestration - campaign pipeline over LLM-backed experts

pub mod experts;
pub mod orchestrator;
pub mod registry;
pub mod types;

pub use orchestrator::{Orchestrator, PipelineError};
pub use registry::CampaignRegistry;
pub use types::*;
