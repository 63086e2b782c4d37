// creative-flow - multi-agent ad campaign generation
//
// Brief -> scored ideas -> ad copy -> poster image, with every stage
// backed by an injected model capability and persisted through a
// `CampaignStore`.

pub mod config;
pub mod orchestration;
pub mod store;

pub use config::{ConfigError, PipelineConfig, Settings};
pub use orchestration::{CampaignRegistry, Orchestrator, PipelineError};
pub use store::{CampaignStore, JsonDirStore, MemoryStore, StoreError};
