pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;
pub use config::toml_config::AppConfig;

#[cfg(feature = "s3")]
pub use adapters::S3ArtifactStore;
pub use adapters::{ConfiguredArtifactStore, LocalArtifactStore};

pub use crate::core::{
    graph::{CascadeReport, GraphStore},
    uid::RandomUid,
    workflow::{PlacementMapping, WorkflowSettings, Workflows},
};
pub use utils::error::{CampaignError, Result};
