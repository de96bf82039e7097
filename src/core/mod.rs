pub mod artifact;
pub mod graph;
pub mod queries;
pub mod uid;
pub mod workflow;

pub use crate::domain::model::{
    Campaign, Client, Contract, Placement, Program, ProgramTargetList, TargetList, UseCase,
};
pub use crate::domain::ports::{ArtifactStore, ConfigProvider, UidSource};
pub use crate::utils::error::Result;
