// kubectl access: typed reads, typed inline manifests
pub mod kubectl;
pub mod manifest;
pub mod objects;

pub use kubectl::Kubectl;
pub use manifest::Manifest;
pub use objects::{DeploymentStatus, JobState};
