//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` (or any Postgres executor) as the first argument.

pub mod deployment_repo;
pub mod model_repo;
pub mod notebook_repo;
pub mod notebook_token_repo;
pub mod usage_log_repo;

pub use deployment_repo::DeploymentRepo;
pub use model_repo::ModelRepo;
pub use notebook_repo::NotebookRepo;
pub use notebook_token_repo::NotebookTokenRepo;
pub use usage_log_repo::UsageLogRepo;
