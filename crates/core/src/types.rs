/// Surrogate keys for append-only tables (token rows, usage logs) are BIGSERIAL.
pub type DbId = i64;

/// Notebooks are addressed by UUID so ids can be handed to browsers as strings.
pub type NotebookId = uuid::Uuid;

/// Owner identity as issued by the identity provider (`sub` claim).
pub type OwnerId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Registered models are addressed by UUID like notebooks.
pub type ModelId = uuid::Uuid;

pub type DeploymentId = uuid::Uuid;
