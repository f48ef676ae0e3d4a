//! Row structs and DTOs.
//!
//! Each submodule holds a `FromRow` entity struct matching the table and the
//! `Deserialize`/plain DTOs used for inserts.

pub mod deployment;
pub mod model;
pub mod notebook;
pub mod notebook_token;
pub mod usage_log;
