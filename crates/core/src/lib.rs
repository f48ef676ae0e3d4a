//! Domain logic for the ML cloud backend.
//!
//! Has no database or HTTP dependencies so the token lifecycle, the notebook,
//! model and deployment state machines and pricing rules can be tested in isolation.

pub mod access_token;
pub mod deployment;
pub mod error;
pub mod model;
pub mod notebook;
pub mod token_service;
pub mod types;
