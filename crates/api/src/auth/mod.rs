//! Authentication primitives.
//!
//! - [`jwt`] -- validation of HS256 access tokens issued by the identity provider.

pub mod jwt;
