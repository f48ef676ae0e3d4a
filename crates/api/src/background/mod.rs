//! Background jobs spawned by the server binary.

pub mod token_purge;
