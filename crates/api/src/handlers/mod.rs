pub mod deployment;
pub mod model;
pub mod notebook;
pub mod usage;
