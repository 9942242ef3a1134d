//! Subcommand implementations.

pub mod fetch;
pub mod inspect;
pub mod lifecycle;
