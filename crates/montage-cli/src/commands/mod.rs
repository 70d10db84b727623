//! CLI command implementations.

pub mod common;
pub mod inspect;
pub mod new;
pub mod render;
pub mod types;
