// ABOUTME: Configuration crate for agentbox
// ABOUTME: Exposes environment variable names and typed parsing helpers

pub mod constants;
pub mod env;

pub use env::{
    env_non_empty, parse_env_bool, parse_env_or_default, parse_env_or_default_with_validation,
};
