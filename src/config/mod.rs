//! Project configuration from tinycompute.toml.

pub mod project;

pub use project::{ProjectConfig, CONFIG_FILE};
