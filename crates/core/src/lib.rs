//! Shared types for MCPIDE crates

pub mod config;

pub use config::{
  ActorConfig, Config, DecompilerConfig, HighlightConfig, LoggingConfig, ToolingConfig, UiConfig,
};
