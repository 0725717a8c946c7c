//! Command implementations

mod config;
mod edit;
mod project;

pub use config::{cmd_config_init, cmd_config_show};
pub use edit::{RenameArgs, cmd_highlight, cmd_rename};
pub use project::{cmd_decompile, cmd_export};
