//! Configuration system for MCPIDE with per-project overrides.
//!
//! Config priority: project-relative (.mcpide/config.toml) > user (~/.config/mcpide/config.toml)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// Actor Configuration
// ============================================================================

/// Project actor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
  /// Capacity of the command queue (default: 256)
  /// Senders wait when the queue is full.
  pub queue_capacity: usize,
}

impl Default for ActorConfig {
  fn default() -> Self {
    Self { queue_capacity: 256 }
  }
}

// ============================================================================
// Highlight Configuration
// ============================================================================

/// Highlight pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
  /// Buffered text submissions per surface before `update_text` waits (default: 64)
  pub update_capacity: usize,
}

impl Default for HighlightConfig {
  fn default() -> Self {
    Self { update_capacity: 64 }
  }
}

// ============================================================================
// UI Configuration
// ============================================================================

/// UI bridge settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
  /// Capacity of the view event channel between actor and UI (default: 256)
  pub event_capacity: usize,

  /// Capacity of the applied-event feed for frontends (default: 256)
  /// Slow subscribers lose the oldest events.
  pub feed_capacity: usize,
}

impl Default for UiConfig {
  fn default() -> Self {
    Self {
      event_capacity: 256,
      feed_capacity: 256,
    }
  }
}

// ============================================================================
// Tooling Configuration
// ============================================================================

/// External decompiler invocation
///
/// `{input}` and `{output}` in `args` are replaced with the archive path and
/// the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecompilerConfig {
  pub program: String,
  #[serde(default)]
  pub args: Vec<String>,
}

/// Project tooling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolingConfig {
  /// Mapping export file, relative to the project directory (default: "mappings.csv")
  pub export_file: String,

  /// Decompiled source tree, relative to the project directory (default: "decompiled")
  pub decompiled_dir: String,

  /// Decompiler command (decompilation fails when unset)
  #[serde(skip_serializing_if = "Option::is_none")]
  pub decompiler: Option<DecompilerConfig>,
}

impl Default for ToolingConfig {
  fn default() -> Self {
    Self {
      export_file: "mappings.csv".to_string(),
      decompiled_dir: "decompiled".to_string(),
      decompiler: None,
    }
  }
}

// ============================================================================
// Logging Configuration
// ============================================================================

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
  /// Log level: "off", "error", "warn", "info", "debug", "trace"
  /// Default: "info"
  #[serde(default = "default_log_level")]
  pub level: String,

  /// Log file rotation: "daily", "hourly", "never"
  /// Default: "daily"
  #[serde(default = "default_log_rotation")]
  pub rotation: String,
}

fn default_log_level() -> String {
  "info".to_string()
}
fn default_log_rotation() -> String {
  "daily".to_string()
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      rotation: default_log_rotation(),
    }
  }
}

// ============================================================================
// Main Configuration
// ============================================================================

/// MCPIDE configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Project actor settings
  #[serde(default)]
  pub actor: ActorConfig,

  /// Highlight pipeline settings
  #[serde(default)]
  pub highlight: HighlightConfig,

  /// UI bridge settings
  #[serde(default)]
  pub ui: UiConfig,

  /// Project tooling settings
  #[serde(default)]
  pub tooling: ToolingConfig,

  /// Logging settings
  #[serde(default)]
  pub logging: LoggingConfig,
}

impl Config {
  /// Load config for a project, with fallback to user config
  pub fn load_for_project(project_path: &Path) -> Self {
    // Try project-relative first
    let project_config = Self::project_config_path(project_path);
    if project_config.exists()
      && let Ok(content) = std::fs::read_to_string(&project_config)
      && let Ok(config) = toml::from_str(&content)
    {
      return config;
    }

    // Fall back to user config
    if let Some(user_config_path) = Self::user_config_path()
      && user_config_path.exists()
      && let Ok(content) = std::fs::read_to_string(&user_config_path)
      && let Ok(config) = toml::from_str(&content)
    {
      return config;
    }

    Self::default()
  }

  /// Get the user-level config path
  pub fn user_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("CONFIG_DIR") {
      return Some(PathBuf::from(path).join("config.toml"));
    }

    if let Ok(path) = std::env::var("XDG_CONFIG_HOME") {
      return Some(PathBuf::from(path).join("mcpide").join("config.toml"));
    }

    dirs::config_dir().map(|p: PathBuf| p.join("mcpide").join("config.toml"))
  }

  /// Get the project-relative config path
  pub fn project_config_path(project_path: &Path) -> PathBuf {
    project_path.join(".mcpide").join("config.toml")
  }

  /// Generate a default config file as a string
  pub fn generate_template() -> String {
    r#"# MCPIDE Configuration
# Place in .mcpide/config.toml (project) or ~/.config/mcpide/config.toml (user)

# ============================================================================
# Project Actor
# ============================================================================

[actor]
# Command queue capacity. Senders wait while the queue is full.
queue_capacity = 256

# ============================================================================
# Highlighting
# ============================================================================

[highlight]
# Text submissions buffered per editor before updates wait
update_capacity = 64

# ============================================================================
# UI Bridge
# ============================================================================

[ui]
# View events buffered between the project actor and the UI thread
event_capacity = 256

# Applied events buffered for each frontend subscriber
feed_capacity = 256

# ============================================================================
# Tooling
# ============================================================================

[tooling]
# Where exported mappings are written, relative to the project
export_file = "mappings.csv"

# Where decompiled sources live, relative to the project
decompiled_dir = "decompiled"

# External decompiler ({input} = archive, {output} = decompiled_dir)
# [tooling.decompiler]
# program = "java"
# args = ["-jar", "decompiler.jar", "{input}", "{output}"]

# ============================================================================
# Logging
# ============================================================================

[logging]
# Log level: off, error, warn, info, debug, trace
level = "info"

# Log file rotation: daily, hourly, never
rotation = "daily"
"#
    .to_string()
  }
}
