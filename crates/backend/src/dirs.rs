/// Get the default base path for MCPIDE data
///
/// Respects the following environment variables (in order of precedence):
/// 1. DATA_DIR - explicit data directory override
/// 2. XDG_DATA_HOME - standard XDG data home directory
/// 3. dirs::data_local_dir() - platform default
pub fn default_data_dir() -> std::path::PathBuf {
  // Check explicit override first
  if let Ok(dir) = std::env::var("DATA_DIR") {
    return std::path::PathBuf::from(dir);
  }

  if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
    return std::path::PathBuf::from(xdg_data).join("mcpide");
  }

  // Fall back to platform default
  dirs::data_local_dir()
    .unwrap_or_else(|| std::path::PathBuf::from("."))
    .join("mcpide")
}

/// Get the default log directory
pub fn default_log_dir() -> std::path::PathBuf {
  default_data_dir().join("logs")
}
