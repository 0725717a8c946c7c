//! Configuration commands

use std::path::Path;

use anyhow::{Context, Result, bail};
use mcpide_core::Config;

/// Show the effective configuration for `project`
pub async fn cmd_config_show(project: &Path) -> Result<()> {
  let config = Config::load_for_project(project);

  let project_config = Config::project_config_path(project);
  let user_config = Config::user_config_path();

  println!("Effective configuration for: {}", project.display());
  println!();

  if project_config.exists() {
    println!("Using project config: {}", project_config.display());
  } else if let Some(user_path) = user_config.filter(|p| p.exists()) {
    println!("Using user config: {}", user_path.display());
  } else {
    println!("Using default configuration (no config file found)");
  }
  println!();

  let toml_str = toml::to_string_pretty(&config).context("Failed to serialize configuration")?;
  println!("{}", toml_str);

  Ok(())
}

/// Write the default configuration template into `project`
pub async fn cmd_config_init(project: &Path) -> Result<()> {
  let config_path = Config::project_config_path(project);
  if config_path.exists() {
    bail!(
      "Config file already exists: {} (delete it first to regenerate)",
      config_path.display()
    );
  }

  if let Some(parent) = config_path.parent() {
    std::fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
  }
  std::fs::write(&config_path, Config::generate_template())
    .with_context(|| format!("Failed to write {}", config_path.display()))?;

  println!("Created project config: {}", config_path.display());
  println!("Edit the file to customize settings.");
  Ok(())
}
