//! Project commands and the session they share

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::{Context, Result};
use mcpide::{Dialogs, LocalTooling, Session};
use mcpide_core::Config;
use mcpide_parser::JavaResolver;
use tracing::info;

use crate::console::ConsoleDialogs;

/// Start a session and load `project`, optionally replacing its mappings.
pub async fn open_project(
  config: Config,
  project: &Path,
  mappings: Option<&Path>,
  dialogs: impl Dialogs,
) -> Result<Session> {
  let tooling = Arc::new(LocalTooling::new(config.tooling.clone()));
  let session = Session::start(config, tooling, Arc::new(JavaResolver::new()), Arc::new(dialogs))
    .context("Failed to start session")?;

  if let Err(e) = load(&session, project, mappings).await {
    session.shutdown().await;
    return Err(e);
  }
  Ok(session)
}

async fn load(session: &Session, project: &Path, mappings: Option<&Path>) -> Result<()> {
  let directory = session
    .load_project(project)
    .await
    .with_context(|| format!("Failed to load project {}", project.display()))?;
  info!(directory = %directory.display(), "Project loaded");

  if let Some(mappings) = mappings {
    let snapshot = session
      .set_initial_mappings(mappings)
      .await
      .with_context(|| format!("Failed to read mappings from {}", mappings.display()))?;
    info!(count = snapshot.len(), "Mappings loaded");
  }
  Ok(())
}

/// Decompile an archive into the project
pub async fn cmd_decompile(config: Config, project: &Path, archive: PathBuf) -> Result<()> {
  let session = open_project(config, project, None, ConsoleDialogs::default()).await?;

  let result = session.decompile(&archive).await;
  session.shutdown().await;

  let output = result.with_context(|| format!("Failed to decompile {}", archive.display()))?;
  println!("Decompiled {} into {}", archive.display(), output.display());
  Ok(())
}

/// Export the project's mappings
pub async fn cmd_export(config: Config, project: &Path, mappings: Option<&Path>) -> Result<()> {
  let session = open_project(config, project, mappings, ConsoleDialogs::default()).await?;

  let result = session.export_mappings().await;
  session.shutdown().await;

  let path = result.context("Failed to export mappings")?;
  println!("Exported mappings to {}", path.display());
  Ok(())
}
