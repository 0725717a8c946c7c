//! Editor commands: highlight a file, rename the symbol at a caret

use std::{path::Path, time::Duration};

use anyhow::{Context, Result, bail};
use mcpide::{EditorSurface, RenameOutcome, Session, StyleClass, SurfaceView};
use mcpide_core::Config;
use tokio::time::timeout;

use super::project::open_project;
use crate::console::ConsoleDialogs;

const HIGHLIGHT_TIMEOUT: Duration = Duration::from_secs(30);

/// Options for `mcpide rename`
pub struct RenameArgs {
  pub caret: usize,
  pub to: Option<String>,
  pub yes: bool,
  pub export: bool,
}

/// Print a file with mappings applied
pub async fn cmd_highlight(
  config: Config,
  project: &Path,
  mappings: Option<&Path>,
  file: &Path,
  show_spans: bool,
) -> Result<()> {
  let session = open_project(config, project, mappings, ConsoleDialogs::default()).await?;

  let result = highlight(&session, file).await;
  session.shutdown().await;
  let view = result?;

  print!("{}", view.text);
  if !view.text.ends_with('\n') {
    println!();
  }
  if show_spans {
    println!();
    print_symbols(&view);
  }
  Ok(())
}

async fn highlight(session: &Session, file: &Path) -> Result<SurfaceView> {
  let surface = session
    .open_file(file)
    .await
    .with_context(|| format!("Failed to open {}", file.display()))?;
  wait_highlighted(&surface).await
}

async fn wait_highlighted(surface: &EditorSurface) -> Result<SurfaceView> {
  let view = timeout(HIGHLIGHT_TIMEOUT, surface.highlighted())
    .await
    .context("Timed out waiting for highlighting")??;
  Ok(view)
}

fn print_symbols(view: &SurfaceView) {
  for span in &view.spans {
    let Some(srg_name) = &span.style.srg_name else {
      continue;
    };
    let marker = match span.style.class {
      StyleClass::Mapped => "mapped",
      StyleClass::Identifier => "unmapped",
      StyleClass::Plain => continue,
    };
    let shown = view.text.get(span.range.clone()).unwrap_or_default();
    println!("{:>6}..{:<6} {:<8} {} -> {}", span.range.start, span.range.end, marker, srg_name, shown);
  }
}

/// Rename the symbol at `args.caret` and export the result
pub async fn cmd_rename(
  config: Config,
  project: &Path,
  mappings: Option<&Path>,
  file: &Path,
  args: RenameArgs,
) -> Result<()> {
  let dialogs = ConsoleDialogs::new(args.yes, args.to.clone());
  let session = open_project(config, project, mappings, dialogs).await?;

  let result = rename(&session, file, &args).await;
  session.shutdown().await;

  match result? {
    RenameOutcome::Sent { old, new } => {
      println!("Renamed {old} to {new}");
      Ok(())
    }
    RenameOutcome::NoSelection => bail!("No identifier at caret {}", args.caret),
    RenameOutcome::NotASymbol => bail!("The identifier at caret {} is not a mappable symbol", args.caret),
    RenameOutcome::PromptDismissed => bail!("Rename cancelled"),
    RenameOutcome::InvalidName(name) => bail!("'{name}' is not a valid identifier"),
    RenameOutcome::Declined => {
      println!("Existing mapping kept");
      Ok(())
    }
  }
}

async fn rename(session: &Session, file: &Path, args: &RenameArgs) -> Result<RenameOutcome> {
  let surface = session
    .open_file(file)
    .await
    .with_context(|| format!("Failed to open {}", file.display()))?;
  wait_highlighted(&surface).await?;

  surface.set_caret(args.caret)?;
  let outcome = surface.start_rename().await.context("Rename failed")?;

  if args.export && matches!(outcome, RenameOutcome::Sent { .. }) {
    // Queued behind the rename, so the export includes it
    let path = session.export_mappings().await.context("Failed to export mappings")?;
    println!("Exported mappings to {}", path.display());
  }
  Ok(outcome)
}
