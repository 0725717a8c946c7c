//! EditorSurface - one open source file
//!
//! A surface pairs a UI view with its highlight pipeline. It keeps the latest
//! raw source so it can re-highlight when the mappings change, and it runs the
//! rename flow: everything is validated here before a `Rename` command is
//! ever built.

use std::{
  ops::Range,
  path::{Path, PathBuf},
  sync::Arc,
};

use mcpide_core::HighlightConfig;
use mcpide_parser::{SymbolResolver, is_valid_identifier};
use tokio::sync::{broadcast::error::RecvError, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{
  actor::{Comms, SendError, ViewEvent},
  domain::selection::{select_identifier, select_word},
  highlight::{GenerationTicket, HighlightHandle, HighlightPipeline},
  ui::{DialogOutcome, PromptSpec, SurfaceId, SurfaceView, UiBridge, UiError, UiUpdate},
};

const OVERWRITE_TITLE: &str = "Overwrite Confirmation";

/// Which branch the rename flow took
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
  /// A `Rename` was enqueued
  Sent { old: String, new: String },
  /// No identifier at the caret
  NoSelection,
  /// The selection is not a single mapped identifier
  NotASymbol,
  PromptDismissed,
  /// The candidate is not a valid identifier
  InvalidName(String),
  /// Overwriting an existing mapping was not confirmed
  Declined,
}

#[derive(Debug, thiserror::Error)]
pub enum RenameError {
  #[error(transparent)]
  Send(#[from] SendError),
  #[error(transparent)]
  Ui(#[from] UiError),
  #[error("Identifier selection produced an empty range")]
  EmptySelection,
}

/// Selection snapshot taken on the UI thread
struct Selected {
  range: Range<usize>,
  word: String,
  srg_names: Vec<Option<String>>,
}

pub struct EditorSurface {
  id: SurfaceId,
  path: PathBuf,
  comms: Comms,
  ui: UiBridge,
  highlight: HighlightHandle,
  source: watch::Sender<String>,
  cancel: CancellationToken,
}

impl EditorSurface {
  /// Register a surface showing `text` and start its pipeline.
  ///
  /// Nothing is highlighted until the first [`update_text`](Self::update_text).
  pub fn open(
    path: PathBuf,
    text: String,
    comms: Comms,
    resolver: Arc<dyn SymbolResolver>,
    ui: UiBridge,
    config: &HighlightConfig,
    cancel: CancellationToken,
  ) -> Result<Self, UiError> {
    let id = ui.register_surface(path.clone(), text.clone())?;
    let highlight = HighlightPipeline::spawn(id, comms.clone(), resolver, ui.clone(), config, cancel.clone());
    let (source, _) = watch::channel(text);

    let surface = Self {
      id,
      path,
      comms,
      ui,
      highlight,
      source,
      cancel,
    };
    surface.spawn_refresher();
    info!(surface = %id, path = %surface.path.display(), "Surface opened");
    Ok(surface)
  }

  /// Re-highlight whenever the project announces new mappings
  fn spawn_refresher(&self) {
    let mut feed = self.ui.subscribe();
    let source = self.source.subscribe();
    let highlight = self.highlight.clone();
    let cancel = self.cancel.clone();
    let surface = self.id;

    tokio::spawn(async move {
      loop {
        let update = tokio::select! {
          biased;
          _ = cancel.cancelled() => break,
          update = feed.recv() => update,
        };
        match update {
          // A lagged feed may have skipped a change
          Ok(UiUpdate::Event(ViewEvent::MappingsChanged(_))) | Err(RecvError::Lagged(_)) => {
            let text = source.borrow().clone();
            debug!(%surface, "Mappings changed, re-highlighting");
            if highlight.update_text(text).await.is_err() {
              break;
            }
          }
          Ok(_) => {}
          Err(RecvError::Closed) => break,
        }
      }
    });
  }

  pub fn id(&self) -> SurfaceId {
    self.id
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn highlight(&self) -> &HighlightHandle {
    &self.highlight
  }

  /// Replace the source text and highlight it
  pub async fn update_text(&self, text: impl Into<String>) -> Result<GenerationTicket, SendError> {
    let text = text.into();
    self.source.send_replace(text.clone());
    self.highlight.update_text(text).await
  }

  /// Highlight the current source again
  pub async fn refresh(&self) -> Result<GenerationTicket, SendError> {
    let text = self.source.borrow().clone();
    self.highlight.update_text(text).await
  }

  /// Move the caret (character index into the displayed text)
  pub fn set_caret(&self, caret: usize) -> Result<(), UiError> {
    self.ui.set_caret(self.id, caret)
  }

  pub async fn view(&self) -> Result<SurfaceView, UiError> {
    self.ui.surface(self.id).await?.ok_or(UiError::Closed)
  }

  /// Wait until the latest submission has been applied
  pub async fn highlighted(&self) -> Result<SurfaceView, UiError> {
    let target = self.highlight.generation().current();
    let mut feed = self.ui.subscribe();

    loop {
      let view = self.view().await?;
      if view.applied_generation >= target {
        return Ok(view);
      }
      loop {
        match feed.recv().await {
          Ok(UiUpdate::Highlighted { surface, generation }) if surface == self.id && generation >= target => break,
          Ok(_) => {}
          Err(RecvError::Lagged(_)) => break,
          Err(RecvError::Closed) => return Err(UiError::Closed),
        }
      }
    }
  }

  /// Select the identifier at the caret, or the surrounding word if there is none
  pub async fn select_word(&self) -> Result<Option<String>, UiError> {
    let id = self.id;
    self
      .ui
      .query(move |state| {
        let view = state.surface_mut(id)?;
        let range = select_identifier(&view.text, view.caret).or_else(|| select_word(&view.text, view.caret))?;
        view.selection = Some(range.clone());
        view.text.get(range).map(str::to_string)
      })
      .await
  }

  // ==========================================================================
  // Rename
  // ==========================================================================

  /// Rename the mapped identifier at the caret.
  ///
  /// Returns which branch was taken; at most one `Rename` is sent.
  pub async fn start_rename(&self) -> Result<RenameOutcome, RenameError> {
    let Some(selected) = self.select_identifier().await? else {
      return Ok(RenameOutcome::NoSelection);
    };
    if selected.range.is_empty() {
      error!(surface = %self.id, "Empty identifier selection");
      return Err(RenameError::EmptySelection);
    }

    let old = match selected.srg_names.as_slice() {
      [Some(srg_name)] => srg_name.clone(),
      _ => {
        debug!(surface = %self.id, word = %selected.word, "Selection is not a single symbol");
        return Ok(RenameOutcome::NotASymbol);
      }
    };

    let prompt = PromptSpec::new("Rename", format!("New name for {}", selected.word), selected.word.clone());
    let Some(candidate) = self.ui.prompt(prompt).await? else {
      return Ok(RenameOutcome::PromptDismissed);
    };
    if !is_valid_identifier(&candidate) {
      debug!(surface = %self.id, candidate, "Rejected rename candidate");
      return Ok(RenameOutcome::InvalidName(candidate));
    }

    let snapshot = self.comms.project.retrieve_mappings().await?;
    if let Some(existing) = snapshot.mapped_name(&old) {
      let message = format!("{old} is already mapped to {existing}. Overwrite it with {candidate}?");
      if self.ui.confirm(OVERWRITE_TITLE, &message).await? != DialogOutcome::Confirmed {
        return Ok(RenameOutcome::Declined);
      }
    }

    self
      .comms
      .project
      .rename(self.path.clone(), old.clone(), candidate.clone())
      .await?;
    info!(surface = %self.id, old, new = candidate, "Rename sent");
    Ok(RenameOutcome::Sent { old, new: candidate })
  }

  /// Select the identifier at the caret and collect the SRG names under it
  async fn select_identifier(&self) -> Result<Option<Selected>, UiError> {
    let id = self.id;
    self
      .ui
      .query(move |state| {
        let view = state.surface_mut(id)?;
        let range = select_identifier(&view.text, view.caret)?;
        view.selection = Some(range.clone());
        Some(Selected {
          word: view.text.get(range.clone())?.to_string(),
          srg_names: view.spans_in(range.clone()).map(|span| span.style.srg_name.clone()).collect(),
          range,
        })
      })
      .await
  }
}

impl Drop for EditorSurface {
  fn drop(&mut self) {
    self.cancel.cancel();
    let _ = self.ui.close_surface(self.id);
  }
}
