//! HighlightPipeline - latest-wins highlighting for one surface
//!
//! # Flow
//!
//! ```text
//! update_text ─> [submissions] ─> driver ─> computation ─> UiBridge::apply_highlighting
//!   (advance)        64            |           |  RetrieveMappings
//!                                  |           |  resolve + rewrite (blocking pool)
//!                                  └─ status   └─ error report (current only)
//! ```
//!
//! Each submission carries the ticket issued when it was made. Starting a
//! computation cancels the previous one, and the UI thread rejects any result
//! whose ticket is no longer current. The driver owns the "Highlighting"
//! status: it goes up when the first computation starts and is cleared when
//! none are left, so superseded computations never touch it.

use std::sync::Arc;

use mcpide_core::HighlightConfig;
use mcpide_parser::{ResolveError, SymbolResolver};
use tokio::{sync::mpsc, task::JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::generation::{EditGeneration, GenerationTicket};
use crate::{
  actor::{Comms, ProjectHandle, SendError},
  domain::highlight::Highlighting,
  ui::{SurfaceId, UiBridge, UiError, panic_message},
};

/// Status category owned by the pipeline
pub const HIGHLIGHTING: &str = "Highlighting";
const IN_PROGRESS: &str = "In Progress...";
const ERROR_TITLE: &str = "Highlighting Error";

/// Errors from one highlighting computation
#[derive(Debug, thiserror::Error)]
pub enum HighlightError {
  #[error("Symbol resolution failed: {0}")]
  Resolve(#[from] ResolveError),
  #[error("Project unavailable: {0}")]
  Actor(SendError),
  #[error("Superseded by a newer edit")]
  Cancelled,
  #[error("Highlighter panicked: {0}")]
  Panicked(String),
  #[error(transparent)]
  Ui(#[from] UiError),
}

impl From<SendError> for HighlightError {
  fn from(e: SendError) -> Self {
    match e {
      SendError::Cancelled => HighlightError::Cancelled,
      other => HighlightError::Actor(other),
    }
  }
}

#[derive(Debug)]
struct Submission {
  ticket: GenerationTicket,
  text: String,
}

// ============================================================================
// Handle
// ============================================================================

/// Submits text to a surface's pipeline
#[derive(Debug, Clone)]
pub struct HighlightHandle {
  tx: mpsc::Sender<Submission>,
  generation: EditGeneration,
}

impl HighlightHandle {
  /// Submit new source text. The returned ticket is current until the next
  /// submission.
  pub async fn update_text(&self, text: impl Into<String>) -> Result<GenerationTicket, SendError> {
    let ticket = self.generation.advance();
    self
      .tx
      .send(Submission {
        ticket: ticket.clone(),
        text: text.into(),
      })
      .await
      .map_err(|_| SendError::ActorGone)?;
    Ok(ticket)
  }

  pub fn generation(&self) -> &EditGeneration {
    &self.generation
  }
}

// ============================================================================
// Pipeline
// ============================================================================

pub struct HighlightPipeline {
  surface: SurfaceId,
  comms: Comms,
  resolver: Arc<dyn SymbolResolver>,
  ui: UiBridge,
  submissions: mpsc::Receiver<Submission>,
  computations: JoinSet<()>,
  /// Token of the newest computation
  current: Option<CancellationToken>,
  cancel: CancellationToken,
}

impl HighlightPipeline {
  /// Spawn the driver task for `surface`
  pub fn spawn(
    surface: SurfaceId,
    comms: Comms,
    resolver: Arc<dyn SymbolResolver>,
    ui: UiBridge,
    config: &HighlightConfig,
    cancel: CancellationToken,
  ) -> HighlightHandle {
    let (tx, rx) = mpsc::channel(config.update_capacity.max(1));

    let pipeline = Self {
      surface,
      comms,
      resolver,
      ui,
      submissions: rx,
      computations: JoinSet::new(),
      current: None,
      cancel,
    };
    tokio::spawn(pipeline.run());

    HighlightHandle {
      tx,
      generation: EditGeneration::new(),
    }
  }

  async fn run(mut self) {
    debug!(surface = %self.surface, "Highlight pipeline started");
    let mut intake_open = true;

    loop {
      if !intake_open && self.computations.is_empty() {
        break;
      }

      tokio::select! {
        biased;

        _ = self.cancel.cancelled() => {
          debug!(surface = %self.surface, "Highlight pipeline cancelled");
          break;
        }

        Some(joined) = self.computations.join_next(), if !self.computations.is_empty() => {
          if let Err(e) = joined
            && e.is_panic()
          {
            error!(surface = %self.surface, "Highlight task panicked");
          }
          if self.computations.is_empty() {
            self.comms.status(HIGHLIGHTING, "").await;
          }
        }

        submission = self.submissions.recv(), if intake_open => {
          match submission {
            Some(submission) => self.start(submission).await,
            None => intake_open = false,
          }
        }
      }
    }

    if let Some(current) = self.current.take() {
      current.cancel();
    }
    debug!(surface = %self.surface, "Highlight pipeline stopped");
  }

  async fn start(&mut self, submission: Submission) {
    let Submission { ticket, text } = submission;
    if !ticket.is_current() {
      trace!(surface = %self.surface, generation = ticket.generation(), "Skipping superseded submission");
      return;
    }

    if let Some(previous) = self.current.take() {
      previous.cancel();
    }
    let token = self.cancel.child_token();
    self.current = Some(token.clone());

    if self.computations.is_empty() {
      self.comms.status(HIGHLIGHTING, IN_PROGRESS).await;
    }

    let surface = self.surface;
    let project = self.comms.project.clone();
    let resolver = Arc::clone(&self.resolver);
    let ui = self.ui.clone();
    self.computations.spawn(async move {
      let generation = ticket.generation();
      let computed = compute(surface, ticket.clone(), text, &project, resolver, &ui, &token).await;
      match computed {
        Ok(()) => {}
        Err(HighlightError::Cancelled) => {
          trace!(%surface, generation, "Highlighting superseded");
        }
        Err(e) => {
          warn!(%surface, generation, error = %e, "Highlighting failed");
          if ticket.is_current() {
            // The dialog is modal; the status must not wait for it
            let message = e.to_string();
            tokio::spawn(async move {
              if let Err(report) = ui.report_error(ERROR_TITLE, &message).await {
                info!(%surface, error = %report, "Could not report highlighting error");
              }
            });
          }
        }
      }
    });
  }
}

/// One computation: snapshot, rewrite, apply
async fn compute(
  surface: SurfaceId,
  ticket: GenerationTicket,
  text: String,
  project: &ProjectHandle,
  resolver: Arc<dyn SymbolResolver>,
  ui: &UiBridge,
  cancel: &CancellationToken,
) -> Result<(), HighlightError> {
  let snapshot = project.retrieve_mappings_until(cancel).await?;

  let task = tokio::task::spawn_blocking(move || Highlighting::compute(resolver.as_ref(), &text, &snapshot));
  let joined = tokio::select! {
    biased;
    _ = cancel.cancelled() => return Err(HighlightError::Cancelled),
    joined = task => joined,
  };

  let highlighting = match joined {
    Ok(result) => result?,
    Err(e) if e.is_panic() => return Err(HighlightError::Panicked(panic_message(&*e.into_panic()).to_string())),
    Err(_) => return Err(HighlightError::Cancelled),
  };

  trace!(%surface, generation = ticket.generation(), spans = highlighting.spans.len(), "Highlighting computed");
  ui.apply_highlighting(surface, ticket, highlighting)?;
  Ok(())
}
