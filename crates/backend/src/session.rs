//! Session - wires the project actor, UI context and surfaces together
//!
//! ```text
//!                 ┌────────────── Comms ──────────────┐
//!                 v                                   v
//! EditorSurface ─> ProjectActor ─> ViewEvent ─> event pump ─> UiBridge
//!       │                                           │
//!       └──> HighlightPipeline ─────────────────────┴─> error dialogs
//! ```
//!
//! The session owns the root cancellation token; every task it starts runs on
//! a child of it.

use std::{path::PathBuf, sync::Arc};

use mcpide_core::Config;
use mcpide_parser::SymbolResolver;
use tokio::{
  sync::mpsc,
  task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
  actor::{Command, Comms, Completion, OperationKind, ProjectActor, ProjectHandle, ProjectTooling, SendError, ViewEvent},
  domain::mapping::MappingSnapshot,
  surface::EditorSurface,
  ui::{Dialogs, UiBridge, UiContext, UiError},
};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
  #[error(transparent)]
  Ui(#[from] UiError),
  #[error(transparent)]
  Send(#[from] SendError),
  #[error("{operation} failed: {message}")]
  OperationFailed { operation: OperationKind, message: String },
  #[error("{0} completed with an unexpected result")]
  UnexpectedResult(OperationKind),
}

pub struct Session {
  config: Config,
  comms: Comms,
  ui: UiContext,
  resolver: Arc<dyn SymbolResolver>,
  pump: JoinHandle<()>,
  cancel: CancellationToken,
}

impl Session {
  /// Start the UI thread, the project actor and the event pump.
  ///
  /// Must be called from within a Tokio runtime.
  pub fn start(
    config: Config,
    tooling: Arc<dyn ProjectTooling>,
    resolver: Arc<dyn SymbolResolver>,
    dialogs: Arc<dyn Dialogs>,
  ) -> Result<Self, SessionError> {
    let cancel = CancellationToken::new();
    let ui = UiContext::spawn(dialogs, &config.ui)?;

    let (view_tx, view_rx) = mpsc::channel(config.ui.event_capacity.max(1));
    let project = ProjectActor::spawn(&config.actor, tooling, view_tx.clone(), cancel.child_token());
    let pump = tokio::spawn(pump_events(view_rx, ui.bridge(), cancel.child_token()));

    info!(queue_capacity = config.actor.queue_capacity, "Session started");

    Ok(Self {
      config,
      comms: Comms::new(project, view_tx),
      ui,
      resolver,
      pump,
      cancel,
    })
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn comms(&self) -> &Comms {
    &self.comms
  }

  pub fn project(&self) -> &ProjectHandle {
    &self.comms.project
  }

  pub fn ui(&self) -> UiBridge {
    self.ui.bridge()
  }

  // ==========================================================================
  // Surfaces
  // ==========================================================================

  /// Open a surface over `text` and submit it for highlighting
  pub async fn open_surface(
    &self,
    path: impl Into<PathBuf>,
    text: impl Into<String>,
  ) -> Result<EditorSurface, SessionError> {
    let text = text.into();
    let surface = EditorSurface::open(
      path.into(),
      text.clone(),
      self.comms.clone(),
      Arc::clone(&self.resolver),
      self.ui.bridge(),
      &self.config.highlight,
      self.cancel.child_token(),
    )?;
    surface.update_text(text).await?;
    Ok(surface)
  }

  /// Read a file through the project and open a surface for it
  pub async fn open_file(&self, file: impl Into<PathBuf>) -> Result<EditorSurface, SessionError> {
    let file = file.into();
    let (path, text) = self
      .request(
        OperationKind::OpenFile,
        |done| Command::OpenFile { file, done },
        |event| match event {
          ViewEvent::FileOpened { path, text } => Some((path, text)),
          _ => None,
        },
      )
      .await?;
    self.open_surface(path, text).await
  }

  // ==========================================================================
  // Awaited operations
  // ==========================================================================

  /// Load a project directory and wait until it is applied
  pub async fn load_project(&self, directory: impl Into<PathBuf>) -> Result<PathBuf, SessionError> {
    let directory = directory.into();
    self
      .request(
        OperationKind::LoadProject,
        |done| Command::LoadProject { directory, done },
        |event| match event {
          ViewEvent::ProjectLoaded { directory, .. } => Some(directory),
          _ => None,
        },
      )
      .await
  }

  /// Replace all mappings and wait for the new snapshot
  pub async fn set_initial_mappings(&self, archive: impl Into<PathBuf>) -> Result<MappingSnapshot, SessionError> {
    let archive = archive.into();
    self
      .request(
        OperationKind::SetInitialMappings,
        |done| Command::SetInitialMappings { archive, done },
        |event| match event {
          ViewEvent::MappingsChanged(snapshot) => Some(snapshot),
          _ => None,
        },
      )
      .await
  }

  /// Decompile into the loaded project; returns the output directory
  pub async fn decompile(&self, archive: impl Into<PathBuf>) -> Result<PathBuf, SessionError> {
    let archive = archive.into();
    self
      .request(
        OperationKind::Decompile,
        |done| Command::DecompileMinecraft { archive, done },
        |event| match event {
          ViewEvent::Decompiled { output } => Some(output),
          _ => None,
        },
      )
      .await
  }

  /// Export the current mappings; returns the written file
  pub async fn export_mappings(&self) -> Result<PathBuf, SessionError> {
    self
      .request(
        OperationKind::ExportMappings,
        |done| Command::ExportMappings { done },
        |event| match event {
          ViewEvent::Exported { path } => Some(path),
          _ => None,
        },
      )
      .await
  }

  /// Send a delegated command and wait for its own completion
  async fn request<T>(
    &self,
    operation: OperationKind,
    build: impl FnOnce(Option<Completion>) -> Command,
    pick: impl FnOnce(ViewEvent) -> Option<T>,
  ) -> Result<T, SessionError> {
    match self.project().request(build).await? {
      Ok(event) => pick(event).ok_or(SessionError::UnexpectedResult(operation)),
      Err(message) => Err(SessionError::OperationFailed { operation, message }),
    }
  }

  /// Stop every task and the UI thread
  pub async fn shutdown(self) {
    self.cancel.cancel();
    if let Err(e) = self.pump.await {
      warn!(error = %e, "Event pump ended abnormally");
    }
    self.ui.shutdown().await;
    info!("Session stopped");
  }
}

/// Forward project events to the UI and report failures
async fn pump_events(mut events: mpsc::Receiver<ViewEvent>, ui: UiBridge, cancel: CancellationToken) {
  loop {
    let event = tokio::select! {
      biased;
      _ = cancel.cancelled() => break,
      event = events.recv() => match event {
        Some(event) => event,
        None => break,
      },
    };

    let report = match &event {
      ViewEvent::OperationFailed { operation, message } => Some((format!("{operation} Failed"), message.clone())),
      ViewEvent::InternalError { message } => Some(("Internal Error".to_string(), message.clone())),
      _ => None,
    };

    if ui.publish(event).is_err() {
      debug!("UI closed, stopping event pump");
      break;
    }

    if let Some((title, message)) = report {
      let ui = ui.clone();
      tokio::spawn(async move {
        if let Err(e) = ui.report_error(&title, &message).await {
          debug!(error = %e, "Could not report failure");
        }
      });
    }
  }
}
