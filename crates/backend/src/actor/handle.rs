//! Actor handles for communicating with the project actor
//!
//! Handles are cheap to clone and provide a way to send commands to the
//! actor. They encapsulate the channel sender and provide convenient methods
//! for the request/response pattern.

use std::path::PathBuf;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use super::message::{Command, Completion, StatusUpdate, ViewEvent, ViewSender};
use crate::domain::mapping::MappingSnapshot;

// ============================================================================
// Project Handle
// ============================================================================

/// Handle to communicate with a ProjectActor
///
/// The queue is bounded: sending waits while it is full.
#[derive(Clone, Debug)]
pub struct ProjectHandle {
  tx: mpsc::Sender<Command>,
}

impl ProjectHandle {
  /// Create a new handle from a sender
  pub fn new(tx: mpsc::Sender<Command>) -> Self {
    Self { tx }
  }

  /// Enqueue a command
  pub async fn send(&self, command: Command) -> Result<(), SendError> {
    self.tx.send(command).await.map_err(|_| SendError::ActorGone)
  }

  /// Fetch the current mapping snapshot
  ///
  /// The snapshot reflects every command enqueued before this request.
  pub async fn retrieve_mappings(&self) -> Result<MappingSnapshot, SendError> {
    let (reply, rx) = oneshot::channel();
    self.send(Command::RetrieveMappings { reply }).await?;
    rx.await.map_err(|_| SendError::ActorGone)
  }

  /// Like [`retrieve_mappings`](Self::retrieve_mappings) but gives up when
  /// `cancel` fires. The reply slot is dropped, so a late snapshot goes nowhere.
  pub async fn retrieve_mappings_until(&self, cancel: &CancellationToken) -> Result<MappingSnapshot, SendError> {
    tokio::select! {
      biased;
      _ = cancel.cancelled() => Err(SendError::Cancelled),
      result = self.retrieve_mappings() => result,
    }
  }

  /// Send a delegated operation and wait for its own result.
  ///
  /// `build` receives the completion slot to embed in the command. The outer
  /// error is a transport failure; the inner one is the operation's failure
  /// message. Dropping the returned future drops the slot, so the result of
  /// an abandoned request is never delivered anywhere.
  pub async fn request(
    &self,
    build: impl FnOnce(Option<Completion>) -> Command,
  ) -> Result<Result<ViewEvent, String>, SendError> {
    let (done, rx) = oneshot::channel();
    self.send(build(Some(done))).await?;
    rx.await.map_err(|_| SendError::ActorGone)
  }

  pub async fn load_project(&self, directory: impl Into<PathBuf>) -> Result<(), SendError> {
    self
      .send(Command::LoadProject {
        directory: directory.into(),
        done: None,
      })
      .await
  }

  pub async fn open_file(&self, file: impl Into<PathBuf>) -> Result<(), SendError> {
    self
      .send(Command::OpenFile {
        file: file.into(),
        done: None,
      })
      .await
  }

  pub async fn export_mappings(&self) -> Result<(), SendError> {
    self.send(Command::ExportMappings { done: None }).await
  }

  pub async fn decompile_minecraft(&self, archive: impl Into<PathBuf>) -> Result<(), SendError> {
    self
      .send(Command::DecompileMinecraft {
        archive: archive.into(),
        done: None,
      })
      .await
  }

  pub async fn set_initial_mappings(&self, archive: impl Into<PathBuf>) -> Result<(), SendError> {
    self
      .send(Command::SetInitialMappings {
        archive: archive.into(),
        done: None,
      })
      .await
  }

  pub async fn rename(
    &self,
    file: impl Into<PathBuf>,
    old: impl Into<String>,
    new: impl Into<String>,
  ) -> Result<(), SendError> {
    self
      .send(Command::Rename {
        file: file.into(),
        old: old.into(),
        new: new.into(),
      })
      .await
  }

  /// Whether the actor has stopped receiving
  pub fn is_closed(&self) -> bool {
    self.tx.is_closed()
  }
}

// ============================================================================
// Comms
// ============================================================================

/// Everything a component needs to talk to the model and the view
#[derive(Clone, Debug)]
pub struct Comms {
  pub project: ProjectHandle,
  pub view: ViewSender,
}

impl Comms {
  pub fn new(project: ProjectHandle, view: ViewSender) -> Self {
    Self { project, view }
  }

  /// Publish a status update; a closed view channel is ignored
  pub async fn status(&self, category: &str, message: &str) {
    let _ = self
      .view
      .send(ViewEvent::Status(StatusUpdate::new(category, message)))
      .await;
  }
}

// ============================================================================
// Errors
// ============================================================================

/// Error when talking to an actor
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
  #[error("Actor has shut down")]
  ActorGone,
  #[error("Request was cancelled")]
  Cancelled,
}
