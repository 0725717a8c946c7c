//! ProjectActor - Single writer for all project state
//!
//! This actor owns the project directory, the decompiled tree and the current
//! mapping snapshot. Every mutation and every read of that state happens on
//! its task, in queue order.
//!
//! # Lifecycle
//!
//! The actor runs until one of:
//! - The CancellationToken is triggered (in-flight operations are aborted)
//! - The command channel is closed and all in-flight operations finished
//!
//! # Message Flow
//!
//! ```text
//! Producers -> Command Queue -> ProjectActor -> [ProjectTooling tasks]
//!                                    |                  |
//!                                    |<--- completion --+
//!                                    v
//!                         RetrieveMappings reply slots
//!                         View events (status, results, failures)
//! ```
//!
//! # Operation Serialization
//!
//! Tooling work runs on background tasks, but its effects are applied here:
//! - Barrier operations (LoadProject, SetInitialMappings) pause intake until
//!   they complete, so later commands observe their result.
//! - Lane operations (DecompileMinecraft, ExportMappings) run one at a time
//!   per kind. A second request parks and pauses intake until the first ends.
//! - A barrier also parks while any lane operation runs, so a lane result
//!   never lands on a project loaded after it started.
//! - OpenFile runs freely.
//!
//! A command's [`Completion`] slot, when present, receives the same result
//! event that is published, or the failure message.

use std::{
  collections::HashMap,
  future::Future,
  path::{Path, PathBuf},
  sync::Arc,
};

use mcpide_core::ActorConfig;
use mcpide_parser::is_valid_identifier;
use tokio::{
  sync::mpsc,
  task::{Id as TaskId, JoinError, JoinSet},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::{
  handle::ProjectHandle,
  message::{Command, Completion, OperationKind, StatusUpdate, ViewEvent, ViewSender},
  tooling::{LoadedProject, ProjectTooling, ToolingError},
};
use crate::domain::mapping::MappingSnapshot;

/// Status message while an operation runs
const IN_PROGRESS: &str = "In Progress...";

// ============================================================================
// State
// ============================================================================

/// Project state owned by the actor
#[derive(Debug, Default)]
struct ProjectState {
  directory: Option<PathBuf>,
  decompiled: Option<PathBuf>,
  mappings: MappingSnapshot,
}

/// What a finished tooling task hands back
#[derive(Debug)]
enum Outcome {
  ProjectLoaded(LoadedProject),
  FileOpened { path: PathBuf, text: String },
  Decompiled(PathBuf),
  MappingsLoaded(MappingSnapshot),
  Exported(PathBuf),
}

type OperationResult = Result<Outcome, ToolingError>;

/// A spawned operation and whoever waits on it
struct Running {
  kind: OperationKind,
  done: Option<Completion>,
}

// ============================================================================
// ProjectActor
// ============================================================================

/// The project actor - owns all project state
///
/// # Ownership Model
///
/// - `state` is only touched inside `run`
/// - `tooling` is shared (via `Arc`) with the operation tasks
/// - published snapshots are immutable, so replies hand out clones of the `Arc`
pub struct ProjectActor {
  tooling: Arc<dyn ProjectTooling>,
  state: ProjectState,
  commands: mpsc::Receiver<Command>,
  events: ViewSender,
  operations: JoinSet<OperationResult>,
  running: HashMap<TaskId, Running>,
  /// Barrier operation currently holding intake
  barrier: Option<OperationKind>,
  /// Command waiting for running lanes to free up
  parked: Option<Command>,
  cancel: CancellationToken,
}

impl ProjectActor {
  /// Spawn a new ProjectActor and return a handle for communication
  ///
  /// # Arguments
  ///
  /// * `config` - Queue settings
  /// * `tooling` - Collaborator for long-running operations
  /// * `events` - Channel for status, results and failures
  /// * `cancel` - Cancellation token for coordinated shutdown
  pub fn spawn(
    config: &ActorConfig,
    tooling: Arc<dyn ProjectTooling>,
    events: ViewSender,
    cancel: CancellationToken,
  ) -> ProjectHandle {
    let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));

    let actor = Self {
      tooling,
      state: ProjectState::default(),
      commands: rx,
      events,
      operations: JoinSet::new(),
      running: HashMap::new(),
      barrier: None,
      parked: None,
      cancel,
    };

    tokio::spawn(actor.run());

    ProjectHandle::new(tx)
  }

  /// Main actor event loop
  async fn run(mut self) {
    info!("ProjectActor started");
    let mut intake_open = true;

    loop {
      if !intake_open && self.operations.is_empty() && self.parked.is_none() {
        info!("ProjectActor shutting down (channel closed)");
        break;
      }
      let accepting = intake_open && self.barrier.is_none() && self.parked.is_none();

      tokio::select! {
        // Check cancellation first (biased)
        biased;

        _ = self.cancel.cancelled() => {
          info!("ProjectActor shutting down (cancelled)");
          break;
        }

        Some(joined) = self.operations.join_next_with_id(), if !self.operations.is_empty() => {
          self.finish_operation(joined).await;
        }

        command = self.commands.recv(), if accepting => {
          match command {
            Some(command) => self.handle_command(command).await,
            None => intake_open = false,
          }
        }
      }
    }

    if !self.operations.is_empty() {
      debug!(count = self.operations.len(), "Aborting in-flight operations");
      self.operations.shutdown().await;
    }

    info!("ProjectActor stopped");
  }

  /// Handle an incoming command
  async fn handle_command(&mut self, command: Command) {
    trace!(command = command.name(), "Handling command");

    if let Some(kind) = command.operation()
      && self.must_wait(kind)
    {
      debug!(command = command.name(), "Waiting for a running lane, parking command");
      self.parked = Some(command);
      return;
    }

    match command {
      Command::LoadProject { directory, done } => {
        self
          .start(OperationKind::LoadProject, done, move |tooling| async move {
            tooling.load_project(&directory).await.map(Outcome::ProjectLoaded)
          })
          .await;
      }
      Command::OpenFile { file, done } => {
        let Some(path) = self.resolve(&file) else {
          self.fail(OperationKind::OpenFile, "No project loaded", done).await;
          return;
        };
        self
          .start(OperationKind::OpenFile, done, move |tooling| async move {
            let text = tooling.read_source(&path).await?;
            Ok(Outcome::FileOpened { path, text })
          })
          .await;
      }
      Command::ExportMappings { done } => {
        let Some(project) = self.state.directory.clone() else {
          self.fail(OperationKind::ExportMappings, "No project loaded", done).await;
          return;
        };
        let snapshot = self.state.mappings.clone();
        self
          .start(OperationKind::ExportMappings, done, move |tooling| async move {
            tooling
              .export_mappings(&project, &snapshot)
              .await
              .map(Outcome::Exported)
          })
          .await;
      }
      Command::DecompileMinecraft { archive, done } => {
        let Some(project) = self.state.directory.clone() else {
          self.fail(OperationKind::Decompile, "No project loaded", done).await;
          return;
        };
        self
          .start(OperationKind::Decompile, done, move |tooling| async move {
            tooling.decompile(&archive, &project).await.map(Outcome::Decompiled)
          })
          .await;
      }
      Command::SetInitialMappings { archive, done } => {
        self
          .start(OperationKind::SetInitialMappings, done, move |tooling| async move {
            tooling.load_mappings(&archive).await.map(Outcome::MappingsLoaded)
          })
          .await;
      }
      Command::Rename { file, old, new } => {
        self.rename(&file, &old, &new).await;
      }
      Command::RetrieveMappings { reply } => {
        if reply.send(self.state.mappings.clone()).is_err() {
          trace!("RetrieveMappings waiter went away");
        }
      }
    }
  }

  /// Apply a rename to the current snapshot
  async fn rename(&mut self, file: &Path, old: &str, new: &str) {
    // Callers validate before sending; anything else is a bug upstream
    if old.is_empty() || !is_valid_identifier(new) {
      error!(file = %file.display(), old, new, "Rejected malformed rename");
      self
        .publish(ViewEvent::InternalError {
          message: format!("Invalid rename of '{old}' to '{new}'"),
        })
        .await;
      return;
    }

    self.state.mappings = self.state.mappings.with_rename(old, new);
    info!(file = %file.display(), old, new, mappings = self.state.mappings.len(), "Renamed");

    self
      .publish(ViewEvent::MappingsChanged(self.state.mappings.clone()))
      .await;
    self
      .publish(ViewEvent::Status(StatusUpdate::new("Rename", format!("{old} -> {new}"))))
      .await;
  }

  /// Spawn a tooling operation
  async fn start<F, Fut>(&mut self, kind: OperationKind, done: Option<Completion>, operation: F)
  where
    F: FnOnce(Arc<dyn ProjectTooling>) -> Fut,
    Fut: Future<Output = OperationResult> + Send + 'static,
  {
    let handle = self.operations.spawn(operation(Arc::clone(&self.tooling)));
    self.running.insert(handle.id(), Running { kind, done });
    if kind.is_barrier() {
      self.barrier = Some(kind);
    }
    debug!(operation = %kind, barrier = kind.is_barrier(), "Operation started");

    self
      .publish(ViewEvent::Status(StatusUpdate::new(kind.label(), IN_PROGRESS)))
      .await;
  }

  /// Apply the result of a finished operation
  async fn finish_operation(&mut self, joined: Result<(TaskId, OperationResult), JoinError>) {
    let (id, result) = match joined {
      Ok((id, result)) => (id, result.map_err(|e| e.to_string())),
      Err(e) => {
        let message = if e.is_panic() {
          "Operation panicked".to_string()
        } else {
          "Operation was aborted".to_string()
        };
        (e.id(), Err(message))
      }
    };

    let Some(Running { kind, done }) = self.running.remove(&id) else {
      warn!(task = %id, "Completion for unknown operation");
      return;
    };
    if self.barrier == Some(kind) {
      self.barrier = None;
    }

    match result {
      Ok(outcome) => {
        let event = self.apply(outcome).await;
        complete(done, Ok(event));
      }
      Err(message) => self.fail(kind, &message, done).await,
    }

    self
      .publish(ViewEvent::Status(StatusUpdate::new(kind.label(), "")))
      .await;

    let ready = self
      .parked
      .as_ref()
      .and_then(Command::operation)
      .is_some_and(|kind| !self.must_wait(kind));
    if ready && let Some(command) = self.parked.take() {
      self.handle_command(command).await;
    }
  }

  /// Apply an outcome and return the event that reports it
  async fn apply(&mut self, outcome: Outcome) -> ViewEvent {
    match outcome {
      Outcome::ProjectLoaded(loaded) => {
        info!(directory = %loaded.directory.display(), "Project loaded");
        self.state.directory = Some(loaded.directory.clone());
        self.state.decompiled = loaded.decompiled.clone();
        let event = ViewEvent::ProjectLoaded {
          directory: loaded.directory,
          decompiled: loaded.decompiled,
        };
        self.publish(event.clone()).await;
        if let Some(mappings) = loaded.mappings {
          self.replace_mappings(mappings).await;
        }
        event
      }
      Outcome::FileOpened { path, text } => {
        debug!(path = %path.display(), bytes = text.len(), "File opened");
        self.publish_result(ViewEvent::FileOpened { path, text }).await
      }
      Outcome::Decompiled(output) => {
        info!(output = %output.display(), "Decompiled");
        self.state.decompiled = Some(output.clone());
        self.publish_result(ViewEvent::Decompiled { output }).await
      }
      Outcome::MappingsLoaded(mappings) => self.replace_mappings(mappings).await,
      Outcome::Exported(path) => {
        info!(path = %path.display(), "Mappings exported");
        self.publish_result(ViewEvent::Exported { path }).await
      }
    }
  }

  async fn replace_mappings(&mut self, mappings: MappingSnapshot) -> ViewEvent {
    info!(count = mappings.len(), "Mappings replaced");
    self.state.mappings = mappings;
    self
      .publish_result(ViewEvent::MappingsChanged(self.state.mappings.clone()))
      .await
  }

  async fn fail(&self, operation: OperationKind, message: &str, done: Option<Completion>) {
    warn!(operation = %operation, error = message, "Operation failed");
    self
      .publish(ViewEvent::OperationFailed {
        operation,
        message: message.to_string(),
      })
      .await;
    complete(done, Err(message.to_string()));
  }

  async fn publish_result(&self, event: ViewEvent) -> ViewEvent {
    self.publish(event.clone()).await;
    event
  }

  async fn publish(&self, event: ViewEvent) {
    if self.events.send(event).await.is_err() {
      debug!("View channel closed, dropping event");
    }
  }

  fn is_running(&self, kind: OperationKind) -> bool {
    self.running.values().any(|r| r.kind == kind)
  }

  /// Whether an operation of `kind` has to wait for running work
  fn must_wait(&self, kind: OperationKind) -> bool {
    if kind.is_lane() {
      self.is_running(kind)
    } else if kind.is_barrier() {
      self.running.values().any(|r| r.kind.is_lane())
    } else {
      false
    }
  }

  /// Resolve a file against the project; absolute paths pass through
  fn resolve(&self, file: &Path) -> Option<PathBuf> {
    if file.is_absolute() {
      return Some(file.to_path_buf());
    }
    self.state.directory.as_ref().map(|dir| dir.join(file))
  }
}

/// Fill a completion slot; a waiter that went away is ignored
fn complete(done: Option<Completion>, result: Result<ViewEvent, String>) {
  if let Some(done) = done
    && done.send(result).is_err()
  {
    trace!("Completion waiter went away");
  }
}
