//! Actor message types
//!
//! [`Command`] is everything a producer can ask of the project actor.
//! [`ViewEvent`] is everything the actor (and the highlighters) tell the UI.
//!
//! Commands are fire-and-forget except [`Command::RetrieveMappings`], which
//! carries a one-shot reply slot the actor fills exactly once. Delegated
//! operations may carry an optional [`Completion`] slot that receives their
//! own result, so a waiter never picks up another request's event.

use std::path::PathBuf;

use tokio::sync::{mpsc, oneshot};

use crate::domain::mapping::MappingSnapshot;

// ============================================================================
// Commands
// ============================================================================

/// Reply slot for one delegated operation: its result event or its failure message
pub type Completion = oneshot::Sender<Result<ViewEvent, String>>;

/// A request to the project actor
#[derive(Debug)]
pub enum Command {
  /// Open a project directory, picking up exported mappings and decompiled sources
  LoadProject {
    directory: PathBuf,
    done: Option<Completion>,
  },
  /// Read a source file (relative paths resolve against the project)
  OpenFile { file: PathBuf, done: Option<Completion> },
  /// Write the current mappings into the project
  ExportMappings { done: Option<Completion> },
  /// Decompile a game archive into the project
  DecompileMinecraft {
    archive: PathBuf,
    done: Option<Completion>,
  },
  /// Replace all mappings with the contents of an archive
  SetInitialMappings {
    archive: PathBuf,
    done: Option<Completion>,
  },
  /// Map `old` to `new`
  Rename { file: PathBuf, old: String, new: String },
  /// Reply with the current snapshot
  RetrieveMappings { reply: oneshot::Sender<MappingSnapshot> },
}

impl Command {
  /// Short name for logs
  pub fn name(&self) -> &'static str {
    match self {
      Command::LoadProject { .. } => "LoadProject",
      Command::OpenFile { .. } => "OpenFile",
      Command::ExportMappings { .. } => "ExportMappings",
      Command::DecompileMinecraft { .. } => "DecompileMinecraft",
      Command::SetInitialMappings { .. } => "SetInitialMappings",
      Command::Rename { .. } => "Rename",
      Command::RetrieveMappings { .. } => "RetrieveMappings",
    }
  }

  /// The delegated operation this command starts, if any
  pub(crate) fn operation(&self) -> Option<OperationKind> {
    match self {
      Command::LoadProject { .. } => Some(OperationKind::LoadProject),
      Command::OpenFile { .. } => Some(OperationKind::OpenFile),
      Command::ExportMappings { .. } => Some(OperationKind::ExportMappings),
      Command::DecompileMinecraft { .. } => Some(OperationKind::Decompile),
      Command::SetInitialMappings { .. } => Some(OperationKind::SetInitialMappings),
      Command::Rename { .. } | Command::RetrieveMappings { .. } => None,
    }
  }
}

// ============================================================================
// Operations
// ============================================================================

/// Long-running work the actor delegates to tooling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
  LoadProject,
  OpenFile,
  Decompile,
  SetInitialMappings,
  ExportMappings,
}

impl OperationKind {
  /// Barrier operations replace state later commands read, so the actor
  /// takes no further commands until they finish.
  pub fn is_barrier(self) -> bool {
    matches!(self, OperationKind::LoadProject | OperationKind::SetInitialMappings)
  }

  /// Lane operations run at most one per kind
  pub fn is_lane(self) -> bool {
    matches!(self, OperationKind::Decompile | OperationKind::ExportMappings)
  }

  /// Status category shown while the operation runs
  pub fn label(self) -> &'static str {
    match self {
      OperationKind::LoadProject => "Load Project",
      OperationKind::OpenFile => "Open File",
      OperationKind::Decompile => "Decompile",
      OperationKind::SetInitialMappings => "Mappings",
      OperationKind::ExportMappings => "Export",
    }
  }
}

impl std::fmt::Display for OperationKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.label())
  }
}

// ============================================================================
// View Events
// ============================================================================

/// Transient status line update; an empty message clears the category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
  pub category: String,
  pub message: String,
}

impl StatusUpdate {
  pub fn new(category: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      category: category.into(),
      message: message.into(),
    }
  }

  pub fn is_clear(&self) -> bool {
    self.message.is_empty()
  }
}

/// Events published towards the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
  Status(StatusUpdate),
  ProjectLoaded {
    directory: PathBuf,
    decompiled: Option<PathBuf>,
  },
  FileOpened {
    path: PathBuf,
    text: String,
  },
  Decompiled {
    output: PathBuf,
  },
  Exported {
    path: PathBuf,
  },
  MappingsChanged(MappingSnapshot),
  /// A delegated operation failed; the actor keeps running
  OperationFailed {
    operation: OperationKind,
    message: String,
  },
  /// An invariant was violated; the offending request was dropped
  InternalError {
    message: String,
  },
}

/// Sending side of the view event channel
pub type ViewSender = mpsc::Sender<ViewEvent>;
