mod actor;
mod domain;
mod highlight;
mod session;
mod surface;
mod ui;

#[cfg(test)]
mod testing;

pub use actor::{
  Command, Comms, Completion, LoadedProject, LocalTooling, OperationKind, ProjectActor, ProjectHandle, ProjectTooling,
  SendError, StatusUpdate, ToolingError, ViewEvent, ViewSender,
};
pub use domain::{
  highlight::{Highlighting, Style, StyleClass, StyleSpan},
  mapping::{MappingParseError, MappingSnapshot, SrgMapping},
  selection::{select_identifier, select_word},
};
pub use highlight::{EditGeneration, GenerationTicket, HIGHLIGHTING, HighlightError, HighlightHandle, HighlightPipeline};
pub use session::{Session, SessionError};
pub use surface::{EditorSurface, RenameError, RenameOutcome};
pub use ui::{
  DialogKind, DialogOutcome, DialogSpec, Dialogs, PromptSpec, SurfaceId, SurfaceView, UiBridge, UiContext, UiError,
  UiState, UiUpdate, is_ui_thread,
};

pub mod dirs;
