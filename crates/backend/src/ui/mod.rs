//! UI thread affinity
//!
//! Visible state lives on one thread; everything else talks to it through
//! [`UiBridge`].

mod bridge;
mod dialog;
mod state;

pub(crate) use bridge::panic_message;
pub use bridge::{UiBridge, UiContext, UiError, UiUpdate, is_ui_thread};
pub use dialog::{DialogKind, DialogOutcome, DialogSpec, Dialogs, PromptSpec};
pub use state::{SurfaceId, SurfaceView, UiState};
