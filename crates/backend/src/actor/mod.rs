//! Actor-based project model
//!
//! Instead of shared-state concurrency with `Arc<Mutex<...>>`, every producer
//! (editor surfaces, highlighters, menu actions) talks to the project through
//! a single command queue.
//!
//! # Architecture
//!
//! - [`ProjectActor`] owns the project directory and the mapping snapshot
//! - Producers hold a cloneable [`ProjectHandle`]
//! - Queries carry a `oneshot` reply slot, filled exactly once
//! - Slow work (reading, decompiling, exporting) goes through [`ProjectTooling`]
//!
//! ```text
//! EditorSurface ─┐
//! Highlighter ───┼──> Command Queue ──> ProjectActor ──> ViewEvent ──> UI
//! Menu actions ──┘        256
//! ```

mod handle;
mod message;
mod project;
mod tooling;

#[cfg(test)]
mod __tests__;

pub use handle::{Comms, ProjectHandle, SendError};
pub use message::{Command, Completion, OperationKind, StatusUpdate, ViewEvent, ViewSender};
pub use project::ProjectActor;
pub use tooling::{LoadedProject, LocalTooling, ProjectTooling, ToolingError};
