//! Modal dialog contract
//!
//! Frontends implement [`Dialogs`]. Every call suspends the caller until the
//! user answers; the bridge makes sure only one dialog is open at a time.

use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogKind {
  /// Yes/no question
  Confirmation,
  /// Non-fatal error report
  Error,
}

/// How the user left a dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogOutcome {
  Confirmed,
  Cancelled,
  /// Closed without choosing (escape, window close)
  Dismissed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogSpec {
  pub kind: DialogKind,
  pub title: String,
  pub message: String,
}

impl DialogSpec {
  pub fn confirmation(title: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      kind: DialogKind::Confirmation,
      title: title.into(),
      message: message.into(),
    }
  }

  pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      kind: DialogKind::Error,
      title: title.into(),
      message: message.into(),
    }
  }
}

/// A single-line text prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSpec {
  pub title: String,
  pub message: String,
  /// Pre-filled value
  pub initial: String,
}

impl PromptSpec {
  pub fn new(title: impl Into<String>, message: impl Into<String>, initial: impl Into<String>) -> Self {
    Self {
      title: title.into(),
      message: message.into(),
      initial: initial.into(),
    }
  }
}

/// Presentation-layer dialogs
#[async_trait]
pub trait Dialogs: Send + Sync + 'static {
  async fn show(&self, spec: DialogSpec) -> DialogOutcome;

  /// `None` when the prompt was dismissed
  async fn prompt(&self, spec: PromptSpec) -> Option<String>;
}
