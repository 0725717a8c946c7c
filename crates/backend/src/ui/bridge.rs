//! UiContext - the only place visible state changes
//!
//! A dedicated OS thread owns [`UiState`] and drains a FIFO of apply
//! callbacks. Asynchronous code never touches the state directly; it posts a
//! callback through a cloneable [`UiBridge`] and, when it needs an answer,
//! waits on a `oneshot`.
//!
//! ```text
//! ProjectActor ─> ViewEvent ─┐
//! Highlighters ──────────────┼─> [callback FIFO] ─> UI thread ─> feed
//! Surfaces ──────────────────┘
//! ```
//!
//! Callbacks run in posting order, so highlighting results and status updates
//! are applied in the order they were produced.

use std::{
  cell::Cell,
  ops::Range,
  panic::{AssertUnwindSafe, catch_unwind},
  path::PathBuf,
  sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
  },
  thread::JoinHandle,
};

use mcpide_core::UiConfig;
use tokio::sync::{Mutex, broadcast, mpsc, oneshot};
use tracing::{debug, error, info, trace, warn};

use super::{
  dialog::{DialogOutcome, DialogSpec, Dialogs, PromptSpec},
  state::{SurfaceId, SurfaceView, UiState},
};
use crate::{actor::ViewEvent, domain::highlight::Highlighting, highlight::GenerationTicket};

type UiTask = Box<dyn FnOnce(&mut UiState) + Send>;

enum UiMessage {
  Apply(UiTask),
  Stop,
}

thread_local! {
  static ON_UI_THREAD: Cell<bool> = const { Cell::new(false) };
}

/// Whether the caller runs on the UI thread
pub fn is_ui_thread() -> bool {
  ON_UI_THREAD.with(Cell::get)
}

/// Applied changes, in application order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiUpdate {
  Event(ViewEvent),
  Highlighted { surface: SurfaceId, generation: u64 },
}

#[derive(Debug, thiserror::Error)]
pub enum UiError {
  #[error("UI context has shut down")]
  Closed,
  #[error("UI callback panicked")]
  Panicked,
  #[error("Failed to start UI thread: {0}")]
  Spawn(#[from] std::io::Error),
}

// ============================================================================
// UiBridge
// ============================================================================

struct Inner {
  tx: mpsc::UnboundedSender<UiMessage>,
  feed: broadcast::Sender<UiUpdate>,
  dialogs: Arc<dyn Dialogs>,
  /// Held while a dialog is open
  modal: Mutex<()>,
  next_surface: AtomicU64,
}

/// Cloneable entry point to the UI thread
#[derive(Clone)]
pub struct UiBridge {
  inner: Arc<Inner>,
}

impl std::fmt::Debug for UiBridge {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("UiBridge").field("closed", &self.is_closed()).finish()
  }
}

impl UiBridge {
  /// Queue a callback to run on the UI thread.
  pub fn post<F>(&self, apply: F) -> Result<(), UiError>
  where
    F: FnOnce(&mut UiState) + Send + 'static,
  {
    self
      .inner
      .tx
      .send(UiMessage::Apply(Box::new(apply)))
      .map_err(|_| UiError::Closed)
  }

  /// Run a closure on the UI thread and wait for its result.
  pub async fn query<F, R>(&self, read: F) -> Result<R, UiError>
  where
    F: FnOnce(&mut UiState) -> R + Send + 'static,
    R: Send + 'static,
  {
    let (reply, rx) = oneshot::channel();
    self.post(move |state| {
      let _ = reply.send(read(state));
    })?;
    // A dropped reply means the callback panicked or the thread stopped
    rx.await.map_err(|_| if self.is_closed() { UiError::Closed } else { UiError::Panicked })
  }

  /// Apply a view event and re-emit it on the feed.
  pub fn publish(&self, event: ViewEvent) -> Result<(), UiError> {
    let feed = self.inner.feed.clone();
    self.post(move |state| {
      state.apply_event(&event);
      let _ = feed.send(UiUpdate::Event(event));
    })
  }

  /// Observe applied changes from now on
  pub fn subscribe(&self) -> broadcast::Receiver<UiUpdate> {
    self.inner.feed.subscribe()
  }

  pub fn is_closed(&self) -> bool {
    self.inner.tx.is_closed()
  }

  // --------------------------------------------------------------------------
  // Surfaces
  // --------------------------------------------------------------------------

  /// Create a surface showing `text` unhighlighted
  pub fn register_surface(&self, path: PathBuf, text: String) -> Result<SurfaceId, UiError> {
    let id = SurfaceId(self.inner.next_surface.fetch_add(1, Ordering::Relaxed) + 1);
    self.post(move |state| state.insert_surface(id, SurfaceView::new(path, text)))?;
    Ok(id)
  }

  pub fn close_surface(&self, surface: SurfaceId) -> Result<(), UiError> {
    self.post(move |state| {
      state.remove_surface(surface);
    })
  }

  /// Replace a surface's text and spans if `ticket` is still the latest
  /// submission for it. Stale results are dropped here, on the UI thread.
  pub fn apply_highlighting(
    &self,
    surface: SurfaceId,
    ticket: GenerationTicket,
    result: Highlighting,
  ) -> Result<(), UiError> {
    let feed = self.inner.feed.clone();
    self.post(move |state| {
      let generation = ticket.generation();
      if !ticket.is_current() {
        trace!(%surface, generation, "Dropping stale highlighting");
        return;
      }
      let Some(view) = state.surface_mut(surface) else {
        debug!(%surface, "Highlighting for closed surface");
        return;
      };
      if generation <= view.applied_generation {
        return;
      }

      view.caret = view.caret.min(result.text.chars().count());
      view.text = result.text;
      view.spans = result.spans;
      view.selection = None;
      view.applied_generation = generation;
      view.applied_count += 1;
      trace!(%surface, generation, spans = view.spans.len(), "Applied highlighting");

      let _ = feed.send(UiUpdate::Highlighted { surface, generation });
    })
  }

  pub fn set_caret(&self, surface: SurfaceId, caret: usize) -> Result<(), UiError> {
    self.post(move |state| {
      if let Some(view) = state.surface_mut(surface) {
        view.caret = caret;
      }
    })
  }

  pub fn set_selection(&self, surface: SurfaceId, selection: Option<Range<usize>>) -> Result<(), UiError> {
    self.post(move |state| {
      if let Some(view) = state.surface_mut(surface) {
        view.selection = selection;
      }
    })
  }

  /// Copy of a surface's current view
  pub async fn surface(&self, surface: SurfaceId) -> Result<Option<SurfaceView>, UiError> {
    self.query(move |state| state.surface(surface).cloned()).await
  }

  // --------------------------------------------------------------------------
  // Dialogs
  // --------------------------------------------------------------------------

  /// Show a dialog and wait until the user answers
  pub async fn show(&self, spec: DialogSpec) -> Result<DialogOutcome, UiError> {
    let _modal = self.inner.modal.lock().await;
    if self.is_closed() {
      return Err(UiError::Closed);
    }
    Ok(self.inner.dialogs.show(spec).await)
  }

  /// Ask for confirmation; only [`DialogOutcome::Confirmed`] means yes
  pub async fn confirm(&self, title: &str, message: &str) -> Result<DialogOutcome, UiError> {
    self.show(DialogSpec::confirmation(title, message)).await
  }

  pub async fn prompt(&self, spec: PromptSpec) -> Result<Option<String>, UiError> {
    let _modal = self.inner.modal.lock().await;
    if self.is_closed() {
      return Err(UiError::Closed);
    }
    Ok(self.inner.dialogs.prompt(spec).await)
  }

  /// Record a non-fatal error and show it; returns once it was dismissed
  pub async fn report_error(&self, title: &str, message: &str) -> Result<(), UiError> {
    let spec = DialogSpec::error(title, message);
    self.post({
      let spec = spec.clone();
      move |state| state.push_notification(spec)
    })?;
    self.show(spec).await.map(|_| ())
  }
}

// ============================================================================
// UiContext
// ============================================================================

/// Owns the UI thread
pub struct UiContext {
  bridge: UiBridge,
  thread: Option<JoinHandle<()>>,
}

impl UiContext {
  /// Start the UI thread
  pub fn spawn(dialogs: Arc<dyn Dialogs>, config: &UiConfig) -> Result<Self, UiError> {
    let (tx, rx) = mpsc::unbounded_channel();
    let (feed, _) = broadcast::channel(config.feed_capacity.max(1));

    let thread = std::thread::Builder::new()
      .name("mcpide-ui".to_string())
      .spawn(move || run(rx))?;

    let bridge = UiBridge {
      inner: Arc::new(Inner {
        tx,
        feed,
        dialogs,
        modal: Mutex::new(()),
        next_surface: AtomicU64::new(0),
      }),
    };

    Ok(Self {
      bridge,
      thread: Some(thread),
    })
  }

  pub fn bridge(&self) -> UiBridge {
    self.bridge.clone()
  }

  /// Stop after the callbacks already queued and wait for the thread
  pub async fn shutdown(mut self) {
    let _ = self.bridge.inner.tx.send(UiMessage::Stop);
    if let Some(thread) = self.thread.take() {
      match tokio::task::spawn_blocking(move || thread.join()).await {
        Ok(Ok(())) => {}
        Ok(Err(_)) => error!("UI thread panicked"),
        Err(e) => warn!(error = %e, "Failed to join UI thread"),
      }
    }
  }
}

impl Drop for UiContext {
  fn drop(&mut self) {
    if self.thread.is_some() {
      let _ = self.bridge.inner.tx.send(UiMessage::Stop);
    }
  }
}

/// UI thread main loop
fn run(mut rx: mpsc::UnboundedReceiver<UiMessage>) {
  ON_UI_THREAD.with(|flag| flag.set(true));
  info!("UI thread started");

  let mut state = UiState::default();
  while let Some(message) = rx.blocking_recv() {
    match message {
      UiMessage::Apply(task) => {
        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| task(&mut state))) {
          error!(panic = panic_message(&*panic), "UI callback panicked");
        }
      }
      UiMessage::Stop => break,
    }
  }

  // Dropping the receiver closes every bridge
  info!("UI thread stopped");
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
  panic
    .downcast_ref::<&str>()
    .copied()
    .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
    .unwrap_or("unknown panic")
}
