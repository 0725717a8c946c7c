//! Visible state owned by the UI thread

use std::{
  collections::{BTreeMap, HashMap},
  fmt,
  ops::Range,
  path::{Path, PathBuf},
};

use super::dialog::DialogSpec;
use crate::{
  actor::ViewEvent,
  domain::{highlight::StyleSpan, mapping::MappingSnapshot},
};

/// Identifies one editor surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub(crate) u64);

impl fmt::Display for SurfaceId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "surface-{}", self.0)
  }
}

/// What one editor surface currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceView {
  pub path: PathBuf,
  /// Displayed text; the rewritten source once highlighted
  pub text: String,
  pub spans: Vec<StyleSpan>,
  /// Caret as a character index into `text`
  pub caret: usize,
  /// Selected byte range of `text`
  pub selection: Option<Range<usize>>,
  /// Generation of the last applied highlighting (0 = never)
  pub applied_generation: u64,
  /// Number of highlighting results applied so far
  pub applied_count: u64,
}

impl SurfaceView {
  pub(crate) fn new(path: PathBuf, text: String) -> Self {
    Self {
      path,
      text,
      spans: Vec::new(),
      caret: 0,
      selection: None,
      applied_generation: 0,
      applied_count: 0,
    }
  }

  /// Spans intersecting `range`
  pub fn spans_in(&self, range: Range<usize>) -> impl Iterator<Item = &StyleSpan> {
    self
      .spans
      .iter()
      .filter(move |span| span.range.start < range.end && range.start < span.range.end)
  }

  pub fn selected_text(&self) -> Option<&str> {
    self.selection.clone().and_then(|range| self.text.get(range))
  }
}

/// Everything the UI shows
#[derive(Debug, Default)]
pub struct UiState {
  surfaces: HashMap<SurfaceId, SurfaceView>,
  status: BTreeMap<String, String>,
  notifications: Vec<DialogSpec>,
  project: Option<PathBuf>,
  mappings: MappingSnapshot,
}

impl UiState {
  pub fn surface(&self, id: SurfaceId) -> Option<&SurfaceView> {
    self.surfaces.get(&id)
  }

  pub fn surface_mut(&mut self, id: SurfaceId) -> Option<&mut SurfaceView> {
    self.surfaces.get_mut(&id)
  }

  pub(crate) fn insert_surface(&mut self, id: SurfaceId, view: SurfaceView) {
    self.surfaces.insert(id, view);
  }

  pub(crate) fn remove_surface(&mut self, id: SurfaceId) -> Option<SurfaceView> {
    self.surfaces.remove(&id)
  }

  /// Current message for a status category
  pub fn status(&self, category: &str) -> Option<&str> {
    self.status.get(category).map(String::as_str)
  }

  /// All active status entries, sorted by category
  pub fn statuses(&self) -> impl Iterator<Item = (&str, &str)> {
    self.status.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  /// Error reports shown so far
  pub fn notifications(&self) -> &[DialogSpec] {
    &self.notifications
  }

  pub(crate) fn push_notification(&mut self, spec: DialogSpec) {
    self.notifications.push(spec);
  }

  pub fn project(&self) -> Option<&Path> {
    self.project.as_deref()
  }

  /// Latest snapshot announced by the project
  pub fn mappings(&self) -> &MappingSnapshot {
    &self.mappings
  }

  pub(crate) fn apply_event(&mut self, event: &ViewEvent) {
    match event {
      ViewEvent::Status(update) => {
        if update.is_clear() {
          self.status.remove(&update.category);
        } else {
          self.status.insert(update.category.clone(), update.message.clone());
        }
      }
      ViewEvent::ProjectLoaded { directory, .. } => {
        self.project = Some(directory.clone());
      }
      ViewEvent::MappingsChanged(snapshot) => {
        self.mappings = snapshot.clone();
      }
      ViewEvent::FileOpened { .. }
      | ViewEvent::Decompiled { .. }
      | ViewEvent::Exported { .. }
      | ViewEvent::OperationFailed { .. }
      | ViewEvent::InternalError { .. } => {}
    }
  }
}
