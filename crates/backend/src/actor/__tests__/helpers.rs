//! Test helpers for actor integration tests.
//!
//! Provides `ActorTestContext`, which spawns a ProjectActor against
//! `FakeTooling` and exposes the view event stream. Tooling calls can be held
//! at a gate so tests control exactly when an operation completes.

use std::{
  collections::HashMap,
  path::{Path, PathBuf},
  sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use async_trait::async_trait;
use mcpide_core::ActorConfig;
use tempfile::TempDir;
use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;

use crate::{
  actor::{
    handle::ProjectHandle,
    message::{OperationKind, ViewEvent},
    project::ProjectActor,
    tooling::{LoadedProject, ProjectTooling, ToolingError},
  },
  domain::mapping::MappingSnapshot,
};

/// How long a test waits for an expected event
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// FakeTooling
// ============================================================================

/// In-memory tooling with per-operation gates
#[derive(Default)]
pub struct FakeTooling {
  gates: Mutex<HashMap<OperationKind, Arc<Semaphore>>>,
  archives: Mutex<HashMap<PathBuf, MappingSnapshot>>,
  sources: Mutex<HashMap<PathBuf, String>>,
  exported: Mutex<Vec<MappingSnapshot>>,
  active: AtomicUsize,
  max_active: AtomicUsize,
}

impl FakeTooling {
  /// Operations of `kind` block until [`release`](Self::release)
  pub fn hold(&self, kind: OperationKind) {
    self.gates.lock().unwrap().insert(kind, Arc::new(Semaphore::new(0)));
  }

  pub fn release(&self, kind: OperationKind) {
    if let Some(gate) = self.gates.lock().unwrap().remove(&kind) {
      gate.close();
    }
  }

  pub fn add_archive(&self, path: impl Into<PathBuf>, snapshot: MappingSnapshot) {
    self.archives.lock().unwrap().insert(path.into(), snapshot);
  }

  pub fn add_source(&self, path: impl Into<PathBuf>, text: &str) {
    self.sources.lock().unwrap().insert(path.into(), text.to_string());
  }

  pub fn exported(&self) -> Vec<MappingSnapshot> {
    self.exported.lock().unwrap().clone()
  }

  /// Highest number of gated operations that were in flight at once
  pub fn max_active(&self) -> usize {
    self.max_active.load(Ordering::SeqCst)
  }

  async fn pass(&self, kind: OperationKind) {
    let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
    self.max_active.fetch_max(active, Ordering::SeqCst);

    let gate = self.gates.lock().unwrap().get(&kind).cloned();
    if let Some(gate) = gate {
      // Closed on release
      let _ = gate.acquire().await;
    }

    self.active.fetch_sub(1, Ordering::SeqCst);
  }
}

#[async_trait]
impl ProjectTooling for FakeTooling {
  async fn load_project(&self, directory: &Path) -> Result<LoadedProject, ToolingError> {
    self.pass(OperationKind::LoadProject).await;
    if !directory.is_dir() {
      return Err(ToolingError::NotADirectory(directory.to_path_buf()));
    }
    Ok(LoadedProject {
      directory: directory.to_path_buf(),
      decompiled: None,
      mappings: None,
    })
  }

  async fn read_source(&self, file: &Path) -> Result<String, ToolingError> {
    self.pass(OperationKind::OpenFile).await;
    self
      .sources
      .lock()
      .unwrap()
      .get(file)
      .cloned()
      .ok_or_else(|| ToolingError::Io {
        path: file.to_path_buf(),
        source: std::io::Error::from(std::io::ErrorKind::NotFound),
      })
  }

  async fn load_mappings(&self, archive: &Path) -> Result<MappingSnapshot, ToolingError> {
    self.pass(OperationKind::SetInitialMappings).await;
    if archive.ends_with("panic.zip") {
      panic!("mapping archive exploded");
    }
    self
      .archives
      .lock()
      .unwrap()
      .get(archive)
      .cloned()
      .ok_or_else(|| ToolingError::NoMappings(archive.to_path_buf()))
  }

  async fn decompile(&self, _archive: &Path, project: &Path) -> Result<PathBuf, ToolingError> {
    self.pass(OperationKind::Decompile).await;
    Ok(project.join("decompiled"))
  }

  async fn export_mappings(&self, project: &Path, snapshot: &MappingSnapshot) -> Result<PathBuf, ToolingError> {
    self.pass(OperationKind::ExportMappings).await;
    self.exported.lock().unwrap().push(snapshot.clone());
    Ok(project.join("mappings.csv"))
  }
}

// ============================================================================
// ActorTestContext
// ============================================================================

/// Test context for actor integration tests.
pub struct ActorTestContext {
  /// Temporary directory used as the project
  pub project_dir: TempDir,
  pub tooling: Arc<FakeTooling>,
  pub handle: ProjectHandle,
  pub events: mpsc::Receiver<ViewEvent>,
  pub cancel: CancellationToken,
}

impl ActorTestContext {
  /// Spawn a ProjectActor with default queue settings.
  pub fn new() -> Self {
    Self::with_config(ActorConfig::default())
  }

  pub fn with_config(config: ActorConfig) -> Self {
    let project_dir = TempDir::new().expect("create project temp dir");
    let tooling = Arc::new(FakeTooling::default());
    let cancel = CancellationToken::new();
    // Large enough that tests which never drain do not stall the actor
    let (view_tx, events) = mpsc::channel(4096);

    let handle = ProjectActor::spawn(&config, tooling.clone(), view_tx, cancel.clone());

    Self {
      project_dir,
      tooling,
      handle,
      events,
      cancel,
    }
  }

  pub fn project_path(&self) -> PathBuf {
    self.project_dir.path().to_path_buf()
  }

  /// Load the temp project and wait until the actor has applied it.
  pub async fn load_project(&mut self) {
    self.handle.load_project(self.project_path()).await.expect("send load");
    self
      .wait_for_event(|e| matches!(e, ViewEvent::ProjectLoaded { .. }))
      .await;
  }

  /// Receive events until one matches, panicking after [`EVENT_TIMEOUT`].
  pub async fn wait_for_event<F>(&mut self, mut matches: F) -> ViewEvent
  where
    F: FnMut(&ViewEvent) -> bool,
  {
    let deadline = tokio::time::Instant::now() + EVENT_TIMEOUT;
    loop {
      let event = tokio::time::timeout_at(deadline, self.events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("view channel closed");
      if matches(&event) {
        return event;
      }
    }
  }

  /// Drain everything currently buffered.
  pub fn drain_events(&mut self) -> Vec<ViewEvent> {
    let mut events = Vec::new();
    while let Ok(event) = self.events.try_recv() {
      events.push(event);
    }
    events
  }
}

impl Drop for ActorTestContext {
  fn drop(&mut self) {
    self.cancel.cancel();
  }
}

/// Wait for a condition to become true, with timeout.
pub async fn wait_for<F>(timeout: Duration, mut check: F) -> bool
where
  F: FnMut() -> bool,
{
  let start = std::time::Instant::now();
  let poll_interval = Duration::from_millis(10);

  while start.elapsed() < timeout {
    if check() {
      return true;
    }
    tokio::time::sleep(poll_interval).await;
  }

  false
}
