//! Project tooling - the long-running work the actor delegates
//!
//! The actor never touches the filesystem itself. It hands paths to a
//! [`ProjectTooling`] implementation on a background task and reacts only to
//! the outcome.
//!
//! [`LocalTooling`] is the default implementation:
//! - projects are plain directories
//! - mappings are MCP-style CSV files (or a directory of them)
//! - decompilation shells out to a configured program

use std::{
  path::{Path, PathBuf},
  process::Stdio,
};

use async_trait::async_trait;
use mcpide_core::ToolingConfig;
use tracing::{debug, info};

use crate::domain::mapping::{MappingParseError, MappingSnapshot};

/// MCP mapping files looked up when a mappings archive is a directory
const MAPPING_FILES: &[&str] = &["fields.csv", "methods.csv", "params.csv"];

// ============================================================================
// Types
// ============================================================================

/// Result of opening a project directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedProject {
  pub directory: PathBuf,
  /// Decompiled sources, if the project has been decompiled before
  pub decompiled: Option<PathBuf>,
  /// Previously exported mappings
  pub mappings: Option<MappingSnapshot>,
}

/// Errors from tooling operations
#[derive(Debug, thiserror::Error)]
pub enum ToolingError {
  #[error("I/O error on {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("Not a directory: {}", .0.display())]
  NotADirectory(PathBuf),
  #[error("Invalid mappings in {}: {source}", .path.display())]
  Mappings {
    path: PathBuf,
    #[source]
    source: MappingParseError,
  },
  #[error("No mapping files found in {}", .0.display())]
  NoMappings(PathBuf),
  #[error("No decompiler configured")]
  DecompilerNotConfigured,
  #[error("Decompiler exited with {status}: {stderr}")]
  DecompilerFailed { status: String, stderr: String },
}

impl ToolingError {
  fn io(path: &Path, source: std::io::Error) -> Self {
    Self::Io {
      path: path.to_path_buf(),
      source,
    }
  }
}

// ============================================================================
// Trait
// ============================================================================

/// Long-running project operations
#[async_trait]
pub trait ProjectTooling: Send + Sync + 'static {
  async fn load_project(&self, directory: &Path) -> Result<LoadedProject, ToolingError>;

  async fn read_source(&self, file: &Path) -> Result<String, ToolingError>;

  async fn load_mappings(&self, archive: &Path) -> Result<MappingSnapshot, ToolingError>;

  /// Decompile `archive` into the project; returns the output directory
  async fn decompile(&self, archive: &Path, project: &Path) -> Result<PathBuf, ToolingError>;

  /// Persist `snapshot` into the project; returns the written file
  async fn export_mappings(&self, project: &Path, snapshot: &MappingSnapshot) -> Result<PathBuf, ToolingError>;
}

// ============================================================================
// LocalTooling
// ============================================================================

/// Filesystem and subprocess backed tooling
#[derive(Debug, Clone, Default)]
pub struct LocalTooling {
  config: ToolingConfig,
}

impl LocalTooling {
  pub fn new(config: ToolingConfig) -> Self {
    Self { config }
  }

  async fn read_mapping_file(path: &Path) -> Result<MappingSnapshot, ToolingError> {
    let content = tokio::fs::read_to_string(path)
      .await
      .map_err(|e| ToolingError::io(path, e))?;
    MappingSnapshot::parse_csv(&content).map_err(|source| ToolingError::Mappings {
      path: path.to_path_buf(),
      source,
    })
  }
}

async fn is_dir(path: &Path) -> bool {
  tokio::fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
}

async fn exists(path: &Path) -> bool {
  tokio::fs::try_exists(path).await.unwrap_or(false)
}

#[async_trait]
impl ProjectTooling for LocalTooling {
  async fn load_project(&self, directory: &Path) -> Result<LoadedProject, ToolingError> {
    let metadata = tokio::fs::metadata(directory)
      .await
      .map_err(|e| ToolingError::io(directory, e))?;
    if !metadata.is_dir() {
      return Err(ToolingError::NotADirectory(directory.to_path_buf()));
    }

    let decompiled = directory.join(&self.config.decompiled_dir);
    let decompiled = is_dir(&decompiled).await.then_some(decompiled);

    let export = directory.join(&self.config.export_file);
    let mappings = if exists(&export).await {
      Some(Self::read_mapping_file(&export).await?)
    } else {
      None
    };

    info!(
      directory = %directory.display(),
      decompiled = decompiled.is_some(),
      mappings = mappings.as_ref().map(|m| m.len()).unwrap_or(0),
      "Loaded project"
    );

    Ok(LoadedProject {
      directory: directory.to_path_buf(),
      decompiled,
      mappings,
    })
  }

  async fn read_source(&self, file: &Path) -> Result<String, ToolingError> {
    tokio::fs::read_to_string(file)
      .await
      .map_err(|e| ToolingError::io(file, e))
  }

  async fn load_mappings(&self, archive: &Path) -> Result<MappingSnapshot, ToolingError> {
    if !is_dir(archive).await {
      return Self::read_mapping_file(archive).await;
    }

    let mut mappings = Vec::new();
    let mut found = false;
    for name in MAPPING_FILES {
      let path = archive.join(name);
      if !exists(&path).await {
        continue;
      }
      found = true;
      let snapshot = Self::read_mapping_file(&path).await?;
      debug!(file = %path.display(), count = snapshot.len(), "Read mapping file");
      mappings.extend(snapshot.iter().cloned());
    }

    if !found {
      return Err(ToolingError::NoMappings(archive.to_path_buf()));
    }
    Ok(MappingSnapshot::from_mappings(mappings))
  }

  async fn decompile(&self, archive: &Path, project: &Path) -> Result<PathBuf, ToolingError> {
    let decompiler = self
      .config
      .decompiler
      .as_ref()
      .ok_or(ToolingError::DecompilerNotConfigured)?;

    let output = project.join(&self.config.decompiled_dir);
    tokio::fs::create_dir_all(&output)
      .await
      .map_err(|e| ToolingError::io(&output, e))?;

    let input = archive.to_string_lossy();
    let out = output.to_string_lossy();
    let args: Vec<String> = decompiler
      .args
      .iter()
      .map(|arg| arg.replace("{input}", &input).replace("{output}", &out))
      .collect();

    info!(program = %decompiler.program, ?args, "Running decompiler");
    let result = tokio::process::Command::new(&decompiler.program)
      .args(&args)
      .stdin(Stdio::null())
      // An aborted operation must not keep writing into the project
      .kill_on_drop(true)
      .output()
      .await
      .map_err(|e| ToolingError::io(Path::new(&decompiler.program), e))?;

    if !result.status.success() {
      return Err(ToolingError::DecompilerFailed {
        status: result.status.to_string(),
        stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
      });
    }

    Ok(output)
  }

  async fn export_mappings(&self, project: &Path, snapshot: &MappingSnapshot) -> Result<PathBuf, ToolingError> {
    let path = project.join(&self.config.export_file);
    if let Some(parent) = path.parent() {
      tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| ToolingError::io(parent, e))?;
    }
    tokio::fs::write(&path, snapshot.to_csv())
      .await
      .map_err(|e| ToolingError::io(&path, e))?;
    Ok(path)
  }
}
