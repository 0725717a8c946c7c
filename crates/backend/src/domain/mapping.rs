//! Identifier mappings and the immutable snapshot the actor publishes

use std::{collections::HashMap, sync::Arc};

/// A single mapping from an SRG (obfuscated) name to a readable name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SrgMapping {
  pub srg_name: String,
  pub new_name: String,
}

impl SrgMapping {
  pub fn new(srg_name: impl Into<String>, new_name: impl Into<String>) -> Self {
    Self {
      srg_name: srg_name.into(),
      new_name: new_name.into(),
    }
  }
}

/// Errors from reading mapping CSV
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingParseError {
  #[error("line {line}: expected at least two columns")]
  MissingColumn { line: usize },
  #[error("line {line}: empty name")]
  EmptyName { line: usize },
}

/// Immutable table of identifier mappings keyed by SRG name.
///
/// Cloning is cheap (shared `Arc`). A published snapshot is never changed;
/// [`MappingSnapshot::with_rename`] and friends build a new one.
#[derive(Debug, Clone, Default)]
pub struct MappingSnapshot {
  entries: Arc<HashMap<String, SrgMapping>>,
}

impl MappingSnapshot {
  /// The empty snapshot the actor starts with
  pub fn empty() -> Self {
    Self::default()
  }

  /// Build a snapshot from mappings; later entries win on duplicate names
  pub fn from_mappings(mappings: impl IntoIterator<Item = SrgMapping>) -> Self {
    let entries = mappings.into_iter().map(|m| (m.srg_name.clone(), m)).collect();
    Self {
      entries: Arc::new(entries),
    }
  }

  /// Convenience for `(srg, new)` pairs
  pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
    Self::from_mappings(pairs.into_iter().map(|(srg, new)| SrgMapping::new(srg, new)))
  }

  pub fn get(&self, srg_name: &str) -> Option<&SrgMapping> {
    self.entries.get(srg_name)
  }

  /// The readable name for `srg_name`, if mapped
  pub fn mapped_name(&self, srg_name: &str) -> Option<&str> {
    self.entries.get(srg_name).map(|m| m.new_name.as_str())
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &SrgMapping> {
    self.entries.values()
  }

  /// Mappings sorted by SRG name
  pub fn sorted(&self) -> Vec<&SrgMapping> {
    let mut mappings: Vec<_> = self.entries.values().collect();
    mappings.sort_by(|a, b| a.srg_name.cmp(&b.srg_name));
    mappings
  }

  /// A new snapshot where `old` maps to `new`; `self` is untouched
  pub fn with_rename(&self, old: &str, new: &str) -> Self {
    let mut entries = HashMap::clone(&self.entries);
    entries.insert(old.to_string(), SrgMapping::new(old, new));
    Self {
      entries: Arc::new(entries),
    }
  }

  /// Whether both snapshots share the same published table
  pub fn ptr_eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.entries, &other.entries)
  }

  /// Parse MCP-style CSV (`searge,name[,side,desc]` or `param,name,side`).
  ///
  /// Blank lines and the header row are skipped.
  pub fn parse_csv(content: &str) -> Result<Self, MappingParseError> {
    let mut mappings = Vec::new();

    for (idx, line) in content.lines().enumerate() {
      let line_no = idx + 1;
      let line = line.trim();
      if line.is_empty() {
        continue;
      }

      let mut columns = line.split(',').map(str::trim);
      let srg = columns.next().unwrap_or_default();
      if idx == 0 && (srg == "searge" || srg == "param") {
        continue;
      }
      let Some(name) = columns.next() else {
        return Err(MappingParseError::MissingColumn { line: line_no });
      };
      if srg.is_empty() || name.is_empty() {
        return Err(MappingParseError::EmptyName { line: line_no });
      }
      mappings.push(SrgMapping::new(srg, name));
    }

    Ok(Self::from_mappings(mappings))
  }

  /// Render as CSV with a `searge,name` header, sorted by SRG name
  pub fn to_csv(&self) -> String {
    let mut out = String::from("searge,name\n");
    for mapping in self.sorted() {
      out.push_str(&mapping.srg_name);
      out.push(',');
      out.push_str(&mapping.new_name);
      out.push('\n');
    }
    out
  }
}

impl PartialEq for MappingSnapshot {
  fn eq(&self, other: &Self) -> bool {
    self.ptr_eq(other) || self.entries == other.entries
  }
}

impl Eq for MappingSnapshot {}
