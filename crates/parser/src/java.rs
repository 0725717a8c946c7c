//! Tree-sitter based Java resolver

use tree_sitter::{Language as TsLanguage, Parser};

use crate::{ResolveError, SymbolOccurrence, SymbolResolver};

/// Node kinds that name something a mapping can apply to
const IDENTIFIER_KINDS: &[&str] = &["identifier", "type_identifier"];

/// Resolves identifiers by walking a tree-sitter-java parse tree.
///
/// A fresh `Parser` is created per call so a single resolver can be shared
/// across threads. Source with syntax errors still yields the identifiers
/// tree-sitter could recover.
pub struct JavaResolver {
  language: TsLanguage,
}

impl JavaResolver {
  pub fn new() -> Self {
    Self {
      language: tree_sitter_java::LANGUAGE.into(),
    }
  }
}

impl Default for JavaResolver {
  fn default() -> Self {
    Self::new()
  }
}

impl SymbolResolver for JavaResolver {
  fn resolve(&self, text: &str) -> Result<Vec<SymbolOccurrence>, ResolveError> {
    let mut parser = Parser::new();
    parser.set_language(&self.language)?;
    let tree = parser.parse(text, None).ok_or(ResolveError::NoTree)?;

    let mut occurrences = Vec::new();
    let mut cursor = tree.walk();

    // Pre-order walk keeps occurrences in document order
    'walk: loop {
      let node = cursor.node();
      if IDENTIFIER_KINDS.contains(&node.kind())
        && let Ok(name) = node.utf8_text(text.as_bytes())
      {
        occurrences.push(SymbolOccurrence::new(name, node.byte_range()));
      }

      if cursor.goto_first_child() {
        continue;
      }
      loop {
        if cursor.goto_next_sibling() {
          continue 'walk;
        }
        if !cursor.goto_parent() {
          break 'walk;
        }
      }
    }

    Ok(occurrences)
  }
}
