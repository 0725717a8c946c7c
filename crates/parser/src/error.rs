//! Error types for symbol resolution

/// Errors that can occur while resolving symbols
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
  #[error("Failed to load grammar: {0}")]
  Grammar(#[from] tree_sitter::LanguageError),
  #[error("Parser produced no tree")]
  NoTree,
}
