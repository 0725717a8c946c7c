//! Symbol resolution for MCPIDE
//!
//! Turns Java source text into the identifier occurrences the highlighter
//! rewrites and tags:
//! - [`JavaResolver`]: tree-sitter based, ignores keywords, comments and literals
//! - [`LexicalResolver`]: dependency-free scanner with the same contract
//!
//! Both are pure and `Send + Sync`, so one instance can serve every editor.
//!
//! # Example
//! ```ignore
//! use mcpide_parser::{JavaResolver, SymbolResolver};
//!
//! let resolver = JavaResolver::new();
//! let symbols = resolver.resolve("class A { int field_1234_a; }")?;
//! ```

mod error;
pub mod ident;
mod java;
mod lexical;

pub use error::ResolveError;
pub use ident::{is_identifier_part, is_identifier_start, is_valid_identifier};
pub use java::JavaResolver;
pub use lexical::LexicalResolver;

use std::ops::Range;

/// A single identifier occurrence in source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolOccurrence {
  /// The identifier as written
  pub name: String,
  /// Byte range of the identifier in the source text
  pub range: Range<usize>,
}

impl SymbolOccurrence {
  pub fn new(name: impl Into<String>, range: Range<usize>) -> Self {
    Self {
      name: name.into(),
      range,
    }
  }
}

/// Resolves identifier occurrences in source text.
///
/// Implementations must return occurrences ordered by start offset with no
/// overlapping ranges.
pub trait SymbolResolver: Send + Sync {
  fn resolve(&self, text: &str) -> Result<Vec<SymbolOccurrence>, ResolveError>;
}
