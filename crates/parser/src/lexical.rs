//! Lexical identifier scanner
//!
//! Recognizes Java comments, string/char literals and numbers well enough to
//! avoid reporting identifiers inside them. No grammar is involved, so the
//! result never fails and is cheap to compute.

use crate::{
  ResolveError, SymbolOccurrence, SymbolResolver,
  ident::{is_identifier_part, is_identifier_start},
};

/// Reserved words and literals that never name a symbol
const KEYWORDS: &[&str] = &[
  "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const", "continue", "default",
  "do", "double", "else", "enum", "extends", "false", "final", "finally", "float", "for", "goto", "if", "implements",
  "import", "instanceof", "int", "interface", "long", "native", "new", "null", "package", "private", "protected",
  "public", "return", "short", "static", "strictfp", "super", "switch", "synchronized", "this", "throw", "throws",
  "transient", "true", "try", "void", "volatile", "while", "var", "record", "yield",
];

/// Scans identifiers character by character.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexicalResolver;

impl LexicalResolver {
  pub fn new() -> Self {
    Self
  }
}

impl SymbolResolver for LexicalResolver {
  fn resolve(&self, text: &str) -> Result<Vec<SymbolOccurrence>, ResolveError> {
    let mut occurrences = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
      match c {
        '/' if matches!(chars.peek(), Some((_, '/'))) => {
          for (_, c) in chars.by_ref() {
            if c == '\n' {
              break;
            }
          }
        }
        '/' if matches!(chars.peek(), Some((_, '*'))) => {
          chars.next();
          let mut prev = '\0';
          for (_, c) in chars.by_ref() {
            if prev == '*' && c == '/' {
              break;
            }
            prev = c;
          }
        }
        '"' | '\'' => {
          let quote = c;
          let mut escaped = false;
          for (_, c) in chars.by_ref() {
            if escaped {
              escaped = false;
            } else if c == '\\' {
              escaped = true;
            } else if c == quote || c == '\n' {
              break;
            }
          }
        }
        c if c.is_ascii_digit() => {
          // Numeric literal, including suffixes and hex digits
          while let Some(&(_, next)) = chars.peek() {
            if is_identifier_part(next) || next == '.' {
              chars.next();
            } else {
              break;
            }
          }
        }
        c if is_identifier_start(c) => {
          let mut end = start + c.len_utf8();
          while let Some(&(idx, next)) = chars.peek() {
            if !is_identifier_part(next) {
              break;
            }
            end = idx + next.len_utf8();
            chars.next();
          }
          let name = &text[start..end];
          if !KEYWORDS.contains(&name) {
            occurrences.push(SymbolOccurrence::new(name, start..end));
          }
        }
        _ => {}
      }
    }

    Ok(occurrences)
  }
}
