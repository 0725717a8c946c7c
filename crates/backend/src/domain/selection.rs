//! Caret-based identifier selection
//!
//! Carets are character indices (what an editor widget reports); returned
//! ranges are byte ranges into the same text.

use std::ops::Range;

use mcpide_parser::is_identifier_part;

/// Select the identifier around `caret`.
///
/// When the character at the caret is an identifier character the selection
/// grows in both directions. Otherwise only the identifier ending right at the
/// caret is considered. Returns `None` for a caret outside the text or when no
/// identifier touches it.
pub fn select_identifier(text: &str, caret: usize) -> Option<Range<usize>> {
  let chars: Vec<(usize, char)> = text.char_indices().collect();
  if caret >= chars.len() {
    return None;
  }

  let (start, end) = if is_identifier_part(chars[caret].1) {
    (scan(&chars, caret, Direction::Back), scan(&chars, caret, Direction::Forward) + 1)
  } else {
    let before = caret.checked_sub(1)?;
    if !is_identifier_part(chars[before].1) {
      return None;
    }
    // Caret is the exclusive end
    (scan(&chars, before, Direction::Back), caret)
  };

  Some(byte_range(text, &chars, start..end))
}

/// Select the whitespace-delimited word around `caret`.
pub fn select_word(text: &str, caret: usize) -> Option<Range<usize>> {
  let chars: Vec<(usize, char)> = text.char_indices().collect();
  let is_word = |idx: usize| chars.get(idx).is_some_and(|(_, c)| !c.is_whitespace());

  let anchor = if is_word(caret) {
    caret
  } else if caret > 0 && is_word(caret - 1) {
    caret - 1
  } else {
    return None;
  };

  let mut start = anchor;
  while start > 0 && is_word(start - 1) {
    start -= 1;
  }
  let mut end = anchor + 1;
  while is_word(end) {
    end += 1;
  }

  Some(byte_range(text, &chars, start..end))
}

#[derive(Clone, Copy)]
enum Direction {
  Back,
  Forward,
}

/// Last index reachable from `from` stepping over identifier characters
fn scan(chars: &[(usize, char)], from: usize, direction: Direction) -> usize {
  let mut valid = from;
  loop {
    let next = match direction {
      Direction::Back => valid.checked_sub(1),
      Direction::Forward => Some(valid + 1),
    };
    match next {
      Some(idx) if idx < chars.len() && is_identifier_part(chars[idx].1) => valid = idx,
      _ => return valid,
    }
  }
}

fn byte_range(text: &str, chars: &[(usize, char)], range: Range<usize>) -> Range<usize> {
  let to_byte = |idx: usize| chars.get(idx).map(|(b, _)| *b).unwrap_or(text.len());
  to_byte(range.start)..to_byte(range.end)
}
