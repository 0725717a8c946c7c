//! Highlighting results and the rewrite that produces them

use std::ops::Range;

use mcpide_parser::{ResolveError, SymbolResolver};

use super::mapping::MappingSnapshot;

/// How a span is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleClass {
  /// Text between identifiers
  Plain,
  /// An identifier with no mapping yet
  Identifier,
  /// An identifier rewritten from the snapshot
  Mapped,
}

/// Style of one span, optionally tagged with the SRG name it denotes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Style {
  pub class: StyleClass,
  pub srg_name: Option<String>,
}

impl Style {
  pub fn plain() -> Self {
    Self {
      class: StyleClass::Plain,
      srg_name: None,
    }
  }
}

/// A styled byte range of the rewritten text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSpan {
  pub range: Range<usize>,
  pub style: Style,
}

/// Rewritten text plus ordered, contiguous style spans covering all of it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Highlighting {
  pub text: String,
  pub spans: Vec<StyleSpan>,
}

impl Highlighting {
  /// Rewrite `source` with `snapshot`, tagging every resolved identifier.
  pub fn compute(
    resolver: &dyn SymbolResolver,
    source: &str,
    snapshot: &MappingSnapshot,
  ) -> Result<Self, ResolveError> {
    let occurrences = resolver.resolve(source)?;

    let mut text = String::with_capacity(source.len());
    let mut spans = Vec::with_capacity(occurrences.len() * 2 + 1);
    let mut cursor = 0;

    for occurrence in occurrences {
      // Overlapping or out-of-order occurrences are ignored
      if occurrence.range.start < cursor || occurrence.range.end > source.len() {
        continue;
      }
      if occurrence.range.start > cursor {
        push_span(&mut text, &mut spans, &source[cursor..occurrence.range.start], Style::plain());
      }

      let (segment, class) = match snapshot.mapped_name(&occurrence.name) {
        Some(new_name) => (new_name, StyleClass::Mapped),
        None => (&source[occurrence.range.clone()], StyleClass::Identifier),
      };
      let style = Style {
        class,
        srg_name: Some(occurrence.name.clone()),
      };
      push_span(&mut text, &mut spans, segment, style);
      cursor = occurrence.range.end;
    }

    if cursor < source.len() {
      push_span(&mut text, &mut spans, &source[cursor..], Style::plain());
    }

    Ok(Self { text, spans })
  }

  /// Spans intersecting `range`
  pub fn spans_in(&self, range: Range<usize>) -> impl Iterator<Item = &StyleSpan> {
    self
      .spans
      .iter()
      .filter(move |span| span.range.start < range.end && range.start < span.range.end)
  }
}

fn push_span(text: &mut String, spans: &mut Vec<StyleSpan>, segment: &str, style: Style) {
  let start = text.len();
  text.push_str(segment);
  spans.push(StyleSpan {
    range: start..text.len(),
    style,
  });
}
