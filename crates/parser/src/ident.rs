//! Java identifier character classes

/// Whether `c` may begin a Java identifier
pub fn is_identifier_start(c: char) -> bool {
  c.is_alphabetic() || c == '_' || c == '$'
}

/// Whether `c` may appear after the first character of a Java identifier
pub fn is_identifier_part(c: char) -> bool {
  // Decimal digits only; superscripts and fractions are not digits
  is_identifier_start(c) || c.is_ascii_digit()
}

/// A non-empty name that starts with an identifier-start character and
/// contains only identifier-part characters.
pub fn is_valid_identifier(name: &str) -> bool {
  let mut chars = name.chars();
  match chars.next() {
    Some(first) if is_identifier_start(first) => chars.all(is_identifier_part),
    _ => false,
  }
}
