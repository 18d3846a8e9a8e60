//! The tokenizer's external Unicode-category collaborator (§6). A full,
//! hand-maintained category table is out of scope for this crate; the
//! lexical classes it needs map cleanly onto the standard library's own
//! Unicode-aware `char` classification, so that's what this module wraps.

/// The lexical role a non-ASCII code point plays in the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphClass {
    /// Letter / letter-number categories: valid as the first character of an
    /// identifier, and anywhere after.
    Name,
    /// Decimal-digit / combining-mark categories: valid only as a
    /// continuation character of an identifier already begun by `Name`.
    NameOther,
    /// Unicode paragraph/line separators, treated like `\n`.
    Linebreak,
    /// Unicode space separators other than line breaks.
    Space,
    /// Anything else: not valid in an identifier, not whitespace.
    Other,
}

pub fn classify(c: char) -> GlyphClass {
    match c {
        '\u{2028}' | '\u{2029}' => GlyphClass::Linebreak,
        _ if c.is_whitespace() => GlyphClass::Space,
        _ if c.is_alphabetic() => GlyphClass::Name,
        _ if c.is_numeric() => GlyphClass::NameOther,
        _ => GlyphClass::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_start_names() {
        assert_eq!(classify('é'), GlyphClass::Name);
        assert_eq!(classify('λ'), GlyphClass::Name);
    }

    #[test]
    fn digits_continue_only() {
        assert_eq!(classify('٣'), GlyphClass::NameOther);
    }

    #[test]
    fn paragraph_separator_is_linebreak() {
        assert_eq!(classify('\u{2029}'), GlyphClass::Linebreak);
    }

    #[test]
    fn nbsp_is_space() {
        assert_eq!(classify('\u{00A0}'), GlyphClass::Space);
    }
}
