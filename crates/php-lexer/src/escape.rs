//! Backslash escape decoding for string literals.
//!
//! Decoding is lazy: nothing is allocated until a backslash sequence is
//! actually rewritten, and an escape-free literal is reported as
//! [`Unescaped::Verbatim`] so the caller can intern the source slice.

use crate::options::Encoding;
use crate::token::Text;

/// Which escape grammar applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeMode {
    /// Only `\\` and `\'`.
    SingleQuoted,
    /// Double-quoted strings and heredocs.
    DoubleQuoted,
    /// Shell-exec strings: double-quoted rules plus `` \` ``.
    Backquote,
}

#[derive(Debug, Clone, Copy)]
pub struct EscapeOptions {
    pub mode: EscapeMode,
    pub unicode_escapes: bool,
    pub encoding: Encoding,
    /// `b"..."` literals always produce bytes.
    pub binary: bool,
}

impl EscapeOptions {
    pub fn new(mode: EscapeMode, encoding: Encoding) -> Self {
        Self {
            mode,
            unicode_escapes: false,
            encoding,
            binary: false,
        }
    }

    pub fn unicode_escapes(mut self, enabled: bool) -> Self {
        self.unicode_escapes = enabled;
        self
    }

    pub fn binary(mut self, binary: bool) -> Self {
        self.binary = binary;
        self
    }
}

/// Outcome of decoding a literal body.
#[derive(Debug, Clone, PartialEq)]
pub enum Unescaped {
    /// No escape applied; the source slice is the value.
    Verbatim,
    Rebuilt {
        text: Text,
        /// A `\u{...}` escape named a surrogate or out-of-range code point
        /// and was replaced with `?`.
        invalid_code_point: bool,
    },
}

/// Longest `\u{...}` body that is read.
const MAX_CODE_POINT_DIGITS: usize = 6;

enum Escape {
    Char(char),
    Byte(u8),
    CodePoint(u32),
}

/// Byte accumulator for a rebuilt literal.
struct ByteBuilder {
    bytes: Vec<u8>,
    encoding: Encoding,
}

impl ByteBuilder {
    fn with_capacity(capacity: usize, encoding: Encoding) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            encoding,
        }
    }

    fn push_chars(&mut self, chars: &[char]) {
        for &c in chars {
            self.encoding.encode_char(c, &mut self.bytes);
        }
    }

    fn push(&mut self, escape: Escape) -> bool {
        match escape {
            Escape::Char(c) => self.encoding.encode_char(c, &mut self.bytes),
            Escape::Byte(b) => self.bytes.push(b),
            Escape::CodePoint(cp) => match char::from_u32(cp) {
                // \u{} always yields UTF-8, whatever the source encoding
                Some(c) => {
                    let mut buf = [0u8; 4];
                    self.bytes
                        .extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                }
                None => {
                    self.bytes.push(b'?');
                    return true;
                }
            },
        }
        false
    }

    fn finish(self, binary: bool) -> Text {
        if binary {
            return Text::Bytes(self.bytes);
        }
        match self.encoding.decode_exact(&self.bytes) {
            Some(text) => Text::from(text),
            None => Text::Bytes(self.bytes),
        }
    }
}

/// Decode the escapes in `chars`.
pub fn unescape(chars: &[char], options: EscapeOptions) -> Unescaped {
    let Some(first) = chars.iter().position(|&c| c == '\\') else {
        if options.binary {
            let mut builder = ByteBuilder::with_capacity(chars.len(), options.encoding);
            builder.push_chars(chars);
            return Unescaped::Rebuilt {
                text: builder.finish(true),
                invalid_code_point: false,
            };
        }
        return Unescaped::Verbatim;
    };

    let mut builder: Option<ByteBuilder> = None;
    let mut invalid_code_point = false;
    let mut copied_to = 0;
    let mut i = first;
    while i < chars.len() {
        if chars[i] != '\\' || i + 1 >= chars.len() {
            i += 1;
            continue;
        }
        match decode_at(chars, i + 1, options) {
            Some((escape, next)) => {
                let b = builder.get_or_insert_with(|| {
                    ByteBuilder::with_capacity(chars.len(), options.encoding)
                });
                b.push_chars(&chars[copied_to..i]);
                invalid_code_point |= b.push(escape);
                copied_to = next;
                i = next;
            }
            // unhandled: backslash and the next character stay as they are
            None => i += 2,
        }
    }

    if builder.is_none() && options.binary {
        builder = Some(ByteBuilder::with_capacity(chars.len(), options.encoding));
    }
    match builder {
        None => Unescaped::Verbatim,
        Some(mut b) => {
            b.push_chars(&chars[copied_to..]);
            Unescaped::Rebuilt {
                text: b.finish(options.binary),
                invalid_code_point,
            }
        }
    }
}

/// Decode the escape whose first character after the backslash is at `at`.
/// Returns the escape and the index just past it.
fn decode_at(chars: &[char], at: usize, options: EscapeOptions) -> Option<(Escape, usize)> {
    let c = chars[at];
    if options.mode == EscapeMode::SingleQuoted {
        return matches!(c, '\\' | '\'').then_some((Escape::Char(c), at + 1));
    }

    let simple = match c {
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        'v' => Some('\u{0b}'),
        'e' => Some('\u{1b}'),
        'f' => Some('\u{0c}'),
        '\\' | '$' | '"' => Some(c),
        '`' if options.mode == EscapeMode::Backquote => Some(c),
        _ => None,
    };
    if let Some(decoded) = simple {
        return Some((Escape::Char(decoded), at + 1));
    }

    match c {
        'x' => {
            let high = chars.get(at + 1)?.to_digit(16)?;
            match chars.get(at + 2).and_then(|c| c.to_digit(16)) {
                Some(low) => Some((Escape::Byte((high * 16 + low) as u8), at + 3)),
                None => Some((Escape::Byte(high as u8), at + 2)),
            }
        }
        'u' if options.unicode_escapes => code_point(chars, at + 1),
        '0'..='7' => {
            let mut code = 0u32;
            let mut end = at;
            while end < chars.len() && end - at < 3 {
                match chars[end].to_digit(8) {
                    Some(d) => code = code * 8 + d,
                    None => break,
                }
                end += 1;
            }
            // \400 and above wrap to a byte
            Some((Escape::Byte((code & 0xff) as u8), end))
        }
        _ => None,
    }
}

/// `{hex}` after `\u`. Malformed bodies leave the escape unhandled.
fn code_point(chars: &[char], open: usize) -> Option<(Escape, usize)> {
    if chars.get(open) != Some(&'{') {
        return None;
    }
    let mut value = 0u32;
    let mut end = open + 1;
    while end < chars.len() && end - open <= MAX_CODE_POINT_DIGITS {
        match chars[end].to_digit(16) {
            Some(d) => value = value * 16 + d,
            None => break,
        }
        end += 1;
    }
    if end == open + 1 || chars.get(end) != Some(&'}') {
        return None;
    }
    Some((Escape::CodePoint(value), end + 1))
}

/// Body bounds of a quoted literal token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotedBounds {
    pub start: usize,
    pub end: usize,
    pub binary: bool,
}

/// Strip an optional `b` prefix and the surrounding quotes. If the quotes
/// are not both present the prefix is not taken either.
pub fn quoted_bounds(chars: &[char], quote: char) -> QuotedBounds {
    let mut start = 0;
    let mut end = chars.len();
    let mut binary = false;
    if end == 0 {
        return QuotedBounds { start, end, binary };
    }
    if matches!(chars[0], 'b' | 'B') {
        binary = true;
        start += 1;
    }
    if end - start >= 2 && chars[start] == quote && chars[end - 1] == quote {
        start += 1;
        end -= 1;
    } else if binary {
        binary = false;
        start -= 1;
    }
    QuotedBounds { start, end, binary }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn decode(s: &str, mode: EscapeMode) -> String {
        decode_with(s, EscapeOptions::new(mode, Encoding::Utf8))
    }

    fn decode_with(s: &str, options: EscapeOptions) -> String {
        match unescape(&chars(s), options) {
            Unescaped::Verbatim => s.to_string(),
            Unescaped::Rebuilt { text, .. } => text.to_string_lossy(),
        }
    }

    // =========================================================================
    // Laziness
    // =========================================================================

    #[test]
    fn test_no_backslash_is_verbatim() {
        let opts = EscapeOptions::new(EscapeMode::DoubleQuoted, Encoding::Utf8);
        assert_eq!(unescape(&chars("plain text"), opts), Unescaped::Verbatim);
    }

    #[test]
    fn test_unhandled_escapes_stay_verbatim() {
        let opts = EscapeOptions::new(EscapeMode::DoubleQuoted, Encoding::Utf8);
        assert_eq!(unescape(&chars(r"C:\path\q"), opts), Unescaped::Verbatim);
        let single = EscapeOptions::new(EscapeMode::SingleQuoted, Encoding::Utf8);
        assert_eq!(unescape(&chars(r"a\nb"), single), Unescaped::Verbatim);
    }

    // =========================================================================
    // Single quotes
    // =========================================================================

    #[test]
    fn test_single_quoted_only_backslash_and_quote() {
        assert_eq!(decode(r"a\\nb\'c", EscapeMode::SingleQuoted), r"a\nb'c");
        assert_eq!(decode(r"\t\x41", EscapeMode::SingleQuoted), r"\t\x41");
    }

    // =========================================================================
    // Double quotes
    // =========================================================================

    #[test]
    fn test_double_quoted_mixed() {
        assert_eq!(decode(r"a\tb\$c\x41", EscapeMode::DoubleQuoted), "a\tb$cA");
    }

    #[test]
    fn test_simple_escapes() {
        assert_eq!(
            decode(r#"\n\r\t\v\e\f\\\""#, EscapeMode::DoubleQuoted),
            "\n\r\t\u{0b}\u{1b}\u{0c}\\\""
        );
    }

    #[test]
    fn test_backquote_only_in_shell_mode() {
        assert_eq!(decode(r"\`", EscapeMode::DoubleQuoted), r"\`");
        assert_eq!(decode(r"\`", EscapeMode::Backquote), "`");
    }

    #[test]
    fn test_hex_one_or_two_digits() {
        assert_eq!(decode(r"\x4", EscapeMode::DoubleQuoted), "\u{4}");
        assert_eq!(decode(r"\x41B", EscapeMode::DoubleQuoted), "AB");
        assert_eq!(decode(r"\x4g", EscapeMode::DoubleQuoted), "\u{4}g");
        assert_eq!(decode(r"\xg", EscapeMode::DoubleQuoted), r"\xg");
    }

    #[test]
    fn test_octal_one_to_three_digits() {
        assert_eq!(decode(r"\101", EscapeMode::DoubleQuoted), "A");
        assert_eq!(decode(r"\0", EscapeMode::DoubleQuoted), "\0");
        assert_eq!(decode(r"\1010", EscapeMode::DoubleQuoted), "A0");
        assert_eq!(decode(r"\18", EscapeMode::DoubleQuoted), "\u{1}8");
    }

    #[test]
    fn test_high_byte_escape_is_bytes() {
        let opts = EscapeOptions::new(EscapeMode::DoubleQuoted, Encoding::Utf8);
        match unescape(&chars(r"\xff"), opts) {
            Unescaped::Rebuilt { text, .. } => assert_eq!(text, Text::Bytes(vec![0xff])),
            other => panic!("expected rebuilt bytes, got {other:?}"),
        }
    }

    #[test]
    fn test_latin1_high_byte_is_text() {
        let opts = EscapeOptions::new(EscapeMode::DoubleQuoted, Encoding::Latin1);
        assert_eq!(decode_with(r"\xe9t\xe9", opts), "été");
    }

    #[test]
    fn test_trailing_backslash_kept() {
        assert_eq!(decode(r"abc\", EscapeMode::DoubleQuoted), r"abc\");
    }

    // =========================================================================
    // Unicode escapes
    // =========================================================================

    #[test]
    fn test_unicode_requires_feature() {
        assert_eq!(decode(r"\u{41}", EscapeMode::DoubleQuoted), r"\u{41}");
        let opts =
            EscapeOptions::new(EscapeMode::DoubleQuoted, Encoding::Utf8).unicode_escapes(true);
        assert_eq!(decode_with(r"\u{41}\u{1F600}", opts), "A\u{1F600}");
    }

    #[test]
    fn test_invalid_code_point_becomes_question_mark() {
        let opts =
            EscapeOptions::new(EscapeMode::DoubleQuoted, Encoding::Utf8).unicode_escapes(true);
        for input in [r"\u{D800}", r"\u{110000}"] {
            match unescape(&chars(input), opts) {
                Unescaped::Rebuilt {
                    text,
                    invalid_code_point,
                } => {
                    assert_eq!(text, Text::from("?"));
                    assert!(invalid_code_point);
                }
                other => panic!("expected rebuilt text, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_malformed_unicode_left_alone() {
        let opts =
            EscapeOptions::new(EscapeMode::DoubleQuoted, Encoding::Utf8).unicode_escapes(true);
        assert_eq!(decode_with(r"\u{}", opts), r"\u{}");
        assert_eq!(decode_with(r"\u{41", opts), r"\u{41");
        assert_eq!(decode_with(r"\u41", opts), r"\u41");
        assert_eq!(decode_with(r"\u{0000041}", opts), r"\u{0000041}");
    }

    // =========================================================================
    // Quote bounds
    // =========================================================================

    #[test]
    fn test_quoted_bounds_plain_and_binary() {
        assert_eq!(
            quoted_bounds(&chars("'abc'"), '\''),
            QuotedBounds {
                start: 1,
                end: 4,
                binary: false
            }
        );
        assert_eq!(
            quoted_bounds(&chars("b\"abc\""), '"'),
            QuotedBounds {
                start: 2,
                end: 5,
                binary: true
            }
        );
    }

    #[test]
    fn test_quoted_bounds_prefix_rolled_back() {
        assert_eq!(
            quoted_bounds(&chars("b'abc"), '\''),
            QuotedBounds {
                start: 0,
                end: 5,
                binary: false
            }
        );
    }

    #[test]
    fn test_binary_literal_is_bytes() {
        let opts = EscapeOptions::new(EscapeMode::SingleQuoted, Encoding::Utf8).binary(true);
        match unescape(&chars("ab"), opts) {
            Unescaped::Rebuilt { text, .. } => assert_eq!(text, Text::Bytes(b"ab".to_vec())),
            other => panic!("expected bytes, got {other:?}"),
        }
    }
}
