//! Heredoc and nowdoc body normalization.
//!
//! A flexible heredoc may indent its closing label; that indentation is
//! removed from every body line. All functions work on the scanner's
//! character buffer and only allocate when something is actually removed.

use std::borrow::Cow;

/// Some body line is indented less than the closing label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndentationMismatch {
    /// Length of the prefix shared by the body lines, which is still removed.
    pub shared: usize,
}

fn is_indent(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn is_label_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || u32::from(c) >= 0x80
}

/// Resolve the indentation to strip from a final body fragment.
///
/// `text` runs up to the closing label, so its last line is the closing
/// label's indentation. Whitespace-only lines do not take part. When
/// `at_line_start` is false the first line continues an earlier fragment
/// and is not checked either.
pub fn resolve_indentation(text: &[char], at_line_start: bool) -> Result<usize, IndentationMismatch> {
    let mut best: Option<&[char]> = None;
    let mut line_start = 0;
    let mut indent_end: Option<usize> = None;
    let mut check_line = at_line_start;

    for (i, &c) in text.iter().enumerate() {
        if c == '\n' {
            if let (true, Some(end)) = (check_line, indent_end) {
                let candidate = &text[line_start..end];
                best = Some(match best {
                    None => candidate,
                    Some(prefix) if candidate.starts_with(prefix) => prefix,
                    Some(prefix) if prefix.starts_with(candidate) => candidate,
                    Some(_) => &text[..0],
                });
            }
            line_start = i + 1;
            indent_end = None;
            check_line = true;
        } else if indent_end.is_none() && !is_indent(c) && c != '\r' {
            indent_end = Some(i);
        }
    }

    let trailing = &text[line_start..];
    match best {
        None => Ok(trailing.len()),
        Some(prefix) if prefix.starts_with(trailing) => Ok(trailing.len()),
        Some(prefix) => Err(IndentationMismatch {
            shared: prefix.len(),
        }),
    }
}

/// Whether every line that starts inside `text` and has content begins
/// with `indent`.
pub fn is_indented_by(text: &[char], at_line_start: bool, indent: &[char]) -> bool {
    line_starts(text, at_line_start).all(|start| {
        let line = &text[start..];
        let content = line.iter().position(|&c| !is_indent(c));
        match content {
            // runs into the next interpolation, so the line has content
            None => line.starts_with(indent) || indent.is_empty(),
            Some(at) if line[at] == '\n' || line[at] == '\r' => true,
            Some(_) => line.starts_with(indent),
        }
    })
}

fn line_starts(text: &[char], at_line_start: bool) -> impl Iterator<Item = usize> + '_ {
    let first = at_line_start.then_some(0);
    let rest = text
        .iter()
        .enumerate()
        .filter(|&(_, &c)| c == '\n')
        .map(|(i, _)| i + 1);
    first.into_iter().chain(rest)
}

/// Remove up to `width` indentation characters from each line start.
pub fn remove_indentation(text: &[char], at_line_start: bool, width: usize) -> Cow<'_, [char]> {
    if width == 0 {
        return Cow::Borrowed(text);
    }
    let mut out = Vec::with_capacity(text.len());
    let mut strip = if at_line_start { width } else { 0 };
    for &c in text {
        if strip > 0 && is_indent(c) {
            strip -= 1;
            continue;
        }
        strip = 0;
        out.push(c);
        if c == '\n' {
            strip = width;
        }
    }
    Cow::Owned(out)
}

/// Split a final fragment into its body and drop the newline that precedes
/// the closing label, together with the label's indentation.
pub fn final_body(text: &[char]) -> &[char] {
    match text.iter().rposition(|&c| c == '\n') {
        Some(nl) if nl > 0 && text[nl - 1] == '\r' => &text[..nl - 1],
        Some(nl) => &text[..nl],
        None => &[],
    }
}

/// Location of a closing label line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosingLabel {
    pub line_start: usize,
    pub label_start: usize,
}

/// Check whether the line starting at `line_start` closes the heredoc:
/// optional indentation, the label, then anything that cannot continue a
/// label (`;`, `,`, `)`, newline, end of input).
pub fn closing_label_at(chars: &[char], line_start: usize, label: &str) -> Option<ClosingLabel> {
    let mut i = line_start;
    while i < chars.len() && is_indent(chars[i]) {
        i += 1;
    }
    let label_start = i;
    for expected in label.chars() {
        if chars.get(i) != Some(&expected) {
            return None;
        }
        i += 1;
    }
    match chars.get(i) {
        Some(&c) if is_label_char(c) => None,
        _ => Some(ClosingLabel {
            line_start,
            label_start,
        }),
    }
}

/// Find the first closing label line at or after `from`, which must be a
/// line start when `at_line_start` holds.
pub fn find_closing_label(
    chars: &[char],
    from: usize,
    at_line_start: bool,
    label: &str,
) -> Option<ClosingLabel> {
    if at_line_start {
        if let Some(found) = closing_label_at(chars, from, label) {
            return Some(found);
        }
    }
    (from..chars.len())
        .filter(|&i| chars[i] == '\n')
        .find_map(|i| closing_label_at(chars, i + 1, label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn dedent(s: &str) -> String {
        let text = chars(s);
        let width = resolve_indentation(&text, true).unwrap();
        remove_indentation(final_body(&text), true, width)
            .iter()
            .collect()
    }

    // =========================================================================
    // Prefix resolution
    // =========================================================================

    #[test]
    fn test_uniform_indent_removed() {
        assert_eq!(dedent("        a\n        b\n    "), "    a\n    b");
    }

    #[test]
    fn test_no_closing_indent_keeps_text() {
        assert_eq!(dedent("  a\n b\n"), "  a\n b");
    }

    #[test]
    fn test_blank_lines_do_not_narrow() {
        assert_eq!(dedent("    a\n\n  \n    b\n    "), "a\n\n\nb");
    }

    #[test]
    fn test_under_indented_line_is_error() {
        let text = chars("    a\n  b\n    ");
        assert_eq!(
            resolve_indentation(&text, true),
            Err(IndentationMismatch { shared: 2 })
        );
    }

    #[test]
    fn test_mixed_indent_collapses() {
        let text = chars("\ta\n  b\n  ");
        assert_eq!(
            resolve_indentation(&text, true),
            Err(IndentationMismatch { shared: 0 })
        );
    }

    #[test]
    fn test_continuation_line_not_checked() {
        let text = chars(" tail\n    next\n    ");
        assert_eq!(resolve_indentation(&text, false), Ok(4));
        assert_eq!(resolve_indentation(&text, true), Err(IndentationMismatch { shared: 1 }));
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(dedent("    "), "");
        assert_eq!(dedent(""), "");
    }

    #[test]
    fn test_crlf_body() {
        assert_eq!(dedent("  a\r\n  "), "a");
    }

    #[test]
    fn test_crlf_blank_line_is_skipped() {
        assert_eq!(resolve_indentation(&chars("    a\r\n\r\n    b\r\n    "), true), Ok(4));
        assert!(is_indented_by(&chars("    a\r\n\r\n    "), true, &chars("    ")));
    }

    // =========================================================================
    // Fragments
    // =========================================================================

    #[test]
    fn test_is_indented_by() {
        let indent = chars("  ");
        assert!(is_indented_by(&chars("  a\n  b "), true, &indent));
        assert!(is_indented_by(&chars("tail\n  "), false, &indent));
        assert!(is_indented_by(&chars("tail\n\n  b"), false, &indent));
        assert!(!is_indented_by(&chars("tail\n b"), false, &indent));
        assert!(!is_indented_by(&chars(" "), true, &indent));
    }

    #[test]
    fn test_remove_indentation_mid_line() {
        let text = chars("x  \n    y");
        let out: String = remove_indentation(&text, false, 4).iter().collect();
        assert_eq!(out, "x  \ny");
    }

    // =========================================================================
    // Closing label
    // =========================================================================

    #[test]
    fn test_closing_label_detection() {
        let text = chars("body\n  EOT;\n");
        assert_eq!(
            find_closing_label(&text, 0, true, "EOT"),
            Some(ClosingLabel {
                line_start: 5,
                label_start: 7
            })
        );
        assert_eq!(find_closing_label(&chars("EOTX\n"), 0, true, "EOT"), None);
        assert_eq!(
            find_closing_label(&chars("EOT"), 0, true, "EOT"),
            Some(ClosingLabel {
                line_start: 0,
                label_start: 0
            })
        );
    }

    #[test]
    fn test_label_not_matched_mid_line() {
        assert_eq!(find_closing_label(&chars("a EOT\n"), 0, true, "EOT"), None);
    }
}
