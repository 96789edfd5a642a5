//! Plain-text sanitisation for metadata field values.
//!
//! Registered metadata fields accept free-form client input but store plain text only. This
//! module implements the two sanitisation pipelines used by field accessors:
//!
//! - **Short text** ([`sanitize_short_text`]): single-line values such as a focus keyphrase or
//!   an SEO title. All whitespace runs collapse to a single space.
//! - **Long text** ([`sanitize_long_text`]): multi-line values such as a meta description.
//!   Newlines and tabs survive; carriage returns are normalised to `\n`.
//!
//! ## Pipeline
//! Both kinds share the same core:
//! 1. Remove disallowed control characters (C0 and DEL, minus the per-kind keep list).
//! 2. Remove `<script>`/`<style>` elements *including their content* (ASCII case-insensitive),
//!    then remaining markup tags, then percent-encoded octets (`%xx`). These three removals
//!    repeat until the string stops changing, so fragments left by one removal can never
//!    reassemble into something a later removal would have caught (`<<b>b>` or `<%61b>` reduce
//!    to nothing rather than to a live tag).
//! 3. Apply per-kind whitespace handling and trim.
//!
//! ## Tag grammar
//! A `<` followed by an ASCII letter, `/`, `!` or `?` opens a tag that runs to the next `>`;
//! an unterminated tag consumes the rest of the input. Any other `<` is literal text, so
//! `"2 < 3"` and `"<3"` pass through untouched.
//!
//! The whole pipeline is idempotent: sanitising an already-sanitised value returns it
//! unchanged. The double write performed on entity saves relies on this: both passes
//! sanitise the same raw input, so they store the identical value.

/// The two value shapes a registered metadata field can declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    /// Single-line value; internal whitespace collapses to single spaces.
    ShortText,
    /// Multi-line value; newlines and tabs are preserved.
    LongText,
}

impl ValueKind {
    /// Stable wire name for this kind, as exposed by the field schema endpoint.
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::ShortText => "short_text",
            ValueKind::LongText => "long_text",
        }
    }

    /// Runs the sanitisation pipeline matching this kind.
    pub fn sanitize(self, raw: &str) -> String {
        match self {
            ValueKind::ShortText => sanitize_short_text(raw),
            ValueKind::LongText => sanitize_long_text(raw),
        }
    }
}

/// Sanitises a single-line field value.
///
/// Strips markup and percent-encoded octets, removes control characters, collapses every run
/// of spaces, tabs and newlines to a single space, and trims the ends.
///
/// # Arguments
///
/// * `raw` - Untrusted input value.
///
/// # Returns
///
/// The cleaned value. May be empty when the input held nothing but markup or whitespace;
/// callers treat an empty result as "nothing to store".
pub fn sanitize_short_text(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|&c| !is_bare_control(c) || matches!(c, '\t' | '\n' | '\r'))
        .collect();
    let stripped = strip_markup_and_octets(&kept);
    let collapsed = collapse_whitespace(&stripped);
    collapsed.trim().to_owned()
}

/// Sanitises a multi-line field value.
///
/// Strips markup and percent-encoded octets and removes control characters, but keeps the
/// line structure: `\r\n` and `\r` normalise to `\n`, and interior newlines, tabs and runs of
/// spaces all survive. Only the outermost whitespace is trimmed.
pub fn sanitize_long_text(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    let kept: String = unified
        .chars()
        .filter(|&c| !is_bare_control(c) || matches!(c, '\t' | '\n'))
        .collect();
    let stripped = strip_markup_and_octets(&kept);
    stripped.trim().to_owned()
}

/// True for C0 control characters and DEL.
fn is_bare_control(c: char) -> bool {
    matches!(c, '\u{0000}'..='\u{001f}' | '\u{007f}')
}

/// Removes script/style elements, markup tags and `%xx` octets until a fixed point.
///
/// Each pass only ever deletes characters, so the string shrinks strictly on every changed
/// pass and the loop terminates.
fn strip_markup_and_octets(input: &str) -> String {
    let mut current = input.to_owned();
    loop {
        let mut next = remove_paired_elements(&current, "script");
        next = remove_paired_elements(&next, "style");
        next = strip_tags(&next);
        next = remove_percent_octets(&next);
        if next == current {
            return next;
        }
        current = next;
    }
}

/// Removes every `<name …>…</name>` element, content included.
///
/// Matching is ASCII case-insensitive. An opening tag without a matching closer is left in
/// place for the plain tag pass, which then removes the tag but keeps its trailing text.
fn remove_paired_elements(input: &str, name: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some((start, end)) = paired_element_span(rest, name) {
        out.push_str(&rest[..start]);
        rest = &rest[end..];
    }
    out.push_str(rest);
    out
}

/// Byte span `[start, end)` of the first complete `<name …>…</name>` element, if any.
fn paired_element_span(input: &str, name: &str) -> Option<(usize, usize)> {
    let mut from = 0;
    while let Some(rel) = input[from..].find('<') {
        let start = from + rel;
        let tail = &input[start..];
        if opens_element(tail, name) {
            if let Some(open_gt) = tail.find('>') {
                let body_start = start + open_gt + 1;
                if let Some(close_len) = closing_tag_end(&input[body_start..], name) {
                    return Some((start, body_start + close_len));
                }
            }
        }
        from = start + 1;
    }
    None
}

/// True if `tail` (starting at `<`) opens an element called `name`.
fn opens_element(tail: &str, name: &str) -> bool {
    let body = &tail[1..];
    let Some(head) = body.get(..name.len()) else {
        return false;
    };
    if !head.eq_ignore_ascii_case(name) {
        return false;
    }
    // the name must end here: `<scripted>` is not a script element
    match body[name.len()..].chars().next() {
        None => true,
        Some('>') | Some('/') => true,
        Some(c) => c.is_ascii_whitespace(),
    }
}

/// Byte length up to and including the `>` of the first `</name>` closer in `hay`.
fn closing_tag_end(hay: &str, name: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(rel) = hay[from..].find("</") {
        let start = from + rel;
        let after = &hay[start + 2..];
        if let Some(head) = after.get(..name.len()) {
            if head.eq_ignore_ascii_case(name) {
                let tail = &after[name.len()..];
                let ws: usize = tail
                    .bytes()
                    .take_while(|b| b.is_ascii_whitespace())
                    .count();
                if tail.as_bytes().get(ws) == Some(&b'>') {
                    return Some(start + 2 + name.len() + ws + 1);
                }
            }
        }
        from = start + 2;
    }
    None
}

/// Removes markup tags, keeping ordinary text (including literal `<`).
fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let mut chars = tail.chars();
        chars.next();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?') => {
                match tail.find('>') {
                    Some(gt) => rest = &tail[gt + 1..],
                    // unterminated tag consumes the rest of the input
                    None => return out,
                }
            }
            _ => {
                out.push('<');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Removes every `%xx` sequence where both `x` are hex digits (either case).
fn remove_percent_octets(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('%') {
        let after = &rest[pos + 1..];
        let is_octet = after
            .get(..2)
            .map(|h| h.bytes().all(|b| b.is_ascii_hexdigit()))
            .unwrap_or(false);
        if is_octet {
            out.push_str(&rest[..pos]);
            rest = &after[2..];
        } else {
            out.push_str(&rest[..pos + 1]);
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

/// Collapses every run of spaces, tabs and newlines to a single space.
fn collapse_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_run = false;
    for c in input.chars() {
        if matches!(c, ' ' | '\t' | '\r' | '\n') {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_passes_plain_values_through() {
        assert_eq!(sanitize_short_text("buyer guide"), "buyer guide");
        assert_eq!(
            sanitize_short_text("South Jersey First-Time Buyer Guide"),
            "South Jersey First-Time Buyer Guide"
        );
    }

    #[test]
    fn test_short_text_strips_tags_but_keeps_text() {
        assert_eq!(sanitize_short_text("<b>bold</b> text"), "bold text");
        assert_eq!(sanitize_short_text("a<br/>b"), "ab");
        assert_eq!(sanitize_short_text("<!-- note -->value"), "value");
    }

    #[test]
    fn test_script_elements_removed_with_content() {
        assert_eq!(
            sanitize_short_text("before<script>alert('x')</script>after"),
            "beforeafter"
        );
        assert_eq!(
            sanitize_short_text("a<style type=\"text/css\">p{color:red}</style>b"),
            "ab"
        );
    }

    #[test]
    fn test_script_matching_is_case_insensitive() {
        assert_eq!(sanitize_short_text("<SCRIPT>x</SCRIPT>ok"), "ok");
        assert_eq!(sanitize_short_text("<Style>y</stYle>ok"), "ok");
    }

    #[test]
    fn test_scripted_prefix_is_not_a_script_element() {
        // the element name must end at the tag name boundary
        assert_eq!(sanitize_short_text("<scripted>note</scripted>"), "note");
    }

    #[test]
    fn test_unclosed_script_keeps_trailing_text() {
        // no closing tag, so only the opening tag itself is removed
        assert_eq!(sanitize_short_text("<script>alert(1)"), "alert(1)");
    }

    #[test]
    fn test_unterminated_tag_consumes_rest() {
        assert_eq!(sanitize_short_text("keep <a href="), "keep");
    }

    #[test]
    fn test_literal_angle_brackets_survive() {
        assert_eq!(sanitize_short_text("2 < 3"), "2 < 3");
        assert_eq!(sanitize_short_text("<3 forever"), "<3 forever");
    }

    #[test]
    fn test_reassembled_tags_are_removed() {
        // a single stripping pass would leave "<b>" behind here
        assert_eq!(sanitize_short_text("<<a>b>"), "");
        // the first pass reassembles a full script element; the next removes it whole
        assert_eq!(sanitize_short_text("<<b>script>x<</b>/script>"), "");
    }

    #[test]
    fn test_percent_octets_removed() {
        assert_eq!(sanitize_short_text("a%20b"), "ab");
        assert_eq!(sanitize_short_text("%3Cscript%3E"), "script");
        assert_eq!(sanitize_short_text("100% true"), "100% true");
        assert_eq!(sanitize_short_text("%zz"), "%zz");
    }

    #[test]
    fn test_octets_revealed_by_tag_stripping_are_removed() {
        // stripping "<b>" brings "%" and "41" together; the loop catches it
        assert_eq!(sanitize_short_text("%<b>41"), "");
    }

    #[test]
    fn test_control_characters_removed() {
        assert_eq!(sanitize_short_text("a\u{0000}b\u{0001}c"), "abc");
        assert_eq!(sanitize_short_text("x\u{007f}y"), "xy");
    }

    #[test]
    fn test_short_text_collapses_whitespace() {
        assert_eq!(sanitize_short_text("  Hello\t\n  World  "), "Hello World");
        assert_eq!(sanitize_short_text("a\r\nb"), "a b");
    }

    #[test]
    fn test_markup_only_input_becomes_empty() {
        assert_eq!(sanitize_short_text("<script>alert(1)</script>"), "");
        assert_eq!(sanitize_short_text("<br/><hr>"), "");
        assert_eq!(sanitize_short_text("   "), "");
    }

    #[test]
    fn test_long_text_preserves_line_structure() {
        assert_eq!(
            sanitize_long_text("Line one\r\nLine two\n\nLine three"),
            "Line one\nLine two\n\nLine three"
        );
        assert_eq!(sanitize_long_text("a\tb"), "a\tb");
        assert_eq!(sanitize_long_text("wide   gap"), "wide   gap");
    }

    #[test]
    fn test_long_text_strips_tags_and_trims() {
        assert_eq!(
            sanitize_long_text("<p>First</p>\n<p>Second</p>"),
            "First\nSecond"
        );
        assert_eq!(sanitize_long_text("\n\nBody\n"), "Body");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let inputs = [
            "<%61b>",
            "<<a>b>",
            "a   b",
            "%%41",
            "plain",
            "<script>x</script>tail",
            "2 < 3 and <3",
        ];
        for input in inputs {
            let once = sanitize_short_text(input);
            assert_eq!(
                sanitize_short_text(&once),
                once,
                "short-text sanitise not idempotent for {input:?}"
            );

            let once = sanitize_long_text(input);
            assert_eq!(
                sanitize_long_text(&once),
                once,
                "long-text sanitise not idempotent for {input:?}"
            );
        }
    }

    #[test]
    fn test_value_kind_dispatch() {
        assert_eq!(ValueKind::ShortText.as_str(), "short_text");
        assert_eq!(ValueKind::LongText.as_str(), "long_text");
        assert_eq!(ValueKind::ShortText.sanitize("a\nb"), "a b");
        assert_eq!(ValueKind::LongText.sanitize("a\nb"), "a\nb");
    }
}
