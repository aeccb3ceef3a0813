//! Free-text cleanup shared by the builder, the payload encoder and diagnostics

/// Tags that separate words when rendered
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "tr", "td", "th", "table", "h1", "h2", "h3", "h4",
    "h5", "h6",
];

/// Remove every `<...>` tag. Block tags leave a space behind, inline tags
/// leave nothing. An unterminated `<` is kept as text.
fn strip_tags(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('<') {
        match rest[start..].find('>') {
            Some(len) => {
                out.push_str(&rest[..start]);
                if is_block_tag(&rest[start + 1..start + len]) {
                    out.push(' ');
                }
                rest = &rest[start + len + 1..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

/// `inner` is the text between `<` and `>`, e.g. `/p` or `br /`
fn is_block_tag(inner: &str) -> bool {
    let name: String = inner
        .trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    BLOCK_TAGS.contains(&name.as_str())
}

/// Normalize a free-text cell.
///
/// Strips markup tags, decodes the common entity escapes, collapses runs of
/// whitespace into a single space and trims. Absent input yields an empty
/// string.
pub fn normalize_text(value: Option<&str>) -> String {
    let Some(raw) = value else {
        return String::new();
    };

    let stripped = strip_tags(raw);
    // &amp; last, so "&amp;lt;" stays a literal "&lt;"
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escape the five XML special characters
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Truncate to at most `max_chars` characters, adding "..." if truncated.
///
/// Counts characters rather than bytes so response bodies with multi-byte
/// text never split a code point.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_absent() {
        assert_eq!(normalize_text(None), "");
        assert_eq!(normalize_text(Some("   ")), "");
    }

    #[test]
    fn test_normalize_strips_tags() {
        assert_eq!(
            normalize_text(Some("<div><p>Visit <b>date</b></p></div>")),
            "Visit date"
        );
    }

    #[test]
    fn test_inline_tags_leave_no_gap() {
        assert_eq!(
            normalize_text(Some("<b>Age</b>: must be &lt; 18")),
            "Age: must be < 18"
        );
        assert_eq!(normalize_text(Some("Visit<span>Date</span>")), "VisitDate");
    }

    #[test]
    fn test_block_tags_separate_words() {
        assert_eq!(normalize_text(Some("Line one<br/>Line two")), "Line one Line two");
        assert_eq!(normalize_text(Some("<P>First</P><P>Second</P>")), "First Second");
        assert_eq!(normalize_text(Some("<li>a</li><LI>b</LI>")), "a b");
    }

    #[test]
    fn test_normalize_keeps_unterminated_angle() {
        assert_eq!(normalize_text(Some("age < 18")), "age < 18");
    }

    #[test]
    fn test_normalize_decodes_entities() {
        assert_eq!(
            normalize_text(Some("a&nbsp;&lt;&gt;&quot;&#39;&amp;b")),
            "a <>\"'&b"
        );
        assert_eq!(normalize_text(Some("&amp;lt;")), "&lt;");
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(
            normalize_text(Some("  Must be\n\n  after\tconsent  ")),
            "Must be after consent"
        );
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b & 'c' > \"d\""), "a&lt;b &amp; &apos;c&apos; &gt; &quot;d&quot;");
        assert_eq!(escape_xml(""), "");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("ééééé", 4), "é...");
    }
}
