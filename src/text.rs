//! Escaping of user-supplied comment text for HTML embedding.

/// Escapes the five HTML-significant characters, turns newlines into `<br>`
/// and keeps runs of spaces visible by replacing every pair of spaces with a
/// regular space followed by `&nbsp;`.
///
/// Not idempotent: the output of a previous call gets escaped again. Apply it
/// once, when rendering, and store the raw text.
pub fn render_text(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len() + raw.len() / 8);
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            '\n' => escaped.push_str("<br>"),
            _ => escaped.push(ch),
        }
    }

    // Pairs are consumed left to right, so three spaces become " &nbsp; ".
    escaped.replace("  ", " &nbsp;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_and_preserves_whitespace() {
        let rendered = render_text("<b>hi</b>\n  ok");
        assert_eq!(rendered, "&lt;b&gt;hi&lt;/b&gt;<br> &nbsp;ok");
        let without_breaks = rendered.replace("<br>", "");
        assert!(!without_breaks.contains('<'));
        assert!(!without_breaks.contains('>'));
    }

    #[test]
    fn escapes_quotes_and_ampersands() {
        assert_eq!(
            render_text(r#"Tom & "Jerry's""#),
            "Tom &amp; &quot;Jerry&#039;s&quot;"
        );
    }

    #[test]
    fn odd_space_runs() {
        assert_eq!(render_text("a   b"), "a &nbsp; b");
        assert_eq!(render_text("a    b"), "a &nbsp; &nbsp;b");
    }

    #[test]
    fn double_escapes_on_second_pass() {
        let once = render_text("a & b");
        assert_eq!(render_text(&once), "a &amp;amp; b");
    }

    #[test]
    fn empty_input() {
        assert_eq!(render_text(""), "");
    }
}
