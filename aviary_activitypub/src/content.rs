//! HTML handling for federated content
use std::collections::HashSet;
use std::iter::FromIterator;

use ammonia::{Builder, UrlRelative};
use html2text::{
    from_read_with_decorator,
    render::text_renderer::TrivialDecorator,
};

// https://docs.rs/ammonia/3.3.0/ammonia/struct.Builder.html#method.url_schemes
const URI_SCHEMES: [&str; 7] = [
    "bitcoin",
    "gemini",
    "http",
    "https",
    "magnet",
    "mailto",
    "xmpp",
];

const BASIC_TAGS: [&str; 16] = [
    "a", "b", "blockquote", "br", "code", "del", "em", "i",
    "li", "ol", "p", "pre", "span", "strong", "u", "ul",
];

/// Sanitizes outgoing HTML with a tag allowlist.
/// Script and style elements are removed with their contents,
/// event handler attributes and unsafe URL schemes are dropped.
pub fn sanitize_html(unsafe_html: &str) -> String {
    let allowed_tags = HashSet::from_iter(BASIC_TAGS.iter().copied());
    Builder::default()
        .tags(allowed_tags)
        .url_schemes(URI_SCHEMES.into())
        .link_rel(Some("noopener"))
        .url_relative(UrlRelative::Deny)
        .clean(unsafe_html)
        .to_string()
}

/// Converts remote HTML to plain text, turning block boundaries and
/// line breaks into newlines
pub fn html_to_text(html: &str) -> String {
    let decorator = TrivialDecorator::new();
    from_read_with_decorator(html.as_bytes(), usize::MAX, decorator)
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_text() {
        let html = "<p>Hello <b>world</b></p><p>Second &amp; last</p>";
        assert_eq!(html_to_text(html), "Hello world\n\nSecond & last");
    }

    #[test]
    fn test_html_to_text_line_breaks() {
        let html = "<p>one<br>two<br/>three</p>";
        assert_eq!(html_to_text(html), "one\ntwo\nthree");
    }

    #[test]
    fn test_sanitize_html_strips_script() {
        let html = r#"<p>hi</p><script>alert("x")</script>"#;
        assert_eq!(sanitize_html(html), "<p>hi</p>");
    }

    #[test]
    fn test_sanitize_html_strips_broken_nesting() {
        // The classic filter-evasion payload: no script element may
        // survive, only inert escaped text
        let html = "<p><scr<script>ipt>alert(1)</scr</script>ipt></p>";
        let safe_html = sanitize_html(html);
        assert_eq!(safe_html.contains("<script"), false);
        assert_eq!(safe_html.contains("</script"), false);
    }

    #[test]
    fn test_sanitize_html_strips_event_handlers() {
        let html = r#"<a href="https://ok.example" onclick="evil()">link</a>"#;
        assert_eq!(
            sanitize_html(html),
            r#"<a href="https://ok.example" rel="noopener">link</a>"#,
        );
    }

    #[test]
    fn test_sanitize_html_strips_javascript_urls() {
        let html = r#"<a href="javascript:evil()">link</a>"#;
        assert_eq!(sanitize_html(html), r#"<a rel="noopener">link</a>"#);
    }

    #[test]
    fn test_sanitize_html_strips_iframe() {
        let html = r#"<p>before</p><iframe src="https://evil.example"></iframe>"#;
        assert_eq!(sanitize_html(html), "<p>before</p>");
    }

    #[test]
    fn test_sanitize_html_keeps_formatting() {
        let html = "<p><strong>bold</strong> and <code>code</code></p>";
        assert_eq!(sanitize_html(html), html);
    }
}
