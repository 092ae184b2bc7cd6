use std::collections::{HashMap, HashSet};

use pulldown_cmark::{Event, Options, Parser};

/// Render puzzle prose to sanitized HTML.
///
/// Single newlines are kept as line breaks; riddles are laid out line by line.
#[must_use]
pub fn markdown_to_html(input: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);

    let parser = Parser::new_ext(input, options).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, parser);
    sanitize_html(&html)
}

#[must_use]
pub fn sanitize_html(html: &str) -> String {
    let tags: HashSet<&str> = [
        "p", "br", "em", "strong", "del", "code", "pre", "blockquote", "ul", "ol", "li", "a",
        "table", "thead", "tbody", "tr", "th", "td",
    ]
    .into_iter()
    .collect();

    let mut attributes: HashMap<&str, HashSet<&str>> = HashMap::new();
    attributes.insert("a", ["href"].into_iter().collect());

    ammonia::Builder::new()
        .tags(tags)
        .tag_attributes(attributes)
        .clean(html)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::{markdown_to_html, sanitize_html};

    #[test]
    fn markdown_to_html_sanitizes_links() {
        let html = markdown_to_html("[Link](javascript:alert(1))");
        assert!(html.contains("Link"));
        assert!(!html.contains("javascript:"));
    }

    #[test]
    fn tables_survive_sanitizing() {
        let html = markdown_to_html("| Row | X |\n|-----|---|\n| 1C | 11 |");
        assert!(html.contains("<table>"), "{html}");
        assert!(html.contains("<td>1C</td>"), "{html}");
    }

    #[test]
    fn riddle_lines_keep_their_breaks() {
        let html = markdown_to_html("alive and dead.\nSum the letters");
        assert!(html.contains("<br>"), "{html}");
    }

    #[test]
    fn morse_stays_in_code_span() {
        let html = markdown_to_html("`-.-. -.--`");
        assert!(html.contains("<code>-.-. -.--</code>"), "{html}");
    }

    #[test]
    fn scripts_are_stripped() {
        let html = sanitize_html("<p>ok</p><script>alert(1)</script><img src=x>");
        assert_eq!(html, "<p>ok</p>");
    }
}
