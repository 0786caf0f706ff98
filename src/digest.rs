//! Digest rendering.
//!
//! Turns feed entries into the Telegram HTML message body:
//!
//! ```text
//! 1) <b>title</b>
//! <a href="https://...">link</a>
//!
//! 2) <b>title</b>
//! ...
//! ```

use crate::feed::FeedEntry;

/// Bold tags an upstream title may already carry.
const BOLD_TAGS: [&str; 4] = ["<b>", "</b>", "<B>", "</B>"];

/// Entities Telegram's HTML mode understands by name.
const NAMED_ENTITIES: [&str; 4] = ["lt", "gt", "amp", "quot"];

/// Render entries as a numbered digest starting at 1.
///
/// An empty slice renders as an empty string.
pub fn render_digest(entries: &[FeedEntry]) -> String {
    let mut out = String::new();

    for (n, entry) in entries.iter().enumerate() {
        let title = escape_text(&strip_bold(&entry.title));
        out.push_str(&format!("{}) <b>{}</b>\n", n + 1, title));
        if !entry.link.is_empty() {
            out.push_str(&format!(
                "<a href=\"{}\">link</a>\n",
                escape_attr(&entry.link)
            ));
        }
        out.push('\n');
    }

    out
}

/// Render one digest per feed and concatenate them; numbering restarts for each feed.
pub fn render_sections(sections: &[Vec<FeedEntry>]) -> String {
    sections.iter().map(|s| render_digest(s)).collect()
}

/// Remove bold markup so the digest's own `<b>` is never nested.
fn strip_bold(title: &str) -> String {
    BOLD_TAGS
        .iter()
        .fold(title.to_string(), |acc, tag| acc.replace(tag, ""))
}

/// Escape text for Telegram HTML, leaving entities that are already valid alone.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, ch) in text.char_indices() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' if starts_entity(&text[i + 1..]) => out.push('&'),
            '&' => out.push_str("&amp;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

/// Whether `rest` (the text after an `&`) begins with a complete entity.
fn starts_entity(rest: &str) -> bool {
    let Some(end) = rest.find(';') else {
        return false;
    };
    let body = &rest[..end];

    if let Some(num) = body.strip_prefix('#') {
        return match num.strip_prefix(['x', 'X']) {
            Some(hex) => !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()),
            None => !num.is_empty() && num.chars().all(|c| c.is_ascii_digit()),
        };
    }

    NAMED_ENTITIES.contains(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_digest() {
        assert_eq!(render_digest(&[]), "");
        assert_eq!(render_sections(&[]), "");
        assert_eq!(render_sections(&[vec![], vec![]]), "");
    }

    #[test]
    fn test_single_entry() {
        let digest = render_digest(&[FeedEntry::new("X", "http://a")]);

        assert_eq!(digest, "1) <b>X</b>\n<a href=\"http://a\">link</a>\n\n");
        assert_eq!(digest.matches("1) ").count(), 1);
        assert_eq!(digest.matches("http://a").count(), 1);
    }

    #[test]
    fn test_numbering_and_separation() {
        let digest = render_digest(&[
            FeedEntry::new("First", "http://1"),
            FeedEntry::new("Second", "http://2"),
        ]);

        let blocks: Vec<&str> = digest.trim_end().split("\n\n").collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].starts_with("1) <b>First</b>"));
        assert!(blocks[1].starts_with("2) <b>Second</b>"));
    }

    #[test]
    fn test_embedded_bold_is_stripped() {
        let digest = render_digest(&[FeedEntry::new("<b>Z</b>", "u")]);
        assert!(digest.starts_with("1) <b>Z</b>\n"));
        assert_eq!(digest.matches("<b>").count(), 1);
        assert_eq!(digest.matches("</b>").count(), 1);

        let digest = render_digest(&[FeedEntry::new("New <b>Pixel</b> phone", "u")]);
        assert!(digest.starts_with("1) <b>New Pixel phone</b>\n"));
    }

    #[test]
    fn test_title_escaping() {
        let digest = render_digest(&[FeedEntry::new("A & B <i>c</i> &amp; &#39;d&#39;", "u")]);
        assert!(digest.starts_with("1) <b>A &amp; B &lt;i&gt;c&lt;/i&gt; &amp; &#39;d&#39;</b>\n"));
    }

    #[test]
    fn test_link_escaping() {
        let digest = render_digest(&[FeedEntry::new("t", "https://x.test/?a=1&b=\"2\"")]);
        assert!(digest.contains("<a href=\"https://x.test/?a=1&amp;b=&quot;2&quot;\">link</a>"));
    }

    #[test]
    fn test_entry_without_link() {
        assert_eq!(render_digest(&[FeedEntry::new("t", "")]), "1) <b>t</b>\n\n");
    }

    #[test]
    fn test_sections_restart_numbering() {
        let digest = render_sections(&[
            vec![FeedEntry::new("a", "u1"), FeedEntry::new("b", "u2")],
            vec![FeedEntry::new("c", "u3")],
        ]);
        assert_eq!(digest.matches("1) ").count(), 2);
        assert_eq!(digest.matches("2) ").count(), 1);
        assert!(digest.find("<b>a</b>").unwrap() < digest.find("<b>c</b>").unwrap());
    }

    #[test]
    fn test_starts_entity() {
        assert!(starts_entity("amp; rest"));
        assert!(starts_entity("#39;"));
        assert!(starts_entity("#x1F600;"));
        assert!(!starts_entity("nbsp;"));
        assert!(!starts_entity("#;"));
        assert!(!starts_entity(" B"));
    }
}
