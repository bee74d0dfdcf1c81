//! Markdown → HTML for chat turns.

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};

const UNSAFE_SCHEMES: [&str; 3] = ["javascript:", "vbscript:", "data:"];

/// Renders `text` as CommonMark (tables and strikethrough on).
///
/// Raw HTML in the input is emitted as escaped text and link targets with a
/// script-capable scheme are replaced by `#`.
///
/// ```ignore
/// assert_eq!(render_markdown("**x**"), "<p><strong>x</strong></p>\n");
/// ```
pub fn render_markdown(text: &str) -> String {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_STRIKETHROUGH);

    let events = Parser::new_ext(text, opts).map(|ev| match ev {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    });

    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let lower = url.trim_start().to_ascii_lowercase();
    if UNSAFE_SCHEMES.iter().any(|s| lower.starts_with(s)) {
        CowStr::Borrowed("#")
    } else {
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bold_and_lists_render() {
        assert_eq!(render_markdown("**x**"), "<p><strong>x</strong></p>\n");
        let list = render_markdown("Hồ sơ gồm:\n\n- Học bạ\n- CCCD");
        assert!(list.contains("<ul>"));
        assert!(list.contains("<li>Học bạ</li>"));
    }

    #[test]
    fn raw_html_stays_escaped() {
        let block = render_markdown("<script>alert(1)</script>");
        assert!(!block.contains("<script>"));
        assert!(block.contains("&lt;script&gt;"));

        let inline = render_markdown("xem <img src=x onerror=alert(1)> nhé");
        assert!(!inline.contains("<img"));
        assert!(inline.contains("&lt;img"));
    }

    #[test]
    fn script_links_are_neutralised() {
        let html = render_markdown("[bấm](javascript:alert(1)) và [HUS](https://hus.vnu.edu.vn)");
        assert!(!html.contains("javascript:"));
        assert!(html.contains(r##"href="#""##));
        assert!(html.contains(r#"href="https://hus.vnu.edu.vn""#));
    }
}
