use lazy_static::lazy_static;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;

/// Rewrites every relative `href`/`src` attribute in the fragment so it is
/// absolute against the post's permalink. Scheme-qualified, rooted, anchor
/// and mailto/data links are left alone.
pub fn make_links_absolute(html: &str, base_link: &str) -> String {
    lazy_static! {
        static ref LINK_ATTR_REGEX: Regex =
            Regex::new(r#"(?P<attr>href|src)="(?P<url>[^"]*)""#).unwrap();
    }

    let result = LINK_ATTR_REGEX.replace_all(html, |caps: &regex::Captures| {
        let attr = caps.name("attr").map(|a| a.as_str()).unwrap_or("");
        let url = caps.name("url").map(|u| u.as_str()).unwrap_or("");
        if is_absolute(url) {
            caps.get(0).map(|m| m.as_str()).unwrap_or("").to_string()
        } else {
            format!(r#"{}="{}""#, attr, join_url(base_link, url))
        }
    });

    result.to_string()
}

fn is_absolute(url: &str) -> bool {
    url.is_empty()
        || url.starts_with('/')
        || url.starts_with('#')
        || url.contains("://")
        || url.starts_with("mailto:")
        || url.starts_with("data:")
}

/// Resolves `rel` against the directory of `base_link`.
fn join_url(base_link: &str, rel: &str) -> String {
    let mut segments: Vec<&str> = base_link.split('/').collect();
    // Drop the page itself, keep its directory
    segments.pop();
    for piece in rel.split('/') {
        match piece {
            "." => {}
            ".." => {
                if segments.len() > 1 {
                    segments.pop();
                }
            }
            p => segments.push(p),
        }
    }
    segments.join("/")
}

/// Cuts the fragment at the teaser sentinel comment and appends a read-more
/// link to the full post. The sentinel may carry a custom link text after a
/// colon. Without a sentinel the fragment comes back untouched.
pub fn extract_teaser(html: &str, permalink: &str, default_text: &str) -> String {
    lazy_static! {
        static ref TEASER_REGEX: Regex =
            Regex::new(r"(?i)<!--\s*TEASER_END(?::(?P<text>[^>]*?))?\s*-->").unwrap();
    }

    let Some(caps) = TEASER_REGEX.captures(html) else {
        return html.to_string();
    };

    let link_text = caps
        .name("text")
        .map(|t| t.as_str().trim())
        .filter(|t| !t.is_empty())
        .unwrap_or(default_text);

    let cut = caps.get(0).map(|m| m.start()).unwrap_or(html.len());
    let mut teaser = html[..cut].to_string();
    teaser.push_str(&format!(
        "<p><a href=\"{}\">{}</a></p>",
        permalink, link_text
    ));
    teaser
}

/// Reduces an HTML fragment to its trimmed plain-text content.
pub fn strip_html(html: &str) -> String {
    let mut reader = Reader::from_str(html);
    reader.config_mut().check_end_names = false;

    let mut out = String::new();
    loop {
        match reader.read_event() {
            Ok(Event::Text(t)) => match t.unescape() {
                Ok(text) => out.push_str(&text),
                Err(_) => out.push_str(&String::from_utf8_lossy(&t)),
            },
            Ok(Event::CData(t)) => out.push_str(&String::from_utf8_lossy(&t)),
            Ok(Event::Eof) => break,
            // Sloppy markup: keep whatever text was already collected
            Err(_) => break,
            _ => {}
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_links_absolute() {
        let html = r#"<p>See <a href="img/one.png">this</a> and <a href="/rooted.html">that</a>
and <a href="https://example.com/x">there</a>.</p>"#;
        let result = make_links_absolute(html, "/posts/hello.html");
        assert_eq!(result, r#"<p>See <a href="/posts/img/one.png">this</a> and <a href="/rooted.html">that</a>
and <a href="https://example.com/x">there</a>.</p>"#);
    }

    #[test]
    fn test_make_links_absolute_src_and_dotdot() {
        let html = r#"<img src="../shared/pic.jpg">"#;
        let result = make_links_absolute(html, "/posts/hello.html");
        assert_eq!(result, r#"<img src="/shared/pic.jpg">"#);
    }

    #[test]
    fn test_make_links_absolute_keeps_anchors_and_mailto() {
        let html = r##"<a href="#section">jump</a> <a href="mailto:a@b.c">mail</a>"##;
        assert_eq!(make_links_absolute(html, "/posts/p.html"), html);
    }

    #[test]
    fn test_extract_teaser() {
        let html = "<p>One.</p>\n<p>Two.</p>\n<!-- TEASER_END -->\n<p>Hidden.</p>\n";
        let teaser = extract_teaser(html, "/posts/hello.html", "Read more...");
        assert_eq!(
            teaser,
            "<p>One.</p>\n<p>Two.</p>\n<p><a href=\"/posts/hello.html\">Read more...</a></p>"
        );
    }

    #[test]
    fn test_extract_teaser_custom_text_and_case() {
        let html = "<p>One.</p><!--teaser_end: Keep reading --><p>Rest.</p>";
        let teaser = extract_teaser(html, "/p.html", "Read more...");
        assert_eq!(
            teaser,
            "<p>One.</p><p><a href=\"/p.html\">Keep reading</a></p>"
        );
    }

    #[test]
    fn test_extract_teaser_without_marker_keeps_content() {
        let html = "<p>One.</p><p>Two.</p>";
        assert_eq!(extract_teaser(html, "/p.html", "Read more..."), html);
    }

    #[test]
    fn test_strip_html() {
        let html = "<p>One <strong>bold</strong>.</p>\n<p>Two &amp; three.</p>";
        assert_eq!(strip_html(html), "One bold.\nTwo & three.");
    }

    #[test]
    fn test_strip_html_resolves_entity_references() {
        let html = "<p>Fish &amp; chips &#8211; from &#x43;openhagen</p>";
        assert_eq!(strip_html(html), "Fish & chips \u{2013} from Copenhagen");
    }

    #[test]
    fn test_strip_html_ignores_comments() {
        let html = " <p>Before.</p><!-- TEASER_END --><p>After.</p> ";
        assert_eq!(strip_html(html), "Before.After.");
    }
}
