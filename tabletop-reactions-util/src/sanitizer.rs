use ammonia::Builder;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// Sanitize reaction text that may carry light markup.
///
/// Allowed tags: b, i, u, em, strong, br. No attributes survive, so links,
/// event handlers and embedded media are all dropped along with script and
/// style content.
pub fn sanitize_html(html: &str) -> String {
  let allowed_tags: HashSet<&str> = ["b", "i", "u", "em", "strong", "br"].into_iter().collect();

  Builder::default()
    .tags(allowed_tags)
    .link_rel(None)
    .generic_attributes(HashSet::new())
    .tag_attributes(Default::default())
    .clean(html)
    .to_string()
}

/// Strip all tags, returning plain text with common entities decoded.
pub fn strip_html(html: &str) -> String {
  let without_tags = ANY_TAG.replace_all(html, "");
  decode_entities(&without_tags)
}

/// Plain, single-line text safe to put on a card.
pub fn display_text(raw: &str) -> String {
  let plain = strip_html(&sanitize_html(raw));
  plain.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
  text
    .replace("&lt;", "<")
    .replace("&gt;", ">")
    .replace("&quot;", "\"")
    .replace("&#39;", "'")
    .replace("&#x27;", "'")
    .replace("&#x2F;", "/")
    .replace("&#47;", "/")
    .replace("&nbsp;", " ")
    .replace("&amp;", "&") // last, so `&amp;lt;` stays `&lt;`
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_preserves_allowed_tags() {
    let input = "<b>bold</b> <i>italic</i> <u>underline</u>";
    assert_eq!(sanitize_html(input), input);
  }

  #[test]
  fn test_removes_script_and_style() {
    let output = sanitize_html("nods<script>alert('x')</script><style>p{}</style>");
    assert!(!output.contains("script"));
    assert!(!output.contains("alert"));
    assert!(!output.contains("p{}"));
    assert!(output.contains("nods"));
  }

  #[test]
  fn test_removes_links_and_images() {
    let output = sanitize_html(r#"<a href="https://example.com">look</a><img src="x.png">"#);
    assert!(!output.contains("<a"));
    assert!(!output.contains("<img"));
    assert!(output.contains("look"));
  }

  #[test]
  fn test_removes_event_handlers() {
    let output = sanitize_html(r#"<b onclick="alert(1)">hey</b>"#);
    assert_eq!(output, "<b>hey</b>");
  }

  #[test]
  fn test_strip_html_decodes_entities() {
    assert_eq!(strip_html("<b>Tom &amp; Jerry</b>"), "Tom & Jerry");
    assert_eq!(strip_html("&amp;lt;"), "&lt;");
  }

  #[test]
  fn test_display_text() {
    assert_eq!(display_text("  <b>rolls</b>\n a   nat 20<script>x</script> "), "rolls a nat 20");
    assert_eq!(display_text("5 < 10"), "5 < 10");
    assert_eq!(display_text("approves."), "approves.");
  }
}
