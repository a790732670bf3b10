//! Markup cleaning for content-change consumers.
//!
//! Engines serialize with presentation attributes (theme classes, layout
//! direction, inline styles). Consumers receive the markup with those
//! removed and must not rely on any of them surviving.

use std::sync::LazyLock;

use regex::Regex;

static CLASS_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\s*class="[^"]*""#).expect("class attribute pattern"));
static STYLE_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\s*style="[^"]*""#).expect("style attribute pattern"));
static BLOCK_ATTRS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(h[1-6]|p|ul|ol|li)(\s[^>]*)?>").expect("block attribute pattern")
});
static TAG_TRAILING_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([a-z][a-z0-9]*)([^<>]*?)\s+>").expect("tag spacing pattern"));

/// Strip presentation attributes from engine markup.
///
/// Removes `class` and `style` everywhere and every attribute on block
/// tags (`h1`..`h6`, `p`, `ul`, `ol`, `li`). Link `href`/`target`/`rel`
/// survive.
pub fn clean_markup(markup: &str) -> String {
    let out = CLASS_ATTR.replace_all(markup, "");
    let out = STYLE_ATTR.replace_all(&out, "");
    let out = BLOCK_ATTRS.replace_all(&out, "<$1>");
    TAG_TRAILING_SPACE.replace_all(&out, "<$1$2>").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_attributes_are_removed() {
        let input = r#"<h2 dir="ltr" class="editor-heading-h2"><span>Title</span></h2><ol class="editor-list-ol"><li value="1" dir="ltr" class="editor-listitem"><span>one</span></li></ol>"#;
        assert_eq!(
            clean_markup(input),
            "<h2><span>Title</span></h2><ol><li><span>one</span></li></ol>"
        );
    }

    #[test]
    fn test_link_keeps_href_and_target() {
        let input = r#"<p dir="ltr"><a href="https://example.com" target="_blank" rel="noreferrer" class="editor-link"><span style="white-space: pre-wrap;">Example</span></a></p>"#;
        assert_eq!(
            clean_markup(input),
            r#"<p><a href="https://example.com" target="_blank" rel="noreferrer"><span>Example</span></a></p>"#
        );
    }

    #[test]
    fn test_inline_classes_are_removed() {
        let input = r#"<p><strong class="editor-text-bold">bold</strong> <em class="editor-text-italic">it</em></p>"#;
        assert_eq!(
            clean_markup(input),
            "<p><strong>bold</strong> <em>it</em></p>"
        );
    }

    #[test]
    fn test_similar_tag_names_are_left_alone() {
        let input = r#"<pre data-x="1">code</pre><param name="p">"#;
        assert_eq!(clean_markup(input), input);
    }

    #[test]
    fn test_attribute_text_in_content_survives() {
        assert_eq!(clean_markup("<p>class=x</p>"), "<p>class=x</p>");
    }
}
