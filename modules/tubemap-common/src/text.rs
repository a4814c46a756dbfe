//! Text normalisation shared by the scorer, selector and extractor.

use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static SYMBOL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s.,!?]").expect("valid regex"));
static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Remove HTML tags and decode the handful of entities providers emit.
pub fn strip_markup(text: &str) -> String {
    let without_tags = TAG_RE.replace_all(text, "");
    without_tags
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Strip markup, drop emoji and other non-linguistic symbols, collapse
/// whitespace.
pub fn clean_text(text: &str) -> String {
    let plain = strip_markup(text);
    let no_symbols = SYMBOL_RE.replace_all(&plain, "");
    SPACE_RE.replace_all(&no_symbols, " ").trim().to_string()
}

/// True when the text contains at least one Hangul syllable.
pub fn has_hangul(text: &str) -> bool {
    text.chars().any(|c| ('\u{AC00}'..='\u{D7A3}').contains(&c))
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// First `n` characters (not bytes) of `text`.
pub fn char_prefix(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_markup_removes_bold_tags_and_entities() {
        assert_eq!(
            strip_markup("<b>명동교자</b> &quot;칼국수&quot; &amp; 만두"),
            "명동교자 \"칼국수\" & 만두"
        );
    }

    #[test]
    fn clean_text_drops_emoji_and_collapses_whitespace() {
        assert_eq!(clean_text("진짜   맛있어요 😋👍\n최고!"), "진짜 맛있어요 최고!");
    }

    #[test]
    fn hangul_detection() {
        assert!(has_hangul("great 맛집"));
        assert!(!has_hangul("great food"));
    }

    #[test]
    fn char_prefix_respects_multibyte_boundaries() {
        assert_eq!(char_prefix("명동교자", 3), "명동교");
        assert_eq!(char_prefix("명동", 3), "명동");
    }
}
