use tubemap_common::rules::MediaAlias;
use tubemap_common::CurationRules;

/// Maps channel names and programme mentions onto official media names.
pub struct MediaResolver {
    /// Longest alias first so `생활의 달인` wins over shorter overlaps.
    aliases: Vec<MediaAlias>,
}

impl MediaResolver {
    pub fn new(rules: &CurationRules) -> Self {
        let mut aliases = rules.media.clone();
        aliases.sort_by_key(|a| std::cmp::Reverse(a.alias.chars().count()));
        Self { aliases }
    }

    /// Official name of the first alias mentioned in `text`.
    pub fn detect(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.aliases
            .iter()
            .find(|a| lowered.contains(&a.alias.to_lowercase()))
            .map(|a| a.official.as_str())
    }

    /// Official name detected in the first text that mentions one, else
    /// `fallback` verbatim.
    pub fn resolve(&self, texts: &[&str], fallback: &str) -> String {
        texts
            .iter()
            .find_map(|t| self.detect(t))
            .unwrap_or(fallback.trim())
            .to_string()
    }
}

/// Add `media` to a `|`-delimited media list unless already present.
pub fn merge_media(existing: &str, media: &str) -> String {
    let media = media.trim();
    let mut parts: Vec<&str> = existing
        .split('|')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if !media.is_empty() && !parts.contains(&media) {
        parts.push(media);
    }
    parts.join("|")
}
