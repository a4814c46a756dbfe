use tracing::debug;

use tubemap_common::rules::ReviewRules;
use tubemap_common::text::{char_len, clean_text, has_hangul};
use tubemap_common::{CurationRules, EvidenceItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionSource {
    /// Short comment from the source video.
    PrimaryReview,
    /// Blog snippet.
    SecondaryReview,
    Template,
    CategoryLabel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description {
    pub text: String,
    pub source: DescriptionSource,
}

/// What the selector knows about the venue being described.
#[derive(Debug, Clone, Default)]
pub struct DescriptionContext<'a> {
    pub name: &'a str,
    pub category: &'a str,
    pub region: &'a str,
}

pub struct DescriptionSelector {
    rules: ReviewRules,
}

impl DescriptionSelector {
    pub fn new(rules: &CurationRules) -> Self {
        Self {
            rules: rules.review.clone(),
        }
    }

    /// Pick one description: primary review, then secondary review, then a
    /// template, then the bare category label. `None` only when even the
    /// category label is empty.
    pub fn select(
        &self,
        primary: &[EvidenceItem],
        secondary: &[EvidenceItem],
        ctx: &DescriptionContext<'_>,
    ) -> Option<Description> {
        if let Some(text) = primary.iter().find_map(|item| self.primary_text(item, ctx)) {
            return Some(Description {
                text,
                source: DescriptionSource::PrimaryReview,
            });
        }
        if let Some(text) = secondary.iter().find_map(|item| self.secondary_text(item)) {
            return Some(Description {
                text,
                source: DescriptionSource::SecondaryReview,
            });
        }

        debug!(name = ctx.name, "No usable review text, falling back to template");
        if let Some(text) = self.template(ctx) {
            return Some(Description {
                text,
                source: DescriptionSource::Template,
            });
        }
        let label = ctx.category.trim();
        (!label.is_empty()).then(|| Description {
            text: label.to_string(),
            source: DescriptionSource::CategoryLabel,
        })
    }

    fn primary_text(&self, item: &EvidenceItem, ctx: &DescriptionContext<'_>) -> Option<String> {
        let text = clean_text(&item.snippet);
        let len = char_len(&text);
        if len < self.rules.primary_min_chars || len > self.rules.primary_max_chars {
            return None;
        }
        if !has_hangul(&text) {
            return None;
        }

        let names_venue = ctx
            .name
            .split_whitespace()
            .filter(|w| char_len(w) >= 2)
            .any(|w| text.contains(w));
        let names_category = !ctx.category.is_empty() && text.contains(ctx.category);
        let sentiment = self
            .rules
            .food_terms
            .iter()
            .chain(self.rules.positive_terms.iter())
            .any(|t| text.contains(t.as_str()));

        (names_venue || names_category || sentiment).then_some(text)
    }

    fn secondary_text(&self, item: &EvidenceItem) -> Option<String> {
        let text = clean_text(&item.snippet);
        let len = char_len(&text);
        let in_band = len >= self.rules.secondary_min_chars && len <= self.rules.secondary_max_chars;
        (in_band && has_hangul(&text)).then_some(text)
    }

    /// Deterministic for a given name: the template index is the sum of the
    /// name's code points modulo the template count. Templates that need a
    /// region are skipped when none is known.
    fn template(&self, ctx: &DescriptionContext<'_>) -> Option<String> {
        let templates = &self.rules.templates;
        if templates.is_empty() || ctx.category.trim().is_empty() {
            return None;
        }
        let start = ctx.name.chars().map(|c| c as usize).sum::<usize>() % templates.len();
        (0..templates.len())
            .map(|offset| &templates[(start + offset) % templates.len()])
            .find(|t| !ctx.region.is_empty() || !t.contains("{region}"))
            .map(|t| {
                t.replace("{category}", ctx.category)
                    .replace("{region}", ctx.region)
            })
    }
}
