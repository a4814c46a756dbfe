//! Evidence relevance scoring.
//!
//! A score is an additive sum of rule hits for one evidence item against a
//! target venue. All point values and thresholds come from
//! [`ScoringRules`]. [`RelevanceScorer::best_evidence`] runs the adaptive
//! query sequence against an evidence source and keeps the best item.

use regex::Regex;
use tracing::{debug, warn};

use evidence_client::EvidenceError;
use tubemap_common::rules::ScoringRules;
use tubemap_common::text::{char_len, char_prefix, strip_markup};
use tubemap_common::{ConfigError, CurationRules, EvidenceItem, SortOrder, VenueRecord};

use crate::traits::{EvidenceResult, EvidenceSource};

const RESULTS_PER_QUERY: usize = 10;
const MIN_KEYWORD_CHARS: usize = 2;
const DESCRIPTION_KEYWORD_CHARS: usize = 10;

/// The venue an evidence item is scored against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreTarget {
    pub name: String,
    /// Menu or category keyword, e.g. `평양냉면`.
    pub keyword: String,
    /// Standard category group, e.g. `한식`.
    pub category: String,
    /// District (optionally prefixed with the city) used to localise queries.
    pub locale: String,
}

impl ScoreTarget {
    /// Target for re-scoring an existing record. The keyword is the first
    /// item after a `:` in the description, or its first few characters.
    pub fn for_record(record: &VenueRecord) -> Self {
        let keyword = match record.description.split_once(':') {
            Some((_, rest)) => rest.split(',').next().unwrap_or("").trim().to_string(),
            None => char_prefix(&record.description, DESCRIPTION_KEYWORD_CHARS)
                .trim()
                .to_string(),
        };
        let mut parts = vec![record.address_city.as_str(), record.locale()];
        parts.retain(|s| !s.is_empty());
        parts.dedup();
        let locale = parts.join(" ");
        Self {
            name: record.name.clone(),
            keyword,
            category: record.category.clone(),
            locale,
        }
    }

    fn tokens(&self) -> impl Iterator<Item = &str> {
        self.keyword
            .split(|c: char| c.is_whitespace() || c == ',')
            .chain(std::iter::once(self.category.as_str()))
            .map(str::trim)
            .filter(|t| char_len(t) >= MIN_KEYWORD_CHARS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    Verified,
    Acceptable,
    Low,
}

impl ConfidenceBand {
    pub fn from_score(score: i32, rules: &ScoringRules) -> Self {
        if score >= rules.verified {
            ConfidenceBand::Verified
        } else if score >= rules.acceptable {
            ConfidenceBand::Acceptable
        } else {
            ConfidenceBand::Low
        }
    }
}

/// Best item found by an adaptive search, with its decayed score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEvidence {
    pub item: EvidenceItem,
    pub score: i32,
    pub query_index: usize,
}

pub struct RelevanceScorer {
    rules: ScoringRules,
    listicle: Vec<Regex>,
}

impl RelevanceScorer {
    pub fn new(rules: &CurationRules) -> Result<Self, ConfigError> {
        let listicle = rules
            .scoring
            .listicle_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| ConfigError::Pattern {
                    pattern: p.clone(),
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            rules: rules.scoring.clone(),
            listicle,
        })
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    pub fn band(&self, score: i32) -> ConfidenceBand {
        ConfidenceBand::from_score(score, &self.rules)
    }

    /// Undecayed score of one item.
    pub fn score(&self, item: &EvidenceItem, target: &ScoreTarget) -> i32 {
        let r = &self.rules;
        let title = strip_markup(&item.title);
        let snippet = strip_markup(&item.snippet);
        let name = target.name.trim();
        let mut score = 0;

        let name_in_title = !name.is_empty() && title.contains(name);
        if name_in_title {
            score += r.exact_name;
        } else if char_len(name) >= r.partial_name_chars
            && title.contains(char_prefix(name, r.partial_name_chars))
        {
            score += r.partial_name;
        }

        if target
            .tokens()
            .any(|t| title.contains(t) || snippet.contains(t))
        {
            score += r.menu_token;
        }

        let host = link_host(&item.link);
        if r.trusted_domains.iter().any(|d| host_matches(&host, d)) {
            score += r.trusted_domain;
        }
        if r.blocked_hosts.iter().any(|b| host.contains(b.as_str())) {
            score += r.blocked_host;
        }

        if r.visual_anchor_terms.iter().any(|t| title.contains(t.as_str())) {
            score += r.visual_anchor;
        }

        let commercial_hits: usize = r
            .commercial_terms
            .iter()
            .map(|t| title.matches(t.as_str()).count() + snippet.matches(t.as_str()).count())
            .sum();
        score += r.commercial * commercial_hits as i32;

        if r.unrelated_terms.iter().any(|t| title.contains(t.as_str())) {
            score += r.unrelated;
        }

        let listicle = r.listicle_terms.iter().any(|t| title.contains(t.as_str()))
            || self.listicle.iter().any(|re| re.is_match(&title));
        if listicle {
            score += if name_in_title {
                r.listicle_with_name
            } else {
                r.listicle
            };
        }

        if let (Some(w), Some(h)) = (item.width, item.height) {
            if w < r.min_width || h < r.min_height {
                score += r.low_resolution;
            }
            if w > r.high_resolution_width {
                score += r.high_resolution;
            }
        }

        score
    }

    /// Score with the per-retry decay for the `query_index`th query.
    pub fn score_at(&self, item: &EvidenceItem, target: &ScoreTarget, query_index: usize) -> i32 {
        self.score(item, target) - self.rules.retry_decay * query_index as i32
    }

    /// Progressively broader image queries for `target`.
    pub fn queries(&self, target: &ScoreTarget) -> Vec<String> {
        let join = |parts: &[&str]| {
            parts
                .iter()
                .map(|p| p.trim())
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        };
        vec![
            join(&[
                target.name.as_str(),
                target.locale.as_str(),
                target.keyword.as_str(),
                "대표사진",
            ]),
            join(&[target.name.as_str(), target.locale.as_str(), "맛집 음식"]),
            join(&[target.name.as_str(), target.category.as_str(), "대표이미지"]),
        ]
    }

    /// Run the adaptive query sequence and return the best-scoring item.
    ///
    /// Stops early once the running best reaches the early-exit threshold.
    /// A failing query is skipped; `Err` only when every query failed.
    /// `Ok(None)` means the source returned nothing at all.
    pub async fn best_evidence(
        &self,
        source: &dyn EvidenceSource,
        target: &ScoreTarget,
    ) -> EvidenceResult<Option<ScoredEvidence>> {
        let mut best: Option<ScoredEvidence> = None;
        let mut last_error: Option<EvidenceError> = None;
        let mut any_ok = false;

        for (i, query) in self.queries(target).iter().enumerate() {
            let items = match source.query(query, SortOrder::Relevance, RESULTS_PER_QUERY).await {
                Ok(items) => items,
                Err(e) => {
                    warn!(source = source.name(), query = %query, error = %e, "Evidence query failed");
                    last_error = Some(e);
                    continue;
                }
            };
            any_ok = true;

            for item in items {
                let score = self.score_at(&item, target, i);
                if best.as_ref().map_or(true, |b| score > b.score) {
                    best = Some(ScoredEvidence {
                        item,
                        score,
                        query_index: i,
                    });
                }
            }

            if best.as_ref().is_some_and(|b| b.score >= self.rules.early_exit) {
                break;
            }
        }

        match (any_ok, last_error) {
            (false, Some(e)) => Err(e),
            _ => {
                debug!(
                    name = %target.name,
                    score = best.as_ref().map(|b| b.score),
                    "Adaptive search finished"
                );
                Ok(best)
            }
        }
    }
}

fn link_host(link: &str) -> String {
    url::Url::parse(link)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_else(|| link.to_lowercase())
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{domain}"))
}
