use std::collections::HashSet;

use thiserror::Error;
use tracing::info;

use tubemap_common::rules::{CategoryRules, NameRules};
use tubemap_common::{Candidate, CatalogKey, CurationRules, PlaceMatch};

/// Keys already in the catalog or accepted earlier in the run.
pub type SeenKeys = HashSet<CatalogKey>;

/// A candidate together with the place resolver's ranked matches for it.
#[derive(Debug, Clone)]
pub struct ResolvedPlace {
    pub candidate: Candidate,
    pub matches: Vec<PlaceMatch>,
}

/// Why a candidate was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("category not admissible: {0}")]
    Category(String),

    #[error("franchise or generic name token: {0}")]
    Franchise(String),

    #[error("ambiguous branch among {0} matches")]
    BranchAmbiguous(usize),

    #[error("already catalogued: {0}")]
    Duplicate(CatalogKey),

    #[error("place lookup returned no match")]
    NotFound,

    #[error("transient collaborator failure: {0}")]
    Transient(String),
}

impl Rejection {
    /// Stable reason code for run stats and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::Category(_) => "category",
            Rejection::Franchise(_) => "franchise",
            Rejection::BranchAmbiguous(_) => "branch_ambiguous",
            Rejection::Duplicate(_) => "duplicate",
            Rejection::NotFound => "not_found",
            Rejection::Transient(_) => "transient",
        }
    }
}

/// Hard filters applied before any evidence is scored. First failure wins:
/// category, franchise, branch ambiguity, duplicate key.
pub struct CandidateValidator {
    categories: CategoryRules,
    names: NameRules,
    blocked_tokens: Vec<String>,
}

impl CandidateValidator {
    pub fn new(rules: &CurationRules) -> Self {
        let blocked_tokens = rules
            .names
            .franchise
            .iter()
            .chain(rules.names.generic.iter())
            .map(|t| t.to_lowercase())
            .collect();
        Self {
            categories: rules.categories.clone(),
            names: rules.names.clone(),
            blocked_tokens,
        }
    }

    /// Pick the single match this candidate refers to, or say why not.
    /// Reads `seen` only; identical inputs always yield the same decision.
    pub fn validate(&self, place: &ResolvedPlace, seen: &SeenKeys) -> Result<PlaceMatch, Rejection> {
        let top = place.matches.first().ok_or(Rejection::NotFound)?;

        self.categories
            .check_admissible(&top.category_path)
            .map_err(Rejection::Category)?;

        for name in [place.candidate.name_hint.as_str(), top.name.as_str()] {
            if let Some(token) = self.blocked_token(name) {
                return Err(Rejection::Franchise(token.to_string()));
            }
        }

        let chosen = self.disambiguate(place, top)?;

        let key = chosen.key();
        if seen.contains(&key) {
            return Err(Rejection::Duplicate(key));
        }
        Ok(chosen.clone())
    }

    /// Checks a bare name against the franchise and generic-noun lists.
    /// Latin tokens (`CU`, `BBQ`) only match as whole words.
    pub fn blocked_token(&self, name: &str) -> Option<&str> {
        let lowered = name.to_lowercase();
        self.blocked_tokens
            .iter()
            .find(|t| {
                if t.is_ascii() {
                    contains_latin_word(&lowered, t)
                } else {
                    lowered.contains(t.as_str())
                }
            })
            .map(String::as_str)
    }

    /// More than one match with any branch-qualified name is ambiguous
    /// unless exactly one match carries the hinted name or sits in the
    /// hinted area.
    fn disambiguate<'a>(
        &self,
        place: &'a ResolvedPlace,
        top: &'a PlaceMatch,
    ) -> Result<&'a PlaceMatch, Rejection> {
        let matches = &place.matches;
        let branched = matches
            .iter()
            .any(|m| self.names.has_branch_qualifier(&m.name));
        if matches.len() < 2 || !branched {
            return Ok(top);
        }

        let hint = compact(&place.candidate.name_hint);
        let by_name: Vec<&PlaceMatch> = matches
            .iter()
            .filter(|m| !hint.is_empty() && compact(&m.name) == hint)
            .collect();
        if let [only] = by_name.as_slice() {
            return Ok(*only);
        }

        let area = place.candidate.area_hint.trim();
        if !area.is_empty() {
            let by_area: Vec<&PlaceMatch> = matches
                .iter()
                .filter(|m| area_matches(&m.address, area) || area_matches(&m.road_address, area))
                .collect();
            if let [only] = by_area.as_slice() {
                return Ok(*only);
            }
        }

        info!(
            name = %place.candidate.name_hint,
            matches = matches.len(),
            "Branch could not be determined"
        );
        Err(Rejection::BranchAmbiguous(matches.len()))
    }
}

/// `word` occurs in `text` with no ASCII letter or digit on either side.
fn contains_latin_word(text: &str, word: &str) -> bool {
    text.match_indices(word).any(|(i, m)| {
        let before = text[..i].chars().next_back();
        let after = text[i + m.len()..].chars().next();
        !before.is_some_and(|c| c.is_ascii_alphanumeric())
            && !after.is_some_and(|c| c.is_ascii_alphanumeric())
    })
}

fn compact(name: &str) -> String {
    name.split_whitespace().collect()
}

/// Every whitespace token of the area hint must appear in the address.
fn area_matches(address: &str, area: &str) -> bool {
    !address.is_empty() && area.split_whitespace().all(|t| address.contains(t))
}
