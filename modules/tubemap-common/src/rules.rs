use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::ConfigError;

const BUNDLED_RULES: &str = include_str!("../rules/default.toml");

/// Versioned curation data: keyword lists, domains, thresholds, templates.
/// Loaded from TOML so tests and deployments can substitute their own.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CurationRules {
    pub version: u32,
    pub categories: CategoryRules,
    pub names: NameRules,
    pub scoring: ScoringRules,
    pub review: ReviewRules,
    pub discovery: DiscoveryRules,
    #[serde(default)]
    pub media: Vec<MediaAlias>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryRules {
    pub allowed_groups: Vec<String>,
    pub excluded: Vec<String>,
    pub standard: Vec<String>,
    pub default_group: String,
    #[serde(default)]
    pub synonyms: Vec<CategorySynonyms>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategorySynonyms {
    pub group: String,
    pub tokens: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NameRules {
    pub franchise: Vec<String>,
    pub generic: Vec<String>,
    pub branch_qualifiers: Vec<String>,
    pub branch_suffix: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoringRules {
    pub exact_name: i32,
    pub partial_name: i32,
    pub partial_name_chars: usize,
    pub menu_token: i32,
    pub trusted_domain: i32,
    pub visual_anchor: i32,
    pub commercial: i32,
    pub unrelated: i32,
    pub blocked_host: i32,
    pub listicle: i32,
    pub listicle_with_name: i32,
    pub low_resolution: i32,
    pub min_width: u32,
    pub min_height: u32,
    pub high_resolution: i32,
    pub high_resolution_width: u32,
    pub retry_decay: i32,
    pub early_exit: i32,
    pub verified: i32,
    pub acceptable: i32,
    pub trusted_domains: Vec<String>,
    pub blocked_hosts: Vec<String>,
    pub commercial_terms: Vec<String>,
    pub unrelated_terms: Vec<String>,
    pub listicle_terms: Vec<String>,
    pub listicle_patterns: Vec<String>,
    pub visual_anchor_terms: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewRules {
    pub primary_min_chars: usize,
    pub primary_max_chars: usize,
    pub secondary_min_chars: usize,
    pub secondary_max_chars: usize,
    pub food_terms: Vec<String>,
    pub positive_terms: Vec<String>,
    pub templates: Vec<String>,
    /// Verification deletes records for which no review text is found
    /// and only a template or category label could describe them.
    pub require_review_on_verify: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiscoveryRules {
    pub video_title_terms: Vec<String>,
    pub region_prefixes: Vec<String>,
    pub seeds: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MediaAlias {
    pub alias: String,
    pub official: String,
}

impl CategoryRules {
    /// `Err` carries the offending token when the provider category path
    /// is not an allowed food or cafe group.
    pub fn check_admissible(&self, category_path: &str) -> Result<(), String> {
        if let Some(excluded) = self.excluded.iter().find(|t| category_path.contains(t.as_str())) {
            return Err(excluded.clone());
        }
        if self
            .allowed_groups
            .iter()
            .any(|g| category_path.contains(g.as_str()))
        {
            Ok(())
        } else {
            Err(category_path.to_string())
        }
    }

    /// Map a provider category path onto one of the standard groups.
    /// Segments are checked top-down; a segment naming a standard group
    /// wins over synonym tokens.
    pub fn standardize(&self, category_path: &str) -> String {
        for segment in category_path.split('>').map(str::trim) {
            if let Some(group) = self.standard.iter().find(|g| segment == g.as_str()) {
                return group.clone();
            }
            if let Some(syn) = self
                .synonyms
                .iter()
                .find(|s| s.tokens.iter().any(|t| segment.contains(t.as_str())))
            {
                return syn.group.clone();
            }
        }
        self.default_group.clone()
    }
}

impl NameRules {
    /// True when the name designates one location of a multi-location
    /// brand: a qualifier token (`본점`, `지점`, ...) or a trailing word
    /// ending in the branch suffix, e.g. `명동교자 을지로점`.
    pub fn has_branch_qualifier(&self, name: &str) -> bool {
        if self.branch_qualifiers.iter().any(|q| name.contains(q.as_str())) {
            return true;
        }
        let words: Vec<&str> = name.split_whitespace().collect();
        match words.as_slice() {
            [_, .., last] => last.chars().count() >= 2 && last.ends_with(self.branch_suffix.as_str()),
            _ => false,
        }
    }
}

impl CurationRules {
    /// Rules shipped with the crate.
    pub fn bundled() -> Result<Self, ConfigError> {
        Self::parse(BUNDLED_RULES)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let rules: CurationRules = toml::from_str(content)?;
        rules.check()?;
        Ok(rules)
    }

    /// Load rules from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::RulesUnreadable {
                path: path.to_path_buf(),
                source,
            })?;
        let rules = Self::parse(&content)?;
        info!(path = %path.display(), version = rules.version, "Loaded curation rules");
        Ok(rules)
    }

    /// Load from `path` when given, otherwise fall back to the bundled rules.
    pub fn load_or_bundled(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Self::bundled(),
        }
    }

    fn check(&self) -> Result<(), ConfigError> {
        let s = &self.scoring;
        if s.acceptable > s.verified {
            return Err(ConfigError::InvalidValue {
                key: "scoring.acceptable".into(),
                message: format!(
                    "acceptable threshold {} exceeds verified threshold {}",
                    s.acceptable, s.verified
                ),
            });
        }
        let r = &self.review;
        if r.primary_min_chars > r.primary_max_chars
            || r.secondary_min_chars > r.secondary_max_chars
        {
            return Err(ConfigError::InvalidValue {
                key: "review".into(),
                message: "length band minimum exceeds maximum".into(),
            });
        }
        if self.categories.allowed_groups.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "categories.allowed_groups".into(),
                message: "at least one allowed group is required".into(),
            });
        }
        Ok(())
    }
}
