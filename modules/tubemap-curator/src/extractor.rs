//! Candidate extraction from free text (video descriptions, blog titles).
//!
//! Two stages. The pattern stage walks the text line by line and recognises
//! bracketed or labelled names, location lines, menu lines and region
//! mentions. When it finds nothing, the optional [`InferenceStage`] gets a
//! truncated copy of the text.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use evidence_client::{EvidenceError, OpenAiChat};
use tubemap_common::text::{char_len, char_prefix, strip_markup};
use tubemap_common::{Candidate, ConfigError, CurationRules, ExtractionMethod, SourceRef};

use crate::traits::EvidenceResult;

const MIN_NAME_CHARS: usize = 2;
const MAX_NAME_CHARS: usize = 30;
const INFERENCE_INPUT_CHARS: usize = 500;
const INFERENCE_MAX_TOKENS: u32 = 300;

const NAME_CHARS: &str = r"[가-힣A-Za-z0-9&'\s]";

/// Name patterns in priority order. The first that matches a line wins.
static NAME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        format!(r"\[({NAME_CHARS}{{2,30}})\]"),
        format!(r"(?:상호명|상호|가게명|가게|매장|장소|업체명)\s*[:：]\s*({NAME_CHARS}{{2,30}})"),
        format!(r#"["“]({NAME_CHARS}{{2,30}})["”]"#),
        format!(r"\(({NAME_CHARS}{{2,30}})\)"),
        r"([가-힣A-Za-z0-9]+\s?(?:본점|직영점|[가-힣]+점))(?:$|[\s,.!?)\]])".to_string(),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid name pattern"))
    .collect()
});

static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([가-힣A-Za-z0-9]{2,30})").expect("valid regex"));

static LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:📍|(?:위치|주소)\s*[:：]?)\s*(.+)").expect("valid regex")
});

static MENU_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:🍴|(?:대표\s*메뉴|메뉴)\s*[:：])\s*(.+)").expect("valid regex")
});

/// A venue mention produced by the inference stage.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Mention {
    #[serde(rename = "store_name", default)]
    pub name: String,
    #[serde(default)]
    pub menu: Option<String>,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub address: String,
}

/// Fallback extraction strategy for text the pattern stage cannot parse.
#[async_trait]
pub trait InferenceStage: Send + Sync {
    async fn extract(&self, text: &str) -> EvidenceResult<Vec<Mention>>;
}

pub struct CandidateExtractor {
    region_re: Regex,
    stop_words: Vec<String>,
    inference: Option<Arc<dyn InferenceStage>>,
}

impl CandidateExtractor {
    pub fn new(rules: &CurationRules) -> Result<Self, ConfigError> {
        let prefixes = rules
            .discovery
            .region_prefixes
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(r"(?:{prefixes})[가-힣]*\s+[가-힣0-9]+(?:시|군|구|읍|면|동|로|길)");
        let region_re = Regex::new(&pattern).map_err(|e| ConfigError::Pattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;

        let mut stop_words: Vec<String> = rules
            .media
            .iter()
            .flat_map(|m| [m.alias.clone(), m.official.clone()])
            .chain(rules.names.generic.iter().cloned())
            .chain(rules.discovery.video_title_terms.iter().cloned())
            .collect();
        stop_words.sort();
        stop_words.dedup();

        Ok(Self {
            region_re,
            stop_words,
            inference: None,
        })
    }

    pub fn with_inference(mut self, stage: Arc<dyn InferenceStage>) -> Self {
        self.inference = Some(stage);
        self
    }

    /// Extract candidates from `text`. Falls through to the inference stage
    /// only when the pattern stage yields nothing.
    pub async fn extract(&self, text: &str, source: &SourceRef, media_hint: &str) -> Vec<Candidate> {
        let found = self.extract_patterns(text, source, media_hint);
        if !found.is_empty() {
            return found;
        }
        let Some(stage) = &self.inference else {
            return found;
        };

        let input = char_prefix(text, INFERENCE_INPUT_CHARS);
        match stage.extract(input).await {
            Ok(mentions) => mentions
                .into_iter()
                .filter(|m| self.is_plausible_name(m.name.trim()) || !m.address.trim().is_empty())
                .map(|m| Candidate {
                    name_hint: m.name.trim().to_string(),
                    area_hint: if m.area.trim().is_empty() {
                        area_of(&m.address)
                    } else {
                        m.area.trim().to_string()
                    },
                    address_hint: m.address.trim().to_string(),
                    menu_hint: m.menu.filter(|s| !s.trim().is_empty()),
                    media_hint: media_hint.to_string(),
                    source: source.clone(),
                    extraction: ExtractionMethod::Inference,
                })
                .collect(),
            Err(e) => {
                warn!(source = source.url(), error = %e, "Inference extraction failed");
                Vec::new()
            }
        }
    }

    /// Deterministic stage only.
    pub fn extract_patterns(&self, text: &str, source: &SourceRef, media_hint: &str) -> Vec<Candidate> {
        let plain = strip_markup(text);
        let mut out: Vec<Candidate> = Vec::new();
        let mut pending_address = String::new();
        let mut pending_menu: Option<String> = None;
        let mut hashtags: Vec<String> = Vec::new();

        let new_candidate = |name: String| Candidate {
            name_hint: name,
            area_hint: String::new(),
            address_hint: String::new(),
            menu_hint: None,
            media_hint: media_hint.to_string(),
            source: source.clone(),
            extraction: ExtractionMethod::Pattern,
        };

        for line in plain.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if let Some(address) = capture_field(&LOCATION_RE, line) {
                match out.last_mut() {
                    Some(c) if c.address_hint.is_empty() => c.address_hint = address,
                    _ => pending_address = address,
                }
                continue;
            }
            if let Some(menu) = capture_field(&MENU_RE, line) {
                match out.last_mut() {
                    Some(c) if c.menu_hint.is_none() => c.menu_hint = Some(menu),
                    _ => pending_menu = Some(menu),
                }
                continue;
            }
            if let Some(name) = self.match_name(line) {
                if !out.iter().any(|c| c.name_hint == name) {
                    out.push(new_candidate(name));
                }
                continue;
            }
            for cap in HASHTAG_RE.captures_iter(line) {
                let tag = cap[1].to_string();
                if self.is_plausible_name(&tag) && !hashtags.contains(&tag) {
                    hashtags.push(tag);
                }
            }
        }

        if out.is_empty() {
            out.extend(hashtags.into_iter().map(&new_candidate));
        }
        if out.is_empty() && !pending_address.is_empty() {
            out.push(new_candidate(String::new()));
        }
        if let Some(first) = out.first_mut() {
            if first.address_hint.is_empty() {
                first.address_hint = std::mem::take(&mut pending_address);
            }
            if first.menu_hint.is_none() {
                first.menu_hint = pending_menu.take();
            }
        }

        let region = self.region_re.find(&plain).map(|m| m.as_str().to_string());
        for c in &mut out {
            c.area_hint = if c.address_hint.is_empty() {
                region.clone().unwrap_or_default()
            } else {
                area_of(&c.address_hint)
            };
        }

        debug!(source = source.url(), count = out.len(), "Pattern extraction");
        out
    }

    fn match_name(&self, line: &str) -> Option<String> {
        NAME_PATTERNS.iter().find_map(|re| {
            re.captures_iter(line)
                .map(|cap| cap[1].trim().to_string())
                .find(|name| self.is_plausible_name(name))
        })
    }

    fn is_plausible_name(&self, name: &str) -> bool {
        let len = char_len(name);
        if !(MIN_NAME_CHARS..=MAX_NAME_CHARS).contains(&len) {
            return false;
        }
        !self.stop_words.iter().any(|w| name == w || (char_len(w) >= 3 && name.contains(w.as_str())))
    }
}

fn capture_field(re: &Regex, line: &str) -> Option<String> {
    let cap = re.captures(line)?;
    let value = cap[1]
        .split(['📞', '🍴', '📍'])
        .next()
        .unwrap_or("")
        .trim()
        .to_string();
    (!value.is_empty()).then_some(value)
}

/// First two address tokens, e.g. `서울 중구`.
fn area_of(address: &str) -> String {
    let parts: Vec<&str> = address.split_whitespace().take(2).collect();
    if parts.len() < 2 {
        return String::new();
    }
    parts.join(" ")
}

// --- OpenAI-backed inference ---

const INFERENCE_SYSTEM: &str = "You extract restaurant and cafe mentions from Korean video \
descriptions. Respond with a JSON array only.";

pub struct OpenAiInference {
    chat: Arc<OpenAiChat>,
}

impl OpenAiInference {
    pub fn new(chat: Arc<OpenAiChat>) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl InferenceStage for OpenAiInference {
    async fn extract(&self, text: &str) -> EvidenceResult<Vec<Mention>> {
        let prompt = format!(
            "다음 영상 정보에서 맛집 정보를 추출하세요.\n\n{text}\n\n\
             JSON 형식으로만 응답:\n\
             [{{\"store_name\": \"업체명\", \"menu\": \"메뉴\", \"area\": \"지역\", \"address\": \"주소\"}}]\n\
             맛집이 없으면 []"
        );
        let content = self
            .chat
            .complete(INFERENCE_SYSTEM, &prompt, INFERENCE_MAX_TOKENS)
            .await?;
        parse_mentions(&content)
    }
}

/// Parse a model reply, tolerating a surrounding markdown code fence.
pub fn parse_mentions(content: &str) -> EvidenceResult<Vec<Mention>> {
    let trimmed = content.trim();
    let body = match trimmed.split_once("```") {
        Some((_, rest)) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.split("```").next().unwrap_or(rest).trim()
        }
        None => trimmed,
    };
    serde_json::from_str(body).map_err(|e| EvidenceError::Parse(format!("inference reply: {e}")))
}
