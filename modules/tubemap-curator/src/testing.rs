//! In-memory collaborators and fixtures for tests.
//!
//! Mocks answer from canned per-query tables and count their calls, so
//! tests can assert both outcomes and how much work the pipeline did.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use evidence_client::EvidenceError;
use tubemap_common::{
    AddressParts, Candidate, EvidenceItem, ExtractionMethod, PlaceMatch, SortOrder, SourceRef,
    VenueRecord,
};

use crate::extractor::{InferenceStage, Mention};
use crate::traits::{AttachedPhoto, EvidenceResult, EvidenceSource, PhotoSource, PlaceResolver};

// ---------------------------------------------------------------------------
// MockPlaces
// ---------------------------------------------------------------------------

/// Place resolver keyed by exact query text. Unknown queries return no
/// matches.
#[derive(Default)]
pub struct MockPlaces {
    answers: HashMap<String, Vec<PlaceMatch>>,
    failing: bool,
    calls: AtomicUsize,
}

impl MockPlaces {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_query(mut self, query: &str, matches: Vec<PlaceMatch>) -> Self {
        self.answers.insert(query.to_string(), matches);
        self
    }

    /// Every lookup fails with a transient error.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlaceResolver for MockPlaces {
    async fn resolve(&self, query: &str) -> EvidenceResult<Vec<PlaceMatch>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(EvidenceError::Network("mock place lookup down".into()));
        }
        Ok(self.answers.get(query).cloned().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// MockEvidence
// ---------------------------------------------------------------------------

/// Evidence source keyed by exact query text. Records every query it sees.
#[derive(Default)]
pub struct MockEvidence {
    answers: HashMap<String, Vec<EvidenceItem>>,
    fallback: Vec<EvidenceItem>,
    failing: bool,
    delay: Option<Duration>,
    queries: Mutex<Vec<String>>,
}

impl MockEvidence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_query(mut self, query: &str, items: Vec<EvidenceItem>) -> Self {
        self.answers.insert(query.to_string(), items);
        self
    }

    /// Items returned for any query without a specific answer.
    pub fn otherwise(mut self, items: Vec<EvidenceItem>) -> Self {
        self.fallback = items;
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Sleep before answering, to keep several calls in flight at once.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.seen().len()
    }

    pub fn seen(&self) -> Vec<String> {
        self.queries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl EvidenceSource for MockEvidence {
    fn name(&self) -> &str {
        "mock"
    }

    async fn query(
        &self,
        text: &str,
        _sort: SortOrder,
        max_results: usize,
    ) -> EvidenceResult<Vec<EvidenceItem>> {
        self.queries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(text.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            return Err(EvidenceError::Api {
                status: 503,
                message: "mock evidence down".into(),
            });
        }
        let items = self.answers.get(text).unwrap_or(&self.fallback);
        Ok(items.iter().take(max_results).cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// MockPhotos / MockInference
// ---------------------------------------------------------------------------

/// Photo source that always returns the same photo, or nothing.
#[derive(Default)]
pub struct MockPhotos {
    photo: Option<AttachedPhoto>,
}

impl MockPhotos {
    pub fn returning(url: &str, place_id: &str) -> Self {
        Self {
            photo: Some(AttachedPhoto {
                url: url.to_string(),
                place_id: Some(place_id.to_string()),
            }),
        }
    }
}

#[async_trait]
impl PhotoSource for MockPhotos {
    async fn lookup(&self, _name: &str, _address: &str) -> EvidenceResult<Option<AttachedPhoto>> {
        Ok(self.photo.clone())
    }
}

/// Inference stage with a fixed reply.
#[derive(Default)]
pub struct MockInference {
    mentions: Vec<Mention>,
    calls: AtomicUsize,
}

impl MockInference {
    pub fn returning(mentions: Vec<Mention>) -> Self {
        Self {
            mentions,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InferenceStage for MockInference {
    async fn extract(&self, _text: &str) -> EvidenceResult<Vec<Mention>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.mentions.clone())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Pattern-extracted candidate from a blog post with no area or media.
pub fn candidate(name_hint: &str) -> Candidate {
    Candidate {
        name_hint: name_hint.to_string(),
        area_hint: String::new(),
        address_hint: String::new(),
        menu_hint: None,
        media_hint: String::new(),
        source: SourceRef::Article {
            link: "https://blog.naver.com/test/1".into(),
        },
        extraction: ExtractionMethod::Pattern,
    }
}

pub fn place_match(name: &str, address: &str, category_path: &str) -> PlaceMatch {
    PlaceMatch {
        id: format!("kakao-{}", name.chars().filter(|c| !c.is_whitespace()).collect::<String>()),
        name: name.to_string(),
        category_path: category_path.to_string(),
        address: address.to_string(),
        road_address: String::new(),
        lat: 37.566,
        lng: 126.991,
        phone: String::new(),
    }
}

/// A 한식 record with address parts filled from `address`.
pub fn record(name: &str, address: &str) -> VenueRecord {
    let parts = AddressParts::parse(address);
    VenueRecord {
        id: 0,
        name: name.to_string(),
        address: address.to_string(),
        lat: 37.566,
        lng: 126.991,
        category: "한식".into(),
        media: "또간집".into(),
        description: "대표 메뉴: 평양냉면".into(),
        image_url: None,
        phone: String::new(),
        naver_url: String::new(),
        address_province: parts.province,
        address_city: parts.city,
        address_district: parts.district,
        category_group: "음식점 > 한식".into(),
        road_address: String::new(),
        source_video_url: None,
        google_place_id: None,
        verified_score: None,
        verified_at: None,
    }
}
