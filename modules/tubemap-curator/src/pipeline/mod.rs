// Curation pipeline.
//
// Two run modes over one TaskPool:
//   collection:   seeds -> discovery -> evaluate (pool) -> single-writer insert
//   verification: records -> filters + branch + review + re-score (pool) -> single-writer apply
//
// Every collaborator is wrapped in a per-call timeout on construction, so
// a hung provider degrades one candidate only.

pub mod collection;
pub mod pool;
pub mod state;
pub mod stats;
pub mod verification;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use evidence_client::EvidenceError;
use tubemap_common::{ConfigError, CurationRules, EvidenceItem, PlaceMatch, SortOrder};

use crate::extractor::{CandidateExtractor, InferenceStage, Mention};
use crate::media::MediaResolver;
use crate::scorer::RelevanceScorer;
use crate::selector::DescriptionSelector;
use crate::traits::{AttachedPhoto, EvidenceResult, EvidenceSource, PhotoSource, PlaceResolver};
use crate::validator::CandidateValidator;

pub use pool::TaskPool;
pub use state::{CandidateOutcome, CandidateState, DeleteReason, RecordVerdict};
pub use stats::{RunMode, RunStats};

/// External services the pipeline talks to. Optional ones are skipped
/// when absent.
#[derive(Clone)]
pub struct Collaborators {
    pub places: Arc<dyn PlaceResolver>,
    /// Blog text search: discovery, secondary reviews, branch and review checks.
    pub text: Arc<dyn EvidenceSource>,
    pub images: Arc<dyn EvidenceSource>,
    pub videos: Option<Arc<dyn EvidenceSource>>,
    /// Comment threads; the query text is a video id.
    pub comments: Option<Arc<dyn EvidenceSource>>,
    pub photos: Option<Arc<dyn PhotoSource>>,
    pub inference: Option<Arc<dyn InferenceStage>>,
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub workers: usize,
    pub call_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            call_timeout: Duration::from_secs(10),
        }
    }
}

pub struct Curator {
    pub(crate) rules: CurationRules,
    pub(crate) collab: Collaborators,
    pub(crate) pool: TaskPool,
    pub(crate) extractor: CandidateExtractor,
    pub(crate) validator: CandidateValidator,
    pub(crate) scorer: RelevanceScorer,
    pub(crate) selector: DescriptionSelector,
    pub(crate) media: MediaResolver,
}

impl Curator {
    pub fn new(
        rules: CurationRules,
        collaborators: Collaborators,
        config: PipelineConfig,
    ) -> Result<Self, ConfigError> {
        let collab = with_timeouts(collaborators, config.call_timeout);

        let mut extractor = CandidateExtractor::new(&rules)?;
        if let Some(stage) = &collab.inference {
            extractor = extractor.with_inference(stage.clone());
        }

        Ok(Self {
            pool: TaskPool::new(config.workers),
            extractor,
            validator: CandidateValidator::new(&rules),
            scorer: RelevanceScorer::new(&rules)?,
            selector: DescriptionSelector::new(&rules),
            media: MediaResolver::new(&rules),
            collab,
            rules,
        })
    }

    pub fn rules(&self) -> &CurationRules {
        &self.rules
    }
}

// ---------------------------------------------------------------------------
// Per-call timeouts
// ---------------------------------------------------------------------------

struct Timed<T: ?Sized> {
    inner: Arc<T>,
    limit: Duration,
}

impl<T: ?Sized> Timed<T> {
    fn wrap(inner: Arc<T>, limit: Duration) -> Arc<Self> {
        Arc::new(Self { inner, limit })
    }
}

async fn within<F, T>(limit: Duration, what: &str, fut: F) -> EvidenceResult<T>
where
    F: Future<Output = EvidenceResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(EvidenceError::Timeout(format!("{what} exceeded {limit:?}"))),
    }
}

fn with_timeouts(c: Collaborators, limit: Duration) -> Collaborators {
    Collaborators {
        places: Timed::wrap(c.places, limit),
        text: Timed::wrap(c.text, limit),
        images: Timed::wrap(c.images, limit),
        videos: c.videos.map(|s| Timed::wrap(s, limit) as Arc<dyn EvidenceSource>),
        comments: c.comments.map(|s| Timed::wrap(s, limit) as Arc<dyn EvidenceSource>),
        photos: c.photos.map(|s| Timed::wrap(s, limit) as Arc<dyn PhotoSource>),
        inference: c.inference.map(|s| Timed::wrap(s, limit) as Arc<dyn InferenceStage>),
    }
}

#[async_trait]
impl PlaceResolver for Timed<dyn PlaceResolver> {
    async fn resolve(&self, query: &str) -> EvidenceResult<Vec<PlaceMatch>> {
        within(self.limit, "place lookup", self.inner.resolve(query)).await
    }
}

#[async_trait]
impl EvidenceSource for Timed<dyn EvidenceSource> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn query(
        &self,
        text: &str,
        sort: SortOrder,
        max_results: usize,
    ) -> EvidenceResult<Vec<EvidenceItem>> {
        within(
            self.limit,
            self.inner.name(),
            self.inner.query(text, sort, max_results),
        )
        .await
    }
}

#[async_trait]
impl PhotoSource for Timed<dyn PhotoSource> {
    async fn lookup(&self, name: &str, address: &str) -> EvidenceResult<Option<AttachedPhoto>> {
        within(self.limit, "photo lookup", self.inner.lookup(name, address)).await
    }
}

#[async_trait]
impl InferenceStage for Timed<dyn InferenceStage> {
    async fn extract(&self, text: &str) -> EvidenceResult<Vec<Mention>> {
        within(self.limit, "inference", self.inner.extract(text)).await
    }
}
