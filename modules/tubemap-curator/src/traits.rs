// Collaborator boundaries for the curation pipeline.
//
// PlaceResolver: ranked place lookup (Kakao Local keyword search).
// EvidenceSource: every query-based provider behind one shape (blog text,
//   image search, video search, comment threads).
// PhotoSource: optional photo attachment (Google Places).
//
// The pipeline only sees these traits, so tests swap in the in-memory
// mocks from `testing.rs`.

use std::sync::Arc;

use async_trait::async_trait;

use evidence_client::{
    EvidenceError, GooglePlaces, KakaoLocal, NaverSearch, NaverSort, YouTube,
};
use tubemap_common::{EvidenceItem, PlaceMatch, SortOrder};

pub type EvidenceResult<T> = std::result::Result<T, EvidenceError>;

/// Number of place matches requested per lookup. More than one is needed
/// to detect branch ambiguity.
const PLACE_LOOKUP_SIZE: usize = 5;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

#[async_trait]
pub trait PlaceResolver: Send + Sync {
    /// Ranked matches for a free-text query. May return several branches.
    async fn resolve(&self, query: &str) -> EvidenceResult<Vec<PlaceMatch>>;
}

#[async_trait]
pub trait EvidenceSource: Send + Sync {
    /// Short provider label for logs.
    fn name(&self) -> &str;

    /// Ranked results for `text`. `rank` on each item is its 0-based position.
    async fn query(
        &self,
        text: &str,
        sort: SortOrder,
        max_results: usize,
    ) -> EvidenceResult<Vec<EvidenceItem>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttachedPhoto {
    pub url: String,
    pub place_id: Option<String>,
}

#[async_trait]
pub trait PhotoSource: Send + Sync {
    async fn lookup(&self, name: &str, address: &str) -> EvidenceResult<Option<AttachedPhoto>>;
}

// ---------------------------------------------------------------------------
// Provider adapters
// ---------------------------------------------------------------------------

#[async_trait]
impl PlaceResolver for KakaoLocal {
    async fn resolve(&self, query: &str) -> EvidenceResult<Vec<PlaceMatch>> {
        let places = self.keyword_search(query, PLACE_LOOKUP_SIZE).await?;
        Ok(places
            .into_iter()
            .map(|p| PlaceMatch {
                id: p.id,
                name: p.place_name,
                category_path: p.category_name,
                address: p.address_name,
                road_address: p.road_address_name,
                lat: p.lat,
                lng: p.lng,
                phone: p.phone,
            })
            .collect())
    }
}

fn naver_sort(sort: SortOrder) -> NaverSort {
    match sort {
        SortOrder::Relevance => NaverSort::Sim,
        SortOrder::Date => NaverSort::Date,
    }
}

/// Naver blog search as a text evidence source.
pub struct BlogEvidence(pub Arc<NaverSearch>);

#[async_trait]
impl EvidenceSource for BlogEvidence {
    fn name(&self) -> &str {
        "naver-blog"
    }

    async fn query(
        &self,
        text: &str,
        sort: SortOrder,
        max_results: usize,
    ) -> EvidenceResult<Vec<EvidenceItem>> {
        let posts = self.0.blog(text, naver_sort(sort), max_results).await?;
        Ok(posts
            .into_iter()
            .enumerate()
            .map(|(rank, p)| EvidenceItem {
                title: p.title,
                snippet: p.description,
                link: p.link,
                rank,
                published_at: p
                    .posted_on
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|dt| dt.and_utc()),
                ..Default::default()
            })
            .collect())
    }
}

/// Naver image search as an image evidence source.
pub struct ImageEvidence(pub Arc<NaverSearch>);

#[async_trait]
impl EvidenceSource for ImageEvidence {
    fn name(&self) -> &str {
        "naver-image"
    }

    async fn query(
        &self,
        text: &str,
        sort: SortOrder,
        max_results: usize,
    ) -> EvidenceResult<Vec<EvidenceItem>> {
        let hits = self.0.image(text, naver_sort(sort), max_results).await?;
        Ok(hits
            .into_iter()
            .enumerate()
            .map(|(rank, h)| EvidenceItem::image(&h.title, &h.link, h.width, h.height, rank))
            .collect())
    }
}

/// YouTube video search. `snippet` is the video description, `link` the
/// watch URL and `author` the channel title.
pub struct VideoEvidence(pub Arc<YouTube>);

#[async_trait]
impl EvidenceSource for VideoEvidence {
    fn name(&self) -> &str {
        "youtube-search"
    }

    async fn query(
        &self,
        text: &str,
        sort: SortOrder,
        max_results: usize,
    ) -> EvidenceResult<Vec<EvidenceItem>> {
        let order = match sort {
            SortOrder::Relevance => "relevance",
            SortOrder::Date => "date",
        };
        let videos = self.0.search_videos(text, order, max_results).await?;
        Ok(videos
            .into_iter()
            .enumerate()
            .map(|(rank, v)| EvidenceItem {
                link: v.url(),
                title: v.title,
                snippet: v.description,
                author: Some(v.channel_title),
                rank,
                published_at: v.published_at,
                ..Default::default()
            })
            .collect())
    }
}

/// YouTube comment threads. The query text is the video id.
pub struct CommentEvidence(pub Arc<YouTube>);

#[async_trait]
impl EvidenceSource for CommentEvidence {
    fn name(&self) -> &str {
        "youtube-comments"
    }

    async fn query(
        &self,
        video_id: &str,
        _sort: SortOrder,
        max_results: usize,
    ) -> EvidenceResult<Vec<EvidenceItem>> {
        let comments = self.0.comments(video_id, max_results).await?;
        Ok(comments
            .into_iter()
            .enumerate()
            .map(|(rank, c)| EvidenceItem {
                snippet: c.text,
                link: format!("https://www.youtube.com/watch?v={video_id}"),
                rank,
                published_at: c.published_at,
                ..Default::default()
            })
            .collect())
    }
}

#[async_trait]
impl PhotoSource for GooglePlaces {
    async fn lookup(&self, name: &str, address: &str) -> EvidenceResult<Option<AttachedPhoto>> {
        let photo = self.find_photo(name, address).await?;
        Ok(photo.photo_url.map(|url| AttachedPhoto {
            url,
            place_id: photo.place_id,
        }))
    }
}
