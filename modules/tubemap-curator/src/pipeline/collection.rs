use std::collections::HashSet;
use std::ops::ControlFlow;
use std::sync::{PoisonError, RwLock};

use chrono::Utc;
use tracing::{debug, info, warn};
use url::Url;

use tubemap_common::{
    AddressParts, Candidate, CatalogKey, EvidenceItem, PlaceMatch, SortOrder, SourceRef,
    VenueRecord,
};

use super::{CandidateOutcome, CandidateState, Curator, RunMode, RunStats};
use crate::catalog::{Catalog, InsertOutcome, VenuePatch};
use crate::media::merge_media;
use crate::scorer::{ConfidenceBand, ScoreTarget};
use crate::selector::DescriptionContext;
use crate::validator::{Rejection, ResolvedPlace, SeenKeys};

const VIDEOS_PER_SEED: usize = 10;
const POSTS_PER_SEED: usize = 20;
pub(super) const COMMENTS_PER_VIDEO: usize = 20;
pub(super) const SNIPPETS_PER_VENUE: usize = 10;
const NAVER_MAP_SEARCH: &str = "https://map.naver.com/p/search/";

impl Curator {
    /// Run a collection batch: discover candidates from `seeds` (the
    /// configured seeds when empty), evaluate them in the pool and append
    /// accepted venues until `target` new records exist. The catalog never
    /// shrinks here.
    pub async fn collect(&self, catalog: &mut Catalog, target: usize, seeds: &[String]) -> RunStats {
        let mut stats = RunStats::new(RunMode::Collection);
        let seeds: Vec<String> = if seeds.is_empty() {
            self.rules.discovery.seeds.clone()
        } else {
            seeds.to_vec()
        };

        let (candidates, failed) = self.discover(&seeds).await;
        stats.discovered = candidates.len() as u32;
        stats.queries_failed = failed;
        info!(
            run_id = %stats.run_id,
            seeds = seeds.len(),
            candidates = candidates.len(),
            target,
            "Discovery complete"
        );
        if target == 0 || candidates.is_empty() {
            return stats;
        }

        let seen = RwLock::new(catalog.keys().collect::<SeenKeys>());
        let seen = &seen;
        let mut inserted = 0usize;

        self.pool
            .run_until(
                candidates,
                move |candidate| self.evaluate(candidate, seen),
                |outcome| {
                    stats.evaluated += 1;
                    match outcome {
                        CandidateOutcome::Accepted(record) => {
                            if self.aggregate(catalog, *record, &mut stats) {
                                inserted += 1;
                            }
                        }
                        CandidateOutcome::Rejected { at, reason, candidate } => {
                            info!(
                                name = %candidate.name_hint,
                                at = %at,
                                reason = %reason,
                                "Candidate rejected"
                            );
                            stats.reject(&reason);
                            if let Rejection::Duplicate(key) = &reason {
                                merge_into(catalog, key, &candidate.media_hint, &mut stats);
                            }
                        }
                        CandidateOutcome::Deferred { name, score } => {
                            info!(name = %name, ?score, "Candidate deferred");
                            stats.deferred += 1;
                        }
                    }
                    if inserted >= target {
                        stats.quota_reached = true;
                        ControlFlow::Break(())
                    } else {
                        ControlFlow::Continue(())
                    }
                },
            )
            .await;

        info!(
            run_id = %stats.run_id,
            accepted = stats.accepted,
            rejected = stats.rejected_total(),
            deferred = stats.deferred,
            "Collection finished"
        );
        stats
    }

    /// Single writer: re-check the key against the catalog and insert.
    fn aggregate(&self, catalog: &mut Catalog, record: VenueRecord, stats: &mut RunStats) -> bool {
        let key = record.key();
        let media = record.media.clone();
        match catalog.insert(record) {
            InsertOutcome::Inserted(id) => {
                stats.accepted += 1;
                info!(id, key = %key, "Venue accepted");
                true
            }
            InsertOutcome::Conflict { .. } => {
                merge_into(catalog, &key, &media, stats);
                stats.reject(&Rejection::Duplicate(key));
                false
            }
        }
    }

    // --- Discovery ---

    /// Candidates from every seed, de-duplicated by hint. Also returns the
    /// number of failed discovery queries.
    pub(crate) async fn discover(&self, seeds: &[String]) -> (Vec<Candidate>, u32) {
        let per_seed = self
            .pool
            .run(seeds.iter(), move |seed| self.discover_seed(seed))
            .await;

        let mut seen_hints = HashSet::new();
        let mut failed = 0;
        let mut out = Vec::new();
        for (candidates, errors) in per_seed {
            failed += errors;
            for c in candidates {
                let hint = (compact(&c.name_hint), compact(&c.address_hint));
                if seen_hints.insert(hint) {
                    out.push(c);
                }
            }
        }
        (out, failed)
    }

    async fn discover_seed(&self, seed: &str) -> (Vec<Candidate>, u32) {
        let mut out = Vec::new();
        let mut failed = 0;

        if let Some(videos) = &self.collab.videos {
            match videos.query(seed, SortOrder::Relevance, VIDEOS_PER_SEED).await {
                Ok(items) => {
                    for item in items.iter().filter(|v| self.is_food_video(&v.title)) {
                        let Some(source) = video_source(item) else {
                            continue;
                        };
                        let channel = item.author.as_deref().unwrap_or("");
                        let media = self.media.resolve(&[channel, item.title.as_str(), seed], channel);
                        let text = format!("{}\n{}", item.title, item.snippet);
                        out.extend(self.extractor.extract(&text, &source, &media).await);
                    }
                }
                Err(e) => {
                    warn!(seed, error = %e, "Video discovery failed");
                    failed += 1;
                }
            }
        }

        match self
            .collab
            .text
            .query(seed, SortOrder::Relevance, POSTS_PER_SEED)
            .await
        {
            Ok(posts) => {
                for post in posts {
                    let source = SourceRef::Article {
                        link: post.link.clone(),
                    };
                    let media = self.media.resolve(&[post.title.as_str(), seed], "");
                    out.extend(self.extractor.extract_patterns(&post.title, &source, &media));
                }
            }
            Err(e) => {
                warn!(seed, error = %e, "Blog discovery failed");
                failed += 1;
            }
        }

        debug!(seed, candidates = out.len(), "Seed discovered");
        (out, failed)
    }

    fn is_food_video(&self, title: &str) -> bool {
        self.rules
            .discovery
            .video_title_terms
            .iter()
            .any(|t| title.contains(t.as_str()))
    }

    // --- Evaluation (runs inside the pool) ---

    pub(crate) async fn evaluate(&self, candidate: Candidate, seen: &RwLock<SeenKeys>) -> CandidateOutcome {
        let query = candidate.lookup_query();
        let matches = match self.collab.places.resolve(&query).await {
            Ok(m) => m,
            Err(e) => {
                warn!(query = %query, error = %e, "Place lookup failed");
                return rejected(
                    CandidateState::Discovered,
                    Rejection::Transient(e.to_string()),
                    candidate,
                );
            }
        };
        let place = ResolvedPlace { candidate, matches };

        let decision = {
            let guard = seen.read().unwrap_or_else(PoisonError::into_inner);
            self.validator.validate(&place, &guard)
        };
        let chosen = match decision {
            Ok(m) => m,
            Err(reason) => return rejected(CandidateState::Resolved, reason, place.candidate),
        };

        // Claimed keys stay claimed only if the candidate is accepted.
        let key = chosen.key();
        let claimed = seen
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone());
        if !claimed {
            return rejected(CandidateState::Validated, Rejection::Duplicate(key), place.candidate);
        }

        let outcome = self.score_and_build(&place.candidate, &chosen).await;
        if !matches!(outcome, CandidateOutcome::Accepted(_)) {
            seen.write()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&key);
        }
        outcome
    }

    async fn score_and_build(&self, candidate: &Candidate, chosen: &PlaceMatch) -> CandidateOutcome {
        let category = self.rules.categories.standardize(&chosen.category_path);
        let parts = AddressParts::parse(&chosen.address);
        let keyword = candidate
            .menu_hint
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| chosen.category_leaf().to_string());
        let target = ScoreTarget {
            name: chosen.name.clone(),
            keyword,
            category: category.clone(),
            locale: parts.district.clone(),
        };

        let best = match self
            .scorer
            .best_evidence(self.collab.images.as_ref(), &target)
            .await
        {
            Ok(best) => best,
            Err(e) => {
                return rejected(
                    CandidateState::Validated,
                    Rejection::Transient(e.to_string()),
                    candidate.clone(),
                );
            }
        };
        let score = best.as_ref().map(|b| b.score);
        let band = score.map_or(ConfidenceBand::Low, |s| self.scorer.band(s));
        debug!(name = %chosen.name, ?score, ?band, state = %CandidateState::Scored, "Candidate scored");
        if band == ConfidenceBand::Low {
            return CandidateOutcome::Deferred {
                name: chosen.name.clone(),
                score,
            };
        }

        let (image_url, google_place_id) = match (band, best) {
            (ConfidenceBand::Verified, Some(b)) => (Some(b.item.link), None),
            _ => self.attach_photo(chosen).await,
        };

        let comments = self.video_comments(&candidate.source).await;
        let snippets = self
            .text_evidence(&format!("{} {}", chosen.name, parts.district))
            .await;
        let description = self
            .selector
            .select(
                &comments,
                &snippets,
                &DescriptionContext {
                    name: &chosen.name,
                    category: &category,
                    region: &parts.city,
                },
            )
            .map(|d| d.text)
            .unwrap_or_default();

        let source_video_url = match &candidate.source {
            SourceRef::Video { url, .. } => Some(url.clone()),
            SourceRef::Article { .. } => None,
        };

        CandidateOutcome::Accepted(Box::new(VenueRecord {
            id: 0,
            name: chosen.name.clone(),
            address: chosen.address.clone(),
            lat: chosen.lat,
            lng: chosen.lng,
            category,
            media: candidate.media_hint.clone(),
            description,
            image_url,
            phone: chosen.phone.clone(),
            naver_url: naver_map_url(&chosen.name),
            address_province: parts.province,
            address_city: parts.city,
            address_district: parts.district,
            category_group: chosen.category_path.clone(),
            road_address: chosen.road_address.clone(),
            source_video_url,
            google_place_id,
            verified_score: score,
            verified_at: Some(Utc::now()),
        }))
    }

    async fn attach_photo(&self, place: &PlaceMatch) -> (Option<String>, Option<String>) {
        let Some(photos) = &self.collab.photos else {
            return (None, None);
        };
        match photos.lookup(&place.name, &place.address).await {
            Ok(Some(photo)) => (Some(photo.url), photo.place_id),
            Ok(None) => (None, None),
            Err(e) => {
                warn!(name = %place.name, error = %e, "Photo lookup failed");
                (None, None)
            }
        }
    }

    async fn video_comments(&self, source: &SourceRef) -> Vec<EvidenceItem> {
        let (Some(comments), Some(video_id)) = (&self.collab.comments, source.video_id()) else {
            return Vec::new();
        };
        comments
            .query(video_id, SortOrder::Relevance, COMMENTS_PER_VIDEO)
            .await
            .unwrap_or_else(|e| {
                warn!(video_id, error = %e, "Comment lookup failed");
                Vec::new()
            })
    }

    pub(crate) async fn text_evidence(&self, query: &str) -> Vec<EvidenceItem> {
        self.collab
            .text
            .query(query, SortOrder::Relevance, SNIPPETS_PER_VENUE)
            .await
            .unwrap_or_else(|e| {
                warn!(query, error = %e, "Text evidence lookup failed");
                Vec::new()
            })
    }
}

fn rejected(at: CandidateState, reason: Rejection, candidate: Candidate) -> CandidateOutcome {
    CandidateOutcome::Rejected {
        at,
        reason,
        candidate: Box::new(candidate),
    }
}

/// A duplicate venue featured by another programme adds that programme to
/// the existing record's media list.
fn merge_into(catalog: &mut Catalog, key: &CatalogKey, media: &str, stats: &mut RunStats) {
    let Some(existing) = catalog.find(key) else {
        return;
    };
    let merged = merge_media(&existing.media, media);
    if merged == existing.media {
        return;
    }
    let id = existing.id;
    debug!(id, key = %key, media = %merged, "Media merged");
    catalog.update(
        id,
        VenuePatch {
            media: Some(merged),
            ..Default::default()
        },
    );
    stats.media_merged += 1;
}

fn compact(s: &str) -> String {
    s.split_whitespace().collect()
}

/// The `v` query parameter of a watch URL.
pub(super) fn video_id_from_url(link: &str) -> Option<String> {
    Url::parse(link)
        .ok()?
        .query_pairs()
        .find(|(k, _)| k == "v")
        .map(|(_, v)| v.into_owned())
}

fn video_source(item: &EvidenceItem) -> Option<SourceRef> {
    let video_id = video_id_from_url(&item.link)?;
    Some(SourceRef::Video {
        video_id,
        channel: item.author.clone().unwrap_or_default(),
        url: item.link.clone(),
    })
}

fn naver_map_url(name: &str) -> String {
    let Ok(mut url) = Url::parse(NAVER_MAP_SEARCH) else {
        return String::new();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(name);
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_id_comes_from_watch_url() {
        let item = EvidenceItem {
            link: "https://www.youtube.com/watch?v=abc123".into(),
            author: Some("또간집".into()),
            ..Default::default()
        };
        assert_eq!(video_source(&item).unwrap().video_id(), Some("abc123"));
        assert!(video_source(&EvidenceItem::default()).is_none());
    }

    #[test]
    fn naver_map_url_is_percent_encoded() {
        assert_eq!(
            naver_map_url("을지 면옥"),
            "https://map.naver.com/p/search/%EC%9D%84%EC%A7%80%20%EB%A9%B4%EC%98%A5"
        );
    }
}
