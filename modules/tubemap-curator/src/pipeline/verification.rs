use chrono::Utc;
use tracing::{debug, info, warn};

use tubemap_common::text::strip_markup;
use tubemap_common::{CatalogKey, SortOrder, VenueRecord};

use super::collection::{video_id_from_url, COMMENTS_PER_VIDEO, SNIPPETS_PER_VENUE};
use super::{Curator, DeleteReason, RecordVerdict, RunMode, RunStats};
use crate::catalog::{Catalog, VenuePatch};
use crate::scorer::{ConfidenceBand, ScoreTarget};
use crate::selector::{DescriptionContext, DescriptionSource};

const BRANCH_CHECK_RESULTS: usize = 10;
const HEAD_OFFICE: &str = "본점";

impl Curator {
    /// Zero-tolerance pass over every record: re-apply the admission
    /// filters, re-confirm branch names, require review text and re-score
    /// against fresh image evidence. Records that fail are deleted; records
    /// whose collaborators failed are left untouched.
    pub async fn verify(&self, catalog: &mut Catalog) -> RunStats {
        let mut stats = RunStats::new(RunMode::Verification);
        let records: Vec<VenueRecord> = catalog.records().to_vec();
        info!(run_id = %stats.run_id, records = records.len(), "Verification started");

        let verdicts = self
            .pool
            .run(records, move |record| async move {
                let verdict = self.check_record(&record).await;
                (record.key(), verdict)
            })
            .await;

        for (key, verdict) in verdicts {
            stats.checked += 1;
            apply_verdict(catalog, &key, verdict, &mut stats);
        }

        info!(
            run_id = %stats.run_id,
            checked = stats.checked,
            replaced = stats.replaced,
            deleted = stats.deleted,
            deferred = stats.deferred,
            "Verification finished"
        );
        stats
    }

    pub(crate) async fn check_record(&self, record: &VenueRecord) -> RecordVerdict {
        if let Some(why) = self.inadmissible(record) {
            return RecordVerdict::Delete(DeleteReason::Inadmissible(why));
        }

        if self.rules.names.has_branch_qualifier(&record.name) {
            if let Some(verdict) = self.check_branch(record).await {
                return verdict;
            }
        }

        if self.rules.review.require_review_on_verify {
            if let Some(verdict) = self.check_review(record).await {
                return verdict;
            }
        }

        let target = ScoreTarget::for_record(record);
        let best = match self
            .scorer
            .best_evidence(self.collab.images.as_ref(), &target)
            .await
        {
            Ok(best) => best,
            Err(e) => return RecordVerdict::Deferred(e.to_string()),
        };
        let Some(best) = best else {
            return RecordVerdict::Delete(DeleteReason::LowConfidence(None));
        };

        match self.scorer.band(best.score) {
            ConfidenceBand::Verified if record.image_url.as_deref() != Some(best.item.link.as_str()) => {
                RecordVerdict::Replace {
                    image_url: best.item.link,
                    score: best.score,
                }
            }
            ConfidenceBand::Verified | ConfidenceBand::Acceptable => {
                RecordVerdict::Keep { score: best.score }
            }
            ConfidenceBand::Low => RecordVerdict::Delete(DeleteReason::LowConfidence(Some(best.score))),
        }
    }

    /// Admission filters re-applied to a stored record. Records without a
    /// provider category path are only checked by name.
    fn inadmissible(&self, record: &VenueRecord) -> Option<String> {
        if !record.category_group.is_empty() {
            if let Err(token) = self.rules.categories.check_admissible(&record.category_group) {
                return Some(format!("category {token}"));
            }
        }
        self.validator
            .blocked_token(&record.name)
            .map(|token| format!("name token {token}"))
    }

    /// `None` when the branch is confirmed: the district appears in branch
    /// search results for the record's media, or the record is the head
    /// office and the results say `본점`.
    async fn check_branch(&self, record: &VenueRecord) -> Option<RecordVerdict> {
        let media = record.media.split('|').next().unwrap_or("").trim();
        let query = format!("{media} {} 지점 위치", record.name);
        let query = query.trim();

        let items = match self
            .collab
            .text
            .query(query, SortOrder::Relevance, BRANCH_CHECK_RESULTS)
            .await
        {
            Ok(items) => items,
            Err(e) => {
                warn!(name = %record.name, error = %e, "Branch check failed");
                return Some(RecordVerdict::Deferred(e.to_string()));
            }
        };

        let district = record.locale();
        let head_office = record.name.contains(HEAD_OFFICE);
        let confirmed = items.iter().any(|item| {
            let text = format!("{} {}", strip_markup(&item.title), strip_markup(&item.snippet));
            (!district.is_empty() && text.contains(district))
                || (head_office && text.contains(HEAD_OFFICE))
        });
        debug!(name = %record.name, results = items.len(), confirmed, "Branch checked");

        (!confirmed).then_some(RecordVerdict::Delete(DeleteReason::BranchUnconfirmed))
    }

    /// `None` when a video comment or blog snippet still describes the
    /// venue. Template and category-label fallbacks do not count.
    async fn check_review(&self, record: &VenueRecord) -> Option<RecordVerdict> {
        let video_id = record
            .source_video_url
            .as_deref()
            .and_then(video_id_from_url);
        let comments = match (&self.collab.comments, video_id) {
            (Some(source), Some(id)) => {
                match source.query(&id, SortOrder::Relevance, COMMENTS_PER_VIDEO).await {
                    Ok(items) => items,
                    Err(e) => {
                        warn!(name = %record.name, error = %e, "Comment lookup failed");
                        return Some(RecordVerdict::Deferred(e.to_string()));
                    }
                }
            }
            _ => Vec::new(),
        };

        let query = format!("{} {}", record.name, record.locale());
        let snippets = match self
            .collab
            .text
            .query(query.trim(), SortOrder::Relevance, SNIPPETS_PER_VENUE)
            .await
        {
            Ok(items) => items,
            Err(e) => {
                warn!(name = %record.name, error = %e, "Review lookup failed");
                return Some(RecordVerdict::Deferred(e.to_string()));
            }
        };

        let source = self
            .selector
            .select(
                &comments,
                &snippets,
                &DescriptionContext {
                    name: &record.name,
                    category: &record.category,
                    region: &record.address_city,
                },
            )
            .map(|d| d.source);
        debug!(name = %record.name, ?source, "Review checked");

        match source {
            Some(DescriptionSource::PrimaryReview | DescriptionSource::SecondaryReview) => None,
            _ => Some(RecordVerdict::Delete(DeleteReason::NoReview)),
        }
    }
}

fn apply_verdict(catalog: &mut Catalog, key: &CatalogKey, verdict: RecordVerdict, stats: &mut RunStats) {
    let Some(id) = catalog.find(key).map(|r| r.id) else {
        return;
    };
    match verdict {
        RecordVerdict::Replace { image_url, score } => {
            info!(id, key = %key, score, "Image replaced");
            catalog.update(
                id,
                VenuePatch {
                    image_url: Some(Some(image_url)),
                    verified_score: Some(score),
                    verified_at: Some(Utc::now()),
                    ..Default::default()
                },
            );
            stats.replaced += 1;
        }
        RecordVerdict::Keep { score } => {
            catalog.update(
                id,
                VenuePatch {
                    verified_score: Some(score),
                    verified_at: Some(Utc::now()),
                    ..Default::default()
                },
            );
            stats.unchanged += 1;
        }
        RecordVerdict::Delete(reason) => {
            info!(id, key = %key, reason = %reason, "Record deleted");
            match reason {
                DeleteReason::BranchUnconfirmed => stats.branch_unconfirmed += 1,
                DeleteReason::Inadmissible(_) => stats.inadmissible += 1,
                DeleteReason::NoReview => stats.no_review += 1,
                DeleteReason::LowConfidence(_) => {}
            }
            catalog.delete(id);
            stats.deleted += 1;
        }
        RecordVerdict::Deferred(error) => {
            warn!(id, key = %key, error = %error, "Record deferred");
            stats.deferred += 1;
        }
    }
}
