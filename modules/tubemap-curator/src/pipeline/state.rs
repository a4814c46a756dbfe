use std::fmt;

use tubemap_common::{Candidate, VenueRecord};

use crate::validator::Rejection;

/// Where a candidate is in `Discovered -> Resolved -> Validated -> Scored`.
/// A candidate leaves the chain as Accepted, Rejected or Deferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateState {
    Discovered,
    Resolved,
    Validated,
    Scored,
}

impl fmt::Display for CandidateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CandidateState::Discovered => "discovered",
            CandidateState::Resolved => "resolved",
            CandidateState::Validated => "validated",
            CandidateState::Scored => "scored",
        };
        f.write_str(s)
    }
}

/// Result of evaluating one candidate in a worker.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateOutcome {
    Accepted(Box<VenueRecord>),
    /// Dropped after reaching `at`.
    Rejected {
        at: CandidateState,
        reason: Rejection,
        candidate: Box<Candidate>,
    },
    /// Evidence too weak this run; may be retried later.
    Deferred { name: String, score: Option<i32> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteReason {
    /// Best fresh score below the acceptable threshold, or no evidence.
    LowConfidence(Option<i32>),
    /// Branch name not confirmed by media/branch text evidence.
    BranchUnconfirmed,
    /// Category or name no longer passes the admission filters.
    Inadmissible(String),
    /// No comment or blog review could describe the venue.
    NoReview,
}

impl fmt::Display for DeleteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteReason::LowConfidence(Some(score)) => write!(f, "low confidence ({score})"),
            DeleteReason::LowConfidence(None) => f.write_str("no evidence"),
            DeleteReason::BranchUnconfirmed => f.write_str("branch unconfirmed"),
            DeleteReason::Inadmissible(why) => write!(f, "inadmissible: {why}"),
            DeleteReason::NoReview => f.write_str("no review evidence"),
        }
    }
}

/// Decision for one existing record in a verification run.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordVerdict {
    /// Verified with a different best image.
    Replace { image_url: String, score: i32 },
    /// Verified with the current image, or acceptable.
    Keep { score: i32 },
    Delete(DeleteReason),
    /// A collaborator failed; leave the record untouched.
    Deferred(String),
}
