use std::collections::BTreeMap;
use std::fmt;

use uuid::Uuid;

use crate::validator::Rejection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Collection,
    Verification,
}

/// Stats from a collection or verification run.
#[derive(Debug, Default)]
pub struct RunStats {
    pub run_id: Uuid,
    pub mode: RunMode,
    pub queries_failed: u32,
    pub discovered: u32,
    pub evaluated: u32,
    pub accepted: u32,
    pub rejected: BTreeMap<&'static str, u32>,
    pub deferred: u32,
    pub media_merged: u32,
    pub quota_reached: bool,
    pub checked: u32,
    pub replaced: u32,
    pub unchanged: u32,
    pub deleted: u32,
    pub branch_unconfirmed: u32,
    pub inadmissible: u32,
    pub no_review: u32,
}

impl RunStats {
    pub fn new(mode: RunMode) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            mode,
            ..Default::default()
        }
    }

    pub fn reject(&mut self, reason: &Rejection) {
        *self.rejected.entry(reason.code()).or_default() += 1;
    }

    pub fn rejected_total(&self) -> u32 {
        self.rejected.values().sum()
    }

    /// True when the run changed the catalog.
    pub fn changed(&self) -> bool {
        self.accepted + self.media_merged + self.replaced + self.deleted > 0
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            RunMode::Collection => {
                writeln!(f, "\n=== Collection Run Complete ===")?;
                writeln!(f, "Candidates discovered: {}", self.discovered)?;
                writeln!(f, "Candidates evaluated:  {}", self.evaluated)?;
                writeln!(f, "Accepted:              {}", self.accepted)?;
                writeln!(f, "Deferred:              {}", self.deferred)?;
                writeln!(f, "Rejected:              {}", self.rejected_total())?;
                for (reason, count) in &self.rejected {
                    writeln!(f, "  {reason:<18} {count}")?;
                }
                if self.media_merged > 0 {
                    writeln!(f, "Media merged:          {}", self.media_merged)?;
                }
                if self.quota_reached {
                    writeln!(f, "Quota reached, remaining candidates abandoned")?;
                }
            }
            RunMode::Verification => {
                writeln!(f, "\n=== Verification Run Complete ===")?;
                writeln!(f, "Records checked:    {}", self.checked)?;
                writeln!(f, "Images replaced:    {}", self.replaced)?;
                writeln!(f, "Unchanged:          {}", self.unchanged)?;
                writeln!(f, "Deleted:            {}", self.deleted)?;
                writeln!(f, "  branch unconfirmed: {}", self.branch_unconfirmed)?;
                writeln!(f, "  inadmissible:       {}", self.inadmissible)?;
                writeln!(f, "  no review:          {}", self.no_review)?;
                writeln!(f, "Deferred:           {}", self.deferred)?;
            }
        }
        if self.queries_failed > 0 {
            writeln!(f, "Failed queries:     {}", self.queries_failed)?;
        }
        writeln!(f, "Run id: {}", self.run_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_are_counted_by_reason() {
        let mut stats = RunStats::new(RunMode::Collection);
        stats.reject(&Rejection::NotFound);
        stats.reject(&Rejection::NotFound);
        stats.reject(&Rejection::Franchise("스타벅스".into()));
        assert_eq!(stats.rejected["not_found"], 2);
        assert_eq!(stats.rejected_total(), 3);
        assert!(!stats.changed());

        let out = stats.to_string();
        assert!(out.contains("franchise"));
        assert!(out.contains("Rejected:              3"));
    }

    #[test]
    fn verification_summary() {
        let stats = RunStats {
            checked: 4,
            deleted: 1,
            ..RunStats::new(RunMode::Verification)
        };
        assert!(stats.changed());
        assert!(stats.to_string().contains("Deleted:            1"));
    }
}
