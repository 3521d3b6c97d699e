//! Per-user progression state.
//!
//! One `UserProgression` record per user, owned exclusively by the
//! `ProgressionStore`. Everything here is plain data; the mutation sequence
//! lives in the store so that it happens under the per-user lock.

use crate::catalog::Catalog;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Days of history kept in `recent_activity`.
pub const RECENT_ACTIVITY_DAYS: usize = 7;

/// Idempotency keys remembered per user.
pub const PROCESSED_EVENTS_CAP: usize = 64;

/// Achievement state for a single milestone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MilestoneState {
    pub achieved: bool,
    pub achieved_at: Option<DateTime<Utc>>,
}

/// One day's tally in the activity history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayActivity {
    pub date: NaiveDate,
    pub uploads: u32,
    /// Milestone ids earned on this day
    #[serde(default)]
    pub rewards_earned: Vec<String>,
}

/// Full progression record for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProgression {
    pub user_id: String,

    /// Lifetime points; never decreases
    pub total_points: u64,

    /// Derived from `total_points` via the catalog; cached, never set directly
    pub level: u32,

    /// Uploads on the current calendar day
    pub daily_uploads: u32,

    /// Lifetime uploads; never decreases, never reset
    pub total_uploads: u64,

    /// Date of the most recent upload; drives daily rollover
    pub last_upload_date: Option<NaiveDate>,

    /// Achievement flags, one entry per cataloged milestone
    pub milestones: HashMap<String, MilestoneState>,

    /// Most-recent-first day tallies, capped at [`RECENT_ACTIVITY_DAYS`]
    #[serde(default)]
    pub recent_activity: Vec<DayActivity>,

    /// Most-recent-first idempotency keys, capped at [`PROCESSED_EVENTS_CAP`]
    #[serde(default)]
    pub processed_events: Vec<String>,
}

impl UserProgression {
    /// Fresh zero-state record with milestone entries seeded from the catalog.
    pub fn new(user_id: &str, catalog: &Catalog) -> Self {
        let milestones = catalog
            .milestone_ids()
            .map(|id| (id.to_string(), MilestoneState::default()))
            .collect();

        Self {
            user_id: user_id.to_string(),
            total_points: 0,
            level: catalog.level_for_points(0),
            daily_uploads: 0,
            total_uploads: 0,
            last_upload_date: None,
            milestones,
            recent_activity: Vec::new(),
            processed_events: Vec::new(),
        }
    }

    /// Catalog entries added after this record was created get seeded here.
    pub fn sync_milestones(&mut self, catalog: &Catalog) {
        for id in catalog.milestone_ids() {
            self.milestones
                .entry(id.to_string())
                .or_insert_with(MilestoneState::default);
        }
    }

    /// Whether the given milestone has been achieved.
    pub fn has_achieved(&self, milestone_id: &str) -> bool {
        self.milestones
            .get(milestone_id)
            .map(|s| s.achieved)
            .unwrap_or(false)
    }

    /// Whether this idempotency key has already been committed.
    pub fn has_processed_event(&self, event_key: &str) -> bool {
        self.processed_events.iter().any(|k| k == event_key)
    }

    /// Remember an idempotency key, trimming the oldest beyond the cap.
    pub fn remember_event(&mut self, event_key: &str) {
        self.processed_events.insert(0, event_key.to_string());
        self.processed_events.truncate(PROCESSED_EVENTS_CAP);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_seeds_all_milestones() {
        let catalog = Catalog::default_catalog();
        let record = UserProgression::new("user-1", &catalog);
        assert_eq!(record.level, 1);
        assert_eq!(record.milestones.len(), catalog.milestone_ids().count());
        assert!(record.milestones.values().all(|s| !s.achieved));
    }

    #[test]
    fn test_processed_events_bounded() {
        let catalog = Catalog::default_catalog();
        let mut record = UserProgression::new("user-1", &catalog);
        for i in 0..(PROCESSED_EVENTS_CAP + 10) {
            record.remember_event(&format!("evt-{}", i));
        }
        assert_eq!(record.processed_events.len(), PROCESSED_EVENTS_CAP);
        // Most recent kept, oldest dropped
        assert!(record.has_processed_event("evt-73"));
        assert!(!record.has_processed_event("evt-0"));
    }
}
