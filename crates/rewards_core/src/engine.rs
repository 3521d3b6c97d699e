//! Rewards engine - the public operation consumed by the upload flow.
//!
//! Thin orchestrator: the store performs the atomic mutation, the engine
//! diffs the pre/post snapshots into an `UploadResult` the presentation
//! layer reacts to (confirmation message, milestone/level-up celebration).
//! The engine itself knows nothing about celebratory effects.

use crate::catalog::{Catalog, LevelBenefits};
use crate::error::Result;
use crate::store::ProgressionStore;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// A milestone whose achieved flag flipped in this call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarnedMilestone {
    pub id: String,
    pub name: String,
    pub description: String,
    pub points: u64,
}

/// Everything that changed during one `record_upload` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResult {
    /// Total points credited by this call (per-upload + milestone bonuses)
    pub points_earned: u64,
    /// Milestone bonus portion of `points_earned`
    pub milestone_bonus_points: u64,
    /// Daily milestones first, then total milestones, ascending by threshold
    pub earned_milestones: Vec<EarnedMilestone>,
    pub level_up: bool,
    pub previous_level: u32,
    pub new_level: u32,
    /// True when the event key was already committed; nothing was credited
    pub duplicate: bool,
}

/// Orchestrates catalog lookups and store mutations.
pub struct RewardsEngine {
    catalog: Arc<Catalog>,
    store: Arc<ProgressionStore>,
}

impl RewardsEngine {
    pub fn new(catalog: Arc<Catalog>, store: Arc<ProgressionStore>) -> Self {
        Self { catalog, store }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &ProgressionStore {
        &self.store
    }

    /// Record one accepted upload and report everything it changed.
    ///
    /// `upload_date` defaults to the process clock's current UTC date so
    /// that time-zone policy stays with the caller. `event_key` is an
    /// optional idempotency key; replaying a committed key credits nothing.
    pub fn record_upload(
        &self,
        user_id: &str,
        upload_date: Option<NaiveDate>,
        event_key: Option<&str>,
    ) -> Result<UploadResult> {
        let date = upload_date.unwrap_or_else(|| Utc::now().date_naive());
        let applied = self.store.apply_upload(user_id, date, event_key)?;

        if applied.duplicate {
            return Ok(UploadResult {
                points_earned: 0,
                milestone_bonus_points: 0,
                earned_milestones: Vec::new(),
                level_up: false,
                previous_level: applied.updated.level,
                new_level: applied.updated.level,
                duplicate: true,
            });
        }

        // Milestones whose flag flipped in this call, in catalog order.
        let mut earned = Vec::new();
        let mut bonus: u64 = 0;
        for m in self.catalog.daily_milestones() {
            if applied.updated.has_achieved(&m.id) && !applied.previous.has_achieved(&m.id) {
                bonus += m.points;
                earned.push(EarnedMilestone {
                    id: m.id.clone(),
                    name: m.name.clone(),
                    description: m.description.clone(),
                    points: m.points,
                });
            }
        }
        for m in self.catalog.total_milestones() {
            if applied.updated.has_achieved(&m.id) && !applied.previous.has_achieved(&m.id) {
                bonus += m.points;
                earned.push(EarnedMilestone {
                    id: m.id.clone(),
                    name: m.name.clone(),
                    description: m.description.clone(),
                    points: m.points,
                });
            }
        }

        let result = UploadResult {
            points_earned: self.catalog.points_per_upload() + bonus,
            milestone_bonus_points: bonus,
            earned_milestones: earned,
            level_up: applied.updated.level > applied.previous.level,
            previous_level: applied.previous.level,
            new_level: applied.updated.level,
            duplicate: false,
        };

        debug!(
            user = user_id,
            points = result.points_earned,
            level_up = result.level_up,
            "Upload recorded"
        );

        Ok(result)
    }

    /// Benefits for every level up to and including `level`.
    ///
    /// On a level-up the caller treats the last entry's benefits as newly
    /// unlocked.
    pub fn level_benefits(&self, level: u32) -> Vec<LevelBenefits> {
        self.catalog.benefits_up_to_level(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> RewardsEngine {
        let catalog = Arc::new(Catalog::default_catalog());
        let store = Arc::new(ProgressionStore::in_memory(catalog.clone()));
        RewardsEngine::new(catalog, store)
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_plain_upload_result() {
        let engine = engine();
        let result = engine
            .record_upload("alice", Some(day("2025-03-01")), None)
            .unwrap();
        assert_eq!(result.points_earned, 10);
        assert_eq!(result.milestone_bonus_points, 0);
        assert!(result.earned_milestones.is_empty());
        assert!(!result.level_up);
        assert_eq!(result.previous_level, 1);
        assert_eq!(result.new_level, 1);
    }

    #[test]
    fn test_milestone_call_reports_bonus() {
        let engine = engine();
        for _ in 0..4 {
            engine
                .record_upload("alice", Some(day("2025-03-01")), None)
                .unwrap();
        }
        let fifth = engine
            .record_upload("alice", Some(day("2025-03-01")), None)
            .unwrap();
        assert_eq!(fifth.milestone_bonus_points, 50);
        assert_eq!(fifth.points_earned, 60);
        assert_eq!(fifth.earned_milestones.len(), 1);
        assert_eq!(fifth.earned_milestones[0].id, "daily_5");
    }

    #[test]
    fn test_duplicate_event_credits_nothing() {
        let engine = engine();
        engine
            .record_upload("alice", Some(day("2025-03-01")), Some("evt-1"))
            .unwrap();
        let replay = engine
            .record_upload("alice", Some(day("2025-03-01")), Some("evt-1"))
            .unwrap();
        assert!(replay.duplicate);
        assert_eq!(replay.points_earned, 0);
        assert!(replay.earned_milestones.is_empty());
        assert!(!replay.level_up);
    }

    #[test]
    fn test_default_date_uses_process_clock() {
        let engine = engine();
        engine.record_upload("alice", None, None).unwrap();
        let record = engine.store().get("alice").unwrap();
        assert_eq!(record.last_upload_date, Some(Utc::now().date_naive()));
    }

    #[test]
    fn test_level_benefits_passthrough() {
        let engine = engine();
        let benefits = engine.level_benefits(2);
        assert_eq!(benefits.len(), 2);
        assert_eq!(benefits[1].level, 2);
        assert_eq!(benefits[1].benefits[0].name, "Bronze badge");
    }
}
