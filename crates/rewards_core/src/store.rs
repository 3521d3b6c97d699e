//! Progression store - owns and atomically mutates per-user state.
//!
//! In-memory cache behind a `RwLock`, optionally backed by one JSON file
//! per user (atomic temp-file + rename writes). `apply_upload` is the sole
//! mutation path and is serialized per user: two uploads for the same user
//! never interleave, uploads for different users never block each other.

use crate::catalog::Catalog;
use crate::error::{Result, RewardsError};
use crate::progression::{DayActivity, UserProgression, RECENT_ACTIVITY_DAYS};
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info};

/// Pre/post snapshots of one committed upload.
#[derive(Debug, Clone)]
pub struct UploadApplied {
    /// State before the upload
    pub previous: UserProgression,
    /// State after the upload
    pub updated: UserProgression,
    /// True when the event key was already committed; nothing moved
    pub duplicate: bool,
}

/// Store holding every user's progression record.
pub struct ProgressionStore {
    catalog: Arc<Catalog>,
    /// Persistence directory; `None` keeps the store purely in-memory
    data_dir: Option<PathBuf>,
    /// Committed records
    cache: RwLock<HashMap<String, UserProgression>>,
    /// Per-user mutation locks
    user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ProgressionStore {
    /// Purely in-memory store (tests, embedded use).
    pub fn in_memory(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            data_dir: None,
            cache: RwLock::new(HashMap::new()),
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Open a store persisting one JSON file per user under `path`.
    pub fn open(catalog: Arc<Catalog>, path: &Path) -> Result<Self> {
        fs::create_dir_all(path).map_err(|e| {
            RewardsError::StorageUnavailable(format!(
                "Failed to create data directory {:?}: {}",
                path, e
            ))
        })?;

        Ok(Self {
            catalog,
            data_dir: Some(path.to_path_buf()),
            cache: RwLock::new(HashMap::new()),
            user_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Current snapshot for a user, or a fresh zero-state record.
    ///
    /// Always a defensive copy; never mutates the store.
    pub fn get(&self, user_id: &str) -> Result<UserProgression> {
        let user_id = validate_user_id(user_id)?;

        if let Some(record) = self.cache.read().unwrap().get(user_id) {
            return Ok(record.clone());
        }

        if let Some(record) = self.load_user(user_id)? {
            return Ok(record);
        }

        Ok(UserProgression::new(user_id, &self.catalog))
    }

    /// Apply one upload event as a single atomic unit.
    ///
    /// Steps: rollover the daily counter on a calendar-day change, bump
    /// counters, mark newly crossed milestones, award points, recompute the
    /// level, and update today's activity entry. Either the whole sequence
    /// commits (cache and disk) or none of it does.
    ///
    /// A repeated `event_key` is a committed no-op: the returned snapshots
    /// are identical and `duplicate` is set.
    pub fn apply_upload(
        &self,
        user_id: &str,
        upload_date: NaiveDate,
        event_key: Option<&str>,
    ) -> Result<UploadApplied> {
        let user_id = validate_user_id(user_id)?;

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().unwrap();

        let mut record = match self.cache.read().unwrap().get(user_id) {
            Some(r) => r.clone(),
            None => match self.load_user(user_id)? {
                Some(r) => r,
                None => UserProgression::new(user_id, &self.catalog),
            },
        };
        record.sync_milestones(&self.catalog);

        if let Some(key) = event_key {
            if record.has_processed_event(key) {
                debug!(user = user_id, key, "Duplicate upload event ignored");
                return Ok(UploadApplied {
                    previous: record.clone(),
                    updated: record,
                    duplicate: true,
                });
            }
        }

        let previous = record.clone();

        // Calendar-day rollover: archive the finished day before counting.
        if let Some(last) = record.last_upload_date {
            if upload_date > last {
                if record.daily_uploads > 0 {
                    upsert_day(&mut record.recent_activity, last, record.daily_uploads, &[]);
                }
                record.daily_uploads = 0;
                debug!(user = user_id, %last, %upload_date, "Daily counter rollover");
            }
        }

        record.daily_uploads += 1;
        record.total_uploads += 1;
        // Clock skew can hand us an older date; the day counter never moves backwards.
        if record.last_upload_date.map_or(true, |d| upload_date > d) {
            record.last_upload_date = Some(upload_date);
        }

        // Newly crossed milestones, daily first then total, ascending.
        let now = Utc::now();
        let mut earned_ids: Vec<String> = Vec::new();
        let mut bonus: u64 = 0;

        for m in self.catalog.daily_milestones() {
            if m.threshold <= record.daily_uploads && !record.has_achieved(&m.id) {
                if let Some(state) = record.milestones.get_mut(&m.id) {
                    state.achieved = true;
                    state.achieved_at = Some(now);
                }
                bonus += m.points;
                earned_ids.push(m.id.clone());
            }
        }
        for m in self.catalog.total_milestones() {
            if m.threshold <= record.total_uploads && !record.has_achieved(&m.id) {
                if let Some(state) = record.milestones.get_mut(&m.id) {
                    state.achieved = true;
                    state.achieved_at = Some(now);
                }
                bonus += m.points;
                earned_ids.push(m.id.clone());
            }
        }

        record.total_points += self.catalog.points_per_upload() + bonus;
        record.level = self.catalog.level_for_points(record.total_points);

        let today = record.last_upload_date.unwrap_or(upload_date);
        upsert_day(
            &mut record.recent_activity,
            today,
            record.daily_uploads,
            &earned_ids,
        );

        if let Some(key) = event_key {
            record.remember_event(key);
        }

        // Persist before publishing to the cache; a write failure leaves
        // the committed state untouched.
        self.save_user(&record)?;
        self.cache
            .write()
            .unwrap()
            .insert(user_id.to_string(), record.clone());

        if !earned_ids.is_empty() || record.level > previous.level {
            info!(
                user = user_id,
                milestones = ?earned_ids,
                level = record.level,
                "Progression advanced"
            );
        }

        Ok(UploadApplied {
            previous,
            updated: record,
            duplicate: false,
        })
    }

    fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().unwrap();
        locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn user_path(&self, user_id: &str) -> Option<PathBuf> {
        let dir = self.data_dir.as_ref()?;
        // Sanitize user_id for the filesystem
        let safe_id = user_id.replace(['/', '\\', ':', '.'], "_");
        Some(dir.join(format!("{}.json", safe_id)))
    }

    fn load_user(&self, user_id: &str) -> Result<Option<UserProgression>> {
        let Some(path) = self.user_path(user_id) else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            RewardsError::StorageUnavailable(format!("Failed to read {:?}: {}", path, e))
        })?;
        let mut record: UserProgression = serde_json::from_str(&content).map_err(|e| {
            RewardsError::StorageUnavailable(format!("Corrupt record {:?}: {}", path, e))
        })?;
        record.sync_milestones(&self.catalog);
        Ok(Some(record))
    }

    fn save_user(&self, record: &UserProgression) -> Result<()> {
        let Some(path) = self.user_path(&record.user_id) else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(record)?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|e| {
            RewardsError::StorageUnavailable(format!("Failed to write {:?}: {}", tmp, e))
        })?;
        fs::rename(&tmp, &path).map_err(|e| {
            RewardsError::StorageUnavailable(format!("Failed to commit {:?}: {}", path, e))
        })?;
        Ok(())
    }
}

/// Update or insert a day's tally, keeping most-recent-first order and the cap.
fn upsert_day(activity: &mut Vec<DayActivity>, date: NaiveDate, uploads: u32, earned: &[String]) {
    if let Some(entry) = activity.iter_mut().find(|a| a.date == date) {
        entry.uploads = uploads;
        entry.rewards_earned.extend(earned.iter().cloned());
    } else {
        activity.insert(
            0,
            DayActivity {
                date,
                uploads,
                rewards_earned: earned.to_vec(),
            },
        );
        activity.sort_by(|a, b| b.date.cmp(&a.date));
        activity.truncate(RECENT_ACTIVITY_DAYS);
    }
}

fn validate_user_id(user_id: &str) -> Result<&str> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(RewardsError::InvalidArgument(
            "user_id must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ProgressionStore {
        ProgressionStore::in_memory(Arc::new(Catalog::default_catalog()))
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_empty_user_id_rejected_without_mutation() {
        let store = store();
        let err = store.apply_upload("  ", day("2025-03-01"), None).unwrap_err();
        assert!(matches!(err, RewardsError::InvalidArgument(_)));
        assert!(store.cache.read().unwrap().is_empty());
    }

    #[test]
    fn test_first_upload_initializes_record() {
        let store = store();
        let applied = store.apply_upload("alice", day("2025-03-01"), None).unwrap();
        assert_eq!(applied.previous.total_uploads, 0);
        assert_eq!(applied.updated.total_uploads, 1);
        assert_eq!(applied.updated.daily_uploads, 1);
        assert_eq!(applied.updated.total_points, 10);
        assert_eq!(applied.updated.level, 1);
    }

    #[test]
    fn test_daily_rollover_resets_to_one_and_archives() {
        let store = store();
        for _ in 0..3 {
            store.apply_upload("alice", day("2025-03-01"), None).unwrap();
        }
        let applied = store.apply_upload("alice", day("2025-03-02"), None).unwrap();
        let updated = applied.updated;
        assert_eq!(updated.daily_uploads, 1);
        assert_eq!(updated.total_uploads, 4);
        assert_eq!(updated.recent_activity[0].date, day("2025-03-02"));
        assert_eq!(updated.recent_activity[0].uploads, 1);
        assert_eq!(updated.recent_activity[1].date, day("2025-03-01"));
        assert_eq!(updated.recent_activity[1].uploads, 3);
    }

    #[test]
    fn test_recent_activity_capped_at_seven_days() {
        let store = store();
        for d in 1..=10 {
            let date = day(&format!("2025-03-{:02}", d));
            store.apply_upload("alice", date, None).unwrap();
        }
        let record = store.get("alice").unwrap();
        assert_eq!(record.recent_activity.len(), RECENT_ACTIVITY_DAYS);
        assert_eq!(record.recent_activity[0].date, day("2025-03-10"));
        assert_eq!(record.recent_activity[6].date, day("2025-03-04"));
        // The lifetime counter keeps the rolled-off days
        assert_eq!(record.total_uploads, 10);
    }

    #[test]
    fn test_out_of_order_date_does_not_reset_daily_counter() {
        let store = store();
        store.apply_upload("alice", day("2025-03-02"), None).unwrap();
        let applied = store.apply_upload("alice", day("2025-03-01"), None).unwrap();
        assert_eq!(applied.updated.daily_uploads, 2);
        assert_eq!(applied.updated.last_upload_date, Some(day("2025-03-02")));
    }

    #[test]
    fn test_duplicate_event_key_is_noop() {
        let store = store();
        let first = store
            .apply_upload("alice", day("2025-03-01"), Some("evt-1"))
            .unwrap();
        assert!(!first.duplicate);

        let replay = store
            .apply_upload("alice", day("2025-03-01"), Some("evt-1"))
            .unwrap();
        assert!(replay.duplicate);
        assert_eq!(replay.updated.total_uploads, 1);
        assert_eq!(replay.updated.total_points, first.updated.total_points);
    }

    #[test]
    fn test_get_does_not_create_records() {
        let store = store();
        let record = store.get("nobody").unwrap();
        assert_eq!(record.total_uploads, 0);
        assert!(store.cache.read().unwrap().is_empty());
    }

    #[test]
    fn test_milestone_awarded_exactly_once() {
        let store = store();
        for _ in 0..5 {
            store.apply_upload("alice", day("2025-03-01"), None).unwrap();
        }
        let record = store.get("alice").unwrap();
        assert!(record.has_achieved("daily_5"));
        // 5 uploads * 10 + daily_5 bonus 50
        assert_eq!(record.total_points, 100);

        // Counter stays above the threshold; no second award
        store.apply_upload("alice", day("2025-03-01"), None).unwrap();
        let record = store.get("alice").unwrap();
        assert_eq!(record.total_points, 110);
    }
}
