//! Read-only projections for the presentation layer.
//!
//! Progress bars and milestone lists are rendered from these snapshots;
//! all derivation (next milestone, points to next level) happens here so
//! display code never re-implements threshold logic. Safe to call
//! arbitrarily often and concurrently; nothing here mutates state.

use crate::catalog::{Catalog, DailyMilestone, LevelBenefits, TotalMilestone};
use crate::error::Result;
use crate::progression::UserProgression;
use crate::store::ProgressionStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Progress toward the next uncrossed milestone.
///
/// Absent (`None` in [`UploadStats`]) once the final cataloged threshold has
/// been reached - there is no "next" to render, rather than a stalled 100%.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilestoneProgress {
    pub id: String,
    pub name: String,
    pub current: u64,
    pub threshold: u64,
}

/// Snapshot plus derived display fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadStats {
    pub progression: UserProgression,
    /// Points still needed for the next level; `None` at the top level
    pub points_to_next_level: Option<u64>,
    pub next_daily_milestone: Option<MilestoneProgress>,
    pub next_total_milestone: Option<MilestoneProgress>,
}

/// Both milestone catalogs, for rendering milestone lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilestoneCatalog {
    pub daily: Vec<DailyMilestone>,
    pub total: Vec<TotalMilestone>,
}

/// Read-only facade over the catalog and store.
pub struct QueryFacade {
    catalog: Arc<Catalog>,
    store: Arc<ProgressionStore>,
}

impl QueryFacade {
    pub fn new(catalog: Arc<Catalog>, store: Arc<ProgressionStore>) -> Self {
        Self { catalog, store }
    }

    /// Upload statistics for one user, with derived progress fields.
    pub fn receipt_upload_stats(&self, user_id: &str) -> Result<UploadStats> {
        let progression = self.store.get(user_id)?;

        let points_to_next_level = self
            .catalog
            .min_points_for_level(progression.level + 1)
            .map(|min| min.saturating_sub(progression.total_points));

        let next_daily_milestone =
            self.catalog
                .next_daily_milestone(progression.daily_uploads)
                .map(|m| MilestoneProgress {
                    id: m.id.clone(),
                    name: m.name.clone(),
                    current: u64::from(progression.daily_uploads),
                    threshold: u64::from(m.threshold),
                });

        let next_total_milestone =
            self.catalog
                .next_total_milestone(progression.total_uploads)
                .map(|m| MilestoneProgress {
                    id: m.id.clone(),
                    name: m.name.clone(),
                    current: progression.total_uploads,
                    threshold: m.threshold,
                });

        Ok(UploadStats {
            progression,
            points_to_next_level,
            next_daily_milestone,
            next_total_milestone,
        })
    }

    /// Both milestone catalogs.
    pub fn receipt_milestones(&self) -> MilestoneCatalog {
        MilestoneCatalog {
            daily: self.catalog.daily_milestones().to_vec(),
            total: self.catalog.total_milestones().to_vec(),
        }
    }

    /// Benefits for every level up to and including `level`.
    pub fn level_benefits(&self, level: u32) -> Vec<LevelBenefits> {
        self.catalog.benefits_up_to_level(level)
    }
}
