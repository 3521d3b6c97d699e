//! Reward catalog - static definitions for points, milestones, and levels.
//!
//! Immutable after construction. All threshold logic lives here so every
//! consumer derives identical values; display code never re-implements it.
//!
//! Definitions can be loaded from a TOML file or taken from the built-in
//! defaults. Validation happens once, at construction: a malformed catalog
//! is a startup failure, never a runtime error.

use crate::error::{Result, RewardsError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A one-time reward for reaching an upload count within a single day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyMilestone {
    /// Unique milestone identifier (e.g., "daily_5")
    pub id: String,
    /// Uploads required within one calendar day
    pub threshold: u32,
    /// Bonus points awarded on first crossing
    pub points: u64,
    /// Display name
    pub name: String,
    /// Display description
    pub description: String,
}

/// A one-time reward for reaching a lifetime upload count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalMilestone {
    /// Unique milestone identifier (e.g., "total_10")
    pub id: String,
    /// Lifetime uploads required
    pub threshold: u64,
    /// Bonus points awarded on first crossing
    pub points: u64,
    /// Display name
    pub name: String,
    /// Display description
    pub description: String,
}

/// Minimum points required to hold a level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LevelThreshold {
    pub level: u32,
    pub min_points: u64,
}

/// A perk unlocked at a given level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelBenefit {
    pub level: u32,
    pub name: String,
    pub description: String,
}

/// Benefits grouped by level, as returned by [`Catalog::benefits_up_to_level`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelBenefits {
    pub level: u32,
    pub benefits: Vec<LevelBenefit>,
}

fn default_points_per_upload() -> u64 {
    10
}

/// On-disk catalog layout (TOML).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CatalogFile {
    #[serde(default = "default_points_per_upload")]
    pub points_per_upload: u64,

    #[serde(default)]
    pub daily_milestones: Vec<DailyMilestone>,

    #[serde(default)]
    pub total_milestones: Vec<TotalMilestone>,

    #[serde(default)]
    pub level_thresholds: Vec<LevelThreshold>,

    #[serde(default)]
    pub level_benefits: Vec<LevelBenefit>,
}

/// Validated, immutable reward definitions.
///
/// Share across threads via `Arc<Catalog>`; reads need no synchronization.
#[derive(Debug, Clone)]
pub struct Catalog {
    points_per_upload: u64,
    daily_milestones: Vec<DailyMilestone>,
    total_milestones: Vec<TotalMilestone>,
    level_thresholds: Vec<LevelThreshold>,
    level_benefits: Vec<LevelBenefit>,
}

impl Catalog {
    /// Build a catalog from raw definitions, validating invariants.
    ///
    /// Definitions must arrive in ascending threshold order; out-of-order
    /// input is rejected, not normalized.
    pub fn new(file: CatalogFile) -> Result<Self> {
        Self::validate(&file)?;

        Ok(Self {
            points_per_upload: file.points_per_upload,
            daily_milestones: file.daily_milestones,
            total_milestones: file.total_milestones,
            level_thresholds: file.level_thresholds,
            level_benefits: file.level_benefits,
        })
    }

    /// Load and validate a catalog from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            RewardsError::Configuration(format!("Failed to read catalog {:?}: {}", path, e))
        })?;
        let file: CatalogFile = toml::from_str(&content).map_err(|e| {
            RewardsError::Configuration(format!("Failed to parse catalog {:?}: {}", path, e))
        })?;
        Self::new(file)
    }

    /// Built-in default catalog.
    pub fn default_catalog() -> Self {
        let file = CatalogFile {
            points_per_upload: 10,
            daily_milestones: vec![
                DailyMilestone {
                    id: "daily_5".to_string(),
                    threshold: 5,
                    points: 50,
                    name: "Daily Five".to_string(),
                    description: "Upload 5 receipts in a single day".to_string(),
                },
                DailyMilestone {
                    id: "daily_10".to_string(),
                    threshold: 10,
                    points: 120,
                    name: "Daily Ten".to_string(),
                    description: "Upload 10 receipts in a single day".to_string(),
                },
            ],
            total_milestones: vec![
                TotalMilestone {
                    id: "total_10".to_string(),
                    threshold: 10,
                    points: 100,
                    name: "Ten Club".to_string(),
                    description: "Upload 10 receipts in total".to_string(),
                },
                TotalMilestone {
                    id: "total_50".to_string(),
                    threshold: 50,
                    points: 400,
                    name: "Fifty Club".to_string(),
                    description: "Upload 50 receipts in total".to_string(),
                },
                TotalMilestone {
                    id: "total_100".to_string(),
                    threshold: 100,
                    points: 1000,
                    name: "Century".to_string(),
                    description: "Upload 100 receipts in total".to_string(),
                },
            ],
            level_thresholds: vec![
                LevelThreshold { level: 1, min_points: 0 },
                LevelThreshold { level: 2, min_points: 100 },
                LevelThreshold { level: 3, min_points: 250 },
                LevelThreshold { level: 4, min_points: 500 },
                LevelThreshold { level: 5, min_points: 1000 },
            ],
            level_benefits: vec![
                LevelBenefit {
                    level: 2,
                    name: "Bronze badge".to_string(),
                    description: "Bronze profile badge on the leaderboard".to_string(),
                },
                LevelBenefit {
                    level: 3,
                    name: "Silver badge".to_string(),
                    description: "Silver profile badge on the leaderboard".to_string(),
                },
                LevelBenefit {
                    level: 3,
                    name: "Early coupons".to_string(),
                    description: "24h early access to new coupons".to_string(),
                },
                LevelBenefit {
                    level: 4,
                    name: "Gold badge".to_string(),
                    description: "Gold profile badge on the leaderboard".to_string(),
                },
                LevelBenefit {
                    level: 5,
                    name: "VIP coupons".to_string(),
                    description: "Exclusive VIP coupon drops".to_string(),
                },
            ],
        };

        // The built-in definitions always pass validation.
        Self::new(file).expect("default catalog is valid")
    }

    fn validate(file: &CatalogFile) -> Result<()> {
        for m in &file.daily_milestones {
            if m.id.trim().is_empty() {
                return Err(RewardsError::Configuration(
                    "Daily milestone with empty id".to_string(),
                ));
            }
            if m.threshold == 0 {
                return Err(RewardsError::Configuration(format!(
                    "Daily milestone {} has zero threshold",
                    m.id
                )));
            }
        }
        for m in &file.total_milestones {
            if m.id.trim().is_empty() {
                return Err(RewardsError::Configuration(
                    "Total milestone with empty id".to_string(),
                ));
            }
            if m.threshold == 0 {
                return Err(RewardsError::Configuration(format!(
                    "Total milestone {} has zero threshold",
                    m.id
                )));
            }
        }

        // Thresholds strictly increasing in the given order; catches both
        // duplicates and unsorted input.
        for pair in file.daily_milestones.windows(2) {
            if pair[0].threshold >= pair[1].threshold {
                return Err(RewardsError::Configuration(format!(
                    "Daily milestone thresholds not strictly increasing: {} vs {}",
                    pair[0].id, pair[1].id
                )));
            }
        }
        for pair in file.total_milestones.windows(2) {
            if pair[0].threshold >= pair[1].threshold {
                return Err(RewardsError::Configuration(format!(
                    "Total milestone thresholds not strictly increasing: {} vs {}",
                    pair[0].id, pair[1].id
                )));
            }
        }

        // Milestone ids unique across both kinds.
        let mut ids: Vec<&str> = file
            .daily_milestones
            .iter()
            .map(|m| m.id.as_str())
            .chain(file.total_milestones.iter().map(|m| m.id.as_str()))
            .collect();
        ids.sort_unstable();
        for pair in ids.windows(2) {
            if pair[0] == pair[1] {
                return Err(RewardsError::Configuration(format!(
                    "Duplicate milestone id: {}",
                    pair[0]
                )));
            }
        }

        let levels = &file.level_thresholds;
        if levels.is_empty() {
            return Err(RewardsError::Configuration(
                "No level thresholds defined".to_string(),
            ));
        }
        if levels[0].level != 1 || levels[0].min_points != 0 {
            return Err(RewardsError::Configuration(
                "Level 1 must exist with min_points = 0".to_string(),
            ));
        }
        for pair in levels.windows(2) {
            if pair[0].level >= pair[1].level || pair[0].min_points >= pair[1].min_points {
                return Err(RewardsError::Configuration(format!(
                    "Level thresholds not strictly increasing at level {}",
                    pair[1].level
                )));
            }
        }

        let max_level = levels[levels.len() - 1].level;
        for b in &file.level_benefits {
            if b.level < 1 || b.level > max_level {
                return Err(RewardsError::Configuration(format!(
                    "Benefit '{}' references unknown level {}",
                    b.name, b.level
                )));
            }
        }

        Ok(())
    }

    /// Fixed points awarded for every accepted upload, before milestone bonuses.
    pub fn points_per_upload(&self) -> u64 {
        self.points_per_upload
    }

    /// Daily milestones, ascending by threshold.
    pub fn daily_milestones(&self) -> &[DailyMilestone] {
        &self.daily_milestones
    }

    /// Total (lifetime) milestones, ascending by threshold.
    pub fn total_milestones(&self) -> &[TotalMilestone] {
        &self.total_milestones
    }

    /// Largest level whose minimum points do not exceed `points`.
    pub fn level_for_points(&self, points: u64) -> u32 {
        self.level_thresholds
            .iter()
            .rev()
            .find(|t| t.min_points <= points)
            .map(|t| t.level)
            .unwrap_or(1)
    }

    /// Points required to reach `level`, if it exists in the table.
    pub fn min_points_for_level(&self, level: u32) -> Option<u64> {
        self.level_thresholds
            .iter()
            .find(|t| t.level == level)
            .map(|t| t.min_points)
    }

    /// Highest level defined in the catalog.
    pub fn max_level(&self) -> u32 {
        self.level_thresholds[self.level_thresholds.len() - 1].level
    }

    /// Benefits for every level from 1 to `level` inclusive, ascending.
    ///
    /// Levels with no benefits still appear, with an empty list.
    pub fn benefits_up_to_level(&self, level: u32) -> Vec<LevelBenefits> {
        (1..=level.min(self.max_level()))
            .map(|lvl| LevelBenefits {
                level: lvl,
                benefits: self
                    .level_benefits
                    .iter()
                    .filter(|b| b.level == lvl)
                    .cloned()
                    .collect(),
            })
            .collect()
    }

    /// First daily milestone not yet reached at `daily_uploads`.
    ///
    /// `None` once the final cataloged threshold has been reached; callers
    /// must treat that as "no further milestones", not reuse the last entry.
    pub fn next_daily_milestone(&self, daily_uploads: u32) -> Option<&DailyMilestone> {
        self.daily_milestones
            .iter()
            .find(|m| m.threshold > daily_uploads)
    }

    /// First total milestone not yet reached at `total_uploads`.
    pub fn next_total_milestone(&self, total_uploads: u64) -> Option<&TotalMilestone> {
        self.total_milestones
            .iter()
            .find(|m| m.threshold > total_uploads)
    }

    /// All milestone ids, daily first then total, each ascending by threshold.
    pub fn milestone_ids(&self) -> impl Iterator<Item = &str> {
        self.daily_milestones
            .iter()
            .map(|m| m.id.as_str())
            .chain(self.total_milestones.iter().map(|m| m.id.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_points_boundaries() {
        let catalog = Catalog::default_catalog();
        assert_eq!(catalog.level_for_points(0), 1);
        assert_eq!(catalog.level_for_points(99), 1);
        assert_eq!(catalog.level_for_points(100), 2);
        assert_eq!(catalog.level_for_points(249), 2);
        assert_eq!(catalog.level_for_points(250), 3);
        assert_eq!(catalog.level_for_points(1_000_000), 5);
    }

    #[test]
    fn test_benefits_up_to_level_includes_empty_levels() {
        let catalog = Catalog::default_catalog();
        let benefits = catalog.benefits_up_to_level(3);
        assert_eq!(benefits.len(), 3);
        assert_eq!(benefits[0].level, 1);
        assert!(benefits[0].benefits.is_empty());
        assert_eq!(benefits[1].benefits.len(), 1);
        assert_eq!(benefits[2].benefits.len(), 2);
    }

    #[test]
    fn test_next_milestone_sentinel() {
        let catalog = Catalog::default_catalog();
        assert_eq!(catalog.next_daily_milestone(0).unwrap().id, "daily_5");
        assert_eq!(catalog.next_daily_milestone(5).unwrap().id, "daily_10");
        assert!(catalog.next_daily_milestone(10).is_none());
        assert!(catalog.next_total_milestone(100).is_none());
    }

    #[test]
    fn test_rejects_duplicate_thresholds() {
        let file = CatalogFile {
            daily_milestones: vec![
                DailyMilestone {
                    id: "a".into(),
                    threshold: 5,
                    points: 10,
                    name: "A".into(),
                    description: String::new(),
                },
                DailyMilestone {
                    id: "b".into(),
                    threshold: 5,
                    points: 10,
                    name: "B".into(),
                    description: String::new(),
                },
            ],
            level_thresholds: vec![LevelThreshold { level: 1, min_points: 0 }],
            ..Default::default()
        };
        assert!(matches!(
            Catalog::new(file),
            Err(RewardsError::Configuration(_))
        ));
    }

    #[test]
    fn test_rejects_unsorted_thresholds() {
        // Out-of-order definitions are a configuration error, never
        // silently reordered.
        let file = CatalogFile {
            daily_milestones: vec![
                DailyMilestone {
                    id: "daily_10".into(),
                    threshold: 10,
                    points: 120,
                    name: "Ten".into(),
                    description: String::new(),
                },
                DailyMilestone {
                    id: "daily_5".into(),
                    threshold: 5,
                    points: 50,
                    name: "Five".into(),
                    description: String::new(),
                },
            ],
            level_thresholds: vec![LevelThreshold { level: 1, min_points: 0 }],
            ..Default::default()
        };
        assert!(matches!(
            Catalog::new(file),
            Err(RewardsError::Configuration(_))
        ));

        let file = CatalogFile {
            level_thresholds: vec![
                LevelThreshold { level: 1, min_points: 0 },
                LevelThreshold { level: 3, min_points: 250 },
                LevelThreshold { level: 2, min_points: 100 },
            ],
            ..Default::default()
        };
        assert!(matches!(
            Catalog::new(file),
            Err(RewardsError::Configuration(_))
        ));
    }

    #[test]
    fn test_rejects_missing_level_one() {
        let file = CatalogFile {
            level_thresholds: vec![LevelThreshold { level: 2, min_points: 100 }],
            ..Default::default()
        };
        assert!(matches!(
            Catalog::new(file),
            Err(RewardsError::Configuration(_))
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let toml_src = r#"
            points_per_upload = 25

            [[daily_milestones]]
            id = "daily_3"
            threshold = 3
            points = 30
            name = "Three a day"
            description = "Three uploads in one day"

            [[level_thresholds]]
            level = 1
            min_points = 0

            [[level_thresholds]]
            level = 2
            min_points = 200
        "#;
        let file: CatalogFile = toml::from_str(toml_src).unwrap();
        let catalog = Catalog::new(file).unwrap();
        assert_eq!(catalog.points_per_upload(), 25);
        assert_eq!(catalog.level_for_points(199), 1);
        assert_eq!(catalog.level_for_points(200), 2);
    }
}
