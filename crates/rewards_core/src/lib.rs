//! Rewards Core - Rewards & Progression Engine
//!
//! Converts accepted receipt uploads into points, detects milestone and
//! level threshold crossings, and exposes progression snapshots.
//!
//! One-time rewards are credited exactly once, also under concurrent or
//! retried upload events; the daily counter rolls over on calendar-day
//! boundaries; points, level, and milestone state stay mutually consistent.

pub mod catalog;
pub mod engine;
pub mod error;
pub mod progression;
pub mod query;
pub mod store;

pub use catalog::{
    Catalog, CatalogFile, DailyMilestone, LevelBenefit, LevelBenefits, LevelThreshold,
    TotalMilestone,
};
pub use engine::{EarnedMilestone, RewardsEngine, UploadResult};
pub use error::{Result, RewardsError};
pub use progression::{DayActivity, MilestoneState, UserProgression};
pub use query::{MilestoneCatalog, MilestoneProgress, QueryFacade, UploadStats};
pub use store::{ProgressionStore, UploadApplied};
