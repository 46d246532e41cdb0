// src/relationship/mod.rs
// Relationship metrics, tiers and the per-tier behavior table

pub mod tiers;
pub mod types;

pub use tiers::{TierProfile, profile, spontaneity_bonus_for_label};
pub use types::{FamiliarityStage, RelationshipMetrics, RelationshipTier};
