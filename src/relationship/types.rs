// src/relationship/types.rs

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Discrete relationship classification, ordered from most hostile to closest.
///
/// Deserializes through [`RelationshipTier::parse`]; unknown labels become
/// `Acquaintance` instead of failing the whole record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum RelationshipTier {
    Adversarial,
    Rival,
    NeutralNegative,
    Acquaintance,
    Friend,
    CloseFriend,
    DeeplyLoving,
}

impl RelationshipTier {
    pub const ALL: [RelationshipTier; 7] = [
        RelationshipTier::Adversarial,
        RelationshipTier::Rival,
        RelationshipTier::NeutralNegative,
        RelationshipTier::Acquaintance,
        RelationshipTier::Friend,
        RelationshipTier::CloseFriend,
        RelationshipTier::DeeplyLoving,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipTier::Adversarial => "adversarial",
            RelationshipTier::Rival => "rival",
            RelationshipTier::NeutralNegative => "neutral_negative",
            RelationshipTier::Acquaintance => "acquaintance",
            RelationshipTier::Friend => "friend",
            RelationshipTier::CloseFriend => "close_friend",
            RelationshipTier::DeeplyLoving => "deeply_loving",
        }
    }

    /// Parse a tier label. "stranger" is the no-record default and maps to
    /// `Acquaintance`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "adversarial" => Some(RelationshipTier::Adversarial),
            "rival" => Some(RelationshipTier::Rival),
            "neutral_negative" | "neutral-negative" => Some(RelationshipTier::NeutralNegative),
            "acquaintance" | "stranger" => Some(RelationshipTier::Acquaintance),
            "friend" => Some(RelationshipTier::Friend),
            "close_friend" | "close-friend" => Some(RelationshipTier::CloseFriend),
            "deeply_loving" | "deeply-loving" => Some(RelationshipTier::DeeplyLoving),
            _ => None,
        }
    }

    /// Lenient parse for stored labels: unknown ones fall back to `Acquaintance`.
    pub fn parse_or_default(s: &str) -> Self {
        Self::parse(s).unwrap_or_else(|| {
            warn!(tier = s, "Unknown relationship tier, treating as acquaintance");
            RelationshipTier::Acquaintance
        })
    }

    /// Derive a tier from a relationship score in [-100, 100].
    pub fn from_score(score: f64) -> Self {
        if score.is_nan() {
            return RelationshipTier::Acquaintance;
        }
        match score {
            s if s < -50.0 => RelationshipTier::Adversarial,
            s if s < -10.0 => RelationshipTier::Rival,
            s if s < 0.0 => RelationshipTier::NeutralNegative,
            s if s < 10.0 => RelationshipTier::Acquaintance,
            s if s < 50.0 => RelationshipTier::Friend,
            s if s < 75.0 => RelationshipTier::CloseFriend,
            _ => RelationshipTier::DeeplyLoving,
        }
    }

    /// Friend or closer
    pub fn is_friendly(&self) -> bool {
        *self >= RelationshipTier::Friend
    }
}

impl std::fmt::Display for RelationshipTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How well the persona knows the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FamiliarityStage {
    Early,
    Developing,
    Established,
}

impl FamiliarityStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FamiliarityStage::Early => "early",
            FamiliarityStage::Developing => "developing",
            FamiliarityStage::Established => "established",
        }
    }

    pub fn from_interactions(total_interactions: u32) -> Self {
        match total_interactions {
            0..=4 => FamiliarityStage::Early,
            5..=24 => FamiliarityStage::Developing,
            _ => FamiliarityStage::Established,
        }
    }
}

/// Relationship scores and derived tier for one user.
///
/// Owned by the persistence layer; this crate only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipMetrics {
    pub warmth_score: f64,
    pub trust_score: f64,
    pub playfulness_score: f64,
    pub stability_score: f64,
    /// Overall affinity in [-100, 100]
    #[serde(default)]
    pub relationship_score: f64,
    #[serde(default)]
    pub total_interactions: u32,
    pub tier: RelationshipTier,
    #[serde(default)]
    pub is_ruptured: bool,
    pub familiarity_stage: FamiliarityStage,
}

impl RelationshipMetrics {
    /// Defaults used when no relationship record exists yet
    pub fn stranger() -> Self {
        Self {
            warmth_score: 0.0,
            trust_score: 0.0,
            playfulness_score: 0.0,
            stability_score: 0.0,
            relationship_score: 0.0,
            total_interactions: 0,
            tier: RelationshipTier::Acquaintance,
            is_ruptured: false,
            familiarity_stage: FamiliarityStage::Early,
        }
    }

    /// Build metrics from raw scores, deriving tier and familiarity.
    pub fn from_scores(
        relationship_score: f64,
        warmth_score: f64,
        trust_score: f64,
        playfulness_score: f64,
        stability_score: f64,
        total_interactions: u32,
    ) -> Self {
        Self {
            warmth_score,
            trust_score,
            playfulness_score,
            stability_score,
            relationship_score,
            total_interactions,
            tier: RelationshipTier::from_score(relationship_score),
            is_ruptured: false,
            familiarity_stage: FamiliarityStage::from_interactions(total_interactions),
        }
    }
}

impl From<String> for RelationshipTier {
    fn from(s: String) -> Self {
        Self::parse_or_default(&s)
    }
}

impl Default for RelationshipMetrics {
    fn default() -> Self {
        Self::stranger()
    }
}
