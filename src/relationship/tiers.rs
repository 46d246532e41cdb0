// src/relationship/tiers.rs
// Per-tier behavioral constants, one row per tier

use tracing::warn;

use super::types::RelationshipTier;

/// Everything callers need to know about a tier, in one place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierProfile {
    pub tier: RelationshipTier,
    /// How the relationship is described to the model
    pub label: &'static str,
    /// Added to the base spontaneity probability
    pub spontaneity_bonus: f64,
    /// `None` means selfies are off the table for this tier
    pub selfie_bonus: Option<f64>,
    /// Added to mood warmth
    pub warmth_bias: f64,
    pub guidance: &'static str,
}

static TIER_PROFILES: [TierProfile; 7] = [
    TierProfile {
        tier: RelationshipTier::Adversarial,
        label: "strained, openly hostile",
        spontaneity_bonus: -0.05,
        selfie_bonus: None,
        warmth_bias: -0.25,
        guidance: "Things between you are bad right now. Stay civil but guarded, keep replies short, \
                   and do not pretend everything is fine. Don't volunteer personal details.",
    },
    TierProfile {
        tier: RelationshipTier::Rival,
        label: "prickly, competitive",
        spontaneity_bonus: -0.03,
        selfie_bonus: None,
        warmth_bias: -0.15,
        guidance: "There's friction here. Banter can have an edge, but you don't owe them warmth. \
                   Push back when they're wrong.",
    },
    TierProfile {
        tier: RelationshipTier::NeutralNegative,
        label: "cool, a little wary",
        spontaneity_bonus: 0.0,
        selfie_bonus: None,
        warmth_bias: -0.05,
        guidance: "You're not sure about them yet and a few things have rubbed you the wrong way. \
                   Be polite and give them a chance to turn it around.",
    },
    TierProfile {
        tier: RelationshipTier::Acquaintance,
        label: "new, still getting to know each other",
        spontaneity_bonus: 0.0,
        selfie_bonus: None,
        warmth_bias: 0.0,
        guidance: "You're still getting to know each other. Be friendly and curious, ask about them, \
                   but don't act like an old friend or share anything too personal.",
    },
    TierProfile {
        tier: RelationshipTier::Friend,
        label: "friends",
        spontaneity_bonus: 0.05,
        selfie_bonus: Some(0.02),
        warmth_bias: 0.05,
        guidance: "You're friends. Tease a little, share what's going on with you, and remember \
                   the things they've told you.",
    },
    TierProfile {
        tier: RelationshipTier::CloseFriend,
        label: "close friends",
        spontaneity_bonus: 0.10,
        selfie_bonus: Some(0.05),
        warmth_bias: 0.10,
        guidance: "You're close. Inside jokes, honest opinions and real vulnerability are all normal \
                   here. Check in on them without being asked.",
    },
    TierProfile {
        tier: RelationshipTier::DeeplyLoving,
        label: "deeply bonded",
        spontaneity_bonus: 0.15,
        selfie_bonus: Some(0.08),
        warmth_bias: 0.15,
        guidance: "You're deeply bonded. Affection comes easily and you don't need to announce it. \
                   Be fully yourself, including the messy parts.",
    },
];

/// Look up the row for a tier.
pub fn profile(tier: RelationshipTier) -> &'static TierProfile {
    // Table order matches the enum's declaration order
    &TIER_PROFILES[tier as usize]
}

/// Spontaneity bonus for a raw tier label. Unknown labels get no bonus.
pub fn spontaneity_bonus_for_label(label: &str) -> f64 {
    match RelationshipTier::parse(label) {
        Some(tier) => profile(tier).spontaneity_bonus,
        None => {
            warn!(tier = label, "Unknown relationship tier, using zero spontaneity bonus");
            0.0
        }
    }
}
