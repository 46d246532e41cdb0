// src/spontaneity/mod.rs
// Spontaneity engine: session state, probability calculus and the per-turn snapshot

pub mod context;
pub mod probability;
pub mod state;

pub use context::{SpontaneityContext, TurnSituation, build_spontaneity_context};
pub use probability::{
    SelfieInputs, calculate_selfie_probability, calculate_spontaneity_probability,
    calculate_spontaneity_probability_for_label,
};
pub use state::{ConversationState, SpontaneousKind};
