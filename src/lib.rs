// src/lib.rs

pub mod clock;
pub mod config;
pub mod error;
pub mod mood;
pub mod open_loops;
pub mod persona;
pub mod promises;
pub mod prompt;
pub mod relationship;
pub mod service;
pub mod session;
pub mod spontaneity;
pub mod store;
pub mod threads;
pub mod utils;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CONFIG, EngineConfig};
pub use error::{EngineError, Result};
pub use service::{CompositionRequest, PersonaService, TurnPreview};
pub use session::Session;
pub use store::{InMemoryStore, PersistenceStore, UserState};
