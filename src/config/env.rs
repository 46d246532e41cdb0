// src/config/env.rs
// Environment overrides layered on top of the defaults

use std::str::FromStr;

use tracing::{debug, warn};

use super::EngineConfig;

/// Read `key` from the environment, falling back to `default` when it is
/// missing or does not parse. Trailing `# comments` are ignored.
pub(crate) fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            let clean_val = val.split('#').next().unwrap_or("").trim();
            match clean_val.parse::<T>() {
                Ok(parsed) => {
                    debug!(key, value = clean_val, "Config value from environment");
                    parsed
                }
                Err(_) => {
                    warn!(key, value = %val, "Config value failed to parse, using default");
                    default
                }
            }
        }
        Err(_) => default,
    }
}

impl EngineConfig {
    /// Defaults overlaid with `PERSONA_*` environment variables. An
    /// overlay that fails validation is dropped in favour of the defaults.
    pub fn from_env() -> Self {
        // Don't fail if .env doesn't exist (production)
        dotenvy::dotenv().ok();
        Self::default().with_env_overrides().validated_or_default()
    }

    fn validated_or_default(self) -> Self {
        match self.validate() {
            Ok(()) => self,
            Err(e) => {
                warn!(error = %e, "Environment config invalid, using defaults");
                Self::default()
            }
        }
    }

    /// Apply `PERSONA_*` environment variables to this config.
    pub fn with_env_overrides(mut self) -> Self {
        self.persona.name = env_var_or("PERSONA_NAME", self.persona.name);
        self.persona.utc_offset_minutes =
            env_var_or("PERSONA_UTC_OFFSET_MINUTES", self.persona.utc_offset_minutes);

        self.spontaneity.max_probability =
            env_var_or("PERSONA_SPONTANEITY_MAX", self.spontaneity.max_probability);
        self.spontaneity.cooldown_minutes =
            env_var_or("PERSONA_SPONTANEITY_COOLDOWN_MINUTES", self.spontaneity.cooldown_minutes);

        self.selfie.max_probability = env_var_or("PERSONA_SELFIE_MAX", self.selfie.max_probability);
        self.selfie.cooldown_hours =
            env_var_or("PERSONA_SELFIE_COOLDOWN_HOURS", self.selfie.cooldown_hours);

        self.fetch.timeout_ms = env_var_or("PERSONA_FETCH_TIMEOUT_MS", self.fetch.timeout_ms);

        self
    }
}
