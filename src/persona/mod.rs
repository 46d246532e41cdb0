// src/persona/mod.rs
// Persona identity text. Everything situational is layered on by the prompt sections.

pub mod default;

pub use default::DEFAULT_PERSONA_PROMPT;

/// Personality modes the identity text can be drawn from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PersonaOverlay {
    #[default]
    Default,
}

impl PersonaOverlay {
    /// Raw identity template for this overlay
    pub fn template(&self) -> &'static str {
        match self {
            PersonaOverlay::Default => DEFAULT_PERSONA_PROMPT,
        }
    }

    /// Identity text with the persona's name filled in
    pub fn prompt(&self, name: &str) -> String {
        let name = name.trim();
        let name = if name.is_empty() { "Mira" } else { name };
        self.template().replace("{name}", name)
    }
}

impl std::fmt::Display for PersonaOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersonaOverlay::Default => write!(f, "default"),
        }
    }
}

impl std::str::FromStr for PersonaOverlay {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(PersonaOverlay::Default),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_fills_name() {
        let prompt = PersonaOverlay::Default.prompt("Juno");
        assert!(prompt.starts_with("You are Juno. "));
        assert!(prompt.ends_with("you stay Juno wherever the conversation goes."));
        assert!(!prompt.contains("{name}"));
    }

    #[test]
    fn test_blank_name_falls_back() {
        assert!(PersonaOverlay::Default.prompt("  ").starts_with("You are Mira"));
    }

    #[test]
    fn test_parse_overlay() {
        assert_eq!("Default".parse::<PersonaOverlay>(), Ok(PersonaOverlay::Default));
        assert!("flirty".parse::<PersonaOverlay>().is_err());
    }
}
