//! Session Configuration

use serde::{Serialize, Deserialize};

use crate::game::error::ConfigError;
use crate::game::generate::DEFAULT_GENERATION_ATTEMPTS;
use crate::game::grid::{DEFAULT_WIDTH, MAX_WIDTH};
use crate::game::resolver::CascadeRules;
use crate::game::token::PALETTE_SIZE;

/// Configuration for a game session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Board side length.
    pub width: usize,
    /// Number of colors in play (4..=6).
    pub palette_size: usize,
    /// Points per cleared token.
    pub points_per_token: u32,
    /// Combo bonus paid per two prior cascade steps.
    pub combo_bonus_step: u32,
    /// Safety cap on cascade steps per turn.
    pub max_cascade_steps: u32,
    /// Boards tried when looking for a playable start.
    pub generation_attempts: u32,
    /// Regenerate the board when no valid move is left after a turn.
    pub reshuffle_when_stuck: bool,
    /// Opaque key the best score is stored under.
    pub player_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let rules = CascadeRules::default();
        Self {
            width: DEFAULT_WIDTH,
            palette_size: PALETTE_SIZE,
            points_per_token: rules.points_per_token,
            combo_bonus_step: rules.combo_bonus_step,
            max_cascade_steps: rules.max_cascade_steps,
            generation_attempts: DEFAULT_GENERATION_ATTEMPTS,
            reshuffle_when_stuck: true,
            player_key: "local".to_string(),
        }
    }
}

impl SessionConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < 3 {
            return Err(ConfigError::WidthTooSmall(self.width));
        }
        if self.width > MAX_WIDTH {
            return Err(ConfigError::WidthTooLarge(self.width));
        }
        if !(4..=PALETTE_SIZE).contains(&self.palette_size) {
            return Err(ConfigError::PaletteSize(self.palette_size));
        }
        if self.points_per_token == 0 {
            return Err(ConfigError::ZeroPoints);
        }
        if self.max_cascade_steps == 0 {
            return Err(ConfigError::ZeroCascadeCap);
        }
        Ok(())
    }

    /// Cascade parameters derived from this config.
    pub fn rules(&self) -> CascadeRules {
        CascadeRules {
            palette_size: self.palette_size,
            points_per_token: self.points_per_token,
            combo_bonus_step: self.combo_bonus_step,
            max_cascade_steps: self.max_cascade_steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.width, 8);
        assert_eq!(config.rules(), CascadeRules::default());
    }

    #[test]
    fn test_validation() {
        let bad_width = SessionConfig { width: 2, ..SessionConfig::default() };
        assert_eq!(bad_width.validate(), Err(ConfigError::WidthTooSmall(2)));

        let too_wide = SessionConfig { width: 65, ..SessionConfig::default() };
        assert_eq!(too_wide.validate(), Err(ConfigError::WidthTooLarge(65)));
        let widest = SessionConfig { width: MAX_WIDTH, ..SessionConfig::default() };
        assert!(widest.validate().is_ok());

        let bad_palette = SessionConfig { palette_size: 3, ..SessionConfig::default() };
        assert_eq!(bad_palette.validate(), Err(ConfigError::PaletteSize(3)));

        let no_points = SessionConfig { points_per_token: 0, ..SessionConfig::default() };
        assert_eq!(no_points.validate(), Err(ConfigError::ZeroPoints));

        let no_cap = SessionConfig { max_cascade_steps: 0, ..SessionConfig::default() };
        assert_eq!(no_cap.validate(), Err(ConfigError::ZeroCascadeCap));
    }

    #[test]
    fn test_from_json_partial() {
        let config = SessionConfig::from_json(r#"{"width": 6, "player_key": "0xabc"}"#).unwrap();
        assert_eq!(config.width, 6);
        assert_eq!(config.player_key, "0xabc");
        assert_eq!(config.palette_size, PALETTE_SIZE);

        assert!(matches!(SessionConfig::from_json("{"), Err(ConfigError::Json(_))));
        assert_eq!(
            SessionConfig::from_json(r#"{"palette_size": 9}"#),
            Err(ConfigError::PaletteSize(9))
        );
        assert_eq!(
            SessionConfig::from_json(r#"{"width": 5000000000}"#),
            Err(ConfigError::WidthTooLarge(5_000_000_000))
        );
    }
}
