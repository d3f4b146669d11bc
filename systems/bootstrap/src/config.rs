//! Reader for the key/value session configuration.
//!
//! The syntax is that of a URL query string (`w=13&h=6&s=2&edit`). Numeric
//! values that are zero or fail to parse fall back to their defaults and are
//! reported through `tracing::warn!`; only structural problems are errors.

use maze_quest_core::{GameConfig, PlayerSelection};
use thiserror::Error;

/// Largest accepted width or height.
pub const MAX_SIDE: u32 = 64;

/// Errors raised while reading a configuration.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The requested grid exceeds [`MAX_SIDE`] in some dimension.
    #[error("grid of {width}x{height} exceeds the maximum side of {max}")]
    GridTooLarge {
        /// Requested number of columns.
        width: u32,
        /// Requested number of rows.
        height: u32,
        /// Largest accepted side.
        max: u32,
    },
    /// A `key=value` pair could not be split.
    #[error("malformed configuration pair `{pair}`")]
    MalformedPair {
        /// Offending pair as written.
        pair: String,
    },
}

/// Accumulates configuration pairs on top of the defaults.
#[derive(Clone, Debug)]
pub struct ConfigReader {
    config: GameConfig,
    density: u32,
    treasures: Option<u32>,
}

impl Default for ConfigReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigReader {
    /// Starts from the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: GameConfig::default(),
            density: GameConfig::DEFAULT_DENSITY,
            treasures: None,
        }
    }

    /// Reads every pair of a query string, with or without the leading `?`.
    pub fn read_query(&mut self, query: &str) -> Result<(), ConfigError> {
        let query = query.trim().trim_start_matches('?');
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = split_pair(pair)?;
            self.set(key, value);
        }
        Ok(())
    }

    /// Applies a single pair. Unknown keys are ignored with a warning.
    pub fn set(&mut self, key: &str, value: &str) {
        let value = value.trim();
        match key.trim() {
            "w" => self.config.width = positive_or(key, value, GameConfig::DEFAULT_WIDTH),
            "h" => self.config.height = positive_or(key, value, GameConfig::DEFAULT_HEIGHT),
            "d" => self.density = positive_or(key, value, GameConfig::DEFAULT_DENSITY),
            "t" => {
                self.treasures = match value.parse::<u32>() {
                    Ok(0) | Err(_) => {
                        tracing::warn!(key, value, "treasure count ignored, using density");
                        None
                    }
                    Ok(count) => Some(count),
                }
            }
            "s" => self.config.skeletons = count_or_zero(key, value),
            "p" => self.config.pots = count_or_zero(key, value),
            "g" => self.config.ghosts = count_or_zero(key, value),
            "edit" => self.config.edit_mode = flag(key, value),
            "players" => self.config.players = players(value),
            "seed" => self.config.seed = seed(value),
            unknown => tracing::warn!(key = unknown, "unknown configuration key ignored"),
        }
    }

    /// Validates the grid size and resolves the treasure count.
    pub fn finish(self) -> Result<GameConfig, ConfigError> {
        let Self {
            mut config,
            density,
            treasures,
        } = self;
        if config.width > MAX_SIDE || config.height > MAX_SIDE {
            return Err(ConfigError::GridTooLarge {
                width: config.width,
                height: config.height,
                max: MAX_SIDE,
            });
        }
        config.treasures = treasures.unwrap_or_else(|| {
            GameConfig::treasures_for_density(config.width, config.height, density)
        });
        Ok(config)
    }
}

/// Reads a complete configuration from a query string.
pub fn parse_query(query: &str) -> Result<GameConfig, ConfigError> {
    let mut reader = ConfigReader::new();
    reader.read_query(query)?;
    reader.finish()
}

fn split_pair(pair: &str) -> Result<(&str, &str), ConfigError> {
    let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
    if key.trim().is_empty() || value.contains('=') {
        return Err(ConfigError::MalformedPair {
            pair: pair.to_owned(),
        });
    }
    Ok((key, value))
}

fn positive_or(key: &str, value: &str, default: u32) -> u32 {
    match value.parse::<u32>() {
        Ok(parsed) if parsed > 0 => parsed,
        _ => {
            tracing::warn!(key, value, default, "invalid value, using default");
            default
        }
    }
}

fn count_or_zero(key: &str, value: &str) -> u32 {
    value.parse().unwrap_or_else(|_| {
        tracing::warn!(key, value, "invalid count, using zero");
        0
    })
}

fn flag(key: &str, value: &str) -> bool {
    match value.to_ascii_lowercase().as_str() {
        "" | "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            tracing::warn!(key, value, "invalid flag, leaving it off");
            false
        }
    }
}

fn players(value: &str) -> PlayerSelection {
    match value.to_ascii_lowercase().as_str() {
        "1" | "single" => PlayerSelection::Single,
        "2" | "coop" | "cooperative" => PlayerSelection::Cooperative,
        _ => {
            tracing::warn!(value, "unknown player selection, using a single player");
            PlayerSelection::Single
        }
    }
}

fn seed(value: &str) -> u64 {
    let parsed = match value.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.unwrap_or_else(|_| {
        tracing::warn!(value, "invalid seed, using default");
        GameConfig::DEFAULT_SEED
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_yields_defaults() {
        assert_eq!(parse_query(""), Ok(GameConfig::default()));
        assert_eq!(parse_query("?"), Ok(GameConfig::default()));
    }

    #[test]
    fn treasures_follow_density_unless_given() {
        let config = parse_query("w=10&h=10&d=25").expect("valid query");
        assert_eq!(config.treasures, 25);

        let config = parse_query("w=10&h=10&d=25&t=3").expect("valid query");
        assert_eq!(config.treasures, 3);

        let config = parse_query("w=3&h=3&d=10").expect("valid query");
        assert_eq!(config.treasures, 1);
    }

    #[test]
    fn zero_and_garbage_fall_back_to_defaults() {
        let config = parse_query("w=0&h=tall&d=0&t=0&s=many&seed=xyz").expect("valid query");
        assert_eq!(config.width, GameConfig::DEFAULT_WIDTH);
        assert_eq!(config.height, GameConfig::DEFAULT_HEIGHT);
        assert_eq!(config.treasures, GameConfig::default().treasures);
        assert_eq!(config.skeletons, 0);
        assert_eq!(config.seed, GameConfig::DEFAULT_SEED);
    }

    #[test]
    fn flags_and_selections() {
        let config = parse_query("?edit&players=coop&seed=0x10&s=2&p=1&g=3").expect("valid query");
        assert!(config.edit_mode);
        assert_eq!(config.players, PlayerSelection::Cooperative);
        assert_eq!(config.seed, 16);
        assert_eq!((config.skeletons, config.pots, config.ghosts), (2, 1, 3));

        let config = parse_query("edit=off&players=1").expect("valid query");
        assert!(!config.edit_mode);
        assert_eq!(config.players, PlayerSelection::Single);
    }

    #[test]
    fn structural_problems_are_errors() {
        assert_eq!(
            parse_query("w=1=2"),
            Err(ConfigError::MalformedPair {
                pair: "w=1=2".to_owned(),
            })
        );
        assert!(matches!(
            parse_query("=4"),
            Err(ConfigError::MalformedPair { .. })
        ));
        assert_eq!(
            parse_query("w=65"),
            Err(ConfigError::GridTooLarge {
                width: 65,
                height: GameConfig::DEFAULT_HEIGHT,
                max: MAX_SIDE,
            })
        );
    }

    #[test]
    fn later_pairs_override_earlier_ones() {
        let mut reader = ConfigReader::new();
        reader.read_query("w=5&h=5").expect("valid query");
        reader.set("w", "7");
        let config = reader.finish().expect("valid grid");
        assert_eq!((config.width, config.height), (7, 5));
    }
}
