#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that prepares a Maze Quest session: reads the
//! configuration and derives the greeting shown when the game starts.

mod config;

pub use config::{parse_query, ConfigError, ConfigReader, MAX_SIDE};

use maze_quest_core::{GameConfig, PlayerSelection, WELCOME_BANNER};

/// Produces data required to greet the players.
#[derive(Debug, Default)]
pub struct Bootstrap;

impl Bootstrap {
    /// Banner shown when the experience starts.
    #[must_use]
    pub fn welcome_banner(&self) -> &'static str {
        WELCOME_BANNER
    }

    /// One-line description of what the session asks of the players.
    #[must_use]
    pub fn objective(&self, config: &GameConfig) -> String {
        let who = match config.players {
            PlayerSelection::Single => "yourself",
            PlayerSelection::Cooperative => "two players",
        };
        let mut objective = format!(
            "Collect {} treasure{} in a {}x{} maze as {who}.",
            config.treasure_goal(),
            if config.treasure_goal() == 1 { "" } else { "s" },
            config.width,
            config.height,
        );
        if config.skeletons > 0 {
            objective.push_str(" Beware of the skeletons.");
        }
        if config.edit_mode {
            objective.push_str(" Edit mode is on.");
        }
        objective
    }

    /// Reads the session configuration from query-string text, then applies
    /// `overrides` pair by pair on top of it.
    pub fn read_config<'a, I>(&self, query: &str, overrides: I) -> Result<GameConfig, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut reader = ConfigReader::new();
        reader.read_query(query)?;
        for (key, value) in overrides {
            reader.set(key, value);
        }
        reader.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objective_counts_every_collectible() {
        let config = GameConfig {
            treasures: 2,
            pots: 1,
            ghosts: 1,
            skeletons: 3,
            ..GameConfig::default()
        };
        let objective = Bootstrap.objective(&config);
        assert!(objective.starts_with("Collect 4 treasures in a 13x6 maze"));
        assert!(objective.contains("skeletons"));
    }

    #[test]
    fn single_treasure_is_singular() {
        let config = GameConfig {
            treasures: 1,
            players: PlayerSelection::Cooperative,
            ..GameConfig::default()
        };
        assert_eq!(
            Bootstrap.objective(&config),
            "Collect 1 treasure in a 13x6 maze as two players."
        );
    }

    #[test]
    fn overrides_win_over_the_query() {
        let config = Bootstrap
            .read_config("w=9&h=7&s=2", [("w", "11"), ("players", "coop")])
            .expect("valid configuration");
        assert_eq!((config.width, config.height), (11, 7));
        assert_eq!(config.skeletons, 2);
        assert_eq!(config.players, PlayerSelection::Cooperative);
    }

    #[test]
    fn oversized_overrides_are_rejected() {
        let error = Bootstrap
            .read_config("", [("h", "500")])
            .expect_err("grid exceeds the side limit");
        assert!(matches!(error, ConfigError::GridTooLarge { height: 500, .. }));
    }

    #[test]
    fn banner_is_stable() {
        assert_eq!(Bootstrap.welcome_banner(), "Welcome to Maze Quest!");
    }
}
