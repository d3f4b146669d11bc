#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a Maze Quest session headlessly.
//!
//! The maze is generated from the configuration, a key script is replayed one
//! frame at a time and the resulting scenes are printed as text.

mod ascii;
mod backend;
mod script;
mod session;

use std::{cell::RefCell, io, rc::Rc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use maze_quest_core::GameConfig;
use maze_quest_rendering::{Color, Presentation, RenderingBackend};
use maze_quest_system_bootstrap::Bootstrap;
use maze_quest_system_gameplay::{query, Game};
use tracing_subscriber::EnvFilter;

use crate::{backend::TextBackend, session::Session};

/// Headless Maze Quest session driven by a key script.
#[derive(Debug, Parser)]
#[command(name = "maze-quest", version, about, long_about = None)]
struct Cli {
    /// Configuration in query-string form, e.g. `w=9&h=7&s=2&edit`.
    #[arg(long, default_value = "")]
    query: String,
    /// Number of columns.
    #[arg(long)]
    width: Option<u32>,
    /// Number of rows.
    #[arg(long)]
    height: Option<u32>,
    /// Treasure density in percent of cells.
    #[arg(long)]
    density: Option<u32>,
    /// Explicit treasure count, overriding the density.
    #[arg(long)]
    treasures: Option<u32>,
    /// Number of skeletons.
    #[arg(long)]
    skeletons: Option<u32>,
    /// Number of pots.
    #[arg(long)]
    pots: Option<u32>,
    /// Number of ghosts.
    #[arg(long)]
    ghosts: Option<u32>,
    /// Player selection: `single` or `coop`.
    #[arg(long)]
    players: Option<String>,
    /// Enables editor steps in the script.
    #[arg(long)]
    edit: bool,
    /// Seed for maze generation and mob behaviour.
    #[arg(long)]
    seed: Option<u64>,
    /// Key script, e.g. `right*10 down*10 fight reset`.
    #[arg(long, default_value = "")]
    script: String,
    /// Simulated milliseconds per frame.
    #[arg(long, default_value_t = 50)]
    frame_ms: u64,
    /// Print every n-th frame in addition to the last one; 0 prints only the last.
    #[arg(long, default_value_t = 0)]
    print_every: usize,
    /// Print gameplay events as they happen.
    #[arg(long)]
    events: bool,
}

impl Cli {
    /// Per-key overrides, applied after the query string.
    fn overrides(&self) -> Vec<(&'static str, String)> {
        let numbers = [
            ("w", self.width),
            ("h", self.height),
            ("d", self.density),
            ("t", self.treasures),
            ("s", self.skeletons),
            ("p", self.pots),
            ("g", self.ghosts),
        ];
        let mut overrides: Vec<(&'static str, String)> = numbers
            .into_iter()
            .filter_map(|(key, value)| value.map(|value| (key, value.to_string())))
            .collect();
        if let Some(players) = &self.players {
            overrides.push(("players", players.clone()));
        }
        if self.edit {
            overrides.push(("edit", String::new()));
        }
        if let Some(seed) = self.seed {
            overrides.push(("seed", seed.to_string()));
        }
        overrides
    }

    fn config(&self, bootstrap: &Bootstrap) -> Result<GameConfig> {
        let overrides = self.overrides();
        bootstrap
            .read_config(
                &self.query,
                overrides.iter().map(|(key, value)| (*key, value.as_str())),
            )
            .context("failed to read the configuration")
    }
}

/// Entry point for the Maze Quest command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let bootstrap = Bootstrap::default();
    let config = cli.config(&bootstrap)?;
    let frames = script::parse_script(&cli.script).context("failed to parse --script")?;
    tracing::info!(frames = frames.len(), seed = config.seed, "replaying key script");

    println!("{}", bootstrap.welcome_banner());
    println!("{}", bootstrap.objective(&config));

    let game = Game::new(config).context("failed to generate the maze")?;
    let session = Rc::new(RefCell::new(Session::new(game, cli.events)));
    let scene = session.borrow().scene()?;
    let presentation = Presentation::new("Maze Quest", Color::from_rgb_u8(0, 0, 0), scene);

    let backend = TextBackend::new(
        frames,
        Duration::from_millis(cli.frame_ms),
        cli.print_every,
        io::stdout(),
    );
    let driver = Rc::clone(&session);
    backend.run(presentation, move |delta, input, scene| {
        driver.borrow_mut().advance(delta, input, scene);
    })?;

    let session = session.borrow();
    match query::winner(session.game()) {
        Some(winner) => println!("Player {} collected the last treasure!", u16::from(winner.get()) + 1),
        None => println!(
            "{} treasure(s) left after {} event(s).",
            query::treasures_remaining(session.game()),
            session.events().len()
        ),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use maze_quest_core::PlayerSelection;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_the_query() {
        let cli = Cli::try_parse_from([
            "maze-quest",
            "--query",
            "w=9&h=7&s=2",
            "--width",
            "11",
            "--players",
            "coop",
            "--edit",
            "--seed",
            "42",
        ])
        .expect("valid arguments");
        let config = cli.config(&Bootstrap).expect("valid configuration");

        assert_eq!((config.width, config.height), (11, 7));
        assert_eq!(config.skeletons, 2);
        assert_eq!(config.players, PlayerSelection::Cooperative);
        assert!(config.edit_mode);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn oversized_grids_are_reported() {
        let cli = Cli::try_parse_from(["maze-quest", "--height", "500"]).expect("valid arguments");
        assert!(cli.config(&Bootstrap).is_err());
    }
}
