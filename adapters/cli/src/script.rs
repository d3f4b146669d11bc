//! Key scripts driving the headless session.
//!
//! A script is a whitespace separated list of steps:
//!
//! * `right*4`: hold `right` for four frames; `right+down` holds both,
//!   `right|left` holds `right` for player one and `left` for player two,
//!   `.` holds nothing;
//! * `reset`: regenerate the maze;
//! * `wall@R,C:DIR`, `place@R,C:KIND`, `remove@R,C`: editor requests.

use std::{error::Error, fmt};

use maze_quest_core::{CellCoord, Direction, EntityKind, InputToken, PressedKeys};
use maze_quest_rendering::{EditAction, FrameInput};

/// Reasons a key script is rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ScriptError {
    /// A held token is not a known key name.
    UnknownToken(String),
    /// The repeat count after `*` is not a positive number.
    InvalidRepeat(String),
    /// An editor step names no valid `row,column` cell.
    InvalidCell(String),
    /// An editor step names no valid direction or entity kind.
    InvalidTarget(String),
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownToken(token) => write!(f, "unknown key `{token}`"),
            Self::InvalidRepeat(step) => write!(f, "invalid repeat count in `{step}`"),
            Self::InvalidCell(step) => write!(f, "invalid cell in `{step}`"),
            Self::InvalidTarget(step) => write!(f, "invalid direction or entity in `{step}`"),
        }
    }
}

impl Error for ScriptError {}

/// Expands a script into one input snapshot per frame.
pub(crate) fn parse_script(script: &str) -> Result<Vec<FrameInput>, ScriptError> {
    let mut frames = Vec::new();
    for step in script.split_whitespace() {
        if step.eq_ignore_ascii_case("reset") {
            frames.push(FrameInput {
                reset: true,
                ..FrameInput::default()
            });
            continue;
        }
        if let Some(frame) = parse_edit(step)? {
            frames.push(frame);
            continue;
        }

        let (held, repeat) = match step.split_once('*') {
            Some((held, count)) => match count.parse::<usize>() {
                Ok(count) if count > 0 => (held, count),
                _ => return Err(ScriptError::InvalidRepeat(step.to_owned())),
            },
            None => (step, 1),
        };
        let pressed = held
            .split('|')
            .map(parse_held)
            .collect::<Result<Vec<_>, _>>()?;
        frames.extend(std::iter::repeat_with(|| FrameInput {
            pressed: pressed.clone(),
            ..FrameInput::default()
        })
        .take(repeat));
    }
    Ok(frames)
}

fn parse_held(held: &str) -> Result<PressedKeys, ScriptError> {
    if held.is_empty() || held == "." {
        return Ok(PressedKeys::new());
    }
    held.split('+')
        .map(|token| {
            InputToken::from_token(token).ok_or_else(|| ScriptError::UnknownToken(token.to_owned()))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(PressedKeys::from_tokens)
}

fn parse_edit(step: &str) -> Result<Option<FrameInput>, ScriptError> {
    let Some((verb, rest)) = step.split_once('@') else {
        return Ok(None);
    };
    let (cell, target) = match rest.split_once(':') {
        Some((cell, target)) => (cell, Some(target)),
        None => (rest, None),
    };
    let cell = parse_cell(cell).ok_or_else(|| ScriptError::InvalidCell(step.to_owned()))?;
    let invalid = || ScriptError::InvalidTarget(step.to_owned());

    let edit = match verb.to_ascii_lowercase().as_str() {
        "wall" => EditAction::ToggleWall(
            target
                .and_then(Direction::from_token)
                .ok_or_else(invalid)?,
        ),
        "place" => EditAction::Place(target.and_then(parse_kind).ok_or_else(invalid)?),
        "remove" => EditAction::Remove,
        _ => return Err(invalid()),
    };
    Ok(Some(FrameInput {
        cursor_cell: Some(cell),
        edit: Some(edit),
        ..FrameInput::default()
    }))
}

fn parse_cell(cell: &str) -> Option<CellCoord> {
    let (row, column) = cell.split_once(',')?;
    Some(CellCoord::new(
        row.trim().parse().ok()?,
        column.trim().parse().ok()?,
    ))
}

fn parse_kind(kind: &str) -> Option<EntityKind> {
    match kind.to_ascii_lowercase().as_str() {
        "player" => Some(EntityKind::Player),
        "treasure" | "t" => Some(EntityKind::Treasure),
        "pot" | "p" => Some(EntityKind::Pot),
        "skeleton" | "s" => Some(EntityKind::Skeleton),
        "ghost" | "g" => Some(EntityKind::Ghost),
        _ => None,
    }
}
