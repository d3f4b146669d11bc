//! Plain-text rendering of a scene.

use std::fmt::Write as _;

use maze_quest_core::SpriteKey;
use maze_quest_rendering::{Scene, StatusPresentation};

/// Character drawn for a sprite strip.
pub(crate) fn glyph(key: SpriteKey) -> char {
    match key {
        SpriteKey::PlayerWalk(player, _)
        | SpriteKey::PlayerIdle(player)
        | SpriteKey::PlayerFight(player)
        | SpriteKey::PlayerCheer(player) => {
            char::from_digit(u32::from(player.get()) + 1, 10).unwrap_or('@')
        }
        SpriteKey::Treasure => '$',
        SpriteKey::Pot => 'o',
        SpriteKey::SkeletonSleep => 's',
        SpriteKey::SkeletonWake | SpriteKey::SkeletonWalk(_) => 'S',
        SpriteKey::SkeletonDie => 'x',
        SpriteKey::SkeletonCorpse => '%',
        SpriteKey::GhostSleep => 'g',
        SpriteKey::GhostWake | SpriteKey::GhostAwake => 'G',
    }
}

/// Topmost sprite glyph per cell, painted in scene order.
fn cell_glyphs(scene: &Scene) -> Vec<Option<char>> {
    let columns = scene.walls.grid.columns() as usize;
    let rows = scene.walls.grid.rows() as usize;
    let mut glyphs = vec![None; rows * columns];
    for sprite in &scene.sprites {
        let cell = sprite.nearest_cell();
        let (row, column) = (cell.row() as usize, cell.column() as usize);
        if row < rows && column < columns {
            glyphs[row * columns + column] = Some(glyph(sprite.sprite.key));
        }
    }
    glyphs
}

/// Draws the walls and sprites of `scene` as text, one maze cell per three
/// characters.
pub(crate) fn render(scene: &Scene) -> String {
    let walls = &scene.walls.grid;
    let glyphs = cell_glyphs(scene);
    let columns = walls.columns();
    let mut text = String::new();

    for row in 0..=walls.rows() {
        for column in 0..columns {
            text.push('+');
            text.push_str(if walls.north(row, column) { "---" } else { "   " });
        }
        text.push_str("+\n");
        if row == walls.rows() {
            break;
        }
        for column in 0..=columns {
            text.push(if walls.west(row, column) { '|' } else { ' ' });
            if column < columns {
                let index = row as usize * columns as usize + column as usize;
                let glyph = glyphs.get(index).copied().flatten().unwrap_or(' ');
                text.push(' ');
                text.push(glyph);
                text.push(' ');
            }
        }
        text.push('\n');
    }
    text
}

/// Single status line under the maze.
pub(crate) fn status_line(status: &StatusPresentation) -> String {
    let mut line = format!("treasures left: {}", status.treasures_remaining);
    if let Some(winner) = status.winner {
        let _ = write!(line, "  winner: player {}", u16::from(winner.get()) + 1);
    }
    if status.edit_mode {
        line.push_str("  [edit]");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use maze_quest_core::{CellCoord, Direction, PlayerId, SpriteFrame};
    use maze_quest_rendering::{
        Color, GridPresentation, SpritePresentation, WallGrid, WallPresentation,
    };
    use maze_quest_world::Maze;

    fn scene(maze: &Maze<()>, sprites: Vec<SpritePresentation>) -> Scene {
        Scene::new(
            GridPresentation::new(maze.width(), maze.height(), 16.0, Color::from_rgb_u8(0, 0, 0))
                .expect("valid grid"),
            WallPresentation::new(1.0, Color::from_rgb_u8(255, 255, 255), WallGrid::from_maze(maze)),
            sprites,
            StatusPresentation::default(),
        )
    }

    fn sprite(key: SpriteKey, column: f32, row: f32, z_index: i32) -> SpritePresentation {
        SpritePresentation::new(SpriteFrame { key, index: 0 }, Vec2::new(column, row), 1.0, z_index)
    }

    #[test]
    fn renders_walls_and_topmost_sprites() {
        let mut maze: Maze<()> = Maze::new(2, 2);
        assert!(maze.set_wall(CellCoord::new(0, 0), Direction::East, true));
        let player = PlayerId::new(0);
        let text = render(&scene(
            &maze,
            vec![
                sprite(SpriteKey::Treasure, 1.0, 1.0, 1),
                sprite(SpriteKey::PlayerIdle(player), 0.0, 0.0, 3),
                sprite(SpriteKey::GhostSleep, 0.9, 1.1, 2),
            ],
        ));

        assert_eq!(
            text,
            "+---+---+\n\
             | 1 |   |\n\
             +   +   +\n\
             |     g |\n\
             +---+---+\n"
        );
    }

    #[test]
    fn status_reports_the_winner() {
        let status = StatusPresentation {
            treasures_remaining: 0,
            winner: Some(PlayerId::new(1)),
            edit_mode: true,
        };
        assert_eq!(
            status_line(&status),
            "treasures left: 0  winner: player 2  [edit]"
        );
    }
}
