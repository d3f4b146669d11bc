//! Rendering backend that prints scenes as text instead of opening a window.

use std::{io::Write, time::Duration};

use anyhow::Result as AnyResult;
use maze_quest_rendering::{FrameInput, Presentation, RenderingBackend, Scene};

use crate::ascii;

/// Replays a fixed list of frame inputs and prints the resulting scenes.
#[derive(Debug)]
pub(crate) struct TextBackend<W> {
    frames: Vec<FrameInput>,
    frame_time: Duration,
    print_every: usize,
    out: W,
}

impl<W: Write> TextBackend<W> {
    /// Creates a backend printing every `print_every`-th frame and the last
    /// one; zero prints only the last frame.
    pub(crate) fn new(frames: Vec<FrameInput>, frame_time: Duration, print_every: usize, out: W) -> Self {
        Self {
            frames,
            frame_time,
            print_every,
            out,
        }
    }
}

fn print_scene<W: Write>(out: &mut W, label: &str, scene: &Scene) -> AnyResult<()> {
    writeln!(out, "{label}")?;
    write!(out, "{}", ascii::render(scene))?;
    writeln!(out, "{}", ascii::status_line(&scene.status))?;
    Ok(())
}

impl<W: Write> RenderingBackend for TextBackend<W> {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            frames,
            frame_time,
            print_every,
            mut out,
        } = self;
        let Presentation {
            window_title,
            mut scene,
            ..
        } = presentation;

        writeln!(out, "== {window_title} ==")?;
        let total = frames.len();
        if total == 0 {
            update_scene(Duration::ZERO, FrameInput::default(), &mut scene);
            print_scene(&mut out, "frame 0", &scene)?;
        }
        for (index, input) in frames.into_iter().enumerate() {
            update_scene(frame_time, input, &mut scene);
            let last = index + 1 == total;
            let sampled = print_every > 0 && index % print_every == 0;
            if last || sampled {
                print_scene(&mut out, &format!("frame {}", index + 1), &scene)?;
            }
        }
        out.flush()?;
        Ok(())
    }
}
