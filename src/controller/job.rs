use std::time::Duration;

use rand::Rng;

use crate::{
    frame_task::{FrameInfo, FrameWork},
    generators::MazeGenerator,
    maze::{CellId, Grid, Orientation},
    render::Renderer,
    solvers::MazeSolver,
    stepper::Stepped,
};

/// What a running job may touch during a frame.
pub(crate) struct JobContext<'a> {
    pub(crate) grid: &'a mut Grid,
    pub(crate) renderer: &'a mut dyn Renderer,
}

/// A generator or solver, driven by the controller's frame task.
pub(crate) enum MazeJob {
    Generate {
        alg: Stepped<MazeGenerator>,
        steps_per_tick: usize,
        animate: bool,
    },
    Solve {
        alg: Stepped<MazeSolver>,
        animate: bool,
    },
}

impl MazeJob {
    pub(crate) fn is_animated(&self) -> bool {
        match self {
            MazeJob::Generate { animate, .. } | MazeJob::Solve { animate, .. } => *animate,
        }
    }
}

impl FrameWork<JobContext<'_>> for MazeJob {
    fn is_finished(&mut self, _ctx: &mut JobContext<'_>, _since_start: Duration) -> bool {
        match self {
            MazeJob::Generate { alg, .. } => alg.is_finished(),
            MazeJob::Solve { alg, .. } => alg.is_finished(),
        }
    }

    fn run(&mut self, ctx: &mut JobContext<'_>, _frame: FrameInfo) {
        match self {
            MazeJob::Generate { alg, animate: false, .. } => alg.finish(ctx.grid),
            MazeJob::Solve { alg, animate: false } => alg.finish(ctx.grid),
            MazeJob::Generate {
                alg,
                steps_per_tick,
                animate: true,
            } => {
                let mut changes = Vec::new();
                for _ in 0..*steps_per_tick {
                    if alg.is_finished() {
                        break;
                    }
                    changes.extend(alg.step(ctx.grid));
                }
                ctx.renderer.draw(ctx.grid, &changes, &[], None);
            }
            MazeJob::Solve { alg, animate: true } => {
                let changes = alg.step(ctx.grid);
                let solver = alg.algorithm();
                ctx.renderer
                    .draw(ctx.grid, &changes, solver.path(), Some(solver.endpoints()));
            }
        }
    }
}

/// Generator steps per animated frame. Grows sublinearly with the cell count so that large mazes
/// do not take forever, capped at `max`.
pub fn steps_per_tick(rows: u16, cols: u16, max: usize) -> usize {
    let cells = rows as f64 * cols as f64;
    let steps = (cells.powf(0.6) * 0.1)
        .clamp(1.0, (cells * 0.2).max(1.0))
        .round() as usize;
    steps.min(max).max(1)
}

/// Random endpoints on opposite sides of the grid, either left to right or top to bottom.
pub(crate) fn random_start_end(grid: &Grid, rng: &mut impl Rng) -> (CellId, CellId) {
    let (rows, cols) = (grid.rows(), grid.cols());
    let orientation = if rng.random_bool(0.5) {
        Orientation::Horizontal
    } else {
        Orientation::Vertical
    };
    let (start, end) = match orientation {
        Orientation::Horizontal => (
            (rng.random_range(0..rows), 0),
            (rng.random_range(0..rows), cols - 1),
        ),
        Orientation::Vertical => (
            (0, rng.random_range(0..cols)),
            (rows - 1, rng.random_range(0..cols)),
        ),
    };
    // Both coordinates are in bounds for a non-empty grid
    let id = |(row, col): (u16, u16)| CellId::new(row as usize * cols as usize + col as usize);
    (id(start), id(end))
}
