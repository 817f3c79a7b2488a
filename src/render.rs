//! The drawing side of the controller.
//!
//! The engine never draws anything itself. It hands the renderer change lists, full redraw
//! requests and canvas-wide transitions, and waits for transitions to finish before it mutates
//! the grid for new work.

use crate::maze::{CellId, Grid};

/// Canvas-wide sweeps that play out over several frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Paint the whole canvas as wall.
    FillWithWall,
    /// Uncover the picture of the last redraw.
    Reveal,
}

pub trait Renderer {
    /// New maze dimensions. Starts a full-canvas transition of its own.
    fn resize(&mut self, rows: u16, cols: u16, cell_wall_ratio: f64);

    fn zoom_to(&mut self, zoom: f64);

    /// Repaints the cells in `changes`, along with the passages around them.
    fn draw(
        &mut self,
        grid: &Grid,
        changes: &[CellId],
        path: &[CellId],
        endpoints: Option<(CellId, CellId)>,
    );

    /// Repaints the whole maze, or an empty canvas without one.
    ///
    /// Right after [`Transition::Reveal`] starts, the new picture is uncovered by the transition
    /// rather than painted at once.
    fn redraw(&mut self, grid: Option<&Grid>, path: &[CellId], endpoints: Option<(CellId, CellId)>);

    fn start_transition(&mut self, transition: Transition);

    /// Whether a resize or transition is still playing.
    fn transitions_pending(&self) -> bool;

    /// Called once per host frame to move transitions along.
    fn advance_transitions(&mut self, _grid: Option<&Grid>) {}
}

/// Renderer that draws nothing, for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn resize(&mut self, _rows: u16, _cols: u16, _cell_wall_ratio: f64) {}

    fn zoom_to(&mut self, _zoom: f64) {}

    fn draw(&mut self, _: &Grid, _: &[CellId], _: &[CellId], _: Option<(CellId, CellId)>) {}

    fn redraw(&mut self, _: Option<&Grid>, _: &[CellId], _: Option<(CellId, CellId)>) {}

    fn start_transition(&mut self, _transition: Transition) {}

    fn transitions_pending(&self) -> bool {
        false
    }
}
