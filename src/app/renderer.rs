use std::{
    collections::HashSet,
    io::{self, Stdout, Write},
    ops::Range,
};

use crossterm::{
    cursor, queue,
    style::{self, Color},
    terminal::{self, ClearType},
};
use unicode_truncate::UnicodeTruncateStr;
use unicode_width::UnicodeWidthStr;

use crate::{
    maze::{CellId, CellState, Grid},
    render::{Renderer, Transition},
};

const WALL: Color = Color::Black;
const PARTIAL: Color = Color::Blue;
const SOLID: Color = Color::White;
const PATH: Color = Color::Yellow;
const START: Color = Color::Green;
const END: Color = Color::Red;
const STATUS_FG: Color = Color::Cyan;

/// Terminal columns per horizontal unit, so that blocks look square.
const CELL_WIDTH: u16 = 2;
/// Rows at the bottom of the terminal reserved for the status line.
pub const NUM_STATUS_ROWS: u16 = 1;
/// Frames a sweep takes, regardless of maze size.
const SWEEP_FRAMES: usize = 24;

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 4.0;

#[derive(Debug, Clone, Copy)]
struct Sweep {
    transition: Transition,
    /// Block rows above this one are already painted.
    next_row: usize,
}

/// Colors of cells and passages for one maze picture.
struct Palette<'a> {
    grid: &'a Grid,
    on_path: HashSet<CellId>,
    path_steps: HashSet<(CellId, CellId)>,
    endpoints: Option<(CellId, CellId)>,
}

impl<'a> Palette<'a> {
    fn new(grid: &'a Grid, path: &[CellId], endpoints: Option<(CellId, CellId)>) -> Self {
        Palette {
            grid,
            on_path: path.iter().copied().collect(),
            path_steps: path
                .windows(2)
                .flat_map(|pair| [(pair[0], pair[1]), (pair[1], pair[0])])
                .collect(),
            endpoints,
        }
    }

    fn state_color(state: CellState) -> Color {
        match state {
            CellState::Empty => WALL,
            CellState::Partial => PARTIAL,
            CellState::Solid => SOLID,
        }
    }

    fn cell(&self, id: CellId) -> Color {
        match self.endpoints {
            Some((start, _)) if start == id => START,
            Some((_, end)) if end == id => END,
            _ if self.on_path.contains(&id) => PATH,
            _ => Palette::state_color(self.grid.state(id)),
        }
    }

    /// A passage takes the "least finished" color of its two cells.
    fn passage(&self, a: CellId, b: CellId) -> Color {
        if !self.grid.is_connected(a, b) {
            return WALL;
        }
        if self.path_steps.contains(&(a, b)) {
            return PATH;
        }
        match (self.grid.state(a), self.grid.state(b)) {
            (CellState::Empty, _) | (_, CellState::Empty) => WALL,
            (CellState::Partial, _) | (_, CellState::Partial) => PARTIAL,
            _ => SOLID,
        }
    }
}

/// Draws the maze with background-colored blocks.
///
/// The maze picture is a `(2 rows + 1) x (2 cols + 1)` canvas of blocks: cells at odd
/// coordinates, walls and passages in between. Walls are `zoom` units thick and cells
/// `cell_wall_ratio * zoom` units wide, each unit being [`CELL_WIDTH`] columns by one row.
/// Whatever does not fit in the terminal is clipped.
pub struct TerminalRenderer {
    stdout: Stdout,
    rows: u16,
    cols: u16,
    cell_wall_ratio: f64,
    zoom: f64,
    /// Terminal size as of the last full repaint.
    viewport: (u16, u16),
    canvas: Vec<Color>,
    sweep: Option<Sweep>,
    status: Vec<String>,
    /// First I/O error since the host last checked.
    error: Option<io::Error>,
}

impl TerminalRenderer {
    pub fn new(rows: u16, cols: u16, cell_wall_ratio: f64) -> Self {
        let mut renderer = TerminalRenderer {
            stdout: io::stdout(),
            rows,
            cols,
            cell_wall_ratio,
            zoom: MIN_ZOOM,
            viewport: terminal::size().unwrap_or((80, 24)),
            canvas: Vec::new(),
            sweep: None,
            status: Vec::new(),
            error: None,
        };
        renderer.reset_canvas();
        renderer
    }

    /// Takes the first I/O error hit while drawing, if any.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Shows `segments` on the status line, in order, dropping the trailing ones that do not fit.
    pub fn set_status(&mut self, segments: Vec<String>) {
        if segments == self.status {
            return;
        }
        self.status = segments;
        let result = self.paint_status().and_then(|_| self.flush());
        self.record(result);
    }

    fn block_rows(&self) -> usize {
        2 * self.rows as usize + 1
    }

    fn block_cols(&self) -> usize {
        2 * self.cols as usize + 1
    }

    fn reset_canvas(&mut self) {
        self.canvas = vec![WALL; self.block_rows() * self.block_cols()];
    }

    /// Thickness of walls and width of cells, in units.
    fn units(&self) -> (usize, usize) {
        let wall = self.zoom.round().max(1.0) as usize;
        let cell = (self.cell_wall_ratio * self.zoom).round().max(1.0) as usize;
        (wall, cell)
    }

    /// Offset and size, in units, of block `index` along either axis.
    fn extent(&self, index: usize) -> (usize, usize) {
        let (wall, cell) = self.units();
        let offset = (index + 1) / 2 * wall + index / 2 * cell;
        let size = if index % 2 == 1 { cell } else { wall };
        (offset, size)
    }

    fn cell_block(grid: &Grid, id: CellId) -> (usize, usize) {
        let (row, col) = grid.coord(id);
        (2 * row as usize + 1, 2 * col as usize + 1)
    }

    /// The passage between two neighbors sits halfway between their blocks.
    fn passage_block(grid: &Grid, a: CellId, b: CellId) -> (usize, usize) {
        let ((row_a, col_a), (row_b, col_b)) = (grid.coord(a), grid.coord(b));
        (
            row_a as usize + row_b as usize + 1,
            col_a as usize + col_b as usize + 1,
        )
    }

    /// Recolors a cell and the passages around it. Returns the blocks that changed.
    fn paint_cell_on_canvas(&mut self, palette: &Palette, id: CellId) -> Vec<(usize, usize)> {
        let width = self.block_cols();
        let mut blocks = Vec::with_capacity(5);
        let (row, col) = TerminalRenderer::cell_block(palette.grid, id);
        self.canvas[row * width + col] = palette.cell(id);
        blocks.push((row, col));
        for &neighbor in palette.grid.neighbors(id) {
            let (row, col) = TerminalRenderer::passage_block(palette.grid, id, neighbor);
            self.canvas[row * width + col] = palette.passage(id, neighbor);
            blocks.push((row, col));
        }
        blocks
    }

    /// Adopts the grid's dimensions if they differ from the canvas's.
    fn fit_to(&mut self, grid: &Grid) {
        if (grid.rows(), grid.cols()) != (self.rows, self.cols) {
            self.rows = grid.rows();
            self.cols = grid.cols();
            self.reset_canvas();
        }
    }

    /// Whether a block row is already on screen, i.e. not waiting for a sweep.
    fn is_uncovered(&self, block_row: usize) -> bool {
        self.sweep.is_none_or(|sweep| block_row < sweep.next_row)
    }

    fn paint_block(&mut self, block_row: usize, block_col: usize) -> io::Result<()> {
        let (y, height) = self.extent(block_row);
        let (x, width) = self.extent(block_col);
        let (x, width) = (x * CELL_WIDTH as usize, width * CELL_WIDTH as usize);
        let max_x = self.viewport.0 as usize;
        let max_y = self.viewport.1.saturating_sub(NUM_STATUS_ROWS) as usize;
        if x >= max_x || y >= max_y {
            return Ok(());
        }
        let blank = " ".repeat(width.min(max_x - x));
        let color = self.canvas[block_row * self.block_cols() + block_col];
        queue!(self.stdout, style::SetBackgroundColor(color))?;
        for dy in 0..height.min(max_y - y) {
            queue!(
                self.stdout,
                cursor::MoveTo(x as u16, (y + dy) as u16),
                style::Print(&blank)
            )?;
        }
        Ok(())
    }

    /// Paints the given blocks, skipping those a sweep has not reached yet.
    fn paint_blocks(&mut self, blocks: Vec<(usize, usize)>) -> io::Result<()> {
        for (row, col) in blocks {
            if self.is_uncovered(row) {
                self.paint_block(row, col)?;
            }
        }
        self.flush()
    }

    fn paint_rows(&mut self, rows: Range<usize>) -> io::Result<()> {
        for row in rows {
            for col in 0..self.block_cols() {
                self.paint_block(row, col)?;
            }
        }
        Ok(())
    }

    fn paint_status(&mut self) -> io::Result<()> {
        let (width, height) = self.viewport;
        let width = width as usize;
        let mut line = String::new();
        for segment in &self.status {
            let separator = if line.is_empty() { "" } else { "  " };
            if line.width() + separator.width() + segment.width() > width {
                break;
            }
            line.push_str(separator);
            line.push_str(segment);
        }
        // A single segment wider than the terminal still shows its beginning
        if line.is_empty() {
            if let Some(first) = self.status.first() {
                line = first.unicode_truncate(width).0.to_string();
            }
        }
        let padding = " ".repeat(width.saturating_sub(line.width()));
        queue!(
            self.stdout,
            cursor::MoveTo(0, height.saturating_sub(NUM_STATUS_ROWS)),
            style::ResetColor,
            style::SetForegroundColor(STATUS_FG),
            style::Print(line),
            style::Print(padding),
        )?;
        Ok(())
    }

    /// Clears the terminal and paints everything that is not waiting for a sweep.
    fn repaint(&mut self) -> io::Result<()> {
        self.viewport = terminal::size()?;
        queue!(
            self.stdout,
            style::ResetColor,
            terminal::Clear(ClearType::All)
        )?;
        let uncovered = match self.sweep {
            Some(sweep) => sweep.next_row,
            None => self.block_rows(),
        };
        self.paint_rows(0..uncovered)?;
        self.paint_status()?;
        self.flush()
    }

    fn flush(&mut self) -> io::Result<()> {
        queue!(self.stdout, style::ResetColor)?;
        self.stdout.flush()
    }

    fn record(&mut self, result: io::Result<()>) {
        if let Err(e) = result {
            tracing::error!("Failed to draw to terminal: {e}");
            self.error.get_or_insert(e);
        }
    }

    fn start_sweep(&mut self, transition: Transition) {
        if transition == Transition::FillWithWall {
            self.reset_canvas();
        }
        tracing::debug!(?transition, "Starting sweep");
        self.sweep = Some(Sweep {
            transition,
            next_row: 0,
        });
    }
}

impl Renderer for TerminalRenderer {
    fn resize(&mut self, rows: u16, cols: u16, cell_wall_ratio: f64) {
        self.rows = rows;
        self.cols = cols;
        self.cell_wall_ratio = cell_wall_ratio;
        self.start_sweep(Transition::FillWithWall);
        let result = self.repaint();
        self.record(result);
    }

    fn zoom_to(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        let result = self.repaint();
        self.record(result);
    }

    fn draw(
        &mut self,
        grid: &Grid,
        changes: &[CellId],
        path: &[CellId],
        endpoints: Option<(CellId, CellId)>,
    ) {
        self.fit_to(grid);
        let palette = Palette::new(grid, path, endpoints);
        let mut blocks = Vec::new();
        for &id in changes {
            blocks.extend(self.paint_cell_on_canvas(&palette, id));
        }
        let result = self.paint_blocks(blocks);
        self.record(result);
    }

    fn redraw(&mut self, grid: Option<&Grid>, path: &[CellId], endpoints: Option<(CellId, CellId)>) {
        self.reset_canvas();
        if let Some(grid) = grid {
            self.fit_to(grid);
            let palette = Palette::new(grid, path, endpoints);
            for id in grid.ids() {
                self.paint_cell_on_canvas(&palette, id);
            }
        }
        let result = self.repaint();
        self.record(result);
    }

    fn start_transition(&mut self, transition: Transition) {
        self.start_sweep(transition);
    }

    fn transitions_pending(&self) -> bool {
        self.sweep.is_some()
    }

    fn advance_transitions(&mut self, _grid: Option<&Grid>) {
        let Some(sweep) = self.sweep else {
            return;
        };
        let total = self.block_rows();
        let end = (sweep.next_row + (total / SWEEP_FRAMES).max(1)).min(total);
        let result = self
            .paint_rows(sweep.next_row..end)
            .and_then(|_| self.flush());
        self.record(result);
        self.sweep = (end < total).then_some(Sweep {
            next_row: end,
            ..sweep
        });
        if self.sweep.is_none() {
            tracing::debug!(transition = ?sweep.transition, "Sweep finished");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_alternates_walls_and_cells() {
        let mut renderer = TerminalRenderer::new(3, 3, 2.0);
        assert_eq!(renderer.extent(0), (0, 1));
        assert_eq!(renderer.extent(1), (1, 2));
        assert_eq!(renderer.extent(2), (3, 1));
        assert_eq!(renderer.extent(3), (4, 2));
        renderer.zoom = 2.0;
        assert_eq!(renderer.extent(3), (2 * 2 + 4, 4));
    }

    #[test]
    fn test_passage_sits_between_cells() {
        let grid = Grid::build(2, 2);
        let a = grid.cell_id(0, 0).unwrap();
        let right = grid.cell_id(0, 1).unwrap();
        let below = grid.cell_id(1, 0).unwrap();
        assert_eq!(TerminalRenderer::cell_block(&grid, a), (1, 1));
        assert_eq!(TerminalRenderer::passage_block(&grid, a, right), (1, 2));
        assert_eq!(TerminalRenderer::passage_block(&grid, below, a), (2, 1));
    }

    #[test]
    fn test_palette_colors() {
        let mut grid = Grid::build(1, 3);
        let ids = grid.ids().collect::<Vec<_>>();
        grid.connect(ids[0], ids[1]).unwrap();
        grid.connect(ids[1], ids[2]).unwrap();
        grid.set_state(ids[0], CellState::Solid);
        grid.set_state(ids[1], CellState::Partial);
        grid.set_state(ids[2], CellState::Solid);

        let palette = Palette::new(&grid, &[], None);
        assert_eq!(palette.cell(ids[0]), SOLID);
        assert_eq!(palette.passage(ids[0], ids[1]), PARTIAL);

        let palette = Palette::new(&grid, &ids[..2], Some((ids[0], ids[2])));
        assert_eq!(palette.cell(ids[0]), START);
        assert_eq!(palette.cell(ids[1]), PATH);
        assert_eq!(palette.cell(ids[2]), END);
        assert_eq!(palette.passage(ids[1], ids[0]), PATH);
        assert_eq!(palette.passage(ids[1], ids[2]), PARTIAL);
        grid.disconnect(ids[1], ids[2]);
        let palette = Palette::new(&grid, &[], None);
        assert_eq!(palette.passage(ids[1], ids[2]), WALL);
    }

    #[test]
    fn test_sweep_covers_rows_until_done() {
        let mut renderer = TerminalRenderer::new(3, 3, 1.0);
        // Paint off screen so the test does not need a terminal
        renderer.viewport = (0, 0);
        renderer.start_transition(Transition::FillWithWall);
        assert!(renderer.transitions_pending());
        assert!(!renderer.is_uncovered(0));
        // 7 block rows, one per frame
        for _ in 0..7 {
            renderer.advance_transitions(None);
        }
        assert!(!renderer.transitions_pending());
        assert!(renderer.is_uncovered(6));
    }
}
