//! Orchestrates generate, solve and clear requests on top of a [`Renderer`].
//!
//! The controller owns the maze and a single job slot. Every request cancels whatever runs in
//! the slot, waits for the renderer's transitions to play out, and only then starts its own
//! work, so two jobs never touch the grid at once. The host drives everything by calling
//! [`Controller::tick`] once per frame.

mod job;
mod settings;

use std::time::Instant;

use rand::{Rng, rngs::StdRng};

pub use job::steps_per_tick;
pub use settings::{
    ControllerConfig, Dimensions, DimsRange, GenerationAlgorithm, Settings, SolveAlgorithm,
};

use crate::{
    controller::job::{JobContext, MazeJob, random_start_end},
    error::{MazeError, MazeResult},
    frame_task::{Completion, FrameTask, TaskOutcome, TickOutcome},
    generators::{Generator, get_rng},
    maze::{CellId, CellState, Grid},
    render::{Renderer, Transition},
    solvers::Solver,
    stepper::Stepped,
};

/// The last kind of request, which decides whether the canvas needs a sweep first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MazeEvent {
    Generate,
    Solve,
}

/// A job resolved at request time and built once the slot is free.
#[derive(Debug)]
enum JobRequest {
    Generate {
        generator: Generator,
        seed: u64,
        animate: bool,
    },
    Solve {
        solver: Solver,
        start: CellId,
        end: CellId,
        seed: u64,
        animate: bool,
    },
}

#[derive(Debug)]
struct PendingJob {
    request: JobRequest,
    completion: Completion,
}

/// The single job slot.
enum Slot {
    Idle,
    /// The previous job was cancelled and this one waits for transitions to finish.
    Cancelling(PendingJob),
    Running(FrameTask<MazeJob>),
}

pub struct Controller<R> {
    renderer: R,
    config: ControllerConfig,
    rng: StdRng,
    dimensions: Dimensions,
    grid: Option<Grid>,
    slot: Slot,
    last_event: Option<MazeEvent>,
    should_sweep: bool,
    /// Path and endpoints of the last finished solve, kept for redraws.
    solution: Option<(Vec<CellId>, (CellId, CellId))>,
    on_solvable: Box<dyn FnMut(bool)>,
}

impl<R: Renderer> Controller<R> {
    /// A controller with no maze yet, assuming `renderer` is sized for the default [`Settings`].
    pub fn new(renderer: R, config: ControllerConfig) -> Self {
        Controller {
            renderer,
            config,
            rng: get_rng(config.seed),
            dimensions: Settings::default().dimensions(),
            grid: None,
            slot: Slot::Idle,
            last_event: None,
            should_sweep: true,
            solution: None,
            on_solvable: Box::new(|_| {}),
        }
    }

    /// Calls `callback` with whether the maze can be solved: false when a generation starts or
    /// the maze is cleared, true once a generation completes.
    pub fn with_solvable_callback(mut self, callback: impl FnMut(bool) + 'static) -> Self {
        self.on_solvable = Box::new(callback);
        self
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Whether a job is running or waiting to run.
    pub fn is_busy(&self) -> bool {
        !matches!(self.slot, Slot::Idle)
    }

    /// Builds a new maze with `settings`.
    pub fn generate(&mut self, settings: &Settings) -> Completion {
        if self.last_event == Some(MazeEvent::Solve) {
            self.should_sweep = true;
        }
        self.last_event = Some(MazeEvent::Generate);
        (self.on_solvable)(false);

        let dimensions = settings.dimensions();
        if dimensions != self.dimensions {
            self.dimensions = dimensions;
            self.renderer
                .resize(dimensions.rows, dimensions.cols, dimensions.cell_wall_ratio);
            // Resizing already sweeps the canvas
            self.should_sweep = false;
        }

        self.cancel_current();
        self.grid = Some(Grid::build(dimensions.rows, dimensions.cols));
        self.solution = None;
        let generator = settings.generation_algorithm.resolve(&mut self.rng);

        if settings.animate_generating && self.should_sweep {
            self.renderer.start_transition(Transition::FillWithWall);
            self.should_sweep = false;
        }

        tracing::debug!(
            %generator,
            rows = dimensions.rows,
            cols = dimensions.cols,
            animate = settings.animate_generating,
            "Generation requested"
        );
        let request = JobRequest::Generate {
            generator,
            seed: self.rng.random(),
            animate: settings.animate_generating,
        };
        self.enqueue(request)
    }

    /// Solves the current maze between random endpoints on opposite sides.
    ///
    /// Fails with [`MazeError::NoMaze`] if nothing was generated since the last clear, or the
    /// maze has no cells.
    pub fn solve(&mut self, settings: &Settings) -> MazeResult<Completion> {
        if self.grid.as_ref().is_none_or(Grid::is_empty) {
            return Err(MazeError::NoMaze);
        }
        if self.last_event == Some(MazeEvent::Generate) {
            self.should_sweep = false;
        }
        self.last_event = Some(MazeEvent::Solve);

        self.cancel_current();
        self.solution = None;
        let Some(grid) = self.grid.as_mut() else {
            return Err(MazeError::NoMaze);
        };
        let (start, end) = random_start_end(grid, &mut self.rng);
        let solver = settings.solve_algorithm.resolve(&mut self.rng);

        if settings.animate_solving && self.should_sweep {
            // Uncover the bare maze, without the previous solve's marks
            self.renderer.start_transition(Transition::Reveal);
            grid.reset_states(CellState::Solid);
            self.renderer.redraw(Some(&*grid), &[], None);
        }
        self.should_sweep = true;

        tracing::debug!(
            %solver,
            %start,
            %end,
            animate = settings.animate_solving,
            "Solve requested"
        );
        let request = JobRequest::Solve {
            solver,
            start,
            end,
            seed: self.rng.random(),
            animate: settings.animate_solving,
        };
        Ok(self.enqueue(request))
    }

    /// Stops any job, drops the maze and paints the canvas as wall.
    ///
    /// There is nothing to wait for, so the returned completion is already settled.
    pub fn clear(&mut self) -> Completion {
        (self.on_solvable)(false);
        self.cancel_current();
        self.grid = None;
        self.solution = None;
        self.should_sweep = false;
        self.last_event = None;
        self.renderer.start_transition(Transition::FillWithWall);
        tracing::debug!("Maze cleared");
        Completion::settled(TaskOutcome::Completed)
    }

    pub fn zoom_to(&mut self, zoom: f64) {
        self.renderer.zoom_to(zoom);
    }

    /// Repaints the whole canvas, e.g. after the host's surface was resized.
    pub fn redraw(&mut self) {
        match &self.solution {
            Some((path, endpoints)) => {
                self.renderer
                    .redraw(self.grid.as_ref(), path, Some(*endpoints))
            }
            None => self.renderer.redraw(self.grid.as_ref(), &[], None),
        }
    }

    pub fn pause(&mut self) {
        if let Slot::Running(task) = &mut self.slot {
            task.pause();
        }
    }

    pub fn unpause(&mut self) {
        if let Slot::Running(task) = &mut self.slot {
            task.unpause();
        }
    }

    pub fn is_paused(&self) -> bool {
        matches!(&self.slot, Slot::Running(task) if task.is_paused())
    }

    /// Runs one frame: moves the renderer's transitions along, starts a waiting job once they
    /// are done, and ticks the running job.
    pub fn tick(&mut self, now: Instant) {
        self.renderer.advance_transitions(self.grid.as_ref());
        if matches!(self.slot, Slot::Cancelling(_)) {
            self.try_start();
        }

        let Slot::Running(task) = &mut self.slot else {
            return;
        };
        let Some(grid) = self.grid.as_mut() else {
            task.cancel();
            self.slot = Slot::Idle;
            return;
        };
        let mut ctx = JobContext {
            grid,
            renderer: &mut self.renderer,
        };
        if task.tick(now, &mut ctx) != TickOutcome::Settled {
            return;
        }
        if let Slot::Running(task) = std::mem::replace(&mut self.slot, Slot::Idle) {
            self.finish_job(task);
        }
    }

    /// Empties the slot: a running job is cancelled, a waiting one superseded.
    fn cancel_current(&mut self) {
        match std::mem::replace(&mut self.slot, Slot::Idle) {
            Slot::Idle => {}
            Slot::Running(mut task) => {
                task.cancel();
                tracing::debug!("Cancelled running maze job");
            }
            Slot::Cancelling(pending) => {
                pending.completion.settle(TaskOutcome::Superseded);
                tracing::debug!(request = ?pending.request, "Superseded waiting maze job");
            }
        }
    }

    /// Parks `request` in the slot and starts it right away if nothing is in flight.
    fn enqueue(&mut self, request: JobRequest) -> Completion {
        let completion = Completion::new();
        self.slot = Slot::Cancelling(PendingJob {
            request,
            completion: completion.clone(),
        });
        self.try_start();
        completion
    }

    fn try_start(&mut self) {
        if self.renderer.transitions_pending() {
            return;
        }
        let Slot::Cancelling(pending) = std::mem::replace(&mut self.slot, Slot::Idle) else {
            return;
        };
        let Some(grid) = self.grid.as_mut() else {
            pending.completion.settle(TaskOutcome::Cancelled);
            return;
        };

        let fps_cap = self.config.fps_cap;
        let fps = |animate: bool| animate.then_some(fps_cap);
        let (job, fps_cap) = match pending.request {
            JobRequest::Generate {
                generator,
                seed,
                animate,
            } => {
                let steps_per_tick = steps_per_tick(
                    grid.rows(),
                    grid.cols(),
                    self.config.max_steps_per_tick,
                );
                let alg = Stepped::new(generator.build(grid, Some(seed)));
                let job = MazeJob::Generate {
                    alg,
                    steps_per_tick,
                    animate,
                };
                (job, fps(animate))
            }
            JobRequest::Solve {
                solver,
                start,
                end,
                seed,
                animate,
            } => {
                let alg = Stepped::new(solver.build(grid, start, end, Some(seed)));
                (MazeJob::Solve { alg, animate }, fps(animate))
            }
        };
        if matches!(job, MazeJob::Generate { .. }) {
            self.should_sweep = true;
        }
        tracing::debug!(animated = job.is_animated(), "Started maze job");
        self.slot = Slot::Running(FrameTask::with_completion(
            job,
            fps_cap,
            pending.completion,
        ));
    }

    fn finish_job(&mut self, task: FrameTask<MazeJob>) {
        let outcome = task.completion().outcome();
        tracing::debug!(?outcome, "Maze job settled");
        if outcome != Some(TaskOutcome::Completed) {
            return;
        }
        let Some(grid) = self.grid.as_ref() else {
            return;
        };
        let animated = task.work().is_animated();
        if !animated {
            self.renderer.start_transition(Transition::Reveal);
        }
        match task.work() {
            MazeJob::Generate { .. } => {
                (self.on_solvable)(true);
                self.renderer.redraw(Some(grid), &[], None);
            }
            MazeJob::Solve { alg, .. } => {
                let solver = alg.algorithm();
                let solution = (solver.path().to_vec(), solver.endpoints());
                self.renderer
                    .redraw(Some(grid), &solution.0, Some(solution.1));
                self.solution = Some(solution);
            }
        }
    }
}

impl<R> Drop for Controller<R> {
    /// Settles the job in the slot so nobody waits on it forever.
    fn drop(&mut self) {
        match std::mem::replace(&mut self.slot, Slot::Idle) {
            Slot::Idle => {}
            Slot::Running(mut task) => task.cancel(),
            Slot::Cancelling(pending) => {
                pending.completion.settle(TaskOutcome::Cancelled);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc, time::Duration};

    use super::*;
    use crate::render::recording::{Call, RecordingRenderer};

    const FRAME: Duration = Duration::from_millis(17);

    fn controller() -> Controller<RecordingRenderer> {
        Controller::new(
            RecordingRenderer::default(),
            ControllerConfig {
                seed: Some(5),
                ..ControllerConfig::default()
            },
        )
    }

    fn settings(rows: u16, cols: u16, animate: bool) -> Settings {
        Settings {
            rows,
            cols,
            animate_generating: animate,
            animate_solving: animate,
            ..Settings::default()
        }
    }

    /// Ticks frame by frame until `completion` settles. Returns the number of ticks.
    fn run<R: Renderer>(
        ctrl: &mut Controller<R>,
        completion: &Completion,
        clock: &mut Instant,
    ) -> usize {
        for ticks in 1..=10_000 {
            *clock += FRAME;
            ctrl.tick(*clock);
            if completion.is_settled() {
                return ticks;
            }
        }
        panic!("job did not settle");
    }

    #[test]
    fn test_generate_builds_a_fresh_maze_every_time() {
        let mut ctrl = controller();
        let mut clock = Instant::now();
        let settings = settings(6, 9, true);

        let first = ctrl.generate(&settings);
        run(&mut ctrl, &first, &mut clock);
        assert_eq!(first.outcome(), Some(TaskOutcome::Completed));
        let grid = ctrl.grid().unwrap();
        assert!(grid.is_spanning_tree());
        assert_eq!((grid.rows(), grid.cols()), (6, 9));
        let first_id = grid.id();

        let second = ctrl.generate(&settings);
        run(&mut ctrl, &second, &mut clock);
        assert_ne!(ctrl.grid().unwrap().id(), first_id);
        assert!(ctrl.grid().unwrap().is_spanning_tree());
        assert!(!ctrl.is_busy());
    }

    #[test]
    fn test_solve_without_maze_fails() {
        let mut ctrl = controller();
        assert_eq!(
            ctrl.solve(&Settings::default()).unwrap_err(),
            MazeError::NoMaze
        );
        assert!(ctrl.renderer().calls.is_empty());
    }

    #[test]
    fn test_animated_generation_draws_in_batches() {
        let mut ctrl = controller();
        let mut clock = Instant::now();
        let completion = ctrl.generate(&Settings::default());
        let ticks = run(&mut ctrl, &completion, &mut clock);
        // 400 cells at 4 steps per frame take about a hundred frames
        assert!(ticks > 50, "took {ticks} ticks");
        let draws = ctrl.renderer().draw_count();
        assert!(draws > 50);
        assert!(ctrl.renderer().calls.iter().all(|call| match call {
            Call::Draw { changes, path } => *changes > 0 && *path == 0,
            _ => true,
        }));
        // Default dimensions need no resize, so the canvas is swept instead
        assert_eq!(ctrl.renderer().transitions(), vec![Transition::FillWithWall]);
        assert_eq!(
            ctrl.renderer().calls.last(),
            Some(&Call::Redraw {
                has_grid: true,
                path: 0
            })
        );
    }

    #[test]
    fn test_instant_generation_and_solve() {
        let mut ctrl = controller();
        let mut clock = Instant::now();
        let settings = settings(12, 7, false);

        let generated = ctrl.generate(&settings);
        // One tick finishes the maze, the next one settles it
        assert_eq!(run(&mut ctrl, &generated, &mut clock), 2);
        assert_eq!(ctrl.renderer().draw_count(), 0);
        assert_eq!(ctrl.renderer().calls[0], Call::Resize(12, 7));
        assert_eq!(ctrl.renderer().transitions(), vec![Transition::Reveal]);

        let solved = ctrl.solve(&settings).unwrap();
        assert_eq!(run(&mut ctrl, &solved, &mut clock), 2);
        assert_eq!(solved.outcome(), Some(TaskOutcome::Completed));
        let Some(Call::Redraw {
            has_grid: true,
            path,
        }) = ctrl.renderer().calls.last().cloned()
        else {
            panic!("solve did not end with a redraw");
        };
        // Endpoints sit on opposite sides, at least a full row or column apart
        assert!(path >= 7);
    }

    #[test]
    fn test_animated_solve_draws_every_step() {
        let mut ctrl = controller();
        let mut clock = Instant::now();
        let generated = ctrl.generate(&settings(8, 8, false));
        run(&mut ctrl, &generated, &mut clock);

        let solved = ctrl.solve(&settings(8, 8, true)).unwrap();
        let ticks = run(&mut ctrl, &solved, &mut clock);
        // Every executed frame draws one step, at most every other 17 ms frame is skipped
        let draws = ctrl.renderer().draw_count();
        assert!(draws >= 1 && draws < ticks);
        assert!(ctrl.renderer().calls.iter().any(|call| matches!(
            call,
            Call::Draw { path, .. } if *path > 0
        )));
    }

    #[test]
    fn test_new_request_cancels_running_job() {
        let mut ctrl = controller();
        let mut clock = Instant::now();
        let first = ctrl.generate(&settings(30, 30, true));
        for _ in 0..5 {
            clock += FRAME;
            ctrl.tick(clock);
        }
        assert!(!first.is_settled());
        let second = ctrl.generate(&settings(30, 30, true));
        assert_eq!(first.outcome(), Some(TaskOutcome::Cancelled));
        run(&mut ctrl, &second, &mut clock);
        assert_eq!(second.outcome(), Some(TaskOutcome::Completed));
        assert!(ctrl.grid().unwrap().is_spanning_tree());
    }

    #[test]
    fn test_dropping_a_busy_controller_cancels_its_job() {
        let mut ctrl = controller();
        let mut clock = Instant::now();
        let running = ctrl.generate(&settings(30, 30, true));
        for _ in 0..3 {
            clock += FRAME;
            ctrl.tick(clock);
        }
        assert!(!running.is_settled());
        drop(ctrl);
        assert_eq!(running.outcome(), Some(TaskOutcome::Cancelled));
        assert_eq!(
            running.wait_timeout(Duration::from_millis(200)),
            Some(TaskOutcome::Cancelled)
        );

        let mut ctrl = controller();
        ctrl.renderer_mut().hold_transitions = true;
        let waiting = ctrl.generate(&settings(5, 5, true));
        assert!(ctrl.is_busy());
        drop(ctrl);
        assert_eq!(waiting.outcome(), Some(TaskOutcome::Cancelled));
    }

    #[test]
    fn test_jobs_wait_for_transitions() {
        let mut ctrl = controller();
        ctrl.renderer_mut().hold_transitions = true;
        let mut clock = Instant::now();

        let completion = ctrl.generate(&settings(5, 5, true));
        for _ in 0..10 {
            clock += FRAME;
            ctrl.tick(clock);
        }
        assert!(ctrl.is_busy());
        assert!(!completion.is_settled());
        assert_eq!(ctrl.renderer().draw_count(), 0);
        // Grid exists but nothing has touched it
        let grid = ctrl.grid().unwrap();
        assert!(grid.ids().all(|id| grid.state(id) == CellState::Empty));

        ctrl.renderer_mut().finish_transitions();
        ctrl.renderer_mut().hold_transitions = false;
        run(&mut ctrl, &completion, &mut clock);
        assert_eq!(completion.outcome(), Some(TaskOutcome::Completed));
        assert!(ctrl.renderer().draw_count() > 0);
    }

    #[test]
    fn test_waiting_request_is_superseded() {
        let mut ctrl = controller();
        ctrl.renderer_mut().hold_transitions = true;
        let mut clock = Instant::now();

        let first = ctrl.generate(&settings(5, 5, true));
        let second = ctrl.generate(&settings(6, 6, true));
        assert_eq!(first.outcome(), Some(TaskOutcome::Superseded));
        assert!(!second.is_settled());

        ctrl.renderer_mut().finish_transitions();
        ctrl.renderer_mut().hold_transitions = false;
        run(&mut ctrl, &second, &mut clock);
        assert_eq!(second.outcome(), Some(TaskOutcome::Completed));
        assert_eq!(ctrl.grid().unwrap().len(), 36);
        assert_eq!(ctrl.dimensions().rows, 6);
    }

    #[test]
    fn test_solvable_callback_sequence() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut ctrl = controller().with_solvable_callback(move |solvable| {
            sink.borrow_mut().push(solvable);
        });
        let mut clock = Instant::now();

        let completion = ctrl.generate(&settings(4, 4, true));
        assert_eq!(*seen.borrow(), vec![false]);
        run(&mut ctrl, &completion, &mut clock);
        assert_eq!(*seen.borrow(), vec![false, true]);

        let solved = ctrl.solve(&settings(4, 4, true)).unwrap();
        run(&mut ctrl, &solved, &mut clock);
        assert_eq!(*seen.borrow(), vec![false, true]);

        ctrl.clear();
        assert_eq!(*seen.borrow(), vec![false, true, false]);
    }

    #[test]
    fn test_clear_cancels_and_discards_maze() {
        let mut ctrl = controller();
        let mut clock = Instant::now();
        let running = ctrl.generate(&settings(25, 25, true));
        clock += FRAME;
        ctrl.tick(clock);

        let cleared = ctrl.clear();
        assert_eq!(cleared.outcome(), Some(TaskOutcome::Completed));
        assert_eq!(running.outcome(), Some(TaskOutcome::Cancelled));
        assert!(ctrl.grid().is_none());
        assert!(!ctrl.is_busy());
        assert_eq!(
            ctrl.renderer().transitions().last(),
            Some(&Transition::FillWithWall)
        );
        assert_eq!(
            ctrl.solve(&Settings::default()).unwrap_err(),
            MazeError::NoMaze
        );
    }

    #[test]
    fn test_solve_after_solve_reveals_bare_maze() {
        let mut ctrl = controller();
        let mut clock = Instant::now();
        let settings = settings(6, 6, true);
        let generated = ctrl.generate(&settings);
        run(&mut ctrl, &generated, &mut clock);

        // Right after a generation the maze is already on screen
        let first = ctrl.solve(&settings).unwrap();
        run(&mut ctrl, &first, &mut clock);
        assert!(!ctrl.renderer().transitions().contains(&Transition::Reveal));

        let second = ctrl.solve(&settings).unwrap();
        assert_eq!(ctrl.renderer().transitions().last(), Some(&Transition::Reveal));
        run(&mut ctrl, &second, &mut clock);
        assert_eq!(second.outcome(), Some(TaskOutcome::Completed));

        // Generating after a solve sweeps the old picture away
        let regenerated = ctrl.generate(&settings);
        assert_eq!(
            ctrl.renderer().transitions().last(),
            Some(&Transition::FillWithWall)
        );
        run(&mut ctrl, &regenerated, &mut clock);
    }

    #[test]
    fn test_pause_holds_the_running_job() {
        let mut ctrl = controller();
        let mut clock = Instant::now();
        let completion = ctrl.generate(&settings(10, 10, true));
        clock += FRAME;
        ctrl.tick(clock);
        ctrl.pause();
        assert!(ctrl.is_paused());
        let draws = ctrl.renderer().draw_count();
        for _ in 0..20 {
            clock += FRAME;
            ctrl.tick(clock);
        }
        assert_eq!(ctrl.renderer().draw_count(), draws);
        ctrl.unpause();
        run(&mut ctrl, &completion, &mut clock);
        assert_eq!(completion.outcome(), Some(TaskOutcome::Completed));
    }
}
