//! A unit of work driven one frame at a time by an external clock.
//!
//! [`FrameTask`] never sleeps or spawns anything: the host calls [`FrameTask::tick`] on every
//! display refresh (or fixed timer, or test loop) and the task decides whether that frame runs.
//! Completion is observable through a [`Completion`] handle that can be waited on from any thread.

use std::{
    sync::{
        Arc, Condvar, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

/// How a task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The finish predicate returned true.
    Completed,
    /// The task was cancelled before finishing.
    Cancelled,
    /// The task was replaced by a newer request before it ever started.
    Superseded,
}

/// Shared, settle-once result of a task.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    inner: Arc<(Mutex<Option<TaskOutcome>>, Condvar)>,
}

impl Completion {
    pub fn new() -> Self {
        Completion::default()
    }

    /// A completion that is already settled with `outcome`.
    pub fn settled(outcome: TaskOutcome) -> Self {
        let completion = Completion::new();
        completion.settle(outcome);
        completion
    }

    /// Settles with `outcome` unless already settled. Returns whether this call settled it.
    pub(crate) fn settle(&self, outcome: TaskOutcome) -> bool {
        let (lock, condvar) = &*self.inner;
        let mut slot = lock.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return false;
        }
        *slot = Some(outcome);
        condvar.notify_all();
        true
    }

    pub fn outcome(&self) -> Option<TaskOutcome> {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_settled(&self) -> bool {
        self.outcome().is_some()
    }

    /// Blocks until settled.
    ///
    /// Ticks are what settle a task, so never call this from the thread that drives them.
    pub fn wait(&self) -> TaskOutcome {
        let (lock, condvar) = &*self.inner;
        let mut slot = lock.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(outcome) = *slot {
                return outcome;
            }
            slot = condvar.wait(slot).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`Completion::wait`], giving up after `timeout`.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<TaskOutcome> {
        let (lock, condvar) = &*self.inner;
        let slot = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (slot, _) = condvar
            .wait_timeout_while(slot, timeout, |slot| slot.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        *slot
    }
}

/// Cancellation flag of a task that can be flipped from another thread. The task notices on its
/// next tick.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Timing passed to every executed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    /// Time since the previous executed frame, zero on the first one.
    pub elapsed: Duration,
    /// Time since the first tick, not counting paused time.
    pub since_start: Duration,
}

/// What a [`FrameTask`] does each frame, given some context `C` lent by the caller of `tick`.
pub trait FrameWork<C: ?Sized> {
    /// Checked before each executed frame. Returning true settles the task as completed.
    fn is_finished(&mut self, ctx: &mut C, since_start: Duration) -> bool;

    fn run(&mut self, ctx: &mut C, frame: FrameInfo);
}

/// [`FrameWork`] out of a pair of closures.
pub struct FnWork<R, F> {
    run: R,
    finished: F,
}

impl<R, F> FnWork<R, F> {
    pub fn new(run: R, finished: F) -> Self {
        FnWork { run, finished }
    }
}

impl<C, R, F> FrameWork<C> for FnWork<R, F>
where
    C: ?Sized,
    R: FnMut(&mut C, FrameInfo),
    F: FnMut(&mut C, Duration) -> bool,
{
    fn is_finished(&mut self, ctx: &mut C, since_start: Duration) -> bool {
        (self.finished)(ctx, since_start)
    }

    fn run(&mut self, ctx: &mut C, frame: FrameInfo) {
        (self.run)(ctx, frame)
    }
}

/// Result of a single [`FrameTask::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Too early for the frame cap, or paused.
    Skipped,
    /// The work ran one frame.
    Ran,
    /// The task is settled, by this tick or earlier.
    Settled,
}

#[derive(Debug)]
pub struct FrameTask<W> {
    work: W,
    /// Minimum time between executed frames, from the frame cap.
    min_interval: Option<Duration>,
    started: Option<Instant>,
    last_run: Option<Instant>,
    last_tick: Option<Instant>,
    paused: bool,
    paused_for: Duration,
    cancel: CancelHandle,
    completion: Completion,
}

impl<W> FrameTask<W> {
    /// A task running `work` at most `fps_cap` frames per second, or every tick with no cap.
    pub fn new(work: W, fps_cap: Option<u32>) -> Self {
        FrameTask::with_completion(work, fps_cap, Completion::new())
    }

    /// Like [`FrameTask::new`], settling a completion handed out earlier.
    pub fn with_completion(work: W, fps_cap: Option<u32>, completion: Completion) -> Self {
        FrameTask {
            work,
            min_interval: fps_cap
                .filter(|&fps| fps > 0)
                .map(|fps| Duration::from_secs(1) / fps),
            started: None,
            last_run: None,
            last_tick: None,
            paused: false,
            paused_for: Duration::ZERO,
            cancel: CancelHandle::default(),
            completion,
        }
    }

    pub fn work(&self) -> &W {
        &self.work
    }

    pub fn completion(&self) -> Completion {
        self.completion.clone()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn is_settled(&self) -> bool {
        self.completion.is_settled()
    }

    /// Stops the task and settles it as cancelled, unless it already settled.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.completion.settle(TaskOutcome::Cancelled);
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn unpause(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Drives the task for the frame at `now`.
    ///
    /// `now` must not go backwards between calls.
    pub fn tick<C: ?Sized>(&mut self, now: Instant, ctx: &mut C) -> TickOutcome
    where
        W: FrameWork<C>,
    {
        if self.is_settled() {
            return TickOutcome::Settled;
        }
        if self.cancel.is_cancelled() {
            self.completion.settle(TaskOutcome::Cancelled);
            return TickOutcome::Settled;
        }

        let started = *self.started.get_or_insert(now);
        let previous_tick = self.last_tick.replace(now);
        if self.paused {
            if let Some(previous) = previous_tick {
                self.paused_for += now.saturating_duration_since(previous);
            }
            // Frame spacing restarts after a pause
            self.last_run = self.last_run.map(|_| now);
            return TickOutcome::Skipped;
        }

        let since_start = now
            .saturating_duration_since(started)
            .saturating_sub(self.paused_for);
        let elapsed = self
            .last_run
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        if let (Some(min_interval), Some(_)) = (self.min_interval, self.last_run) {
            if elapsed < min_interval {
                return TickOutcome::Skipped;
            }
        }

        if self.work.is_finished(ctx, since_start) {
            self.completion.settle(TaskOutcome::Completed);
            return TickOutcome::Settled;
        }
        self.work.run(
            ctx,
            FrameInfo {
                elapsed,
                since_start,
            },
        );
        self.last_run = Some(now);
        TickOutcome::Ran
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts frames and finishes once `limit` frames ran.
    fn counter(limit: usize) -> impl FrameWork<Vec<FrameInfo>> {
        FnWork::new(
            |frames: &mut Vec<FrameInfo>, frame: FrameInfo| frames.push(frame),
            move |frames: &mut Vec<FrameInfo>, _: Duration| frames.len() >= limit,
        )
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_first_tick_runs_and_predicate_settles() {
        let start = Instant::now();
        let mut frames = Vec::new();
        let mut task = FrameTask::new(counter(2), None);
        assert_eq!(task.tick(start, &mut frames), TickOutcome::Ran);
        assert_eq!(task.tick(start + ms(1), &mut frames), TickOutcome::Ran);
        assert_eq!(task.tick(start + ms(2), &mut frames), TickOutcome::Settled);
        assert_eq!(task.completion().outcome(), Some(TaskOutcome::Completed));
        // Settled tasks stay settled and never run again
        assert_eq!(task.tick(start + ms(3), &mut frames), TickOutcome::Settled);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].elapsed, Duration::ZERO);
        assert_eq!(frames[1].elapsed, ms(1));
    }

    #[test]
    fn test_fps_cap_skips_early_ticks() {
        let start = Instant::now();
        let mut frames = Vec::new();
        // 100 fps: one frame every 10 ms
        let mut task = FrameTask::new(counter(10), Some(100));
        assert_eq!(task.tick(start, &mut frames), TickOutcome::Ran);
        assert_eq!(task.tick(start + ms(4), &mut frames), TickOutcome::Skipped);
        assert_eq!(task.tick(start + ms(9), &mut frames), TickOutcome::Skipped);
        assert_eq!(task.tick(start + ms(10), &mut frames), TickOutcome::Ran);
        assert_eq!(task.tick(start + ms(25), &mut frames), TickOutcome::Ran);
        // Elapsed is measured from the last executed tick, not the last skipped one
        assert_eq!(frames[1].elapsed, ms(10));
        assert_eq!(frames[2].elapsed, ms(15));
        assert_eq!(frames[2].since_start, ms(25));
    }

    #[test]
    fn test_cancel_settles_immediately() {
        let start = Instant::now();
        let mut frames = Vec::new();
        let mut task = FrameTask::new(counter(100), None);
        task.tick(start, &mut frames);
        let completion = task.completion();
        task.cancel();
        assert_eq!(completion.outcome(), Some(TaskOutcome::Cancelled));
        assert_eq!(task.tick(start + ms(1), &mut frames), TickOutcome::Settled);
        assert_eq!(frames.len(), 1);
        // Settlement is idempotent
        assert!(!completion.settle(TaskOutcome::Completed));
        assert_eq!(completion.outcome(), Some(TaskOutcome::Cancelled));
    }

    #[test]
    fn test_cancel_handle_is_observed_on_next_tick() {
        let start = Instant::now();
        let mut frames = Vec::new();
        let mut task = FrameTask::new(counter(100), None);
        let handle = task.cancel_handle();
        task.tick(start, &mut frames);
        std::thread::spawn(move || handle.cancel())
            .join()
            .unwrap();
        assert!(!task.is_settled());
        assert_eq!(task.tick(start + ms(1), &mut frames), TickOutcome::Settled);
        assert_eq!(task.completion().outcome(), Some(TaskOutcome::Cancelled));
    }

    #[test]
    fn test_pause_excludes_paused_time() {
        let start = Instant::now();
        let mut frames = Vec::new();
        let mut task = FrameTask::new(counter(100), None);
        task.tick(start, &mut frames);
        task.tick(start + ms(10), &mut frames);
        task.pause();
        assert_eq!(task.tick(start + ms(20), &mut frames), TickOutcome::Skipped);
        assert_eq!(task.tick(start + ms(50), &mut frames), TickOutcome::Skipped);
        task.unpause();
        assert_eq!(task.tick(start + ms(60), &mut frames), TickOutcome::Ran);
        assert_eq!(frames.len(), 3);
        // 40 ms were spent paused
        assert_eq!(frames[2].since_start, ms(20));
        assert_eq!(frames[2].elapsed, ms(10));
    }

    #[test]
    fn test_completion_wait_from_another_thread() {
        let start = Instant::now();
        let mut frames = Vec::new();
        let mut task = FrameTask::new(counter(1), None);
        let completion = task.completion();
        let waiter = std::thread::spawn(move || completion.wait());
        task.tick(start, &mut frames);
        task.tick(start + ms(1), &mut frames);
        assert_eq!(waiter.join().unwrap(), TaskOutcome::Completed);
    }

    #[test]
    fn test_wait_timeout_on_unsettled_completion() {
        let completion = Completion::new();
        assert_eq!(completion.wait_timeout(ms(5)), None);
        let settled = Completion::settled(TaskOutcome::Superseded);
        assert_eq!(settled.wait_timeout(ms(5)), Some(TaskOutcome::Superseded));
        assert_eq!(settled.wait(), TaskOutcome::Superseded);
    }
}
