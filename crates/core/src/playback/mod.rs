//! Playback controller: paces a sort run and republishes its steps.
//!
//! The controller never sleeps. The driver hands it the current time through
//! [`PlaybackController::poll`] and asks [`PlaybackController::next_deadline`]
//! how long it may wait before polling again. Every user operation and every
//! step happens on the caller's thread, so the dataset is never touched by two
//! operations at once.
//!
//! Phases:
//!
//! - `Idle`: nothing scheduled; `start` begins a run.
//! - `Running`: one step per poll once the step delay has elapsed.
//! - `Paused`: polls pull no steps until `toggle_pause` resumes.
//! - `Completed`: the sort finished; the sorted-playback pass sweeps the bars.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, trace, warn};

use crate::{
    config::{self, AppConfig, AudioConfig, PlaybackConfig},
    timeline::{DeferredAction, ScheduledEvent, Scheduler},
    AlgorithmId, AudioSink, CancelToken, Dataset, Frame, RenderSink, Result, SortSteps,
    StepEvent,
};

/// Coarse view of [`PlaybackState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Running,
    Paused,
    Completed,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Running => write!(f, "running"),
            Phase::Paused => write!(f, "paused"),
            Phase::Completed => write!(f, "completed"),
        }
    }
}

/// The controller's single source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackState {
    pub running: bool,
    /// Only meaningful while `running`.
    pub paused: bool,
    pub speed_delay_ms: u64,
    pub algorithm: AlgorithmId,
    pub highlight_primary: Option<usize>,
    pub highlight_secondary: Option<usize>,
    /// Set when the active run reported `Done`; cleared by reset or restart.
    pub completed: bool,
}

impl PlaybackState {
    fn new(algorithm: AlgorithmId, speed_delay: Duration) -> Self {
        Self {
            running: false,
            paused: false,
            speed_delay_ms: speed_delay.as_millis() as u64,
            algorithm,
            highlight_primary: None,
            highlight_secondary: None,
            completed: false,
        }
    }

    pub fn phase(&self) -> Phase {
        match (self.running, self.paused, self.completed) {
            (true, true, _) => Phase::Paused,
            (true, false, _) => Phase::Running,
            (false, _, true) => Phase::Completed,
            (false, _, false) => Phase::Idle,
        }
    }

    pub fn speed_delay(&self) -> Duration {
        Duration::from_millis(self.speed_delay_ms)
    }

    fn highlight(&mut self, primary: Option<usize>, secondary: Option<usize>) {
        self.highlight_primary = primary;
        self.highlight_secondary = secondary;
    }

    fn clear_highlights(&mut self) {
        self.highlight(None, None);
    }
}

/// Cursor of the sweep that plays the sorted bars once a run completes.
#[derive(Debug, Clone, Copy)]
struct Finale {
    next: usize,
    due: Duration,
}

#[derive(Debug)]
struct ActiveRun {
    steps: SortSteps,
    cancel: CancelToken,
    due: Duration,
}

/// Drives a sort run and forwards its progress to a render and audio sink.
pub struct PlaybackController<R, A> {
    playback: PlaybackConfig,
    audio_config: AudioConfig,
    bar_count: usize,
    dataset: Dataset,
    state: PlaybackState,
    run: Option<ActiveRun>,
    finale: Option<Finale>,
    scheduler: Scheduler,
    now: Duration,
    render: R,
    audio: A,
    audio_degraded: bool,
}

impl<R: RenderSink, A: AudioSink> PlaybackController<R, A> {
    /// Builds a controller in `Idle` with a freshly shuffled dataset and draws
    /// the first frame.
    pub fn new(config: &AppConfig, render: R, audio: A) -> Self {
        let config = config.clone().normalized();
        let dataset = match config.dataset.seed {
            Some(seed) => Dataset::with_seed(config.dataset.height, seed),
            None => Dataset::new(config.dataset.height),
        };
        let state = PlaybackState::new(
            config.playback.algorithm,
            config::speed_delay(config.playback.speed_level),
        );

        let mut controller = Self {
            playback: config.playback,
            audio_config: config.audio,
            bar_count: config.dataset.bar_count,
            dataset,
            state,
            run: None,
            finale: None,
            scheduler: Scheduler::new(),
            now: Duration::ZERO,
            render,
            audio,
            audio_degraded: false,
        };
        controller.reset();
        controller
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn bar_count(&self) -> usize {
        self.bar_count
    }

    pub fn render_sink(&self) -> &R {
        &self.render
    }

    pub fn audio_sink(&self) -> &A {
        &self.audio
    }

    pub fn is_restart_pending(&self) -> bool {
        !self.scheduler.is_empty()
    }

    pub fn is_finale_active(&self) -> bool {
        self.finale.is_some()
    }

    /// Snapshot of what should currently be on screen.
    pub fn frame(&self) -> Frame {
        Frame {
            values: self.dataset.snapshot(),
            primary: self.state.highlight_primary,
            secondary: self.state.highlight_secondary,
            done_up_to: self.finale.and_then(|finale| finale.next.checked_sub(1)),
        }
    }

    /// Draws the current frame regardless of step cadence.
    pub fn redraw(&mut self) {
        let frame = self.frame();
        self.draw(&frame);
    }

    /// Begins a run with the selected algorithm over the current bars.
    pub fn start(&mut self) {
        if self.state.running || self.is_restart_pending() || self.finale.is_some() {
            debug!(phase = %self.phase(), "start ignored");
            return;
        }
        self.begin_run(self.state.algorithm);
    }

    /// Flips between `Running` and `Paused`. Ignored when no run is active.
    pub fn toggle_pause(&mut self) {
        if !self.state.running {
            debug!(phase = %self.phase(), "pause toggle ignored");
            return;
        }
        self.state.paused = !self.state.paused;
        if self.state.paused {
            info!("paused");
        } else {
            let due = self.now + self.state.speed_delay();
            if let Some(run) = self.run.as_mut() {
                run.due = due;
            }
            info!("resumed");
        }
    }

    /// Cancels everything in flight and deals a fresh set of bars.
    pub fn reset(&mut self) {
        self.cancel_run();
        self.scheduler.clear();
        self.finale = None;
        self.state.running = false;
        self.state.paused = false;
        self.state.completed = false;
        self.state.clear_highlights();
        self.dataset.randomize(self.bar_count);
        info!(bars = self.bar_count, "reset");
        self.redraw();
    }

    /// Maps a 1..=100 level onto the step delay. Applies from the next step.
    pub fn set_speed(&mut self, level: u32) {
        let clamped = config::clamp_speed_level(level);
        if clamped != level {
            warn!(level, clamped, "speed level out of range");
        }
        self.state.speed_delay_ms = config::speed_delay(clamped).as_millis() as u64;
        debug!(level = clamped, delay_ms = self.state.speed_delay_ms, "speed changed");
    }

    /// Switches algorithm by name. Unknown names leave the current one active.
    pub fn select_algorithm(&mut self, name: &str) {
        match name.parse::<AlgorithmId>() {
            Ok(id) => self.select(id),
            Err(err) => warn!(%err, current = %self.state.algorithm, "keeping current algorithm"),
        }
    }

    /// Switches algorithm. A run in progress is cancelled now and restarted
    /// with `id` once the settle delay has passed.
    pub fn select(&mut self, id: AlgorithmId) {
        self.state.algorithm = id;
        if !self.state.running && !self.is_restart_pending() {
            info!(algorithm = %id, "algorithm selected");
            return;
        }

        self.cancel_run();
        self.state.running = false;
        self.state.paused = false;
        self.state.clear_highlights();
        self.scheduler.clear();
        let due = self.now + self.playback.restart_settle();
        self.scheduler
            .schedule(ScheduledEvent::new(due, DeferredAction::Restart(id)));
        info!(algorithm = %id, restart_in_ms = self.playback.restart_settle_ms, "algorithm switched mid-run");
    }

    /// Changes the number of bars. Always goes through `Idle`.
    pub fn set_bar_count(&mut self, count: usize) {
        let clamped = config::clamp_bar_count(count);
        if clamped != count {
            warn!(count, clamped, "bar count out of range");
        }
        self.bar_count = clamped;
        self.reset();
    }

    /// Earliest time at which `poll` has work to do, if anything is scheduled.
    pub fn next_deadline(&self) -> Option<Duration> {
        let step = self
            .run
            .as_ref()
            .filter(|_| self.state.running && !self.state.paused)
            .map(|run| run.due);
        [self.scheduler.next_due(), self.finale.map(|f| f.due), step]
            .into_iter()
            .flatten()
            .min()
    }

    /// Advances whatever is due at `now`: a deferred restart, one bar of the
    /// sorted-playback pass, or one algorithm step.
    ///
    /// Only an algorithm fault is returned; the controller is back in `Idle`
    /// when that happens.
    pub fn poll(&mut self, now: Duration) -> Result<()> {
        self.now = self.now.max(now);

        if let Some(DeferredAction::Restart(id)) = self.scheduler.take_due(self.now) {
            debug!(algorithm = %id, "restarting after settle");
            self.begin_run(id);
            return Ok(());
        }

        if self.finale.is_some_and(|finale| finale.due <= self.now) {
            self.advance_finale();
            return Ok(());
        }

        if !self.state.running || self.state.paused {
            return Ok(());
        }
        let due = match self.run.as_ref() {
            Some(run) => run.due,
            None => return Ok(()),
        };
        if due > self.now {
            return Ok(());
        }

        match self.pull_step() {
            Ok(()) => Ok(()),
            Err(err) => {
                error!(%err, "sort step failed; returning to idle");
                self.cancel_run();
                self.state.running = false;
                self.state.paused = false;
                self.state.clear_highlights();
                Err(err)
            }
        }
    }

    fn begin_run(&mut self, id: AlgorithmId) {
        self.cancel_run();
        self.state.algorithm = id;
        let cancel = CancelToken::new();
        self.run = Some(ActiveRun {
            steps: id.steps(self.dataset.len(), cancel.clone()),
            cancel,
            due: self.now,
        });
        self.state.running = true;
        self.state.paused = false;
        self.state.completed = false;
        self.state.clear_highlights();
        info!(algorithm = %id, bars = self.dataset.len(), "sort started");
    }

    fn cancel_run(&mut self) {
        if let Some(run) = self.run.take() {
            run.cancel.cancel();
            debug!(algorithm = %run.steps.algorithm(), "run cancelled");
        }
    }

    fn pull_step(&mut self) -> Result<()> {
        let Some(run) = self.run.as_mut() else {
            return Ok(());
        };
        let algorithm = run.steps.algorithm();
        let event = run.steps.next_step(&mut self.dataset)?;
        trace!(?event, "step");

        match event {
            Some(StepEvent::Compare { i, j }) => {
                self.state.highlight(Some(i), Some(j));
                self.redraw();
                if self.playback.sound_compares {
                    self.sound(i);
                }
                self.schedule_next_step();
            }
            Some(StepEvent::Swap { i, j }) => {
                self.state.highlight(Some(i), Some(j));
                self.redraw();
                self.sound(algorithm.swap_tone_index(i, j));
                self.schedule_next_step();
            }
            Some(StepEvent::Done) => self.complete(),
            // Cancelled underneath us; nothing left to drive.
            None => {
                self.run = None;
                self.state.running = false;
                self.state.paused = false;
                self.state.clear_highlights();
            }
        }
        Ok(())
    }

    fn schedule_next_step(&mut self) {
        let due = self.now + self.state.speed_delay();
        if let Some(run) = self.run.as_mut() {
            run.due = due;
        }
    }

    fn complete(&mut self) {
        self.run = None;
        self.state.running = false;
        self.state.paused = false;
        self.state.completed = true;
        self.state.clear_highlights();
        info!(
            algorithm = %self.state.algorithm,
            sorted = self.dataset.is_sorted(),
            "sort completed"
        );
        self.redraw();
        self.finale = Some(Finale {
            next: 0,
            due: self.now + self.state.speed_delay(),
        });
    }

    fn advance_finale(&mut self) {
        let Some(mut finale) = self.finale else {
            return;
        };

        if finale.next >= self.dataset.len() {
            self.finale = None;
            self.state.clear_highlights();
            debug!("sorted playback finished");
            self.redraw();
            return;
        }

        let index = finale.next;
        self.state.highlight(Some(index), None);
        finale.next += 1;
        finale.due = self.now + self.state.speed_delay();
        self.finale = Some(finale);
        self.redraw();
        self.sound(index);
    }

    fn draw(&mut self, frame: &Frame) {
        if let Err(err) = self.render.render(frame) {
            warn!(%err, "render sink failed");
        }
    }

    fn sound(&mut self, index: usize) {
        if !self.audio_config.enabled {
            return;
        }
        let Ok(value) = self.dataset.value(index) else {
            return;
        };
        if let Err(err) = self.audio.play(value, self.audio_config.tone_duration()) {
            if self.audio_degraded {
                debug!(%err, "audio sink failed");
            } else {
                warn!(%err, "audio sink failed; continuing without sound");
                self.audio_degraded = true;
            }
        }
    }
}

impl<R, A> std::fmt::Debug for PlaybackController<R, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("state", &self.state)
            .field("bar_count", &self.bar_count)
            .field("run", &self.run.as_ref().map(|run| run.steps.algorithm()))
            .field("finale", &self.finale)
            .field("pending", &!self.scheduler.is_empty())
            .finish()
    }
}

#[cfg(test)]
mod tests;
