use std::time::{Duration, Instant};

use crate::AlgorithmId;

/// Monotonic clock the driver samples before every `poll`.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackClock {
    origin: Instant,
}

impl PlaybackClock {
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Time since [`PlaybackClock::start`], the unit every deadline uses.
    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    /// Sleep length until `deadline`, or zero if it already passed.
    pub fn until(&self, deadline: Duration) -> Duration {
        deadline.saturating_sub(self.elapsed())
    }
}

/// Work the controller postpones instead of doing mid-step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredAction {
    /// Start a fresh run with this algorithm once the cancelled one settled.
    Restart(AlgorithmId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledEvent {
    pub due: Duration,
    pub action: DeferredAction,
}

impl ScheduledEvent {
    pub fn new(due: Duration, action: DeferredAction) -> Self {
        Self { due, action }
    }
}

/// Ordered queue of deferred actions keyed by due time.
#[derive(Debug, Default)]
pub struct Scheduler {
    events: Vec<ScheduledEvent>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, event: ScheduledEvent) {
        let at = self.events.partition_point(|queued| queued.due <= event.due);
        self.events.insert(at, event);
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.events.first().map(|event| event.due)
    }

    /// Removes and returns the earliest action whose due time has passed.
    pub fn take_due(&mut self, now: Duration) -> Option<DeferredAction> {
        match self.events.first() {
            Some(event) if event.due <= now => Some(self.events.remove(0).action),
            _ => None,
        }
    }
}
