//! Sorting algorithms rewritten as step machines.
//!
//! Each call to `next_step` performs at most one comparison or one swap on the
//! [`Dataset`] and reports it as a [`StepEvent`]. The caller decides when the
//! next call happens, which is what lets the playback controller pause,
//! cancel and pace a run without the algorithms knowing about time.

mod bubble;
mod quick;

use std::{
    fmt,
    str::FromStr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use serde::{Deserialize, Serialize};

use crate::{Dataset, Result, SortSoundError};

pub use bubble::BubbleSteps;
pub use quick::{partition, Partition, PartitionStep, QuickSteps};

/// One unit of algorithm progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StepEvent {
    Compare { i: usize, j: usize },
    /// The swap has already been applied to the dataset.
    Swap { i: usize, j: usize },
    Done,
}

/// Registered sorting algorithms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmId {
    #[default]
    Bubble,
    Quick,
}

impl AlgorithmId {
    pub const ALL: [AlgorithmId; 2] = [AlgorithmId::Bubble, AlgorithmId::Quick];

    pub fn name(self) -> &'static str {
        match self {
            AlgorithmId::Bubble => "bubble",
            AlgorithmId::Quick => "quick",
        }
    }

    /// Builds a fresh step sequence over a dataset of `len` elements.
    pub fn steps(self, len: usize, cancel: CancelToken) -> SortSteps {
        match self {
            AlgorithmId::Bubble => SortSteps::Bubble(BubbleSteps::new(len, cancel)),
            AlgorithmId::Quick => SortSteps::Quick(QuickSteps::new(len, cancel)),
        }
    }

    /// Index whose value a `Swap { i, j }` sounds, read after the swap.
    ///
    /// Bubble sort sounds the larger value as it moves right, which now sits
    /// at `j`. Quicksort sounds whatever landed at `i`.
    pub fn swap_tone_index(self, i: usize, j: usize) -> usize {
        match self {
            AlgorithmId::Bubble => j,
            AlgorithmId::Quick => i,
        }
    }
}

impl fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AlgorithmId {
    type Err = SortSoundError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bubble" => Ok(AlgorithmId::Bubble),
            "quick" | "quicksort" => Ok(AlgorithmId::Quick),
            other => Err(SortSoundError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Cooperative cancellation flag shared between the controller and the step
/// sequence it is driving.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Tally of a drained step sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepCounts {
    pub compares: usize,
    pub swaps: usize,
}

impl StepCounts {
    pub fn record(&mut self, event: StepEvent) {
        match event {
            StepEvent::Compare { .. } => self.compares += 1,
            StepEvent::Swap { .. } => self.swaps += 1,
            StepEvent::Done => {}
        }
    }
}

/// A running instance of one of the registered algorithms.
#[derive(Debug)]
pub enum SortSteps {
    Bubble(BubbleSteps),
    Quick(QuickSteps),
}

impl SortSteps {
    /// Produces the next event, or `None` once the sequence is over. A
    /// cancelled sequence stops without ever reporting [`StepEvent::Done`].
    pub fn next_step(&mut self, data: &mut Dataset) -> Result<Option<StepEvent>> {
        match self {
            SortSteps::Bubble(steps) => steps.next_step(data),
            SortSteps::Quick(steps) => steps.next_step(data),
        }
    }

    pub fn algorithm(&self) -> AlgorithmId {
        match self {
            SortSteps::Bubble(_) => AlgorithmId::Bubble,
            SortSteps::Quick(_) => AlgorithmId::Quick,
        }
    }

    /// Runs the sequence to its end without any pacing.
    pub fn drain(&mut self, data: &mut Dataset) -> Result<StepCounts> {
        let mut counts = StepCounts::default();
        while let Some(event) = self.next_step(data)? {
            counts.record(event);
        }
        Ok(counts)
    }
}

#[cfg(test)]
pub(crate) fn collect_events(steps: &mut SortSteps, data: &mut Dataset) -> Vec<StepEvent> {
    let mut events = Vec::new();
    while let Some(event) = steps.next_step(data).unwrap() {
        events.push(event);
    }
    events
}
