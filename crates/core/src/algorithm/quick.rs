use tracing::trace;

use super::{CancelToken, StepEvent};
use crate::{Dataset, Result};

/// Outcome of advancing a [`Partition`] by one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionStep {
    Event(StepEvent),
    /// The pivot has settled at this index; the partition is over.
    Placed(usize),
}

/// One Lomuto partition of `[low, high]`, pivoting on `values[high]`.
///
/// `store` is the slot the next smaller-than-pivot element moves into, i.e.
/// one past the textbook `i`. Everything in `[low, store)` is below the pivot
/// and everything in `[store, cursor)` is above it.
#[derive(Debug, Clone)]
pub struct Partition {
    low: usize,
    high: usize,
    store: usize,
    cursor: usize,
    pending_swap: bool,
    placed: Option<usize>,
}

impl Partition {
    pub fn new(low: usize, high: usize) -> Self {
        Self {
            low,
            high,
            store: low,
            cursor: low,
            pending_swap: false,
            placed: None,
        }
    }

    pub fn range(&self) -> (usize, usize) {
        (self.low, self.high)
    }

    pub fn step(&mut self, data: &mut Dataset) -> Result<PartitionStep> {
        if let Some(pivot_index) = self.placed {
            return Ok(PartitionStep::Placed(pivot_index));
        }

        if self.pending_swap {
            self.pending_swap = false;
            let (i, j) = (self.store, self.cursor);
            data.swap(i, j)?;
            self.store += 1;
            self.cursor += 1;
            return Ok(PartitionStep::Event(StepEvent::Swap { i, j }));
        }

        if self.cursor < self.high {
            let j = self.cursor;
            if data.value(j)? < data.value(self.high)? {
                self.pending_swap = true;
            } else {
                self.cursor += 1;
            }
            return Ok(PartitionStep::Event(StepEvent::Compare { i: j, j: self.high }));
        }

        let pivot_index = self.store;
        data.swap(pivot_index, self.high)?;
        self.placed = Some(pivot_index);
        Ok(PartitionStep::Event(StepEvent::Swap {
            i: pivot_index,
            j: self.high,
        }))
    }
}

/// Runs a single partition to completion and returns the pivot's final index.
pub fn partition(data: &mut Dataset, low: usize, high: usize) -> Result<usize> {
    let mut part = Partition::new(low, high);
    loop {
        if let PartitionStep::Placed(pivot_index) = part.step(data)? {
            return Ok(pivot_index);
        }
    }
}

/// Quicksort with the recursion flattened into a work stack of ranges.
///
/// Left halves are processed before right halves, matching the recursive
/// formulation. `Done` is reported once the stack and the active partition
/// are both exhausted.
#[derive(Debug)]
pub struct QuickSteps {
    stack: Vec<(usize, usize)>,
    active: Option<Partition>,
    finished: bool,
    cancel: CancelToken,
}

impl QuickSteps {
    pub fn new(len: usize, cancel: CancelToken) -> Self {
        let mut stack = Vec::new();
        if len > 1 {
            stack.push((0, len - 1));
        }
        Self {
            stack,
            active: None,
            finished: false,
            cancel,
        }
    }

    pub fn next_step(&mut self, data: &mut Dataset) -> Result<Option<StepEvent>> {
        if self.finished {
            return Ok(None);
        }
        if self.cancel.is_cancelled() {
            trace!(pending_ranges = self.stack.len(), "quicksort cancelled");
            self.finished = true;
            return Ok(None);
        }

        loop {
            if let Some(part) = self.active.as_mut() {
                match part.step(data)? {
                    PartitionStep::Event(event) => return Ok(Some(event)),
                    PartitionStep::Placed(pivot_index) => {
                        let (low, high) = part.range();
                        self.active = None;
                        if pivot_index + 1 < high {
                            self.stack.push((pivot_index + 1, high));
                        }
                        if pivot_index > low + 1 {
                            self.stack.push((low, pivot_index - 1));
                        }
                    }
                }
                continue;
            }

            match self.stack.pop() {
                Some((low, high)) => {
                    trace!(low, high, "partitioning range");
                    self.active = Some(Partition::new(low, high));
                }
                None => {
                    self.finished = true;
                    return Ok(Some(StepEvent::Done));
                }
            }
        }
    }
}
