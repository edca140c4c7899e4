use tracing::trace;

use super::{CancelToken, StepEvent};
use crate::{Dataset, Result};

/// Bubble sort as a step machine.
///
/// Walks the classic double loop: pass `i` compares every adjacent pair
/// `(j, j + 1)` with `j < len - i - 1`. An out-of-order pair yields a
/// `Compare` followed, on the next call, by the `Swap` that fixes it.
#[derive(Debug)]
pub struct BubbleSteps {
    len: usize,
    pass: usize,
    cursor: usize,
    pending_swap: bool,
    finished: bool,
    cancel: CancelToken,
}

impl BubbleSteps {
    pub fn new(len: usize, cancel: CancelToken) -> Self {
        Self {
            len,
            pass: 0,
            cursor: 0,
            pending_swap: false,
            finished: false,
            cancel,
        }
    }

    pub fn next_step(&mut self, data: &mut Dataset) -> Result<Option<StepEvent>> {
        if self.finished {
            return Ok(None);
        }
        if self.cancel.is_cancelled() {
            trace!(pass = self.pass, cursor = self.cursor, "bubble sort cancelled");
            self.finished = true;
            return Ok(None);
        }

        let j = self.cursor;
        if self.pending_swap {
            self.pending_swap = false;
            data.swap(j, j + 1)?;
            self.advance();
            return Ok(Some(StepEvent::Swap { i: j, j: j + 1 }));
        }

        if self.pass + 1 < self.len && j + 1 < self.len - self.pass {
            if data.value(j)? > data.value(j + 1)? {
                self.pending_swap = true;
            } else {
                self.advance();
            }
            return Ok(Some(StepEvent::Compare { i: j, j: j + 1 }));
        }

        self.finished = true;
        Ok(Some(StepEvent::Done))
    }

    fn advance(&mut self) {
        self.cursor += 1;
        if self.cursor + 1 >= self.len - self.pass {
            self.pass += 1;
            self.cursor = 0;
        }
    }
}
