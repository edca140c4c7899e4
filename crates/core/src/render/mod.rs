use std::io::Write;

use serde::Serialize;

use crate::{Result, SortSoundError};

const GLYPHS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Everything a render sink needs to draw one picture of the bars.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Frame {
    pub values: Vec<f32>,
    pub primary: Option<usize>,
    pub secondary: Option<usize>,
    /// Set during the sorted-playback pass: bars `0..=index` are final.
    pub done_up_to: Option<usize>,
}

/// Consumer of frames. Drawing the same frame twice must look the same.
pub trait RenderSink {
    fn render(&mut self, frame: &Frame) -> Result<()>;
}

impl<S: RenderSink + ?Sized> RenderSink for Box<S> {
    fn render(&mut self, frame: &Frame) -> Result<()> {
        (**self).render(frame)
    }
}

/// Draws the bars as a single line of block glyphs with a marker line below.
///
/// Datasets wider than `width` are down-sampled by taking the tallest bar in
/// each bucket; a bucket is marked if it contains a highlighted index.
#[derive(Debug)]
pub struct TextRenderer<W: Write> {
    out: W,
    width: usize,
    max_value: f32,
    in_place: bool,
    drawn: bool,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W, width: usize, max_value: f32) -> Self {
        Self {
            out,
            width: width.max(1),
            max_value,
            in_place: false,
            drawn: false,
        }
    }

    /// Redraw over the previous frame instead of scrolling. Needs an ANSI
    /// terminal.
    pub fn in_place(mut self, enabled: bool) -> Self {
        self.in_place = enabled;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn bucket_count(&self, len: usize) -> usize {
        len.min(self.width)
    }

    /// Produces the two text lines for `frame` without writing them.
    pub fn layout(&self, frame: &Frame) -> (String, String) {
        let len = frame.values.len();
        let buckets = self.bucket_count(len);
        let mut bars = String::with_capacity(buckets * 3);
        let mut marks = String::with_capacity(buckets);

        for bucket in 0..buckets {
            let start = bucket * len / buckets;
            let end = ((bucket + 1) * len / buckets).max(start + 1);
            let tallest = frame.values[start..end]
                .iter()
                .copied()
                .fold(0.0_f32, f32::max);
            bars.push(self.glyph(tallest));

            let covers =
                |index: Option<usize>| index.is_some_and(|i| (start..end).contains(&i));
            let mark = if covers(frame.primary) {
                '^'
            } else if covers(frame.secondary) {
                '*'
            } else if frame.done_up_to.is_some_and(|done| done >= start) {
                '='
            } else {
                ' '
            };
            marks.push(mark);
        }
        (bars, marks.trim_end().to_string())
    }

    fn glyph(&self, value: f32) -> char {
        if self.max_value <= 0.0 {
            return GLYPHS[0];
        }
        let ratio = (value / self.max_value).clamp(0.0, 1.0);
        let slot = (ratio * (GLYPHS.len() - 1) as f32).round() as usize;
        GLYPHS[slot]
    }
}

impl<W: Write> RenderSink for TextRenderer<W> {
    fn render(&mut self, frame: &Frame) -> Result<()> {
        let (bars, marks) = self.layout(frame);
        let (rewind, clear) = match (self.in_place, self.drawn) {
            (true, true) => ("\x1b[2F", "\x1b[K"),
            (true, false) => ("", "\x1b[K"),
            _ => ("", ""),
        };
        self.drawn = true;
        write!(self.out, "{rewind}")
            .and_then(|_| writeln!(self.out, "{bars}{clear}"))
            .and_then(|_| writeln!(self.out, "{marks}{clear}"))
            .and_then(|_| self.out.flush())
            .map_err(|err| SortSoundError::sink(format!("text renderer: {err}")))
    }
}

/// Discards every frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl RenderSink for NullRenderer {
    fn render(&mut self, _frame: &Frame) -> Result<()> {
        Ok(())
    }
}
