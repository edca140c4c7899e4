use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::{Result, SortSoundError};

/// Rendering height the seed magnitudes are spread across by default.
pub const DEFAULT_HEIGHT: f32 = 400.0;

/// The bars being sorted.
///
/// Values are always a permutation of `unit, 2 * unit, ..., n * unit` where
/// `unit = height / n`, so there are never two equal bars. Only [`swap`] and a
/// wholesale [`randomize`] change the contents.
///
/// [`swap`]: Dataset::swap
/// [`randomize`]: Dataset::randomize
#[derive(Debug, Clone)]
pub struct Dataset {
    values: Vec<f32>,
    height: f32,
    rng: StdRng,
}

impl Dataset {
    /// Creates an empty dataset seeded from OS entropy.
    pub fn new(height: f32) -> Self {
        Self {
            values: Vec::new(),
            height,
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates an empty dataset whose shuffles are reproducible.
    pub fn with_seed(height: f32, seed: u64) -> Self {
        Self {
            values: Vec::new(),
            height,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Wraps a fixed sequence. The height becomes the largest value so tone
    /// and bar scaling still work.
    pub fn from_values(values: Vec<f32>) -> Self {
        let height = values.iter().copied().fold(0.0_f32, f32::max);
        Self {
            values,
            height,
            rng: StdRng::seed_from_u64(0),
        }
    }

    /// The ascending sequence `randomize(n)` shuffles.
    pub fn seed_values(n: usize, height: f32) -> Vec<f32> {
        if n == 0 {
            return Vec::new();
        }
        let unit = height / n as f32;
        (1..=n).map(|step| step as f32 * unit).collect()
    }

    /// Replaces the contents with a uniformly shuffled set of `n` seed
    /// magnitudes.
    pub fn randomize(&mut self, n: usize) {
        let mut values = Self::seed_values(n, self.height);
        values.shuffle(&mut self.rng);
        self.values = values;
    }

    pub fn swap(&mut self, i: usize, j: usize) -> Result<()> {
        self.check(i)?;
        self.check(j)?;
        self.values.swap(i, j);
        Ok(())
    }

    pub fn value(&self, index: usize) -> Result<f32> {
        self.check(index)?;
        Ok(self.values[index])
    }

    /// Owned copy for consumers that must not observe later swaps.
    pub fn snapshot(&self) -> Vec<f32> {
        self.values.clone()
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn is_sorted(&self) -> bool {
        self.values.windows(2).all(|pair| pair[0] <= pair[1])
    }

    fn check(&self, index: usize) -> Result<()> {
        if index < self.values.len() {
            Ok(())
        } else {
            Err(SortSoundError::IndexOutOfRange {
                index,
                len: self.values.len(),
            })
        }
    }
}
