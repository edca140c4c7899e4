use std::{fs, ops::RangeInclusive, path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{dataset::DEFAULT_HEIGHT, AlgorithmId, Result, SortSoundError};

/// Bar counts the controller accepts.
pub const BAR_COUNT_RANGE: RangeInclusive<usize> = 10..=2000;
/// Speed levels exposed by the speed control.
pub const SPEED_RANGE: RangeInclusive<u32> = 1..=100;

/// Inter-step delay for a speed level: `(max + 1) - level` milliseconds, so
/// level 100 is the fastest. Out-of-range levels are clamped.
pub fn speed_delay(level: u32) -> Duration {
    let level = level.clamp(*SPEED_RANGE.start(), *SPEED_RANGE.end());
    Duration::from_millis(u64::from(SPEED_RANGE.end() + 1 - level))
}

/// Inverse of [`speed_delay`] for delays inside the mapped range.
pub fn speed_level(delay: Duration) -> u32 {
    let max = u64::from(*SPEED_RANGE.end());
    let millis = delay.as_millis().clamp(1, u128::from(max)) as u64;
    (max + 1 - millis) as u32
}

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dataset: DatasetConfig,
    pub playback: PlaybackConfig,
    pub audio: AudioConfig,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&text)?;
        Ok(config.normalized())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Clamps every bounded setting into range, logging what was changed.
    pub fn normalized(mut self) -> Self {
        if let Err(err) = self.validate() {
            warn!(%err, "clamping configuration into range");
        }
        self.dataset.bar_count = clamp_bar_count(self.dataset.bar_count);
        self.playback.speed_level = clamp_speed_level(self.playback.speed_level);
        if !(self.dataset.height.is_finite() && self.dataset.height > 0.0) {
            self.dataset.height = DEFAULT_HEIGHT;
        }
        if self.audio.min_frequency > self.audio.max_frequency {
            std::mem::swap(&mut self.audio.min_frequency, &mut self.audio.max_frequency);
        }
        self
    }

    /// Reports the first setting that is out of range.
    pub fn validate(&self) -> Result<()> {
        if !BAR_COUNT_RANGE.contains(&self.dataset.bar_count) {
            return Err(SortSoundError::invalid_config(format!(
                "bar count {} outside {:?}",
                self.dataset.bar_count, BAR_COUNT_RANGE
            )));
        }
        if !SPEED_RANGE.contains(&self.playback.speed_level) {
            return Err(SortSoundError::invalid_config(format!(
                "speed level {} outside {:?}",
                self.playback.speed_level, SPEED_RANGE
            )));
        }
        if !(self.dataset.height.is_finite() && self.dataset.height > 0.0) {
            return Err(SortSoundError::invalid_config(format!(
                "height {} must be positive",
                self.dataset.height
            )));
        }
        if self.audio.min_frequency > self.audio.max_frequency {
            return Err(SortSoundError::invalid_config(
                "audio frequency band is inverted",
            ));
        }
        Ok(())
    }
}

/// Shape of the bars being sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub bar_count: usize,
    pub height: f32,
    /// Fixed shuffle seed; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            bar_count: 100,
            height: DEFAULT_HEIGHT,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub algorithm: AlgorithmId,
    pub speed_level: u32,
    /// How long a cancelled run gets to settle before an algorithm switch
    /// restarts it.
    pub restart_settle_ms: u64,
    /// Driver poll interval while nothing is scheduled, e.g. while paused.
    pub pause_poll_ms: u64,
    pub sound_compares: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            algorithm: AlgorithmId::Bubble,
            speed_level: 1,
            restart_settle_ms: 100,
            pause_poll_ms: 100,
            sound_compares: true,
        }
    }
}

impl PlaybackConfig {
    pub fn restart_settle(&self) -> Duration {
        Duration::from_millis(self.restart_settle_ms)
    }

    pub fn pause_poll(&self) -> Duration {
        Duration::from_millis(self.pause_poll_ms)
    }
}

/// Configuration specific to the audio subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub enabled: bool,
    pub min_frequency: f32,
    pub max_frequency: f32,
    pub tone_ms: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_frequency: 440.0,
            max_frequency: 880.0,
            tone_ms: 100,
        }
    }
}

impl AudioConfig {
    pub fn tone_duration(&self) -> Duration {
        Duration::from_millis(self.tone_ms)
    }
}

pub fn clamp_bar_count(count: usize) -> usize {
    count.clamp(*BAR_COUNT_RANGE.start(), *BAR_COUNT_RANGE.end())
}

pub fn clamp_speed_level(level: u32) -> u32 {
    level.clamp(*SPEED_RANGE.start(), *SPEED_RANGE.end())
}
