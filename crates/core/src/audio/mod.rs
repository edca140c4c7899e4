use std::time::Duration;

use tracing::trace;

use crate::{config::AudioConfig, Result};

/// Consumer of the tones a run produces.
///
/// `play` must return without waiting for the tone to finish; the tone stops
/// on its own after `duration`.
pub trait AudioSink {
    fn play(&mut self, value: f32, duration: Duration) -> Result<()>;
}

impl<S: AudioSink + ?Sized> AudioSink for Box<S> {
    fn play(&mut self, value: f32, duration: Duration) -> Result<()> {
        (**self).play(value, duration)
    }
}

/// Maps bar magnitudes onto a pitch band. Taller bars sound lower.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneMapper {
    min_frequency: f32,
    max_frequency: f32,
    max_value: f32,
}

impl ToneMapper {
    pub fn new(min_frequency: f32, max_frequency: f32, max_value: f32) -> Self {
        Self {
            min_frequency,
            max_frequency,
            max_value,
        }
    }

    pub fn from_config(config: &AudioConfig, max_value: f32) -> Self {
        Self::new(config.min_frequency, config.max_frequency, max_value)
    }

    pub fn frequency(&self, value: f32) -> f32 {
        if self.max_value <= 0.0 {
            return self.max_frequency;
        }
        let band = self.max_frequency - self.min_frequency;
        let frequency = self.max_frequency - band * (value / self.max_value);
        frequency.clamp(self.min_frequency, self.max_frequency)
    }
}

/// Sink that reports every tone through `tracing` instead of a sound device.
#[derive(Debug, Clone)]
pub struct TracingAudio {
    mapper: ToneMapper,
}

impl TracingAudio {
    pub fn new(mapper: ToneMapper) -> Self {
        Self { mapper }
    }
}

impl AudioSink for TracingAudio {
    fn play(&mut self, value: f32, duration: Duration) -> Result<()> {
        trace!(
            value,
            frequency_hz = self.mapper.frequency(value),
            duration_ms = duration.as_millis() as u64,
            "tone"
        );
        Ok(())
    }
}

/// Silent sink for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _value: f32, _duration: Duration) -> Result<()> {
        Ok(())
    }
}
