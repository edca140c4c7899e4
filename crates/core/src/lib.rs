//! Core library for the Sort Sonifier application.
//!
//! Sorting algorithms run as step machines ([`algorithm`]) over a shuffled
//! set of bars ([`dataset`]). The [`playback`] controller paces them, owns all
//! run state, and publishes every step to a render sink and an audio sink.
//! The [`input`] module turns user actions into controller calls.

pub mod algorithm;
pub mod audio;
pub mod config;
pub mod dataset;
pub mod error;
pub mod input;
pub mod playback;
pub mod render;
pub mod timeline;

pub use algorithm::{AlgorithmId, CancelToken, SortSteps, StepCounts, StepEvent};
pub use audio::{AudioSink, NullAudio, ToneMapper, TracingAudio};
pub use config::{AppConfig, AudioConfig, DatasetConfig, PlaybackConfig};
pub use dataset::Dataset;
pub use error::{Result, SortSoundError};
pub use input::InputCommand;
pub use playback::{Phase, PlaybackController, PlaybackState};
pub use render::{Frame, NullRenderer, RenderSink, TextRenderer};
pub use timeline::{DeferredAction, PlaybackClock, ScheduledEvent, Scheduler};
