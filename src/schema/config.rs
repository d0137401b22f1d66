//! Playback configuration.

use serde::{Deserialize, Serialize};

use crate::animation::AnimationCue;

/// Longest cue a configuration may describe, in ticks.
pub const MAX_TICKS: u64 = u32::MAX as u64;

fn default_frame_rate() -> f64 {
    10.0
}

fn default_preload() -> bool {
    true
}

/// Settings for playing a volume sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaybackConfig {
    /// Cue ticks per second of scene time.
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f64,
    /// Cue start time.
    #[serde(default)]
    pub start_time: f64,
    /// Cue end time. When absent the cue ticks once per sequence element.
    #[serde(default)]
    pub end_time: Option<f64>,
    /// Decode every element before playback starts.
    #[serde(default = "default_preload")]
    pub preload: bool,
    /// Sleep between ticks so playback runs at `frame_rate`.
    #[serde(default)]
    pub realtime: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            frame_rate: default_frame_rate(),
            start_time: 0.0,
            end_time: None,
            preload: default_preload(),
            realtime: false,
        }
    }
}

impl PlaybackConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
            return Err(ConfigError::InvalidFrameRate(self.frame_rate));
        }
        if !self.start_time.is_finite() {
            return Err(ConfigError::InvalidTimeRange);
        }
        if let Some(end) = self.end_time {
            if !end.is_finite() || end < self.start_time {
                return Err(ConfigError::InvalidTimeRange);
            }
            let ticks = AnimationCue::new(self.start_time, end, self.frame_rate).tick_count();
            if ticks > MAX_TICKS {
                return Err(ConfigError::TooManyTicks(ticks));
            }
        }
        Ok(())
    }

    /// Build the cue for a sequence of `frames` elements.
    pub fn cue(&self, frames: usize) -> AnimationCue {
        match self.end_time {
            Some(end) => AnimationCue::new(self.start_time, end, self.frame_rate),
            None => {
                let mut cue = AnimationCue::for_frames(frames, self.frame_rate);
                cue.start_time += self.start_time;
                cue.end_time += self.start_time;
                cue
            }
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Frame rate must be positive, got {0}")]
    InvalidFrameRate(f64),
    #[error("End time must not precede start time")]
    InvalidTimeRange,
    #[error("Cue would emit {0} ticks, more than {MAX_TICKS}")]
    TooManyTicks(u64),
}
