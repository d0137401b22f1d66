//! Schema module - Playback configuration and synthetic series descriptions.

mod config;
mod series;

pub use config::*;
pub use series::*;
