//! Real-time audio spectrum bars
//!
//! An analysis pipeline writes per-channel bin matrices; a presentation layer
//! asks for frames at its own cadence and gets back double-buffered tiny-skia
//! pixmaps with the bars auto-scaled to the recent signal level.

pub mod config;
pub mod error;
pub mod render;
pub mod stats;
pub mod synth;
pub mod telemetry;

pub use config::Config;
pub use error::RenderError;
pub use render::{FrameBuffer, RepaintSignal, SpectrumRenderer};
pub use stats::{MovingWindow, PeakStatistic};
