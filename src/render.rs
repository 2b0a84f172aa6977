//! Spectrum rendering pipeline
//!
//! Bin matrices come in through [`SpectrumRenderer::write`]; frames go out
//! through [`SpectrumRenderer::render_frame`] and the shared [`FrameBuffer`].
//!
//! The pipeline is organized into:
//! - `geometry`: bin counts and column math
//! - `surface`: the tiny-skia pixmap bars are stroked onto
//! - `buffer`: double buffering of presented frames
//! - `layout`: zigzag placement of bars across channels
//! - `scale`: adaptive auto-gain
//! - `repaint`: repaint requests for the presentation layer

mod buffer;
mod geometry;
mod layout;
mod renderer;
mod repaint;
mod scale;
mod surface;

pub use buffer::{FrameBuffer, placeholder};
pub use geometry::{ColumnSpan, bar_stop, visible_bins};
pub use layout::{BarPlacement, Zigzag};
pub use renderer::{DEFAULT_BAR_WIDTH, DEFAULT_SPACE_WIDTH, LINE_WIDTH, SpectrumRenderer};
pub use repaint::RepaintSignal;
pub use scale::{AutoGain, PEAK_THRESHOLD, SILENT_FRAMES_BEFORE_RESET};
pub use surface::DrawSurface;
