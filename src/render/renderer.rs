//! Spectrum bar renderer
//!
//! The analysis thread calls [`SpectrumRenderer::write`] once per analysis
//! frame; the presentation layer calls [`SpectrumRenderer::render_frame`] on
//! its own schedule. Both hold the same state lock for their full duration.
//! Finished frames go through a [`FrameBuffer`] with its own lock, so readers
//! of presented frames never wait on the producer.

use super::buffer::{self, FrameBuffer};
use super::geometry::{self, bar_stop};
use super::layout::Zigzag;
use super::repaint::RepaintSignal;
use super::scale::AutoGain;
use super::surface::DrawSurface;
use crate::error::RenderError;
use crate::stats::{MovingWindow, PeakStatistic};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tiny_skia::{Color, LineCap, Pixmap};

pub const DEFAULT_BAR_WIDTH: f32 = 75.0;
pub const DEFAULT_SPACE_WIDTH: f32 = 5.0;

/// Stroke width of every bar
pub const LINE_WIDTH: f32 = 25.0;

struct State<S> {
    surface: DrawSurface,
    bins: Vec<Vec<f32>>,
    nchannels: usize,
    peak: f32,

    bar_width: f32,
    space_width: f32,
    bin_width: f32,

    width: u32,
    height: u32,

    gain: AutoGain<S>,
}

impl<S: PeakStatistic> State<S> {
    fn visible_bins(&self) -> usize {
        geometry::visible_bins(self.width, self.bin_width)
    }

    /// Grow the scratch matrix to at least `channels` x `len`; never shrinks
    fn grow(&mut self, channels: usize, len: usize) -> Result<(), RenderError> {
        let have_channels = self.bins.len();
        let have_len = self.bins.first().map_or(0, Vec::len);
        if channels <= have_channels && len <= have_len {
            return Ok(());
        }

        let channels = channels.max(have_channels);
        let len = len.max(have_len);

        let mut grown = Vec::new();
        grown.try_reserve_exact(channels)?;
        for _ in 0..channels {
            let mut row = Vec::new();
            row.try_reserve_exact(len)?;
            row.resize(len, 0.0);
            grown.push(row);
        }

        tracing::debug!("scratch bins grown to {}x{}", channels, len);
        self.bins = grown;
        Ok(())
    }

    fn draw(&mut self, abs_scale: f32) {
        let hf = self.height as f32;
        let scale = hf / abs_scale;
        let nbars = self.visible_bins();
        let nchannels = self.nchannels.min(self.bins.len());

        for bar in Zigzag::new(nchannels, nbars, self.bin_width, self.width) {
            let value = self.bins[bar.channel].get(bar.bin).copied().unwrap_or(0.0);
            let stop = bar_stop(value * scale, hf);
            self.surface.stroke_line(bar.x, hf, bar.x, stop);
        }
    }
}

pub struct SpectrumRenderer<S = MovingWindow> {
    state: Mutex<State<S>>,
    frames: Arc<FrameBuffer>,
    repaint: RepaintSignal,
}

impl SpectrumRenderer<MovingWindow> {
    /// Create a renderer whose auto-gain window is sized for the given stream
    pub fn new(sample_rate: u32, sample_size: usize) -> Self {
        Self::with_statistic(MovingWindow::for_stream(sample_rate, sample_size))
    }
}

impl<S: PeakStatistic> SpectrumRenderer<S> {
    pub fn with_statistic(statistic: S) -> Self {
        Self {
            state: Mutex::new(State {
                surface: DrawSurface::new(),
                bins: Vec::new(),
                nchannels: 0,
                peak: 0.0,
                bar_width: DEFAULT_BAR_WIDTH,
                space_width: DEFAULT_SPACE_WIDTH,
                bin_width: DEFAULT_BAR_WIDTH + DEFAULT_SPACE_WIDTH,
                width: 0,
                height: 0,
                gain: AutoGain::new(statistic),
            }),
            frames: Arc::new(FrameBuffer::new()),
            repaint: RepaintSignal::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the bar and gap widths; takes effect on the next render
    pub fn configure_bar_geometry(&self, bar_width: f32, space_width: f32) {
        let mut state = self.lock();
        state.bar_width = bar_width;
        state.space_width = space_width;
        state.bin_width = bar_width + space_width;
    }

    pub fn bar_geometry(&self) -> (f32, f32) {
        let state = self.lock();
        (state.bar_width, state.space_width)
    }

    /// Accept a new analysis frame
    ///
    /// Rows beyond the visible bin count are ignored. A repaint is requested
    /// once the state lock has been released.
    pub fn write<B: AsRef<[f32]>>(&self, bins: &[B], nchannels: usize) -> Result<(), RenderError> {
        let result = self.write_locked(bins, nchannels);
        self.repaint.request();
        result
    }

    fn write_locked<B: AsRef<[f32]>>(&self, bins: &[B], nchannels: usize) -> Result<(), RenderError> {
        let mut guard = self.lock();
        let state = &mut *guard;

        let incoming_len = bins.iter().map(|row| row.as_ref().len()).max().unwrap_or(0);
        state.grow(bins.len(), incoming_len)?;

        let nchannels = if nchannels > bins.len() {
            tracing::warn!(
                "write asked for {} channels but only {} were supplied",
                nchannels,
                bins.len()
            );
            bins.len()
        } else {
            nchannels
        };

        let nbins = state.visible_bins();
        let mut peak = 0.0f32;

        for (i, (src, dst)) in bins.iter().zip(state.bins.iter_mut()).enumerate() {
            let src = src.as_ref();
            let n = nbins.min(src.len());
            dst[..n].copy_from_slice(&src[..n]);

            // Clear stale values when the producer sent fewer bins than fit
            let visible_end = nbins.min(dst.len());
            if visible_end > n {
                dst[n..visible_end].fill(0.0);
            }

            if i < nchannels {
                peak = src[..n].iter().copied().fold(peak, f32::max);
            }
        }

        state.peak = peak;
        state.nchannels = nchannels;
        Ok(())
    }

    /// Number of bins that fit horizontally at the current surface width
    ///
    /// All channels share the same columns, so `nchannels` does not change
    /// the result.
    pub fn visible_bin_count(&self, _nchannels: usize) -> usize {
        self.lock().visible_bins()
    }

    /// Draw the latest frame at the requested size and present it
    ///
    /// Returns the presented frame; callers may hold it until the next one
    /// arrives without forcing a new allocation. A zero-sized request draws
    /// nothing and returns the 1x1 placeholder.
    pub fn render_frame(&self, width: u32, height: u32) -> Result<Arc<Pixmap>, RenderError> {
        let mut guard = self.lock();
        let state = &mut *guard;

        state.surface.resize(width, height)?;
        state.width = width;
        state.height = height;

        if state.surface.pixmap().is_none() {
            return Ok(buffer::placeholder());
        }

        state.surface.clear();
        state.surface.set_stroke_color(Color::WHITE);
        state.surface.set_line_width(LINE_WIDTH);
        state.surface.set_line_cap(LineCap::Round);

        let scale = state.gain.next_scale(state.peak);
        state.draw(scale);

        tracing::trace!(
            "rendered {}x{} frame, peak={:.3}, scale={:.3}",
            width,
            height,
            state.peak,
            scale
        );

        match state.surface.pixmap_mut() {
            Some(pixmap) => self.frames.swap(pixmap),
            None => Ok(buffer::placeholder()),
        }
    }

    /// Shared handle to the double buffer, for readers that never render
    pub fn frames(&self) -> Arc<FrameBuffer> {
        Arc::clone(&self.frames)
    }

    pub fn repaint_signal(&self) -> RepaintSignal {
        self.repaint.clone()
    }

    /// Peak of the most recent analysis frame
    pub fn peak(&self) -> f32 {
        self.lock().peak
    }

    pub fn channel_count(&self) -> usize {
        self.lock().nchannels
    }

    /// Auto-gain scale used for the most recent render
    pub fn scale(&self) -> f32 {
        self.lock().gain.scale()
    }

    /// Surface size of the most recent render
    pub fn size(&self) -> (u32, u32) {
        let state = self.lock();
        (state.width, state.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::scale::tests::CountingStatistic;
    use std::thread;

    fn is_lit(frame: &Pixmap, x: u32, y: u32) -> bool {
        frame.pixel(x, y).map(|p| p.alpha() == 255).unwrap_or(false)
    }

    fn is_clear(frame: &Pixmap, x: u32, y: u32) -> bool {
        frame.pixel(x, y).map(|p| p.alpha() == 0).unwrap_or(false)
    }

    #[test]
    fn test_visible_bin_count_before_first_render() {
        let renderer = SpectrumRenderer::new(44100, 1024);
        assert_eq!(renderer.visible_bin_count(2), 0);
    }

    #[test]
    fn test_visible_bin_count_follows_geometry() {
        let renderer = SpectrumRenderer::new(44100, 1024);
        renderer.render_frame(800, 600).unwrap();
        assert_eq!(renderer.visible_bin_count(2), 10);
        assert_eq!(renderer.visible_bin_count(1), 10);

        renderer.configure_bar_geometry(35.0, 5.0);
        assert_eq!(renderer.visible_bin_count(2), 20);
        assert_eq!(renderer.bar_geometry(), (35.0, 5.0));
    }

    #[test]
    fn test_write_finds_peak() {
        let renderer = SpectrumRenderer::new(44100, 1024);
        renderer.render_frame(800, 600).unwrap();

        renderer.write(&[vec![0.5, 0.2], vec![0.9, 0.1]], 2).unwrap();

        assert!((renderer.peak() - 0.9).abs() < 1e-6);
        assert_eq!(renderer.channel_count(), 2);
    }

    #[test]
    fn test_peak_ignores_hidden_bins_and_channels() {
        let renderer = SpectrumRenderer::new(44100, 1024);
        renderer.render_frame(160, 100).unwrap();

        // Only two bins are visible; the 5.0 is off screen
        renderer
            .write(&[vec![0.1, 0.2, 5.0], vec![0.3, 0.0, 0.0]], 1)
            .unwrap();

        assert!((renderer.peak() - 0.2).abs() < 1e-6);
        assert_eq!(renderer.channel_count(), 1);
    }

    #[test]
    fn test_write_clamps_channel_count() {
        let renderer = SpectrumRenderer::new(44100, 1024);
        renderer.render_frame(800, 600).unwrap();

        renderer.write(&[vec![0.4; 10]], 3).unwrap();

        assert_eq!(renderer.channel_count(), 1);
        assert!((renderer.peak() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_scratch_only_grows() {
        let renderer = SpectrumRenderer::new(44100, 1024);
        renderer.render_frame(800, 600).unwrap();

        renderer.write(&[vec![0.0; 32], vec![0.0; 32]], 2).unwrap();
        renderer.write(&[vec![0.0; 8]], 1).unwrap();
        {
            let state = renderer.lock();
            assert_eq!(state.bins.len(), 2);
            assert_eq!(state.bins[0].len(), 32);
        }

        renderer.write(&[vec![0.0; 4], vec![0.0; 4], vec![0.0; 4]], 3).unwrap();
        let state = renderer.lock();
        assert_eq!(state.bins.len(), 3);
        assert!(state.bins.iter().all(|row| row.len() == 32));
    }

    #[test]
    fn test_short_frame_clears_stale_bins() {
        let renderer = SpectrumRenderer::new(44100, 1024);
        renderer.render_frame(800, 600).unwrap();

        renderer.write(&[vec![0.7; 10]], 1).unwrap();
        renderer.write(&[vec![0.1; 3]], 1).unwrap();

        let state = renderer.lock();
        assert_eq!(&state.bins[0][..3], &[0.1, 0.1, 0.1]);
        assert!(state.bins[0][3..10].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_write_requests_repaint() {
        let renderer = SpectrumRenderer::new(44100, 1024);
        let signal = renderer.repaint_signal();
        assert!(!signal.take());

        renderer.write(&[vec![0.1]], 1).unwrap();

        assert!(signal.take());
        assert_eq!(signal.requests(), 1);
    }

    #[test]
    fn test_bar_heights_match_values() {
        let renderer = SpectrumRenderer::new(44100, 1024);
        renderer.configure_bar_geometry(75.0, 5.0);
        renderer.render_frame(800, 600).unwrap();
        renderer.write(&[vec![0.5, 0.2], vec![0.9, 0.1]], 2).unwrap();

        let frame = renderer.render_frame(800, 600).unwrap();
        assert_eq!((frame.width(), frame.height()), (800, 600));
        assert_eq!(renderer.scale(), 1.0);

        // Channel 0, bin 0 at x=40: 0.5 * 600 tall, ends at y=300
        assert!(is_lit(&frame, 40, 400));
        assert!(is_clear(&frame, 40, 250));

        // Channel 1, bin 0 at x=760: 0.9 * 600 tall, ends at y=60
        assert!(is_lit(&frame, 760, 100));
        assert!(is_clear(&frame, 760, 30));

        // Channel 1, bin 1 at x=680: ends at y=540
        assert!(is_lit(&frame, 680, 580));
        assert!(is_clear(&frame, 680, 300));

        // Gaps between columns stay transparent
        assert!(is_clear(&frame, 80, 590));
    }

    #[test]
    fn test_loud_input_is_scaled_down() {
        let renderer = SpectrumRenderer::new(44100, 1024);
        renderer.render_frame(800, 600).unwrap();
        renderer.write(&[vec![3.0, 1.5]], 1).unwrap();

        let frame = renderer.render_frame(800, 600).unwrap();

        assert!((renderer.scale() - 3.0).abs() < 1e-4);
        // Full-height bar for the peak, half height for the next bin
        assert!(is_lit(&frame, 40, 20));
        assert!(is_lit(&frame, 120, 320));
        assert!(is_clear(&frame, 120, 250));
    }

    #[test]
    fn test_bars_never_exceed_surface() {
        let renderer = SpectrumRenderer::with_statistic(CountingStatistic {
            mean: 1.0,
            ..Default::default()
        });
        renderer.render_frame(800, 600).unwrap();
        renderer.write(&[vec![1000.0; 10]], 1).unwrap();

        let frame = renderer.render_frame(800, 600).unwrap();
        assert!(is_lit(&frame, 40, 1));
        assert!(is_lit(&frame, 760, 599));
    }

    #[test]
    fn test_zero_size_returns_placeholder() {
        let renderer = SpectrumRenderer::new(44100, 1024);

        let frame = renderer.render_frame(0, 600).unwrap();

        assert_eq!((frame.width(), frame.height()), (1, 1));
        assert_eq!(renderer.frames().allocations(), 0);
        assert_eq!(renderer.visible_bin_count(2), 0);
    }

    #[test]
    fn test_zero_bin_width_draws_nothing() {
        let renderer = SpectrumRenderer::new(44100, 1024);
        renderer.configure_bar_geometry(0.0, 0.0);
        renderer.write(&[vec![1.0; 4]], 1).unwrap();

        let frame = renderer.render_frame(100, 100).unwrap();

        assert_eq!(renderer.visible_bin_count(1), 0);
        assert!(frame.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_silent_frames_reset_statistic_once() {
        let renderer = SpectrumRenderer::with_statistic(CountingStatistic::default());

        for _ in 0..8 {
            renderer.render_frame(800, 600).unwrap();
        }

        let state = renderer.lock();
        assert_eq!(state.gain.statistic().resets, 1);
        assert_eq!(state.gain.statistic().updates, 0);
    }

    #[test]
    fn test_steady_size_reuses_buffers() {
        let renderer = SpectrumRenderer::new(44100, 1024);

        for _ in 0..10 {
            drop(renderer.render_frame(320, 240).unwrap());
        }
        assert_eq!(renderer.frames().allocations(), 1);

        drop(renderer.render_frame(640, 480).unwrap());
        assert_eq!(renderer.frames().allocations(), 2);
    }

    #[test]
    fn test_holding_presented_frame_reuses_buffers() {
        let renderer = SpectrumRenderer::new(44100, 1024);
        renderer.write(&[vec![0.5; 4]], 1).unwrap();

        let mut current = renderer.render_frame(320, 240).unwrap();
        for _ in 0..10 {
            renderer.write(&[vec![0.5; 4]], 1).unwrap();
            let next = renderer.render_frame(320, 240).unwrap();
            assert!(!Arc::ptr_eq(&current, &next));
            current = next;
        }

        assert_eq!(renderer.frames().allocations(), 2);
        assert!(is_lit(&current, 40, 200));
    }

    #[test]
    fn test_impossible_size_is_allocation_error() {
        let renderer = SpectrumRenderer::new(44100, 1024);
        renderer.render_frame(800, 600).unwrap();
        renderer.write(&[vec![0.5; 10]], 1).unwrap();
        let before = renderer.render_frame(800, 600).unwrap();
        let allocations = renderer.frames().allocations();

        let err = renderer.render_frame(u32::MAX, u32::MAX).unwrap_err();

        assert!(matches!(
            err,
            RenderError::Allocation {
                width: u32::MAX,
                height: u32::MAX
            }
        ));
        assert_eq!(renderer.size(), (800, 600));
        assert_eq!(renderer.frames().allocations(), allocations);
        assert!(Arc::ptr_eq(&renderer.frames().latest(), &before));

        // The surface survived and keeps rendering at the old size
        let frame = renderer.render_frame(800, 600).unwrap();
        assert_eq!((frame.width(), frame.height()), (800, 600));
        assert!(is_lit(&frame, 40, 400));
    }

    #[test]
    fn test_scratch_growth_failure_is_reported() {
        let renderer = SpectrumRenderer::new(44100, 1024);
        renderer.write(&[vec![0.1; 4]], 1).unwrap();

        let err = renderer.lock().grow(usize::MAX, 1).unwrap_err();

        assert!(matches!(err, RenderError::ScratchAllocation(_)));
        let state = renderer.lock();
        assert_eq!(state.bins.len(), 1);
        assert_eq!(state.bins[0].len(), 4);
    }

    #[test]
    fn test_reader_sees_latest_frame() {
        let renderer = SpectrumRenderer::new(44100, 1024);
        renderer.render_frame(400, 300).unwrap();
        renderer.write(&[vec![0.5; 5]], 1).unwrap();
        renderer.render_frame(400, 300).unwrap();

        let frames = renderer.frames();
        let lit = frames.acquire(|frame| is_lit(frame, 40, 250));
        assert!(lit);
    }

    #[test]
    fn test_concurrent_producer_and_consumer() {
        let renderer = Arc::new(SpectrumRenderer::new(44100, 1024));
        renderer.configure_bar_geometry(15.0, 5.0);
        renderer.render_frame(400, 300).unwrap();

        let producer = {
            let renderer = Arc::clone(&renderer);
            thread::spawn(move || {
                for frame in 0..500 {
                    let nbins = renderer.visible_bin_count(2).max(1);
                    let level = (frame % 50) as f32 / 25.0;
                    let bins = vec![vec![level; nbins], vec![level / 2.0; nbins]];
                    renderer.write(&bins, 2).unwrap();
                }
            })
        };

        let reader = {
            let frames = renderer.frames();
            thread::spawn(move || {
                for _ in 0..500 {
                    let (w, _) = frames.acquire(|frame| (frame.width(), frame.height()));
                    assert!(w == 1 || w == 400);
                }
            })
        };

        for _ in 0..200 {
            let frame = renderer.render_frame(400, 300).unwrap();
            assert_eq!((frame.width(), frame.height()), (400, 300));
            assert!(renderer.scale() >= 1.0);
        }

        producer.join().unwrap();
        reader.join().unwrap();
        assert_eq!(renderer.channel_count(), 2);
    }
}
