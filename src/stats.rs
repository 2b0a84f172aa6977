//! Rolling statistics over recent peak values
//!
//! The renderer feeds the peak of every non-silent frame into a
//! [`PeakStatistic`] and derives its auto-gain scale from the returned mean
//! and standard deviation.

/// Length of history used for auto-scaling, in seconds
pub const SCALING_WINDOW_SECS: f32 = 1.5;

/// Source of the rolling mean and standard deviation of recent peaks
pub trait PeakStatistic: Send {
    /// Push a value and return the updated `(mean, stddev)`
    fn update(&mut self, value: f32) -> (f32, f32);

    /// Discard all accumulated history
    fn recalculate(&mut self);
}

/// Fixed-capacity moving window with running sums
///
/// A flat ring buffer plus a write index; the oldest value is overwritten
/// once the window is full.
#[derive(Debug, Clone)]
pub struct MovingWindow {
    buffer: Vec<f64>,
    index: usize,
    len: usize,
    sum: f64,
    sum_sq: f64,
}

impl MovingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(1)],
            index: 0,
            len: 0,
            sum: 0.0,
            sum_sq: 0.0,
        }
    }

    /// Size the window in analysis frames for the given stream
    ///
    /// One analysis frame covers `sample_size` samples, so the window holds
    /// twice the number of frames that fit into [`SCALING_WINDOW_SECS`].
    pub fn for_stream(sample_rate: u32, sample_size: usize) -> Self {
        Self::new(window_frames(sample_rate, sample_size))
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn stats(&self) -> (f32, f32) {
        if self.len == 0 {
            return (0.0, 0.0);
        }

        let n = self.len as f64;
        let mean = self.sum / n;
        // Running sums drift; never let that produce a negative variance.
        let variance = (self.sum_sq / n - mean * mean).max(0.0);
        (mean as f32, variance.sqrt() as f32)
    }
}

impl PeakStatistic for MovingWindow {
    fn update(&mut self, value: f32) -> (f32, f32) {
        let value = f64::from(value);

        if self.len == self.buffer.len() {
            let old = self.buffer[self.index];
            self.sum -= old;
            self.sum_sq -= old * old;
        } else {
            self.len += 1;
        }

        self.buffer[self.index] = value;
        self.sum += value;
        self.sum_sq += value * value;
        self.index = (self.index + 1) % self.buffer.len();

        self.stats()
    }

    fn recalculate(&mut self) {
        self.buffer.fill(0.0);
        self.index = 0;
        self.len = 0;
        self.sum = 0.0;
        self.sum_sq = 0.0;
    }
}

/// Number of analysis frames covered by the scaling window
pub fn window_frames(sample_rate: u32, sample_size: usize) -> usize {
    if sample_size == 0 {
        return 1;
    }

    let samples = (SCALING_WINDOW_SECS * sample_rate as f32) as usize;
    ((samples / sample_size) * 2).max(1)
}
