//! Synthetic bin matrices for driving the renderer without an audio device
//!
//! Each channel carries a couple of drifting peaks whose loudness swells
//! above unity now and then, with a stretch of silence every few seconds so
//! the auto-gain reset path gets exercised.

/// Frames per loudness cycle segment
const SEGMENT_FRAMES: u64 = 200;

/// Every `SILENT_SEGMENT_EVERY`th segment is silent
const SILENT_SEGMENT_EVERY: u64 = 5;

/// Temporal smoothing factor (0.0-1.0, higher = more smoothing)
const SMOOTHING_FACTOR: f32 = 0.6;

pub struct SyntheticSpectrum {
    channels: usize,
    frame: u64,
    frame_rate: f32,
    bins: Vec<Vec<f32>>,
}

impl SyntheticSpectrum {
    /// `frame_rate` is analysis frames per second and only affects motion speed
    pub fn new(channels: usize, frame_rate: f32) -> Self {
        Self {
            channels,
            frame: 0,
            frame_rate: if frame_rate > 0.0 { frame_rate } else { 1.0 },
            bins: vec![Vec::new(); channels],
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Whether the current frame falls into a silent segment
    pub fn is_silent(&self) -> bool {
        (self.frame / SEGMENT_FRAMES) % SILENT_SEGMENT_EVERY == SILENT_SEGMENT_EVERY - 1
    }

    /// Produce the next frame with `nbins` bins per channel
    pub fn next_frame(&mut self, nbins: usize) -> &[Vec<f32>] {
        let t = self.frame as f32 / self.frame_rate;
        let silent = self.is_silent();
        let loudness = 0.4 + 1.2 * (t * 0.35).sin().abs();

        for (ch, row) in self.bins.iter_mut().enumerate() {
            if row.len() != nbins {
                row.resize(nbins, 0.0);
            }

            let phase = ch as f32 * 1.7;
            let n = nbins.max(1) as f32;
            let centers = [
                (0.5 + 0.35 * (t * 0.6 + phase).sin()) * n,
                (0.5 + 0.45 * (t * 1.3 + phase).cos()) * n,
            ];
            let spread = (n / 8.0).max(1.0);

            for (i, value) in row.iter_mut().enumerate() {
                let target = if silent {
                    0.0
                } else {
                    let x = i as f32;
                    let bumps: f32 = centers
                        .iter()
                        .map(|&c| (-((x - c) / spread).powi(2)).exp())
                        .sum();
                    // Gentle tilt towards the low bins, like a real spectrum
                    let tilt = 1.0 - 0.5 * x / n;
                    (loudness * bumps * tilt).max(0.0)
                };

                *value = SMOOTHING_FACTOR * *value + (1.0 - SMOOTHING_FACTOR) * target;
            }
        }

        self.frame += 1;
        &self.bins
    }
}
