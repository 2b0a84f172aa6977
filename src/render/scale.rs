//! Adaptive auto-gain
//!
//! Peaks above [`PEAK_THRESHOLD`] feed a rolling statistic and the scale
//! follows `mean + 2 * stddev`, never dropping below unity. After
//! [`SILENT_FRAMES_BEFORE_RESET`] consecutive silent frames the statistic
//! is reset so a long pause does not leave a stale, oversized scale behind.

use crate::stats::PeakStatistic;

/// Peaks below this count as silence
pub const PEAK_THRESHOLD: f32 = 0.01;

/// Consecutive silent frames that reset the rolling statistic
pub const SILENT_FRAMES_BEFORE_RESET: u32 = 5;

pub struct AutoGain<S> {
    statistic: S,
    zeroes: u32,
    scale: f32,
}

impl<S: PeakStatistic> AutoGain<S> {
    pub fn new(statistic: S) -> Self {
        Self {
            statistic,
            zeroes: 0,
            scale: 1.0,
        }
    }

    /// Advance the policy by one frame and return the active scale
    pub fn next_scale(&mut self, peak: f32) -> f32 {
        let mut scale = 1.0;

        if peak >= PEAK_THRESHOLD {
            self.zeroes = 0;

            let (mean, sd) = self.statistic.update(peak);
            let t = mean + 2.0 * sd;
            if t > 1.0 {
                scale = t;
            }
        } else {
            self.zeroes = self.zeroes.saturating_add(1);
            if self.zeroes == SILENT_FRAMES_BEFORE_RESET {
                tracing::debug!("silence for {} frames, resetting peak statistic", self.zeroes);
                self.statistic.recalculate();
            }
        }

        self.scale = scale;
        scale
    }

    /// Scale chosen for the most recent frame
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Consecutive silent frames seen so far
    pub fn silent_frames(&self) -> u32 {
        self.zeroes
    }

    pub fn statistic(&self) -> &S {
        &self.statistic
    }
}
