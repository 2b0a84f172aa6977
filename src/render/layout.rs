//! Zigzag bar layout
//!
//! Channels are laid out in alternating directions: channel 0 maps bins
//! left to right, channel 1 right to left over the same columns, channel 2
//! left to right again, and so on. The bin cursor carries over between
//! channels, so the boundary bin is not repeated and each pass starts at the
//! right end of the bin range.
//!
//! Every channel restarts at the leftmost column, so channels share columns
//! rather than splitting the width between them. With two channels each
//! column holds bin `i` of channel 0 and bin `n - 1 - i` of channel 1, and
//! the taller of the two is what shows.

use super::geometry::ColumnSpan;

/// One bar to draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarPlacement {
    pub channel: usize,
    pub bin: usize,
    /// Column center in pixels
    pub x: f32,
}

/// Iterator over the bars of one frame
#[derive(Debug, Clone)]
pub struct Zigzag {
    span: Option<ColumnSpan>,
    bin_width: f32,
    nbars: usize,
    nchannels: usize,
    channel: usize,
    x_col: f32,
    x_bin: isize,
    delta: isize,
}

impl Zigzag {
    pub fn new(nchannels: usize, nbars: usize, bin_width: f32, width: u32) -> Self {
        let span = ColumnSpan::new(width, bin_width);
        Self {
            span,
            bin_width,
            nbars,
            nchannels,
            channel: 0,
            x_col: span.map(|s| s.start).unwrap_or(0.0),
            x_bin: 0,
            delta: 1,
        }
    }

    fn bin_in_range(&self) -> bool {
        self.x_bin >= 0 && (self.x_bin as usize) < self.nbars
    }
}

impl Iterator for Zigzag {
    type Item = BarPlacement;

    fn next(&mut self) -> Option<Self::Item> {
        let span = self.span?;
        if self.nbars == 0 {
            return None;
        }

        while self.channel < self.nchannels {
            if self.bin_in_range() && self.x_col < span.max {
                let bar = BarPlacement {
                    channel: self.channel,
                    bin: self.x_bin as usize,
                    x: self.x_col,
                };
                self.x_col += self.bin_width;
                self.x_bin += self.delta;
                return Some(bar);
            }

            // Turn around for the next channel
            self.delta = -self.delta;
            self.x_bin += self.delta;
            self.x_col = span.start;
            self.channel += 1;
        }

        None
    }
}
