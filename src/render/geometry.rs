//! Geometry helpers shared by the layout and the renderer

/// Number of whole bins that fit horizontally in `width` pixels
///
/// Returns 0 for a non-positive or non-finite bin width instead of dividing
/// by zero.
pub fn visible_bins(width: u32, bin_width: f32) -> usize {
    if !bin_width.is_finite() || bin_width <= 0.0 {
        return 0;
    }

    (width as f32 / bin_width).floor() as usize
}

/// Horizontal span covered by the bar columns
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSpan {
    /// Center of the first column
    pub start: f32,
    /// Exclusive upper bound for column centers
    pub max: f32,
}

impl ColumnSpan {
    /// Round the width to a whole number of bins and center the leftover margin
    pub fn new(width: u32, bin_width: f32) -> Option<Self> {
        if width == 0 || !bin_width.is_finite() || bin_width <= 0.0 {
            return None;
        }

        let wf = width as f32;
        let max = (wf / bin_width).round() * bin_width;
        let start = bin_width / 2.0 + (wf - max) / 2.0;

        Some(Self { start, max })
    }
}

/// Y coordinate where a bar of `value` pixels ends, measured from the top
///
/// The bar is clamped so it never exceeds `height`.
pub fn bar_stop(value: f32, height: f32) -> f32 {
    height - value.min(height)
}
