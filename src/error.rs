use std::collections::TryReserveError;
use thiserror::Error;

/// Render path error types
///
/// Both variants are allocation failures. Degenerate geometry is not an error:
/// the renderer simply draws nothing for that frame.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to allocate a {width}x{height} pixmap")]
    Allocation { width: u32, height: u32 },
    #[error("Failed to grow the scratch bin matrix: {0}")]
    ScratchAllocation(#[from] TryReserveError),
}
