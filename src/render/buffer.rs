//! Double buffering for rendered frames
//!
//! The renderer draws into its own pixmap, then exchanges it with a recycled
//! pixmap kept here. Readers get a shared `Arc<Pixmap>` handle, so presenting
//! a frame never copies pixel data and never touches the renderer's lock.
//! Besides the renderer's working pixmap the buffer keeps the presented frame
//! and the one before it, so steady-size rendering settles on a fixed set of
//! pixmaps even while the presenter holds the current frame.

use crate::error::RenderError;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};
use tiny_skia::Pixmap;

/// Returned to readers before any frame has been presented
static PLACEHOLDER: LazyLock<Arc<Pixmap>> =
    LazyLock::new(|| Arc::new(Pixmap::new(1, 1).expect("1x1 pixmap is always valid")));

/// The fixed 1x1 transparent frame
pub fn placeholder() -> Arc<Pixmap> {
    Arc::clone(&PLACEHOLDER)
}

pub struct FrameBuffer {
    inner: Mutex<Inner>,
}

struct Inner {
    /// Frame handed out by the latest swap
    presented: Option<Arc<Pixmap>>,
    /// Frame evicted by the latest swap, recycled once its readers let go
    spare: Option<Arc<Pixmap>>,
    allocations: usize,
}

fn same_bounds(pixmap: &Pixmap, width: u32, height: u32) -> bool {
    pixmap.width() == width && pixmap.height() == height
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                presented: None,
                spare: None,
                allocations: 0,
            }),
        }
    }

    /// Exchange `frame` with a recycled pixmap and return the new frame
    ///
    /// After the call the FrameBuffer retains what the caller drew, and
    /// `frame` holds an older frame of the same bounds, ready to be drawn
    /// over. The frame evicted one swap earlier is recycled first, so a
    /// presenter that holds on to the current frame until the next one
    /// arrives never forces an allocation. Failing that, the frame evicted
    /// now is recycled if nobody holds it. A fresh pixmap is allocated only
    /// when neither is free or the bounds changed.
    pub fn swap(&self, frame: &mut Pixmap) -> Result<Arc<Pixmap>, RenderError> {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let inner = &mut *guard;

        let (width, height) = (frame.width(), frame.height());
        let mut evicted = inner.presented.take();

        let mut recycled = inner
            .spare
            .take()
            .filter(|spare| same_bounds(spare, width, height))
            .and_then(|spare| Arc::try_unwrap(spare).ok());

        if recycled.is_none() {
            recycled = match evicted.take() {
                Some(last) if same_bounds(&last, width, height) => match Arc::try_unwrap(last) {
                    Ok(pixmap) => Some(pixmap),
                    Err(last) => {
                        evicted = Some(last);
                        None
                    }
                },
                other => {
                    evicted = other;
                    None
                }
            };
        }

        let mut ours = match recycled {
            Some(pixmap) => pixmap,
            None => {
                inner.allocations += 1;
                tracing::debug!("frame buffer allocating {}x{}", width, height);
                Pixmap::new(width, height).ok_or(RenderError::Allocation { width, height })?
            }
        };

        std::mem::swap(&mut ours, frame);

        let presented = Arc::new(ours);
        inner.presented = Some(Arc::clone(&presented));
        inner.spare = evicted.filter(|last| same_bounds(last, width, height));
        Ok(presented)
    }

    /// Call `f` with the retained frame, or the placeholder if there is none
    pub fn acquire<R>(&self, f: impl FnOnce(&Pixmap) -> R) -> R {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        match &inner.presented {
            Some(presented) => f(presented),
            None => f(&PLACEHOLDER),
        }
    }

    /// Shared handle to the retained frame, or the placeholder
    pub fn latest(&self) -> Arc<Pixmap> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.presented.clone().unwrap_or_else(placeholder)
    }

    /// Number of pixmaps allocated by `swap` so far
    pub fn allocations(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .allocations
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
