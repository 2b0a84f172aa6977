//! tiny-skia drawing surface

use crate::error::RenderError;
use tiny_skia::*;

/// Stroke settings applied to every line drawn on a [`DrawSurface`]
#[derive(Clone)]
struct DrawContext {
    paint: Paint<'static>,
    stroke: Stroke,
}

impl Default for DrawContext {
    fn default() -> Self {
        let mut paint = Paint::default();
        paint.set_color(Color::BLACK);
        paint.anti_alias = true;

        Self {
            paint,
            stroke: Stroke::default(),
        }
    }
}

/// An owned pixmap plus the vector context that draws into it
///
/// The pixmap and context are always replaced together. A zero-sized surface
/// has no pixmap at all; drawing on it is a no-op.
pub struct DrawSurface {
    pixmap: Option<Pixmap>,
    context: DrawContext,
}

impl DrawSurface {
    pub fn new() -> Self {
        Self {
            pixmap: None,
            context: DrawContext::default(),
        }
    }

    /// Current size in pixels
    pub fn size(&self) -> (u32, u32) {
        self.pixmap
            .as_ref()
            .map(|p| (p.width(), p.height()))
            .unwrap_or((0, 0))
    }

    /// Resize the surface, discarding its contents
    ///
    /// Cheap when the size is unchanged, so callers may call this every frame.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if self.size() == (width, height) {
            return Ok(());
        }

        self.pixmap = if width == 0 || height == 0 {
            None
        } else {
            Some(Pixmap::new(width, height).ok_or(RenderError::Allocation { width, height })?)
        };
        self.context = DrawContext::default();

        tracing::debug!("surface resized to {}x{}", width, height);
        Ok(())
    }

    /// Clear to fully transparent black
    pub fn clear(&mut self) {
        if let Some(pixmap) = &mut self.pixmap {
            pixmap.fill(Color::TRANSPARENT);
        }
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        self.context.paint.set_color(color);
    }

    pub fn set_line_width(&mut self, width: f32) {
        self.context.stroke.width = width;
    }

    pub fn set_line_cap(&mut self, cap: LineCap) {
        self.context.stroke.line_cap = cap;
    }

    /// Stroke a single line segment with the current settings
    pub fn stroke_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32) {
        let Some(pixmap) = &mut self.pixmap else {
            return;
        };

        let mut pb = PathBuilder::new();
        pb.move_to(x0, y0);
        pb.line_to(x1, y1);
        let Some(path) = pb.finish() else {
            return;
        };

        pixmap.stroke_path(
            &path,
            &self.context.paint,
            &self.context.stroke,
            Transform::identity(),
            None,
        );
    }

    pub fn pixmap(&self) -> Option<&Pixmap> {
        self.pixmap.as_ref()
    }

    /// Mutable access for exchanging the pixmap with a [`super::FrameBuffer`]
    pub fn pixmap_mut(&mut self) -> Option<&mut Pixmap> {
        self.pixmap.as_mut()
    }
}

impl Default for DrawSurface {
    fn default() -> Self {
        Self::new()
    }
}
