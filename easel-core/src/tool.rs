//! Stroke tool capability surface
//!
//! A stroke tool captures a pointer drag and turns it into path geometry.
//! `FreehandStroke` is the generic implementation; specialized tools (like
//! the eraser brush) wrap it and add their own compositing setup around the
//! delegated calls instead of subclassing.

use crate::path_fitting::{decimate_points, smooth_open_path};
use crate::shape::{ShapeColor, StrokeStyle};
use kurbo::{Affine, BezPath, Point, Shape as KurboShape};
use vello::peniko::Fill;
use vello::Scene;

/// Finalized stroke geometry in canvas world coordinates
#[derive(Clone, Debug)]
pub struct StrokeGeometry {
    /// Smooth path built from the decimated samples
    pub path: BezPath,
}

impl StrokeGeometry {
    /// Whether the geometry collapsed to the canonical zero-extent form
    ///
    /// Degenerate geometry must not be rendered, composited, or committed.
    pub fn is_degenerate(&self) -> bool {
        let bbox = self.path.bounding_box();
        bbox.width() == 0.0 && bbox.height() == 0.0
    }
}

/// Capability set of an interactive stroke tool
pub trait StrokeTool {
    /// Reset state and record the seed point (pointer-down)
    fn prepare_stroke(&mut self, point: Point);

    /// Append a world-space sample (once per drag-move event)
    fn sample_stroke(&mut self, point: Point);

    /// Decimate and convert the samples into final geometry (pointer-up)
    fn finalize_stroke(&mut self) -> StrokeGeometry;

    /// Render the in-progress stroke onto the live drawing surface
    fn render_preview(&self, scene: &mut Scene);
}

/// Generic freehand stroke capture
#[derive(Clone, Debug)]
pub struct FreehandStroke {
    points: Vec<Point>,

    /// Stroke width in pixels
    pub width: f64,

    /// Stroke color (erasers only use it for the preview)
    pub color: ShapeColor,

    /// Distance threshold for sample decimation; 0 disables
    pub decimate: f64,
}

impl Default for FreehandStroke {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            width: 10.0,
            color: ShapeColor::rgb(0, 0, 0),
            decimate: 0.4,
        }
    }
}

impl FreehandStroke {
    /// Create with a stroke width
    pub fn new(width: f64) -> Self {
        Self {
            width,
            ..Default::default()
        }
    }

    /// The samples recorded so far
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Smooth path through the samples recorded so far
    pub fn live_path(&self) -> BezPath {
        smooth_open_path(&self.points)
    }

    /// Stroke style used for painting this stroke
    pub fn stroke_style(&self) -> StrokeStyle {
        StrokeStyle::round(self.width)
    }
}

impl StrokeTool for FreehandStroke {
    fn prepare_stroke(&mut self, point: Point) {
        self.points.clear();
        self.points.push(point);
    }

    fn sample_stroke(&mut self, point: Point) {
        self.points.push(point);
    }

    fn finalize_stroke(&mut self) -> StrokeGeometry {
        let mut points = std::mem::take(&mut self.points);
        if self.decimate > 0.0 {
            points = decimate_points(&points, self.decimate);
        }
        StrokeGeometry {
            path: smooth_open_path(&points),
        }
    }

    fn render_preview(&self, scene: &mut Scene) {
        if self.points.is_empty() {
            return;
        }
        let path = self.live_path();
        scene.stroke(
            &self.stroke_style().to_stroke(),
            Affine::IDENTITY,
            self.color.to_peniko(),
            None,
            &path,
        );
        // A bare seed point strokes to nothing; show the dab as a dot
        if self.points.len() == 1 {
            let dot = kurbo::Circle::new(self.points[0], self.width / 2.0);
            scene.fill(
                Fill::NonZero,
                Affine::IDENTITY,
                self.color.to_peniko(),
                None,
                &dot,
            );
        }
    }
}
