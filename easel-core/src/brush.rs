//! Eraser brush: stroke lifecycle and commit
//!
//! The brush wraps the generic freehand tool and adds subtractive
//! compositing around the delegated calls. On pointer-up the finalized
//! stroke is committed into the eraser mask of every erasable drawable and
//! every erasable entity the stroke intersects; everything else is silently
//! skipped.

use crate::canvas::Canvas;
use crate::compositor::{DualLayerCompositor, StrokePhase};
use crate::drawable::DrawableSurface;
use crate::entity::{Entity, EntityKind};
use crate::hit_test;
use crate::renderer::ImageCache;
use crate::shape::CompositeMode;
use crate::tool::{FreehandStroke, StrokeGeometry, StrokeTool};
use kurbo::{Affine, Point, Shape as KurboShape};
use vello::Scene;

/// Host callbacks fired around the commit step
///
/// Both carry the finalized path entity. Nothing fires for a degenerate
/// stroke.
pub trait StrokeObserver {
    /// Fired with the finalized path before any mask is updated
    fn before_path_created(&mut self, _path: &Entity) {}

    /// Fired after every affected entity's mask is updated
    fn path_created(&mut self, _path: &Entity) {}
}

/// Observer that ignores all notifications
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl StrokeObserver for NullObserver {}

/// The selective eraser brush
pub struct EraserBrush {
    /// Generic freehand capture the brush delegates to
    pub freehand: FreehandStroke,
    compositor: DualLayerCompositor,
}

impl EraserBrush {
    /// Create an eraser brush with the given stroke width
    pub fn new(width: f64) -> Self {
        Self {
            freehand: FreehandStroke::new(width),
            compositor: DualLayerCompositor::new(),
        }
    }

    /// The compositor carrying the base and top passes
    pub fn compositor(&self) -> &DualLayerCompositor {
        &self.compositor
    }

    /// Pointer-down: seed the stroke and build the base pass
    pub fn pointer_down(&mut self, canvas: &Canvas, cache: &mut ImageCache, point: Point) {
        self.freehand.prepare_stroke(point);
        self.compositor.prepare(canvas, cache);
        self.redraw_preview(canvas, cache);
    }

    /// Pointer-move: record the sample and refresh the live preview
    pub fn pointer_move(&mut self, canvas: &Canvas, cache: &mut ImageCache, point: Point) {
        if self.compositor.phase() != StrokePhase::Drawing {
            return;
        }
        self.freehand.sample_stroke(point);
        self.redraw_preview(canvas, cache);
    }

    fn redraw_preview(&mut self, canvas: &Canvas, cache: &mut ImageCache) {
        let Self {
            freehand,
            compositor,
        } = self;
        compositor.draw_preview(canvas, cache, |scene| {
            subtractive_preview(freehand, scene);
        });
    }

    /// Pointer-up: finalize, and commit unless the stroke degenerated
    ///
    /// Returns the committed path entity, or None for a discarded stroke.
    pub fn pointer_up(
        &mut self,
        canvas: &mut Canvas,
        observer: &mut dyn StrokeObserver,
    ) -> Option<Entity> {
        let geometry = self.freehand.finalize_stroke();

        // Live surface cleared and snapshot dropped on every exit path
        self.compositor.finalize();

        if geometry.is_degenerate() {
            log::debug!("discarding degenerate erase stroke");
            canvas.request_render();
            return None;
        }

        let mut path = self.create_path(geometry);
        observer.before_path_created(&path);

        let committed = commit_stroke(canvas, &path);

        canvas.request_render();
        path.set_coords(Affine::IDENTITY);
        observer.path_created(&path);
        log::debug!("erase stroke committed to {} entities", committed);

        Some(path)
    }

    /// Build the committed path entity: subtractive and non-interactive
    fn create_path(&self, geometry: StrokeGeometry) -> Entity {
        let mut path = Entity::new(EntityKind::Path(geometry.path))
            .with_stroke(self.freehand.color, self.freehand.stroke_style())
            .with_compose(CompositeMode::DestOut);
        path.selectable = false;
        path.hit_testable = false;
        path
    }
}

/// Append the stroke to every erasable drawable and intersected entity
///
/// Returns how many entities were updated.
fn commit_stroke(canvas: &mut Canvas, path: &Entity) -> usize {
    let mut committed = 0;

    for surface in DrawableSurface::all() {
        canvas.slot_mut(surface).for_each_part_mut(|part, parent| {
            if part.erasable {
                add_path_to_entity_eraser(part, parent, path);
                committed += 1;
            }
        });
    }

    for entity in &mut canvas.entities {
        if entity.erasable && hit_test::entity_intersects_path(entity, Affine::IDENTITY, path) {
            add_path_to_entity_eraser(entity, Affine::IDENTITY, path);
            committed += 1;
        }
    }

    committed
}

/// Append `path` to the entity's mask, creating the mask on first use
fn add_path_to_entity_eraser(entity: &mut Entity, parent: Affine, path: &Entity) {
    let inverse = entity.world_transform(parent).inverse();
    entity.ensure_eraser_mask().add_path(path.clone(), inverse);
}

/// Render the live freehand preview inside a subtractive layer
fn subtractive_preview(freehand: &FreehandStroke, scene: &mut Scene) {
    if freehand.points().is_empty() {
        return;
    }
    let bounds = freehand
        .live_path()
        .bounding_box()
        .inflate(freehand.width, freehand.width);
    scene.push_layer(
        CompositeMode::DestOut.to_blend(),
        1.0,
        Affine::IDENTITY,
        &bounds,
    );
    freehand.render_preview(scene);
    scene.pop_layer();
}

impl StrokeTool for EraserBrush {
    fn prepare_stroke(&mut self, point: Point) {
        self.freehand.prepare_stroke(point);
    }

    fn sample_stroke(&mut self, point: Point) {
        self.freehand.sample_stroke(point);
    }

    fn finalize_stroke(&mut self) -> StrokeGeometry {
        self.freehand.finalize_stroke()
    }

    fn render_preview(&self, scene: &mut Scene) {
        subtractive_preview(&self.freehand, scene);
    }
}
