//! Dual-pass composite for live erase strokes
//!
//! Selective erasure is an illusion built from two render passes. The base
//! pass holds everything the stroke must never touch: non-erasable ordinary
//! entities plus a snapshot of background/overlay state with the erasable
//! parts hidden. The top pass holds the full scene plus the live stroke
//! drawn subtractively. Wherever the stroke removes top-pass pixels the
//! untouched base pass shows through, so only erasable content appears to
//! be erased.
//!
//! The snapshot canvas is exclusively owned by the current stroke and is
//! dropped on every exit path of the finalize step; the top scene is
//! likewise cleared on every exit path so no stale preview leaks into the
//! next frame.

use crate::canvas::Canvas;
use crate::drawable::DrawableSurface;
use crate::entity::Entity;
use crate::renderer::{self, ImageCache, PaintPass};
use vello::Scene;

/// Stroke lifecycle phase
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrokePhase {
    /// No stroke in progress
    Idle,
    /// Pointer-down: building the base pass
    Preparing,
    /// Between samples: top pass carries the live preview
    Drawing,
    /// Pointer-up: committing or discarding
    Finalizing,
}

impl Default for StrokePhase {
    fn default() -> Self {
        StrokePhase::Idle
    }
}

/// Orchestrates the base and top render passes of one erase stroke
pub struct DualLayerCompositor {
    base: Scene,
    top: Scene,
    snapshot: Option<Canvas>,
    has_overlay: bool,
    phase: StrokePhase,
}

impl DualLayerCompositor {
    /// Create an idle compositor
    pub fn new() -> Self {
        Self {
            base: Scene::new(),
            top: Scene::new(),
            snapshot: None,
            has_overlay: false,
            phase: StrokePhase::Idle,
        }
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> StrokePhase {
        self.phase
    }

    /// The base pass: content the stroke must never touch
    pub fn base_scene(&self) -> &Scene {
        &self.base
    }

    /// The top pass: full scene plus the live stroke
    pub fn top_scene(&self) -> &Scene {
        &self.top
    }

    /// The throwaway canvas snapshot of the current stroke, if any
    pub fn snapshot(&self) -> Option<&Canvas> {
        self.snapshot.as_ref()
    }

    /// Whether a non-erasable overlay must be repainted above the stroke
    pub fn has_overlay(&self) -> bool {
        self.has_overlay
    }

    /// Pointer-down: build the base pass
    ///
    /// The canvas is cloned into a throwaway snapshot and the erasable
    /// background/overlay parts are hidden on the snapshot only; the live
    /// canvas keeps its state, so there is nothing to restore afterwards.
    pub fn prepare(&mut self, canvas: &Canvas, cache: &mut ImageCache) {
        self.phase = StrokePhase::Preparing;
        log::debug!("preparing erase stroke passes");

        let mut snapshot = canvas.clone();
        for surface in DrawableSurface::all() {
            snapshot.slot_mut(surface).for_each_part_mut(|part, _| {
                if part.erasable {
                    part.visible = false;
                }
            });
        }

        self.base.reset();
        let keep_non_erasable = |entity: &Entity| !entity.erasable;
        let pass = PaintPass {
            include_background: true,
            include_overlay: true,
            entity_filter: Some(&keep_non_erasable),
        };
        renderer::paint_canvas(&mut self.base, &snapshot, cache, &pass);

        self.has_overlay = canvas
            .overlay
            .any_part(|part| !part.erasable && part.visible);
        self.snapshot = Some(snapshot);
        self.phase = StrokePhase::Drawing;
    }

    /// Rebuild the top pass with the current live stroke
    ///
    /// `render_stroke` paints the preview (already wrapped in its own
    /// subtractive layer by the calling tool). The base pass is untouched.
    pub fn draw_preview(
        &mut self,
        canvas: &Canvas,
        cache: &mut ImageCache,
        render_stroke: impl FnOnce(&mut Scene),
    ) {
        self.top.reset();

        let pass = PaintPass {
            include_background: true,
            include_overlay: false,
            entity_filter: None,
        };
        renderer::paint_canvas(&mut self.top, canvas, cache, &pass);

        // Erasable overlay parts paint beneath the stroke so it can erase
        // them; non-erasable parts paint above it afterwards
        let erasable = |entity: &Entity| entity.erasable;
        renderer::paint_slot(&mut self.top, &canvas.overlay, cache, Some(&erasable));

        render_stroke(&mut self.top);

        if self.has_overlay {
            let non_erasable = |entity: &Entity| !entity.erasable;
            renderer::paint_slot(&mut self.top, &canvas.overlay, cache, Some(&non_erasable));
        }
    }

    /// Pointer-up: clear the live surface and release the snapshot
    ///
    /// Runs on every exit path, committed or degenerate.
    pub fn finalize(&mut self) {
        self.phase = StrokePhase::Finalizing;
        self.top.reset();
        self.snapshot = None;
        self.has_overlay = false;
        self.phase = StrokePhase::Idle;
    }
}

impl Default for DualLayerCompositor {
    fn default() -> Self {
        Self::new()
    }
}
