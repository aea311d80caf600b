//! Canvas document object
//!
//! The Canvas owns the ordinary scene entities plus the background and
//! overlay drawable slots, and carries the document-level settings the
//! renderer needs. During an erase stroke the compositor clones the whole
//! canvas as a throwaway snapshot; cloning is plain `Clone`.

use crate::drawable::{DrawableKind, DrawableSlot, DrawableSurface};
use crate::entity::Entity;
use crate::shape::ShapeColor;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A 2D scene-graph canvas
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Canvas {
    /// Unique identifier for this canvas
    pub id: Uuid,

    /// Canvas name
    pub name: String,

    /// Canvas width in pixels
    pub width: f64,

    /// Canvas height in pixels
    pub height: f64,

    /// Plain clear color painted behind everything
    ///
    /// Distinct from the background drawable slot: the plain color is not
    /// an entity and can never be erased.
    pub clear_color: ShapeColor,

    /// Background drawable slot (painted beneath the entities)
    #[serde(default)]
    pub background: DrawableSlot,

    /// Overlay drawable slot (painted above the entities)
    #[serde(default)]
    pub overlay: DrawableSlot,

    /// Ordinary scene entities in paint order
    pub entities: Vec<Entity>,

    /// Set when committed state changed and the host should repaint
    #[serde(skip)]
    pub needs_render: bool,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: "Untitled".to_string(),
            width: 1920.0,
            height: 1080.0,
            clear_color: ShapeColor::rgb(255, 255, 255),
            background: DrawableSlot::default(),
            overlay: DrawableSlot::default(),
            entities: Vec::new(),
            needs_render: false,
        }
    }
}

impl Canvas {
    /// Create a new canvas with the given size
    pub fn new(name: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            ..Default::default()
        }
    }

    /// Add an entity, returning its id
    pub fn add_entity(&mut self, entity: Entity) -> Uuid {
        let id = entity.id;
        self.entities.push(entity);
        id
    }

    /// Get an entity by id
    pub fn get_entity(&self, id: &Uuid) -> Option<&Entity> {
        self.entities.iter().find(|e| &e.id == id)
    }

    /// Get a mutable entity by id
    pub fn get_entity_mut(&mut self, id: &Uuid) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| &e.id == id)
    }

    /// Remove an entity by id
    pub fn remove_entity(&mut self, id: &Uuid) -> Option<Entity> {
        let index = self.entities.iter().position(|e| &e.id == id)?;
        Some(self.entities.remove(index))
    }

    /// The drawable slot for a surface
    pub fn slot(&self, surface: DrawableSurface) -> &DrawableSlot {
        match surface {
            DrawableSurface::Background => &self.background,
            DrawableSurface::Overlay => &self.overlay,
        }
    }

    /// Mutable drawable slot for a surface
    pub fn slot_mut(&mut self, surface: DrawableSurface) -> &mut DrawableSlot {
        match surface {
            DrawableSurface::Background => &mut self.background,
            DrawableSurface::Overlay => &mut self.overlay,
        }
    }

    /// Current drawable entity for a surface/kind pair
    pub fn drawable(&self, surface: DrawableSurface, kind: DrawableKind) -> Option<&Entity> {
        self.slot(surface).get(kind)
    }

    /// Mutable drawable entity for a surface/kind pair
    pub fn drawable_mut(
        &mut self,
        surface: DrawableSurface,
        kind: DrawableKind,
    ) -> Option<&mut Entity> {
        self.slot_mut(surface).get_mut(kind)
    }

    /// Collapse a surface's drawables into the merged representation
    pub fn merge_drawables_if_needed(&mut self, surface: DrawableSurface) -> bool {
        let name = match surface {
            DrawableSurface::Background => "background",
            DrawableSurface::Overlay => "overlay",
        };
        self.slot_mut(surface).merge_if_needed(name)
    }

    /// Stamp the erasable flag onto all current background and overlay
    /// drawables
    ///
    /// Returns whether any flag actually changed; with no drawables present
    /// this is always false. Merged groups keep their own flag clear and
    /// the children are stamped instead.
    pub fn set_erasable(&mut self, value: bool) -> bool {
        let mut changed = false;
        for surface in DrawableSurface::all() {
            self.slot_mut(surface).for_each_part_mut(|entity, _| {
                if entity.erasable != value {
                    entity.erasable = value;
                    changed = true;
                }
            });
        }
        changed
    }

    /// Ask the host for a full repaint of committed state
    pub fn request_render(&mut self) {
        self.needs_render = true;
    }

    /// Consume a pending repaint request
    pub fn take_render_request(&mut self) -> bool {
        std::mem::take(&mut self.needs_render)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityKind, ImageAsset};

    fn canvas_with_background() -> Canvas {
        let mut canvas = Canvas::new("Test", 800.0, 600.0);
        canvas.background.color = Some(Entity::rect(
            800.0,
            600.0,
            ShapeColor::rgb(250, 250, 250),
        ));
        canvas.background.image = Some(Entity::new(EntityKind::Image(ImageAsset::new(
            "bg", "bg.png", 800, 600,
        ))));
        canvas
    }

    #[test]
    fn test_entity_lookup() {
        let mut canvas = Canvas::new("Test", 100.0, 100.0);
        let id = canvas.add_entity(Entity::rect(10.0, 10.0, ShapeColor::rgb(0, 0, 0)));
        assert!(canvas.get_entity(&id).is_some());
        assert!(canvas.remove_entity(&id).is_some());
        assert!(canvas.get_entity(&id).is_none());
    }

    // === set_erasable change reporting ===

    #[test]
    fn test_set_erasable_reports_change_once() {
        let mut canvas = canvas_with_background();
        assert!(canvas.set_erasable(true));
        assert!(!canvas.set_erasable(true));
        assert!(canvas.set_erasable(false));
        assert!(!canvas.set_erasable(false));
    }

    #[test]
    fn test_set_erasable_without_drawables() {
        let mut canvas = Canvas::new("Test", 100.0, 100.0);
        assert!(!canvas.set_erasable(true));
    }

    #[test]
    fn test_set_erasable_covers_overlay() {
        let mut canvas = Canvas::new("Test", 100.0, 100.0);
        canvas.overlay.color = Some(Entity::rect(100.0, 100.0, ShapeColor::rgb(0, 0, 0)));
        assert!(canvas.set_erasable(true));
        assert!(canvas
            .drawable(DrawableSurface::Overlay, DrawableKind::Color)
            .unwrap()
            .erasable);
    }

    #[test]
    fn test_set_erasable_stamps_merged_children() {
        let mut canvas = canvas_with_background();
        canvas.merge_drawables_if_needed(DrawableSurface::Background);
        assert!(canvas.set_erasable(true));

        let group = canvas.background.merged.as_ref().unwrap();
        assert!(!group.erasable);
        assert!(canvas
            .drawable(DrawableSurface::Background, DrawableKind::Color)
            .unwrap()
            .erasable);
        assert!(canvas
            .drawable(DrawableSurface::Background, DrawableKind::Image)
            .unwrap()
            .erasable);
    }

    #[test]
    fn test_merge_then_get_both_kinds() {
        let mut canvas = canvas_with_background();
        assert!(canvas.merge_drawables_if_needed(DrawableSurface::Background));
        assert!(!canvas.merge_drawables_if_needed(DrawableSurface::Background));
        assert!(canvas
            .drawable(DrawableSurface::Background, DrawableKind::Color)
            .is_some());
        assert!(canvas
            .drawable(DrawableSurface::Background, DrawableKind::Image)
            .is_some());
    }

    #[test]
    fn test_render_request_roundtrip() {
        let mut canvas = Canvas::new("Test", 100.0, 100.0);
        assert!(!canvas.take_render_request());
        canvas.request_render();
        assert!(canvas.take_render_request());
        assert!(!canvas.take_render_request());
    }
}
