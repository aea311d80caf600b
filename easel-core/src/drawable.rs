//! Background and overlay drawable slots
//!
//! Each canvas surface (background, overlay) is a logical (color, image)
//! pair. The pair may be stored as two independent entities or merged into
//! one non-erasable group entity; this module normalizes access so the
//! compositor and the eraser commit step never special-case the
//! representation.

use crate::entity::{Entity, EntityKind};
use kurbo::Affine;
use serde::{Deserialize, Serialize};

/// Canvas surface a drawable belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DrawableSurface {
    Background,
    Overlay,
}

impl DrawableSurface {
    /// Both surfaces, background first
    pub fn all() -> [DrawableSurface; 2] {
        [DrawableSurface::Background, DrawableSurface::Overlay]
    }
}

/// Which half of a drawable slot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DrawableKind {
    Color,
    Image,
}

/// A surface's (color, image) drawable pair
///
/// Either the split fields or `merged` is populated, never both. In the
/// merged representation the group's first child is the color rect and the
/// second the image; reads match children by content kind so a slot merged
/// from a single drawable still resolves.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DrawableSlot {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub color: Option<Entity>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image: Option<Entity>,

    /// Merged group representation; when present it replaces the split pair
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub merged: Option<Entity>,
}

fn matches_kind(entity: &Entity, kind: DrawableKind) -> bool {
    match kind {
        DrawableKind::Color => matches!(entity.kind, EntityKind::Rect { .. }),
        DrawableKind::Image => matches!(entity.kind, EntityKind::Image(_)),
    }
}

impl DrawableSlot {
    /// Whether the slot holds no drawable at all
    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.image.is_none() && self.merged.is_none()
    }

    /// Whether the slot is in the merged representation
    pub fn is_merged(&self) -> bool {
        self.merged.is_some()
    }

    /// Current entity for one half of the slot, unwrapping a merged group
    pub fn get(&self, kind: DrawableKind) -> Option<&Entity> {
        if let Some(merged) = &self.merged {
            if let EntityKind::Group(children) = &merged.kind {
                return children.iter().find(|child| matches_kind(child, kind));
            }
            return None;
        }
        match kind {
            DrawableKind::Color => self.color.as_ref(),
            DrawableKind::Image => self.image.as_ref(),
        }
    }

    /// Mutable access to one half of the slot
    pub fn get_mut(&mut self, kind: DrawableKind) -> Option<&mut Entity> {
        if let Some(merged) = &mut self.merged {
            if let EntityKind::Group(children) = &mut merged.kind {
                return children.iter_mut().find(|child| matches_kind(child, kind));
            }
            return None;
        }
        match kind {
            DrawableKind::Color => self.color.as_mut(),
            DrawableKind::Image => self.image.as_mut(),
        }
    }

    /// Replace one half of the slot
    pub fn set(&mut self, kind: DrawableKind, entity: Option<Entity>) {
        if let Some(merged) = &mut self.merged {
            if let EntityKind::Group(children) = &mut merged.kind {
                children.retain(|child| !matches_kind(child, kind));
                if let Some(entity) = entity {
                    // keep the color-first child order
                    match kind {
                        DrawableKind::Color => children.insert(0, entity),
                        DrawableKind::Image => children.push(entity),
                    }
                }
            }
            return;
        }
        match kind {
            DrawableKind::Color => self.color = entity,
            DrawableKind::Image => self.image = entity,
        }
    }

    /// Collapse the split pair into one merged group entity
    ///
    /// Idempotent: an already-merged slot is left untouched, and an empty
    /// slot stays empty. Returns whether a merge happened.
    pub fn merge_if_needed(&mut self, name: impl Into<String>) -> bool {
        if self.merged.is_some() || (self.color.is_none() && self.image.is_none()) {
            return false;
        }

        let mut children = Vec::new();
        if let Some(color) = self.color.take() {
            children.push(color);
        }
        if let Some(image) = self.image.take() {
            children.push(image);
        }

        // The group wrapper itself never takes the eraser; its children
        // keep their own erasable flags.
        let mut group = Entity::new(EntityKind::Group(children)).with_name(name);
        group.erasable = false;
        group.selectable = false;
        self.merged = Some(group);
        true
    }

    /// Visit every drawable entity in the slot with the parent transform
    /// needed to reach world space
    pub fn for_each_part_mut(&mut self, mut f: impl FnMut(&mut Entity, Affine)) {
        if let Some(merged) = &mut self.merged {
            let parent = merged.transform.to_affine();
            if let EntityKind::Group(children) = &mut merged.kind {
                for child in children {
                    f(child, parent);
                }
            }
            return;
        }
        if let Some(color) = &mut self.color {
            f(color, Affine::IDENTITY);
        }
        if let Some(image) = &mut self.image {
            f(image, Affine::IDENTITY);
        }
    }

    /// Whether any drawable in the slot satisfies `pred`
    pub fn any_part(&self, mut pred: impl FnMut(&Entity) -> bool) -> bool {
        if let Some(merged) = &self.merged {
            if let EntityKind::Group(children) = &merged.kind {
                return children.iter().any(|child| pred(child));
            }
            return false;
        }
        self.color.iter().chain(self.image.iter()).any(|e| pred(e))
    }
}
