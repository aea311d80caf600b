//! Persistent eraser masks
//!
//! An `EraserMask` is the per-entity record of everything ever erased from
//! that entity: a backing rectangle covering the owner's bounds plus an
//! ordered, append-only list of committed stroke entities, each paired with
//! a snapshot of the owner's inverse world transform at commit time.
//! Rendered as a mask it starts fully opaque and each entry knocks coverage
//! out with subtractive compositing, so installing it as the owner's clip
//! makes the erased pixels permanently transparent.
//!
//! Masks round-trip through serde using the persisted layout
//! `{ "type": "eraser-path", …, "objects": [ { "path": …,
//! "transformMatrix": [a,b,c,d,e,f] }, … ] }`; revival is a fallible
//! operation that rejects malformed data outright rather than producing a
//! partially revived mask.

use crate::entity::{Entity, EntityKind};
use crate::error::MaskDataError;
use crate::shape::{CompositeMode, ShapeColor};
use kurbo::{Affine, BezPath, Rect};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use vello::peniko::Fill;
use vello::Scene;

/// Type tag of a persisted eraser mask
pub const ERASER_PATH_KIND: &str = "eraser-path";

/// One committed erasure: a stroke entity and the owner's inverse world
/// transform captured when the stroke was committed
#[derive(Clone, Debug)]
pub struct EraserEntry {
    /// The committed stroke path entity (always subtractive)
    pub path: Entity,
    /// Maps stroke world coordinates into the owner's local space
    pub transform: Affine,
}

/// Per-entity accumulated erasure mask
///
/// Owned by exactly one entity through its clip slot. Entries are
/// append-only and render oldest-first; since every entry is subtractive
/// the net mask is order-independent, but the order is preserved for
/// deterministic serialization.
#[derive(Clone, Debug)]
pub struct EraserMask {
    /// Left edge of the backing rect in owner-local coordinates
    pub left: f64,
    /// Top edge of the backing rect in owner-local coordinates
    pub top: f64,
    /// Backing rect width (the owner's bounding width at creation)
    pub width: f64,
    /// Backing rect height
    pub height: f64,
    /// Backing paint; opaque so the mask starts at full coverage
    pub fill: ShapeColor,
    /// Clip inherited from the owner at creation, if the owner already
    /// carried a plain clip
    pub clip: Option<BezPath>,
    entries: Vec<EraserEntry>,
    dirty: bool,
}

impl EraserMask {
    /// Create an empty mask covering `owner_bounds`
    pub fn new(owner_bounds: Rect, inherited_clip: Option<BezPath>) -> Self {
        Self {
            left: owner_bounds.x0,
            top: owner_bounds.y0,
            width: owner_bounds.width(),
            height: owner_bounds.height(),
            fill: ShapeColor::rgb(255, 255, 255),
            clip: inherited_clip,
            entries: Vec::new(),
            dirty: false,
        }
    }

    /// The backing rect in owner-local coordinates
    pub fn backing_rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.left + self.width, self.top + self.height)
    }

    /// Committed entries, oldest first
    pub fn entries(&self) -> &[EraserEntry] {
        &self.entries
    }

    /// Whether the mask changed since the last re-render
    pub fn dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag after a re-render
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Append a committed stroke
    ///
    /// The stored entity is re-stamped subtractive and non-interactive no
    /// matter how it was drawn, so the mask renders identically after any
    /// number of serialization round trips.
    pub fn add_path(&mut self, mut path: Entity, inverse_owner_transform: Affine) {
        stamp_stroke_entity(&mut path);
        self.entries.push(EraserEntry {
            path,
            transform: inverse_owner_transform,
        });
        self.dirty = true;
    }

    /// Render the mask itself: opaque backing first, then every entry
    /// oldest-first inside its own pushed/popped subtractive layer
    pub fn render(&self, scene: &mut Scene, transform: Affine) {
        let clipped = self.clip.is_some();
        if let Some(clip) = &self.clip {
            scene.push_layer(CompositeMode::SrcOver.to_blend(), 1.0, transform, clip);
        }
        scene.fill(
            Fill::NonZero,
            transform,
            self.fill.to_peniko(),
            None,
            &self.backing_rect(),
        );
        self.knock_out(scene, transform);
        if clipped {
            scene.pop_layer();
        }
    }

    /// Apply just the subtractive entries to content already painted in the
    /// current layer
    ///
    /// With the backing rect fully opaque, clipping the content to the
    /// backing (and inherited clip) and knocking the entries out of it is
    /// pixel-equivalent to multiplying by the rendered mask.
    pub fn knock_out(&self, scene: &mut Scene, owner_transform: Affine) {
        for entry in &self.entries {
            let local = owner_transform * entry.transform * entry.path.transform.to_affine();
            scene.push_layer(
                CompositeMode::DestOut.to_blend(),
                1.0,
                local,
                &entry.path.local_bounds(),
            );
            paint_stroke_entity(scene, local, &entry.path);
            scene.pop_layer();
        }
    }

    /// Convert to the persisted layout
    pub fn to_data(&self) -> EraserMaskData {
        EraserMaskData {
            kind: ERASER_PATH_KIND.to_string(),
            left: self.left,
            top: self.top,
            width: self.width,
            height: self.height,
            fill: self.fill,
            objects: self
                .entries
                .iter()
                .map(|entry| EraserEntryData {
                    path: entry.path.clone(),
                    transform_matrix: entry.transform.as_coeffs(),
                })
                .collect(),
            clip_path: self.clip.clone(),
        }
    }

    /// Revive a mask from its persisted layout
    ///
    /// Fails on the first structural inconsistency; a mask is never revived
    /// partially, since it would silently under-erase.
    pub fn from_data(data: EraserMaskData) -> Result<Self, MaskDataError> {
        if data.kind != ERASER_PATH_KIND {
            log::warn!("refusing to revive eraser mask with type tag {:?}", data.kind);
            return Err(MaskDataError::UnexpectedKind { found: data.kind });
        }

        let mut entries = Vec::with_capacity(data.objects.len());
        for (index, object) in data.objects.into_iter().enumerate() {
            if object.transform_matrix.iter().any(|v| !v.is_finite()) {
                return Err(MaskDataError::NonFiniteMatrix { index });
            }
            let mut path = object.path;
            if !matches!(path.kind, EntityKind::Path(_)) {
                return Err(MaskDataError::MalformedEntry {
                    index,
                    detail: "stored stroke entity is not path geometry".to_string(),
                });
            }
            stamp_stroke_entity(&mut path);
            entries.push(EraserEntry {
                path,
                transform: Affine::new(object.transform_matrix),
            });
        }

        Ok(Self {
            left: data.left,
            top: data.top,
            width: data.width,
            height: data.height,
            fill: data.fill,
            clip: data.clip_path,
            entries,
            dirty: false,
        })
    }
}

/// Force the invariants every stored stroke entity carries
fn stamp_stroke_entity(path: &mut Entity) {
    path.compose = CompositeMode::DestOut;
    path.selectable = false;
    path.hit_testable = false;
    path.erasable = false;
}

/// Paint a stroke entity's geometry with its own paint properties
fn paint_stroke_entity(scene: &mut Scene, transform: Affine, entity: &Entity) {
    let EntityKind::Path(path) = &entity.kind else {
        return;
    };
    if let Some(fill) = &entity.fill {
        scene.fill(Fill::NonZero, transform, fill.to_peniko(), None, path);
    }
    if let (Some(color), Some(style)) = (&entity.stroke_color, &entity.stroke_style) {
        scene.stroke(&style.to_stroke(), transform, color.to_peniko(), None, path);
    }
}

/// Persisted layout of an eraser mask
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EraserMaskData {
    /// Always `"eraser-path"`
    #[serde(rename = "type")]
    pub kind: String,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub fill: ShapeColor,
    /// Committed entries in append order
    pub objects: Vec<EraserEntryData>,
    /// The owner's prior clip, if the mask inherited one
    #[serde(rename = "clipPath", skip_serializing_if = "Option::is_none", default)]
    pub clip_path: Option<BezPath>,
}

/// Persisted layout of one committed erasure
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EraserEntryData {
    /// The serialized stroke entity
    pub path: Entity,
    /// Owner's inverse world transform at commit time
    #[serde(rename = "transformMatrix")]
    pub transform_matrix: [f64; 6],
}

impl Serialize for EraserMask {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_data().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EraserMask {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let data = EraserMaskData::deserialize(deserializer)?;
        EraserMask::from_data(data).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_fitting::smooth_open_path;
    use crate::shape::StrokeStyle;
    use kurbo::Point;

    fn stroke_entity(coords: &[(f64, f64)]) -> Entity {
        let points: Vec<Point> = coords.iter().map(|&(x, y)| Point::new(x, y)).collect();
        Entity::new(EntityKind::Path(smooth_open_path(&points)))
            .with_stroke(ShapeColor::rgb(0, 0, 0), StrokeStyle::round(10.0))
    }

    fn mask_with_entries(count: usize) -> EraserMask {
        let mut mask = EraserMask::new(Rect::new(0.0, 0.0, 100.0, 80.0), None);
        for i in 0..count {
            let offset = i as f64 * 10.0;
            mask.add_path(
                stroke_entity(&[(offset, 0.0), (offset + 5.0, 5.0), (offset + 10.0, 0.0)]),
                Affine::translate((-offset, 0.0)),
            );
        }
        mask
    }

    // === Append semantics ===

    #[test]
    fn test_add_path_preserves_existing_entries() {
        let mut mask = mask_with_entries(3);
        let before: Vec<[f64; 6]> = mask.entries().iter().map(|e| e.transform.as_coeffs()).collect();

        mask.add_path(
            stroke_entity(&[(50.0, 50.0), (60.0, 60.0)]),
            Affine::scale(2.0),
        );

        assert_eq!(mask.entries().len(), 4);
        for (i, coeffs) in before.iter().enumerate() {
            assert_eq!(&mask.entries()[i].transform.as_coeffs(), coeffs);
        }
        assert_eq!(
            mask.entries()[3].transform.as_coeffs(),
            Affine::scale(2.0).as_coeffs()
        );
    }

    #[test]
    fn test_add_path_restamps_compositing() {
        let mut mask = mask_with_entries(0);
        let path = stroke_entity(&[(0.0, 0.0), (5.0, 5.0)]).with_compose(CompositeMode::SrcOver);
        mask.add_path(path, Affine::IDENTITY);

        let stored = &mask.entries()[0].path;
        assert_eq!(stored.compose, CompositeMode::DestOut);
        assert!(!stored.selectable);
        assert!(!stored.hit_testable);
    }

    #[test]
    fn test_add_path_marks_dirty() {
        let mut mask = mask_with_entries(0);
        assert!(!mask.dirty());
        mask.add_path(stroke_entity(&[(0.0, 0.0), (5.0, 5.0)]), Affine::IDENTITY);
        assert!(mask.dirty());
        mask.mark_clean();
        assert!(!mask.dirty());
    }

    // === Serialization ===

    #[test]
    fn test_roundtrip_empty_mask() {
        let mask = mask_with_entries(0);
        let json = serde_json::to_string(&mask).unwrap();
        let revived: EraserMask = serde_json::from_str(&json).unwrap();
        assert_eq!(revived.entries().len(), 0);
        assert_eq!(revived.width, mask.width);
        assert_eq!(revived.height, mask.height);
    }

    #[test]
    fn test_roundtrip_preserves_entries_and_order() {
        for count in [1, 4] {
            let mask = mask_with_entries(count);
            let json = serde_json::to_string(&mask).unwrap();
            let revived: EraserMask = serde_json::from_str(&json).unwrap();

            assert_eq!(revived.entries().len(), count);
            for (a, b) in mask.entries().iter().zip(revived.entries()) {
                assert_eq!(a.transform.as_coeffs(), b.transform.as_coeffs());
                assert_eq!(a.path.local_bounds(), b.path.local_bounds());
                assert_eq!(b.path.compose, CompositeMode::DestOut);
            }
        }
    }

    #[test]
    fn test_roundtrip_preserves_inherited_clip() {
        let mut clip = BezPath::new();
        clip.move_to((0.0, 0.0));
        clip.line_to((50.0, 0.0));
        clip.line_to((50.0, 50.0));
        clip.close_path();
        let mask = EraserMask::new(Rect::new(0.0, 0.0, 100.0, 80.0), Some(clip));

        let json = serde_json::to_string(&mask).unwrap();
        let revived: EraserMask = serde_json::from_str(&json).unwrap();
        assert!(revived.clip.is_some());
    }

    #[test]
    fn test_wire_format_field_names() {
        let mask = mask_with_entries(1);
        let value: serde_json::Value = serde_json::to_value(&mask).unwrap();
        assert_eq!(value["type"], "eraser-path");
        assert!(value["objects"][0]["transformMatrix"].is_array());
        assert_eq!(value["objects"][0]["transformMatrix"].as_array().unwrap().len(), 6);
    }

    // === Revival failures ===

    #[test]
    fn test_from_data_rejects_unexpected_kind() {
        let mut data = mask_with_entries(0).to_data();
        data.kind = "rect".to_string();
        let err = EraserMask::from_data(data).unwrap_err();
        assert!(matches!(err, MaskDataError::UnexpectedKind { .. }));
    }

    #[test]
    fn test_from_data_rejects_non_finite_matrix() {
        let mut data = mask_with_entries(2).to_data();
        data.objects[1].transform_matrix[4] = f64::NAN;
        let err = EraserMask::from_data(data).unwrap_err();
        assert_eq!(err, MaskDataError::NonFiniteMatrix { index: 1 });
    }

    #[test]
    fn test_from_data_rejects_non_path_entry() {
        let mut data = mask_with_entries(1).to_data();
        data.objects[0].path = Entity::rect(10.0, 10.0, ShapeColor::rgb(0, 0, 0));
        let err = EraserMask::from_data(data).unwrap_err();
        assert!(matches!(err, MaskDataError::MalformedEntry { index: 0, .. }));
    }

    #[test]
    fn test_revival_restamps_subtractive_compositing() {
        let mut data = mask_with_entries(1).to_data();
        data.objects[0].path.compose = CompositeMode::SrcOver;
        let revived = EraserMask::from_data(data).unwrap();
        assert_eq!(revived.entries()[0].path.compose, CompositeMode::DestOut);
    }

    // === Rendering ===

    #[test]
    fn test_render_without_errors() {
        let mask = mask_with_entries(3);
        let mut scene = Scene::new();
        mask.render(&mut scene, Affine::IDENTITY);
        mask.render(&mut scene, Affine::translate((5.0, 5.0)) * Affine::rotate(0.3));
    }
}
