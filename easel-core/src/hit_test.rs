//! Geometric intersection tests
//!
//! The eraser commit step only needs bounding-geometry intersection between
//! a world-space stroke and an entity, taking the transform stack into
//! account.

use crate::entity::Entity;
use kurbo::{Affine, Rect};

/// Whether two rects share any area (touching edges count)
pub fn rects_overlap(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Whether `entity` and a world-space stroke entity intersect
///
/// Both sides are compared by their transformed bounding boxes, which is
/// what commit-time selectivity needs; pixel-accurate clipping happens in
/// the mask itself.
pub fn entity_intersects_path(entity: &Entity, parent: Affine, stroke: &Entity) -> bool {
    let entity_bounds = entity.world_bounds(parent);
    let stroke_bounds = stroke.world_bounds(Affine::IDENTITY);
    rects_overlap(entity_bounds, stroke_bounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;
    use crate::path_fitting::smooth_open_path;
    use crate::shape::{ShapeColor, StrokeStyle};
    use kurbo::Point;

    fn stroke(coords: &[(f64, f64)]) -> Entity {
        let points: Vec<Point> = coords.iter().map(|&(x, y)| Point::new(x, y)).collect();
        Entity::new(EntityKind::Path(smooth_open_path(&points)))
            .with_stroke(ShapeColor::rgb(0, 0, 0), StrokeStyle::round(10.0))
    }

    #[test]
    fn test_overlapping_rects() {
        assert!(rects_overlap(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(5.0, 5.0, 15.0, 15.0)
        ));
        assert!(!rects_overlap(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(20.0, 0.0, 30.0, 10.0)
        ));
    }

    #[test]
    fn test_stroke_hits_entity_under_transform() {
        let entity =
            Entity::rect(10.0, 10.0, ShapeColor::rgb(0, 0, 0)).with_position(100.0, 100.0);
        let near = stroke(&[(95.0, 95.0), (105.0, 105.0)]);
        let far = stroke(&[(0.0, 0.0), (10.0, 10.0)]);
        assert!(entity_intersects_path(&entity, Affine::IDENTITY, &near));
        assert!(!entity_intersects_path(&entity, Affine::IDENTITY, &far));
    }

    #[test]
    fn test_parent_transform_shifts_entity() {
        let entity = Entity::rect(10.0, 10.0, ShapeColor::rgb(0, 0, 0));
        let probe = stroke(&[(200.0, 200.0), (210.0, 210.0)]);
        assert!(!entity_intersects_path(&entity, Affine::IDENTITY, &probe));
        assert!(entity_intersects_path(
            &entity,
            Affine::translate((200.0, 200.0)),
            &probe
        ));
    }

    #[test]
    fn test_stroke_width_extends_reach() {
        // The path line ends at x=90 but the 10px round stroke reaches past 95
        let entity =
            Entity::rect(10.0, 10.0, ShapeColor::rgb(0, 0, 0)).with_position(94.0, 0.0);
        let probe = stroke(&[(0.0, 5.0), (90.0, 5.0)]);
        assert!(entity_intersects_path(&entity, Affine::IDENTITY, &probe));
    }
}
