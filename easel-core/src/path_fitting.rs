//! Point decimation and smoothing for freehand strokes
//!
//! Raw pointer samples arrive at display rate and are both denser and
//! noisier than the path needs. `decimate_points` drops samples closer than
//! a distance threshold to the last kept one; `smooth_open_path` converts
//! the survivors into a quadratic-interpolated polyline.

use kurbo::{BezPath, Point};

/// Drop consecutive samples closer than `threshold` to the last kept sample
///
/// The first sample is always kept; the last sample is kept when it differs
/// from the last survivor, so the stroke never loses its endpoint.
pub fn decimate_points(points: &[Point], threshold: f64) -> Vec<Point> {
    if points.len() <= 2 || threshold <= 0.0 {
        return points.to_vec();
    }

    let sq_threshold = threshold * threshold;
    let mut result = vec![points[0]];
    let mut prev = points[0];

    for &point in &points[1..] {
        let d = point - prev;
        if d.hypot2() >= sq_threshold {
            result.push(point);
            prev = point;
        }
    }

    if let Some(&last) = points.last() {
        if last != prev {
            result.push(last);
        }
    }

    result
}

/// Build a smooth open path through `points`
///
/// Quadratic segments are threaded through the midpoints of consecutive
/// samples, with the samples themselves as control points, and the path
/// ends with a line to the final sample. A single sample produces the
/// canonical zero-extent form (all control points equal).
pub fn smooth_open_path(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    let Some(&first) = points.first() else {
        return path;
    };

    path.move_to(first);
    if points.len() == 1 {
        path.quad_to(first, first);
        path.line_to(first);
        return path;
    }

    for i in 1..points.len() - 1 {
        let mid = points[i].midpoint(points[i + 1]);
        path.quad_to(points[i], mid);
    }
    path.line_to(points[points.len() - 1]);

    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Shape;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn test_decimate_keeps_endpoints() {
        let points = pts(&[(0.0, 0.0), (0.1, 0.0), (0.2, 0.0), (5.0, 0.0)]);
        let decimated = decimate_points(&points, 1.0);
        assert_eq!(decimated.first(), points.first());
        assert_eq!(decimated.last(), points.last());
        assert!(decimated.len() < points.len());
    }

    #[test]
    fn test_decimate_zero_threshold_is_identity() {
        let points = pts(&[(0.0, 0.0), (0.1, 0.0), (0.2, 0.0)]);
        assert_eq!(decimate_points(&points, 0.0), points);
    }

    #[test]
    fn test_decimate_short_input_untouched() {
        let points = pts(&[(0.0, 0.0), (0.01, 0.0)]);
        assert_eq!(decimate_points(&points, 10.0), points);
    }

    #[test]
    fn test_smooth_path_covers_samples() {
        let points = pts(&[(0.0, 0.0), (10.0, 10.0), (20.0, 0.0)]);
        let path = smooth_open_path(&points);
        let bbox = path.bounding_box();
        assert!(bbox.width() > 0.0);
        assert!(bbox.height() > 0.0);
    }

    #[test]
    fn test_single_sample_has_zero_extent() {
        let path = smooth_open_path(&pts(&[(7.0, 7.0)]));
        let bbox = path.bounding_box();
        assert_eq!(bbox.width(), 0.0);
        assert_eq!(bbox.height(), 0.0);
    }

    #[test]
    fn test_empty_input_empty_path() {
        let path = smooth_open_path(&[]);
        assert!(path.elements().is_empty());
    }
}
