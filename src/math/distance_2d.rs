use super::{Point2, Segment, EPSILON};

/// Euclidean distance between two points.
#[must_use]
pub fn distance(a: &Point2, b: &Point2) -> f64 {
    (b - a).norm()
}

/// Projects `p` onto the segment, returning the clamped parameter `t` in
/// `[0, 1]` and the closest point on the segment.
///
/// A degenerate segment projects everything onto its start point.
#[must_use]
pub fn project_onto_segment(p: &Point2, seg: &Segment) -> (f64, Point2) {
    let d = seg.direction();
    let len_sq = d.norm_squared();
    if len_sq < EPSILON * EPSILON {
        return (0.0, seg.start);
    }

    let t = ((p - seg.start).dot(&d) / len_sq).clamp(0.0, 1.0);
    (t, seg.point_at(t))
}

/// Returns the minimum distance from `p` to the finite segment.
#[must_use]
pub fn point_to_segment_dist(p: &Point2, seg: &Segment) -> f64 {
    let (_, closest) = project_onto_segment(p, seg);
    distance(p, &closest)
}

/// Returns the perpendicular distance from `p` to the infinite line through
/// the segment. Falls back to point distance for a degenerate segment.
#[must_use]
pub fn point_to_line_dist(p: &Point2, seg: &Segment) -> f64 {
    let d = seg.direction();
    let len = d.norm();
    if len < EPSILON {
        return distance(p, &seg.start);
    }
    let v = p - seg.start;
    (d.x * v.y - d.y * v.x).abs() / len
}
