use super::distance_2d::{point_to_line_dist, point_to_segment_dist};
use super::{Point2, Segment, Vector2, DEFAULT_TOLERANCE, EPSILON};

/// Parametric 2D line-line intersection.
///
/// Given lines `p1 + t * d1` and `p2 + u * d2`, returns `(t, u)` if not parallel.
#[must_use]
pub fn line_line_intersect_2d(
    p1: &Point2,
    d1: &Vector2,
    p2: &Point2,
    d2: &Vector2,
) -> Option<(f64, f64)> {
    if is_parallel(d1, d2) {
        return None;
    }
    let cross = d1.x * d2.y - d1.y * d2.x;
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    let t = (dx * d2.y - dy * d2.x) / cross;
    let u = (dx * d1.y - dy * d1.x) / cross;
    Some((t, u))
}

/// Whether two direction vectors are parallel (or either is zero).
///
/// Compares the sine of the enclosed angle, so the result does not depend on
/// the vectors' lengths.
#[must_use]
pub fn is_parallel(d1: &Vector2, d2: &Vector2) -> bool {
    let n1 = d1.norm();
    let n2 = d2.norm();
    if n1 < EPSILON || n2 < EPSILON {
        return true;
    }
    let sine = (d1.x * d2.y - d1.y * d2.x) / (n1 * n2);
    sine.abs() < EPSILON
}

/// Segment-segment intersection with the default tolerance.
#[must_use]
pub fn segments_intersect(s1: &Segment, s2: &Segment) -> Option<Point2> {
    segments_intersect_with(s1, s2, DEFAULT_TOLERANCE)
}

/// Bounded segment-segment intersection in 2D.
///
/// Returns the meeting point of the two supporting lines when it lies within
/// `tolerance` of both finite segments. Degenerate segments and parallel
/// pairs (including collinear overlaps) never intersect.
#[must_use]
pub fn segments_intersect_with(s1: &Segment, s2: &Segment, tolerance: f64) -> Option<Point2> {
    if s1.is_degenerate() || s2.is_degenerate() {
        return None;
    }
    let (t, _u) = line_line_intersect_2d(&s1.start, &s1.direction(), &s2.start, &s2.direction())?;
    let pt = s1.point_at(t);

    if point_to_segment_dist(&pt, s1) <= tolerance && point_to_segment_dist(&pt, s2) <= tolerance {
        Some(pt)
    } else {
        None
    }
}

/// Returns true if `p` lies within `tolerance` of the finite segment.
///
/// A degenerate segment contains nothing.
#[must_use]
pub fn is_point_on_segment(p: &Point2, seg: &Segment, tolerance: f64) -> bool {
    if seg.is_degenerate() {
        return false;
    }
    point_to_segment_dist(p, seg) <= tolerance
}

/// Returns true if both segments lie on the same infinite line within
/// `tolerance`.
#[must_use]
pub fn collinear(s1: &Segment, s2: &Segment, tolerance: f64) -> bool {
    if s1.is_degenerate() || s2.is_degenerate() {
        return false;
    }
    point_to_line_dist(&s2.start, s1) <= tolerance
        && point_to_line_dist(&s2.end, s1) <= tolerance
        && point_to_line_dist(&s1.start, s2) <= tolerance
        && point_to_line_dist(&s1.end, s2) <= tolerance
}
