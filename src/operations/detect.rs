use std::cmp::Ordering;

use crate::math::{
    distance, is_parallel, line_line_intersect_2d, point_to_segment_dist, project_onto_segment,
    Point2,
};
use crate::model::{Junction, JunctionKind, WallId, WallSegment};

/// Finds and classifies every pairwise wall meeting.
///
/// For each unordered pair the supporting lines are intersected; the meeting
/// point must lie within `tolerance` of both finite walls. It is then a
/// corner when it is near an endpoint of both walls, a T-junction when near
/// an endpoint of exactly one (that wall is dependent), and a crossing
/// otherwise. When the lines cross too far away (shallow angles), ends
/// within tolerance of each other still form a corner, and an end within
/// tolerance of the other wall's interior forms a T-junction at its
/// projection. Degenerate walls and parallel pairs yield nothing.
#[derive(Debug, Clone, Copy)]
pub struct DetectIntersections {
    tolerance: f64,
}

impl DetectIntersections {
    #[must_use]
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Runs the O(n²) pair scan.
    ///
    /// The result is ordered by point (x, then y), then by wall ids.
    #[must_use]
    pub fn execute(&self, walls: &[WallSegment]) -> Vec<Junction> {
        let mut sorted: Vec<&WallSegment> = walls.iter().collect();
        sorted.sort_by_key(|w| w.id);

        let mut found: Vec<Junction> = Vec::new();
        for i in 0..sorted.len() {
            for j in (i + 1)..sorted.len() {
                let Some(junction) = classify(sorted[i], sorted[j], self.tolerance) else {
                    continue;
                };
                let duplicate = found.iter().any(|f| {
                    same_pair(f.walls, junction.walls)
                        && distance(&f.point, &junction.point) <= self.tolerance
                });
                if !duplicate {
                    found.push(junction);
                }
            }
        }

        found.sort_by(compare_by_position);
        found
    }
}

/// Classifies one pair of walls.
#[must_use]
pub fn classify(a: &WallSegment, b: &WallSegment, tolerance: f64) -> Option<Junction> {
    if a.id == b.id || a.is_degenerate() || b.is_degenerate() {
        return None;
    }
    let sa = a.segment();
    let sb = b.segment();
    if is_parallel(&sa.direction(), &sb.direction()) {
        return None;
    }

    let (t, _u) = line_line_intersect_2d(&sa.start, &sa.direction(), &sb.start, &sb.direction())?;
    let p = sa.point_at(t);

    if point_to_segment_dist(&p, &sa) <= tolerance && point_to_segment_dist(&p, &sb) <= tolerance {
        let at_end_a = a.nearest_endpoint(&p).1 <= tolerance;
        let at_end_b = b.nearest_endpoint(&p).1 <= tolerance;
        let (kind, walls) = match (at_end_a, at_end_b) {
            (true, true) => (JunctionKind::Corner, [a.id, b.id]),
            (true, false) => (JunctionKind::TJunction, [a.id, b.id]),
            (false, true) => (JunctionKind::TJunction, [b.id, a.id]),
            (false, false) => (JunctionKind::Cross, [a.id, b.id]),
        };
        return Some(Junction { point: p, kind, walls });
    }

    // Nearly parallel walls whose ends touch: their lines meet far away, but
    // the ends still form a corner.
    let (ea, eb, d) = closest_endpoints(a, b);
    if d <= tolerance {
        return Some(Junction {
            point: Point2::from((ea.coords + eb.coords) / 2.0),
            kind: JunctionKind::Corner,
            walls: [a.id, b.id],
        });
    }

    end_on_interior(a, b, tolerance)
}

/// The closest end of either wall resting on the other's interior, as a
/// T-junction at its projection (dependent wall first).
fn end_on_interior(a: &WallSegment, b: &WallSegment, tolerance: f64) -> Option<Junction> {
    let mut best: Option<(f64, Junction)> = None;
    for (dependent, through) in [(a, b), (b, a)] {
        let seg = through.segment();
        for end in [dependent.start, dependent.end] {
            let (_, foot) = project_onto_segment(&end, &seg);
            let d = distance(&end, &foot);
            if d > tolerance || through.nearest_endpoint(&foot).1 <= tolerance {
                continue;
            }
            if best.as_ref().is_none_or(|(bd, _)| d < *bd) {
                let junction = Junction {
                    point: foot,
                    kind: JunctionKind::TJunction,
                    walls: [dependent.id, through.id],
                };
                best = Some((d, junction));
            }
        }
    }
    best.map(|(_, j)| j)
}

fn closest_endpoints(a: &WallSegment, b: &WallSegment) -> (Point2, Point2, f64) {
    let mut best = (a.start, b.start, distance(&a.start, &b.start));
    for pa in [a.start, a.end] {
        for pb in [b.start, b.end] {
            let d = distance(&pa, &pb);
            if d < best.2 {
                best = (pa, pb, d);
            }
        }
    }
    best
}

fn same_pair(x: [WallId; 2], y: [WallId; 2]) -> bool {
    x == y || x == [y[1], y[0]]
}

/// Orders junctions by point (x, then y), then wall ids.
pub(crate) fn compare_by_position(a: &Junction, b: &Junction) -> Ordering {
    a.point
        .x
        .total_cmp(&b.point.x)
        .then(a.point.y.total_cmp(&b.point.y))
        .then(a.walls.cmp(&b.walls))
}
