use std::fmt;

use crate::math::{points_coincide, Point2};

use super::wall::WallId;

/// Unique identifier for a recorded intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IntersectionId(pub u64);

impl fmt::Display for IntersectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "intersection#{}", self.0)
    }
}

/// How two walls meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JunctionKind {
    /// Both walls end at the point.
    Corner,
    /// One wall ends on the other's interior.
    TJunction,
    /// The walls pass through each other.
    Cross,
    /// Requested explicitly at a caller-chosen point.
    Manual,
}

/// A detected, not yet recorded, meeting of two walls.
///
/// Uses the same wall ordering convention as [`Intersection`].
#[derive(Debug, Clone, PartialEq)]
pub struct Junction {
    pub point: Point2,
    pub kind: JunctionKind,
    pub walls: [WallId; 2],
}

/// A recorded meeting point of exactly two distinct walls.
///
/// Holds wall ids only. For [`JunctionKind::TJunction`], `walls[0]` is the
/// dependent wall (the one whose endpoint terminates) and `walls[1]` the
/// through wall.
#[derive(Debug, Clone, PartialEq)]
pub struct Intersection {
    pub id: IntersectionId,
    pub point: Point2,
    pub kind: JunctionKind,
    pub walls: [WallId; 2],
}

impl Intersection {
    #[must_use]
    pub fn new(id: IntersectionId, point: Point2, kind: JunctionKind, walls: [WallId; 2]) -> Self {
        Self {
            id,
            point,
            kind,
            walls,
        }
    }

    #[must_use]
    pub fn references(&self, wall: WallId) -> bool {
        self.walls.contains(&wall)
    }

    /// The wall paired with `wall`, if `wall` is referenced.
    #[must_use]
    pub fn other(&self, wall: WallId) -> Option<WallId> {
        match self.walls {
            [a, b] if a == wall => Some(b),
            [a, b] if b == wall => Some(a),
            _ => None,
        }
    }

    /// Same unordered wall pair at the same point.
    #[must_use]
    pub fn same_junction(&self, walls: [WallId; 2], point: &Point2, tolerance: f64) -> bool {
        let same_pair = self.walls == walls || self.walls == [walls[1], walls[0]];
        same_pair && points_coincide(&self.point, point, tolerance)
    }

    /// Replaces every reference to `from` with `to`.
    #[must_use]
    pub fn repointed(&self, from: WallId, to: WallId) -> Self {
        let mut next = self.clone();
        for w in &mut next.walls {
            if *w == from {
                *w = to;
            }
        }
        next
    }
}
