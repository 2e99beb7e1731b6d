use crate::command::Draft;
use crate::config::DEFAULT_SNAP_TOLERANCE;
use crate::math::{point_to_segment_dist, Point2};
use crate::model::{FloorId, IdGenerator, Intersection, JunctionKind, WallId, WallSegment};

use super::resolve::{validate_intersection, ResolveJunction};

/// What committing a manual join would do.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinPreview {
    Invalid {
        reason: String,
    },
    Valid {
        join_type: JunctionKind,
        /// Walls that would be modified or created.
        affected_walls: Vec<WallId>,
        /// Segments a commit would create by splitting.
        new_walls: Vec<WallSegment>,
        /// Distance from the point to the nearer wall.
        distance: f64,
    },
}

impl JoinPreview {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }
}

/// Dry run of a manual join.
///
/// The join is resolved on a throwaway draft with a cloned id generator, so
/// neither the walls nor the ids handed out later are affected.
#[derive(Debug, Clone)]
pub struct JoinPreviewQuery {
    walls: [WallId; 2],
    point: Point2,
    tolerance: f64,
}

impl JoinPreviewQuery {
    #[must_use]
    pub fn new(a: WallId, b: WallId, point: Point2) -> Self {
        Self {
            walls: [a, b],
            point,
            tolerance: DEFAULT_SNAP_TOLERANCE,
        }
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn run(
        &self,
        floor: FloorId,
        walls: &[WallSegment],
        intersections: &[Intersection],
        ids: &IdGenerator,
    ) -> JoinPreview {
        let [a, b] = self.walls;
        if let Err(e) = validate_intersection(walls, a, b, &self.point, self.tolerance) {
            return JoinPreview::Invalid {
                reason: e.to_string(),
            };
        }

        let distance = walls
            .iter()
            .filter(|w| w.id == a || w.id == b)
            .map(|w| point_to_segment_dist(&self.point, &w.segment()))
            .fold(f64::INFINITY, f64::min);

        let mut ids = ids.clone();
        let mut draft = Draft::new(floor, walls.to_vec(), intersections.to_vec(), &mut ids);
        match ResolveJunction::manual(a, b, self.point)
            .with_tolerance(self.tolerance)
            .execute(&mut draft)
        {
            Ok(resolution) => JoinPreview::Valid {
                join_type: resolution.kind,
                affected_walls: resolution.affected_walls,
                new_walls: resolution
                    .new_walls
                    .iter()
                    .filter_map(|id| draft.wall(*id).cloned())
                    .collect(),
                distance,
            },
            Err(e) => JoinPreview::Invalid {
                reason: e.to_string(),
            },
        }
    }
}
