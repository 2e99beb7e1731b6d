use tracing::debug;

use crate::command::Draft;
use crate::config::DEFAULT_SNAP_TOLERANCE;
use crate::error::{Result, ValidationError};
use crate::math::{is_point_on_segment, Point2};
use crate::model::{
    Intersection, IntersectionId, Junction, JunctionKind, WallEnd, WallId, WallSegment,
};

use super::split::SplitWall;

/// How a junction point relates to one wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallRole {
    /// Within tolerance of this end: the end is snapped onto the point.
    Endpoint(WallEnd),
    /// Within tolerance of the interior: the wall is split there.
    Interior,
    /// Away from the wall: its nearer end is moved onto the point.
    Off(WallEnd),
}

/// Classifies `point` against `wall`.
#[must_use]
pub fn role_of(wall: &WallSegment, point: &Point2, tolerance: f64) -> WallRole {
    let (end, d) = wall.nearest_endpoint(point);
    if d <= tolerance {
        WallRole::Endpoint(end)
    } else if is_point_on_segment(point, &wall.segment(), tolerance) {
        WallRole::Interior
    } else {
        WallRole::Off(end)
    }
}

/// The junction kind implied by the two roles.
#[must_use]
pub fn infer_kind(a: WallRole, b: WallRole) -> JunctionKind {
    match (a == WallRole::Interior, b == WallRole::Interior) {
        (false, false) => JunctionKind::Corner,
        (true, true) => JunctionKind::Cross,
        _ => JunctionKind::TJunction,
    }
}

/// Checks that a join of walls `a` and `b` at `point` may proceed.
///
/// # Errors
///
/// Fails when either wall is missing, both ids are equal, or the point is
/// farther than `tolerance` from both walls.
pub fn validate_intersection(
    walls: &[WallSegment],
    a: WallId,
    b: WallId,
    point: &Point2,
    tolerance: f64,
) -> Result<()> {
    if a == b {
        return Err(ValidationError::SameWall(a).into());
    }
    let find = |id: WallId| {
        walls
            .iter()
            .find(|w| w.id == id)
            .ok_or(ValidationError::WallNotFound(id))
    };
    let wa = find(a)?;
    let wb = find(b)?;

    let near_a = is_point_on_segment(point, &wa.segment(), tolerance);
    let near_b = is_point_on_segment(point, &wb.segment(), tolerance);
    if !near_a && !near_b {
        return Err(ValidationError::PointOutOfTolerance {
            x: point.x,
            y: point.y,
            tolerance,
        }
        .into());
    }
    Ok(())
}

/// Outcome of a resolved junction.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Geometric kind of the junction that was built.
    pub kind: JunctionKind,
    pub point: Point2,
    /// Every wall that was modified or created.
    pub affected_walls: Vec<WallId>,
    /// Walls created by splitting.
    pub new_walls: Vec<WallId>,
    /// The recorded intersection, if a new one was added.
    pub intersection: Option<IntersectionId>,
}

/// Turns a detected or manual junction into wall edits.
///
/// Ends near the point are snapped exactly onto it and walls passing
/// through it are split there, so the detection tolerance gap is closed.
/// A manual request may also move the nearer end of a wall that does not
/// reach the point.
#[derive(Debug, Clone)]
pub struct ResolveJunction {
    walls: [WallId; 2],
    point: Point2,
    kind: JunctionKind,
    tolerance: f64,
}

impl ResolveJunction {
    #[must_use]
    pub fn new(walls: [WallId; 2], point: Point2, kind: JunctionKind) -> Self {
        Self {
            walls,
            point,
            kind,
            tolerance: DEFAULT_SNAP_TOLERANCE,
        }
    }

    /// Resolves a junction found by the detector.
    #[must_use]
    pub fn from_junction(junction: &Junction) -> Self {
        Self::new(junction.walls, junction.point, junction.kind)
    }

    /// Joins two walls at a caller-chosen point.
    #[must_use]
    pub fn manual(a: WallId, b: WallId, point: Point2) -> Self {
        Self::new([a, b], point, JunctionKind::Manual)
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Executes the resolution on the draft.
    ///
    /// # Errors
    ///
    /// Returns a validation error when [`validate_intersection`] fails or a
    /// detected junction no longer touches both walls, and a geometry error
    /// when an edit would collapse a wall. The draft is left untouched on
    /// error.
    pub fn execute(&self, draft: &mut Draft<'_>) -> Result<Resolution> {
        let [a, b] = self.walls;
        validate_intersection(draft.walls(), a, b, &self.point, self.tolerance)?;

        let wall_a = draft.require_wall(a)?.clone();
        let wall_b = draft.require_wall(b)?.clone();
        let role_a = role_of(&wall_a, &self.point, self.tolerance);
        let role_b = role_of(&wall_b, &self.point, self.tolerance);

        let off = matches!(role_a, WallRole::Off(_)) || matches!(role_b, WallRole::Off(_));
        if off && self.kind != JunctionKind::Manual {
            return Err(ValidationError::PointOutOfTolerance {
                x: self.point.x,
                y: self.point.y,
                tolerance: self.tolerance,
            }
            .into());
        }

        let mark = draft.checkpoint();
        match self.apply(draft, [(&wall_a, role_a), (&wall_b, role_b)]) {
            Ok(resolution) => {
                debug!(
                    kind = ?resolution.kind,
                    a = %a,
                    b = %b,
                    x = self.point.x,
                    y = self.point.y,
                    "resolved junction"
                );
                Ok(resolution)
            }
            Err(e) => {
                draft.rollback(mark);
                Err(e)
            }
        }
    }

    fn apply(
        &self,
        draft: &mut Draft<'_>,
        walls: [(&WallSegment, WallRole); 2],
    ) -> Result<Resolution> {
        let kind = infer_kind(walls[0].1, walls[1].1);
        let mut new_walls = Vec::new();

        for (wall, role) in walls {
            match role {
                WallRole::Endpoint(end) | WallRole::Off(end) => {
                    draft.update_wall(wall.with_endpoint(end, self.point))?;
                }
                WallRole::Interior => {
                    let id = SplitWall::new(wall.id, self.point)
                        .with_tolerance(self.tolerance)
                        .execute(draft)?;
                    new_walls.push(id);
                }
            }
        }

        // Dependent wall first for T-junctions.
        let pair = if kind == JunctionKind::TJunction && walls[0].1 == WallRole::Interior {
            [walls[1].0.id, walls[0].0.id]
        } else {
            [walls[0].0.id, walls[1].0.id]
        };
        let recorded_kind = if self.kind == JunctionKind::Manual {
            JunctionKind::Manual
        } else {
            kind
        };

        let already_recorded = draft
            .intersections()
            .iter()
            .any(|i| i.same_junction(pair, &self.point, self.tolerance));
        let intersection = if already_recorded {
            None
        } else {
            let id = draft.fresh_intersection_id();
            draft.add_intersection(Intersection::new(id, self.point, recorded_kind, pair))?;
            Some(id)
        };

        let mut affected_walls = pair.to_vec();
        affected_walls.extend(new_walls.iter().copied());

        Ok(Resolution {
            kind,
            point: self.point,
            affected_walls,
            new_walls,
            intersection,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::error::JoineryError;
    use crate::model::{FloorId, IdGenerator};
    use crate::operations::detect::DetectIntersections;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn wall(id: u64, a: Point2, b: Point2) -> WallSegment {
        WallSegment::new(WallId(id), a, b)
    }

    #[test]
    fn equal_ids_never_validate() {
        let walls = vec![wall(1, p(0.0, 0.0), p(10.0, 0.0))];
        let err =
            validate_intersection(&walls, WallId(1), WallId(1), &p(5.0, 0.0), 1.0).unwrap_err();
        assert!(matches!(err, JoineryError::Validation(ValidationError::SameWall(_))));
    }

    #[test]
    fn missing_wall_fails_validation() {
        let walls = vec![wall(1, p(0.0, 0.0), p(10.0, 0.0))];
        assert!(validate_intersection(&walls, WallId(1), WallId(2), &p(5.0, 0.0), 1.0).is_err());
    }

    #[test]
    fn far_point_fails_validation() {
        let walls = vec![
            wall(1, p(0.0, 0.0), p(10.0, 0.0)),
            wall(2, p(0.0, 5.0), p(0.0, 10.0)),
        ];
        let err =
            validate_intersection(&walls, WallId(1), WallId(2), &p(50.0, 50.0), 1.0).unwrap_err();
        assert!(matches!(
            err,
            JoineryError::Validation(ValidationError::PointOutOfTolerance { .. })
        ));
    }

    #[test]
    fn corner_snaps_both_ends_exactly() {
        let mut ids = IdGenerator::new();
        let walls = vec![
            wall(1, p(0.0, 0.0), p(97.0, 0.0)),
            wall(2, p(100.0, 2.0), p(100.0, 100.0)),
        ];
        let mut draft = Draft::new(FloorId(0), walls, Vec::new(), &mut ids);
        let junction = DetectIntersections::new(5.0).execute(draft.walls()).remove(0);

        let res = ResolveJunction::from_junction(&junction)
            .with_tolerance(5.0)
            .execute(&mut draft)
            .unwrap();

        assert_eq!(res.kind, JunctionKind::Corner);
        assert!(res.new_walls.is_empty());
        let w1 = draft.wall(WallId(1)).unwrap();
        let w2 = draft.wall(WallId(2)).unwrap();
        assert_abs_diff_eq!(w1.end.x, 100.0, epsilon = 1e-9);
        assert_eq!(w1.end, w2.start);
        assert_eq!(draft.intersections().len(), 1);
    }

    #[test]
    fn t_junction_splits_through_wall_and_snaps_dependent() {
        let mut ids = IdGenerator::new();
        let walls = vec![
            wall(1, p(0.0, 0.0), p(100.0, 0.0)),
            wall(2, p(50.0, 3.0), p(50.0, 80.0)),
        ];
        let mut draft = Draft::new(FloorId(0), walls, Vec::new(), &mut ids);
        let junction = DetectIntersections::new(5.0).execute(draft.walls()).remove(0);
        assert_eq!(junction.kind, JunctionKind::TJunction);

        let res = ResolveJunction::from_junction(&junction)
            .with_tolerance(5.0)
            .execute(&mut draft)
            .unwrap();

        assert_eq!(res.new_walls.len(), 1);
        let new_id = res.new_walls[0];
        assert_eq!(draft.wall(WallId(1)).unwrap().end, p(50.0, 0.0));
        assert_eq!(draft.wall(new_id).unwrap().start, p(50.0, 0.0));
        assert_eq!(draft.wall(new_id).unwrap().end, p(100.0, 0.0));
        assert_eq!(draft.wall(WallId(2)).unwrap().start, p(50.0, 0.0));
        let recorded = &draft.intersections()[0];
        assert_eq!(recorded.kind, JunctionKind::TJunction);
        assert_eq!(recorded.walls, [WallId(2), WallId(1)]);
    }

    #[test]
    fn cross_splits_both_walls() {
        let mut ids = IdGenerator::new();
        let walls = vec![
            wall(1, p(0.0, 0.0), p(100.0, 0.0)),
            wall(2, p(50.0, -50.0), p(50.0, 50.0)),
        ];
        let mut draft = Draft::new(FloorId(0), walls, Vec::new(), &mut ids);
        let junction = DetectIntersections::new(1.0).execute(draft.walls()).remove(0);

        let res = ResolveJunction::from_junction(&junction)
            .with_tolerance(1.0)
            .execute(&mut draft)
            .unwrap();

        assert_eq!(res.kind, JunctionKind::Cross);
        assert_eq!(res.new_walls.len(), 2);
        assert_eq!(draft.walls().len(), 4);
        let at_center = draft
            .walls()
            .iter()
            .filter(|w| w.start == p(50.0, 0.0) || w.end == p(50.0, 0.0))
            .count();
        assert_eq!(at_center, 4);
    }

    #[test]
    fn manual_join_extends_short_wall() {
        let mut ids = IdGenerator::new();
        let walls = vec![
            wall(1, p(0.0, 0.0), p(100.0, 0.0)),
            wall(2, p(100.0, 30.0), p(100.0, 100.0)),
        ];
        let mut draft = Draft::new(FloorId(0), walls, Vec::new(), &mut ids);

        let res = ResolveJunction::manual(WallId(1), WallId(2), p(100.0, 0.0))
            .with_tolerance(5.0)
            .execute(&mut draft)
            .unwrap();

        assert_eq!(res.kind, JunctionKind::Corner);
        assert_eq!(draft.wall(WallId(2)).unwrap().start, p(100.0, 0.0));
        assert_eq!(draft.intersections()[0].kind, JunctionKind::Manual);
    }

    #[test]
    fn detected_junction_off_a_wall_is_rejected_without_mutation() {
        let mut ids = IdGenerator::new();
        let walls = vec![
            wall(1, p(0.0, 0.0), p(100.0, 0.0)),
            wall(2, p(100.0, 30.0), p(100.0, 100.0)),
        ];
        let mut draft = Draft::new(FloorId(0), walls, Vec::new(), &mut ids);
        let result =
            ResolveJunction::new([WallId(1), WallId(2)], p(100.0, 0.0), JunctionKind::Corner)
                .with_tolerance(5.0)
                .execute(&mut draft);
        assert!(result.is_err());
        assert!(draft.is_unchanged());
    }
}
