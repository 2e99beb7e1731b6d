use tracing::debug;

use crate::command::Draft;
use crate::config::DEFAULT_SNAP_TOLERANCE;
use crate::error::{Result, ValidationError};
use crate::math::{collinear, distance, Point2, EPSILON};
use crate::model::{JunctionKind, WallEnd, WallId, WallSegment};

/// Collapses a chain of collinear walls into the first one.
///
/// The walls must be pairwise collinear, share thickness and material, and
/// touch end to end in the given order, moving steadily away from the first
/// wall. The first wall's touching end is moved to the far end of the chain;
/// the other walls are removed.
#[derive(Debug, Clone)]
pub struct MergeWalls {
    walls: Vec<WallId>,
    tolerance: f64,
}

impl MergeWalls {
    #[must_use]
    pub fn new(walls: Vec<WallId>) -> Self {
        Self {
            walls,
            tolerance: DEFAULT_SNAP_TOLERANCE,
        }
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Executes the merge on the draft, returning the surviving wall's id.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a wall is missing or referenced twice,
    /// or if the walls are not collinear, differ in build-up, or do not form
    /// a connected chain. The draft is left untouched on error.
    pub fn execute(&self, draft: &mut Draft<'_>) -> Result<WallId> {
        let walls = self.collect(draft)?;
        let (moving_end, chain_end) = self.trace_chain(&walls)?;

        let first = &walls[0];
        let merged = first.with_endpoint(moving_end, chain_end);

        let mark = draft.checkpoint();
        if let Err(e) = self.commit(draft, &walls, merged) {
            draft.rollback(mark);
            return Err(e);
        }

        debug!(survivor = %first.id, absorbed = walls.len() - 1, "merged walls");
        Ok(first.id)
    }

    fn collect(&self, draft: &Draft<'_>) -> Result<Vec<WallSegment>> {
        if self.walls.len() < 2 {
            return Err(not_mergeable("at least two walls are required"));
        }
        let mut walls: Vec<WallSegment> = Vec::with_capacity(self.walls.len());
        for &id in &self.walls {
            if walls.iter().any(|w| w.id == id) {
                return Err(ValidationError::SameWall(id).into());
            }
            walls.push(draft.require_wall(id)?.clone());
        }

        let first = &walls[0];
        if walls.iter().any(|w| !w.has_same_build_up(first)) {
            return Err(not_mergeable("thickness or material differs"));
        }
        for (i, a) in walls.iter().enumerate() {
            for b in &walls[i + 1..] {
                if !collinear(&a.segment(), &b.segment(), self.tolerance) {
                    return Err(not_mergeable(&format!("{} and {} are not collinear", a.id, b.id)));
                }
            }
        }
        Ok(walls)
    }

    /// Walks the chain, returning the first wall's end that moves and the
    /// point it moves to.
    fn trace_chain(&self, walls: &[WallSegment]) -> Result<(WallEnd, Point2)> {
        let first = &walls[0];
        let second = &walls[1];

        let moving_end = [WallEnd::End, WallEnd::Start]
            .into_iter()
            .find(|&end| touching_end(second, &first.endpoint(end), self.tolerance).is_some())
            .ok_or_else(|| not_mergeable(&format!("{} does not touch {}", first.id, second.id)))?;
        let anchor = first.endpoint(moving_end.opposite());

        let mut joint = first.endpoint(moving_end);
        for wall in &walls[1..] {
            let end = touching_end(wall, &joint, self.tolerance)
                .ok_or_else(|| not_mergeable(&format!("chain is broken at {}", wall.id)))?;
            let far = wall.endpoint(end.opposite());
            if distance(&anchor, &far) <= distance(&anchor, &joint) + EPSILON {
                return Err(not_mergeable(&format!("chain doubles back at {}", wall.id)));
            }
            joint = far;
        }
        Ok((moving_end, joint))
    }

    fn commit(
        &self,
        draft: &mut Draft<'_>,
        walls: &[WallSegment],
        merged: WallSegment,
    ) -> Result<()> {
        let survivor = merged.id;
        let members: Vec<WallId> = walls.iter().map(|w| w.id).collect();

        // Junctions inside the chain disappear; junctions with outside walls
        // follow the survivor.
        let touched: Vec<_> = draft
            .intersections()
            .iter()
            .filter(|i| members[1..].iter().any(|m| i.references(*m)))
            .cloned()
            .collect();
        for item in touched {
            let inside = item.walls.iter().all(|w| members.contains(w));
            let mut next = members[1..]
                .iter()
                .fold(item.clone(), |acc, m| acc.repointed(*m, survivor));
            let duplicate = draft
                .intersections()
                .iter()
                .any(|i| {
                    i.id != item.id && i.same_junction(next.walls, &next.point, self.tolerance)
                });
            if inside || duplicate {
                draft.remove_intersection(item.id)?;
                continue;
            }
            if next.kind == JunctionKind::Corner
                && merged.nearest_endpoint(&next.point).1 > self.tolerance
            {
                next.kind = JunctionKind::TJunction;
                if next.walls[0] == survivor {
                    next.walls.swap(0, 1);
                }
            }
            draft.update_intersection(next)?;
        }

        for id in &members[1..] {
            draft.remove_wall(*id)?;
        }
        draft.update_wall(merged)
    }
}

/// The end of `wall` lying within `tolerance` of `p`, if any.
fn touching_end(wall: &WallSegment, p: &Point2, tolerance: f64) -> Option<WallEnd> {
    let (end, d) = wall.nearest_endpoint(p);
    (d <= tolerance).then_some(end)
}

fn not_mergeable(reason: &str) -> crate::error::JoineryError {
    ValidationError::NotMergeable(reason.to_owned()).into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::JoineryError;
    use crate::model::{FloorId, IdGenerator, Intersection, IntersectionId};
    use crate::operations::split::SplitWall;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn wall(id: u64, a: Point2, b: Point2) -> WallSegment {
        WallSegment::new(WallId(id), a, b)
    }

    fn is_not_mergeable(err: &JoineryError) -> bool {
        matches!(err, JoineryError::Validation(ValidationError::NotMergeable(_)))
    }

    #[test]
    fn three_wall_chain_collapses_into_first() {
        let mut ids = IdGenerator::new();
        let walls = vec![
            wall(1, p(0.0, 0.0), p(30.0, 0.0)),
            // Reversed orientation is fine.
            wall(2, p(60.0, 0.0), p(30.0, 0.0)),
            wall(3, p(60.0, 0.0), p(100.0, 0.0)),
        ];
        let mut draft = Draft::new(FloorId(0), walls, Vec::new(), &mut ids);

        let id = MergeWalls::new(vec![WallId(1), WallId(2), WallId(3)])
            .execute(&mut draft)
            .unwrap();

        assert_eq!(id, WallId(1));
        assert_eq!(draft.walls().len(), 1);
        let merged = draft.wall(WallId(1)).unwrap();
        assert_eq!((merged.start, merged.end), (p(0.0, 0.0), p(100.0, 0.0)));
    }

    #[test]
    fn chain_attached_at_start_extends_start() {
        let mut ids = IdGenerator::new();
        let walls = vec![
            wall(1, p(50.0, 0.0), p(100.0, 0.0)),
            wall(2, p(0.0, 0.0), p(50.0, 0.0)),
        ];
        let mut draft = Draft::new(FloorId(0), walls, Vec::new(), &mut ids);
        MergeWalls::new(vec![WallId(1), WallId(2)])
            .execute(&mut draft)
            .unwrap();
        let merged = draft.wall(WallId(1)).unwrap();
        assert_eq!((merged.start, merged.end), (p(0.0, 0.0), p(100.0, 0.0)));
    }

    #[test]
    fn non_collinear_walls_are_rejected_unchanged() {
        let mut ids = IdGenerator::new();
        let walls = vec![
            wall(1, p(0.0, 0.0), p(100.0, 0.0)),
            wall(2, p(100.0, 0.0), p(100.0, 100.0)),
        ];
        let mut draft = Draft::new(FloorId(0), walls.clone(), Vec::new(), &mut ids);
        let err = MergeWalls::new(vec![WallId(1), WallId(2)])
            .execute(&mut draft)
            .unwrap_err();
        assert!(is_not_mergeable(&err));
        assert!(draft.is_unchanged());
        assert_eq!(draft.walls(), walls.as_slice());
    }

    #[test]
    fn differing_material_is_rejected() {
        let mut ids = IdGenerator::new();
        let walls = vec![
            wall(1, p(0.0, 0.0), p(50.0, 0.0)),
            wall(2, p(50.0, 0.0), p(100.0, 0.0)).with_material("glass"),
        ];
        let mut draft = Draft::new(FloorId(0), walls, Vec::new(), &mut ids);
        let err = MergeWalls::new(vec![WallId(1), WallId(2)])
            .execute(&mut draft)
            .unwrap_err();
        assert!(is_not_mergeable(&err));
    }

    #[test]
    fn disconnected_walls_are_rejected() {
        let mut ids = IdGenerator::new();
        let walls = vec![
            wall(1, p(0.0, 0.0), p(40.0, 0.0)),
            wall(2, p(60.0, 0.0), p(100.0, 0.0)),
        ];
        let mut draft = Draft::new(FloorId(0), walls, Vec::new(), &mut ids);
        let err = MergeWalls::new(vec![WallId(1), WallId(2)])
            .with_tolerance(1.0)
            .execute(&mut draft)
            .unwrap_err();
        assert!(is_not_mergeable(&err));
    }

    #[test]
    fn overlapping_walls_are_rejected() {
        let mut ids = IdGenerator::new();
        let walls = vec![
            wall(1, p(0.0, 0.0), p(50.0, 0.0)),
            wall(2, p(50.0, 0.0), p(20.0, 0.0)),
        ];
        let mut draft = Draft::new(FloorId(0), walls, Vec::new(), &mut ids);
        let err = MergeWalls::new(vec![WallId(1), WallId(2)])
            .with_tolerance(1.0)
            .execute(&mut draft)
            .unwrap_err();
        assert!(is_not_mergeable(&err));
    }

    #[test]
    fn split_then_merge_round_trips() {
        let mut ids = IdGenerator::new();
        let original = wall(1, p(0.0, 0.0), p(100.0, 40.0))
            .with_thickness(15.0)
            .with_material("brick");
        let mut draft = Draft::new(FloorId(0), vec![original.clone()], Vec::new(), &mut ids);

        let new_id = SplitWall::new(WallId(1), p(25.0, 10.0))
            .execute(&mut draft)
            .unwrap();
        MergeWalls::new(vec![WallId(1), new_id])
            .execute(&mut draft)
            .unwrap();

        assert_eq!(draft.walls(), &[original]);
    }

    #[test]
    fn junctions_of_absorbed_walls_follow_survivor() {
        let mut ids = IdGenerator::new();
        let walls = vec![
            wall(1, p(0.0, 0.0), p(50.0, 0.0)),
            wall(2, p(50.0, 0.0), p(100.0, 0.0)),
            wall(3, p(50.0, 0.0), p(50.0, 60.0)),
            wall(4, p(100.0, 0.0), p(100.0, 60.0)),
        ];
        let items = vec![
            Intersection::new(
                IntersectionId(1),
                p(50.0, 0.0),
                JunctionKind::Corner,
                [WallId(1), WallId(2)],
            ),
            Intersection::new(
                IntersectionId(2),
                p(50.0, 0.0),
                JunctionKind::Corner,
                [WallId(2), WallId(3)],
            ),
            Intersection::new(
                IntersectionId(3),
                p(100.0, 0.0),
                JunctionKind::Corner,
                [WallId(2), WallId(4)],
            ),
        ];
        let mut draft = Draft::new(FloorId(0), walls, items, &mut ids);

        MergeWalls::new(vec![WallId(1), WallId(2)])
            .with_tolerance(1.0)
            .execute(&mut draft)
            .unwrap();

        let items = draft.intersections();
        assert_eq!(items.len(), 2);
        let tee = items.iter().find(|i| i.id == IntersectionId(2)).unwrap();
        assert_eq!(tee.kind, JunctionKind::TJunction);
        assert_eq!(tee.walls, [WallId(3), WallId(1)]);
        let corner = items.iter().find(|i| i.id == IntersectionId(3)).unwrap();
        assert_eq!(corner.kind, JunctionKind::Corner);
        assert_eq!(corner.walls, [WallId(1), WallId(4)]);
    }
}
