use tracing::debug;

use crate::command::Draft;
use crate::config::DEFAULT_SNAP_TOLERANCE;
use crate::error::{Result, ValidationError};
use crate::math::{distance, is_point_on_segment, project_onto_segment, Point2};
use crate::model::{WallId, WallSegment};

/// Cuts one wall into two at an interior point.
///
/// The point is projected onto the wall. The original wall keeps its id and
/// becomes `[start, point]`; a new wall `[point, end]` with the same
/// thickness, height and material is created.
/// Recorded intersections that now lie on the new half are re-pointed to it.
#[derive(Debug, Clone)]
pub struct SplitWall {
    wall: WallId,
    point: Point2,
    tolerance: f64,
}

impl SplitWall {
    /// Creates a new `SplitWall` operation with the default snap tolerance.
    #[must_use]
    pub fn new(wall: WallId, point: Point2) -> Self {
        Self {
            wall,
            point,
            tolerance: DEFAULT_SNAP_TOLERANCE,
        }
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Checks that the point is a valid split point of `wall`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::PointOutOfTolerance` if the point is not on
    /// the wall, or `ValidationError::SplitAtEndpoint` if it is on an end.
    pub fn validate(&self, wall: &WallSegment) -> Result<()> {
        if !is_point_on_segment(&self.point, &wall.segment(), self.tolerance) {
            return Err(ValidationError::PointOutOfTolerance {
                x: self.point.x,
                y: self.point.y,
                tolerance: self.tolerance,
            }
            .into());
        }
        if wall.nearest_endpoint(&self.point).1 <= self.tolerance {
            return Err(ValidationError::SplitAtEndpoint(wall.id).into());
        }
        Ok(())
    }

    /// Executes the split on the draft, returning the id of the new wall.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the wall is missing or the point is not
    /// a valid split point. The draft is left untouched in that case.
    pub fn execute(&self, draft: &mut Draft<'_>) -> Result<WallId> {
        let wall = draft.require_wall(self.wall)?.clone();
        self.validate(&wall)?;

        let (_, at) = project_onto_segment(&self.point, &wall.segment());
        let new_id = draft.fresh_wall_id();
        let first = wall.derive(wall.id, wall.start, at);
        let second = wall.derive(new_id, at, wall.end);

        let mark = draft.checkpoint();
        let result = draft
            .update_wall(first)
            .and_then(|()| draft.add_wall(second))
            .and_then(|()| self.repoint_intersections(draft, &wall, new_id, &at));
        if let Err(e) = result {
            draft.rollback(mark);
            return Err(e);
        }

        debug!(wall = %wall.id, new = %new_id, x = at.x, y = at.y, "split wall");
        Ok(new_id)
    }

    fn repoint_intersections(
        &self,
        draft: &mut Draft<'_>,
        original: &WallSegment,
        new_id: WallId,
        at: &Point2,
    ) -> Result<()> {
        let seg = original.segment();
        let (t_split, _) = project_onto_segment(at, &seg);

        let moved: Vec<_> = draft
            .intersections()
            .iter()
            .filter(|i| i.references(original.id))
            .filter(|i| {
                let (t, _) = project_onto_segment(&i.point, &seg);
                t > t_split && distance(&i.point, at) > self.tolerance
            })
            .map(|i| i.repointed(original.id, new_id))
            .collect();

        for item in moved {
            draft.update_intersection(item)?;
        }
        Ok(())
    }
}
