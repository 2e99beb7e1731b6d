use tracing::{debug, info, warn};

use crate::command::Draft;
use crate::config::JoinConfig;
use crate::error::{Result, ValidationError};
use crate::math::{distance, points_coincide, Point2, DEFAULT_TOLERANCE};
use crate::model::{Junction, JunctionKind, WallSegment};

use super::detect::{compare_by_position, DetectIntersections};
use super::resolve::{role_of, Resolution, ResolveJunction, WallRole};

/// What one auto-join pass did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutoJoinReport {
    /// Junctions resolved, in resolution order.
    pub resolved: Vec<Resolution>,
    /// Candidates the resolver refused.
    pub skipped: Vec<Junction>,
}

impl AutoJoinReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

/// Joins every corner and T-junction within tolerance.
///
/// Detection is re-run after each resolution, and the first candidate that
/// still needs work is resolved next. Candidates are ordered corners first,
/// then T-junctions, each by point (x, then y) and wall ids, so a wall that a
/// corner join is about to shorten is never split first. Crossings are left
/// alone. A candidate within tolerance of a recorded junction that shares one
/// of its walls is pulled onto the recorded point, keeping multi-wall
/// junctions coincident.
///
/// An end already sitting on a recorded junction point is pinned: a
/// candidate that would pull it elsewhere is left alone.
///
/// A layout where every candidate is settled (ends exactly on the point and
/// the point recorded) produces no mutations, so a second pass is a no-op.
#[derive(Debug, Clone)]
pub struct AutoJoin {
    tolerance: f64,
    pass_limit_factor: usize,
}

impl AutoJoin {
    #[must_use]
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            pass_limit_factor: JoinConfig::default().pass_limit_factor,
        }
    }

    #[must_use]
    pub fn from_config(config: &JoinConfig) -> Self {
        Self {
            tolerance: config.tolerance,
            pass_limit_factor: config.pass_limit_factor,
        }
    }

    #[must_use]
    pub fn with_pass_limit_factor(mut self, factor: usize) -> Self {
        self.pass_limit_factor = factor;
        self
    }

    /// Runs the pass on the draft. Resolver refusals are collected in
    /// [`AutoJoinReport::skipped`] and leave the draft as it was.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NotConverged` when the pass limit is hit;
    /// the draft is rolled back to where the pass started.
    pub fn execute(&self, draft: &mut Draft<'_>) -> Result<AutoJoinReport> {
        let detector = DetectIntersections::new(self.tolerance);
        let limit = self.pass_limit_factor * (draft.walls().len() + 1).pow(2);
        let start = draft.checkpoint();
        let mut report = AutoJoinReport::default();

        loop {
            let mut candidates: Vec<Junction> = detector
                .execute(draft.walls())
                .into_iter()
                .filter(|j| j.kind != JunctionKind::Cross)
                .collect();
            candidates.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| compare_by_position(a, b)));

            let next = candidates
                .iter()
                .filter(|c| !report.skipped.iter().any(|s| self.same_candidate(s, c)))
                .find_map(|c| self.pending(draft, c));
            let Some(target) = next else {
                break;
            };
            if report.resolved.len() + report.skipped.len() >= limit {
                warn!(limit, resolved = report.resolved.len(), "auto-join stopped at pass limit");
                draft.rollback(start);
                return Err(ValidationError::NotConverged(limit).into());
            }

            let mark = draft.checkpoint();
            match ResolveJunction::from_junction(&target)
                .with_tolerance(self.tolerance)
                .execute(draft)
            {
                Ok(resolution) if draft.checkpoint() > mark => report.resolved.push(resolution),
                Ok(_) => report.skipped.push(target),
                Err(e) => {
                    debug!(
                        error = %e,
                        a = %target.walls[0],
                        b = %target.walls[1],
                        "auto-join skipped candidate"
                    );
                    report.skipped.push(target);
                }
            }
        }

        info!(
            resolved = report.resolved.len(),
            skipped = report.skipped.len(),
            "auto-join pass finished"
        );
        Ok(report)
    }

    /// The candidate to resolve, anchored to the nearest recorded point, or
    /// `None` when it is already settled or would move a pinned end.
    fn pending(&self, draft: &Draft<'_>, candidate: &Junction) -> Option<Junction> {
        let point = draft
            .intersections()
            .iter()
            .filter(|i| {
                candidate.walls.iter().any(|w| i.references(*w))
                    && points_coincide(&i.point, &candidate.point, self.tolerance)
            })
            .min_by(|a, b| {
                let da = distance(&a.point, &candidate.point);
                da.total_cmp(&distance(&b.point, &candidate.point))
            })
            .map_or(candidate.point, |i| i.point);

        let walls: Vec<&WallSegment> = candidate
            .walls
            .iter()
            .filter_map(|id| draft.wall(*id))
            .collect();
        if walls.iter().any(|w| self.moves_pinned_end(draft, w, &point)) {
            return None;
        }
        let settled_geometry = walls.iter().all(|w| self.is_settled(w, &point));
        let recorded = draft
            .intersections()
            .iter()
            .any(|i| points_coincide(&i.point, &point, self.settle_tolerance()));

        if settled_geometry && recorded {
            return None;
        }
        Some(Junction {
            point,
            kind: candidate.kind,
            walls: candidate.walls,
        })
    }

    fn is_settled(&self, wall: &WallSegment, point: &Point2) -> bool {
        match role_of(wall, point, self.tolerance) {
            WallRole::Endpoint(end) => {
                points_coincide(&wall.endpoint(end), point, self.settle_tolerance())
            }
            WallRole::Interior | WallRole::Off(_) => false,
        }
    }

    /// Whether resolving at `point` would drag an end of `wall` off the
    /// recorded junction it already sits on.
    fn moves_pinned_end(&self, draft: &Draft<'_>, wall: &WallSegment, point: &Point2) -> bool {
        let WallRole::Endpoint(end) = role_of(wall, point, self.tolerance) else {
            return false;
        };
        let current = wall.endpoint(end);
        !points_coincide(&current, point, self.settle_tolerance())
            && draft
                .intersections()
                .iter()
                .any(|i| points_coincide(&i.point, &current, self.settle_tolerance()))
    }

    fn settle_tolerance(&self) -> f64 {
        self.tolerance.min(DEFAULT_TOLERANCE)
    }

    fn same_candidate(&self, a: &Junction, b: &Junction) -> bool {
        let same_pair = a.walls == b.walls || a.walls == [b.walls[1], b.walls[0]];
        same_pair && points_coincide(&a.point, &b.point, self.tolerance)
    }
}
