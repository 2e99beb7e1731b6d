//! Command facade over a wall repository.
//!
//! Every mutating call reads a fresh snapshot of one floor, plans its edits
//! on a [`Draft`], and commits the resulting
//! [`Command`](crate::command::Command) through the
//! [`History`] as a single undo step. Failed validation leaves the floor and
//! the history untouched.

use std::collections::BTreeMap;

use tracing::debug;

use crate::command::{Draft, History};
use crate::config::{HistoryConfig, JoinConfig};
use crate::error::Result;
use crate::math::Point2;
use crate::model::{
    FloorId, IdGenerator, Intersection, IntersectionId, Junction, WallId, WallSegment,
};
use crate::operations::{
    validate_intersection, AutoJoin, AutoJoinReport, DetectIntersections, JoinPreview,
    JoinPreviewQuery, MergeWalls, Resolution, ResolveJunction, SplitWall,
};
use crate::repository::{ElementRepository, IntersectionSet};

/// Wall-joining editor for all floors of one repository.
#[derive(Debug)]
pub struct FloorPlanEditor<R: ElementRepository> {
    repo: R,
    intersections: BTreeMap<FloorId, IntersectionSet>,
    history: History,
    ids: IdGenerator,
    config: JoinConfig,
}

impl<R: ElementRepository> FloorPlanEditor<R> {
    /// Creates an editor with default join and history settings.
    pub fn new(repo: R) -> Self {
        Self::with_config(repo, JoinConfig::default(), HistoryConfig::default())
    }

    pub fn with_config(repo: R, config: JoinConfig, history: HistoryConfig) -> Self {
        Self {
            repo,
            intersections: BTreeMap::new(),
            history: History::new(history),
            ids: IdGenerator::new(),
            config,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Direct repository access. Writes made here bypass the history;
    /// intersections left dangling by them are pruned on the next edit.
    pub fn repository_mut(&mut self) -> &mut R {
        &mut self.repo
    }

    pub fn config(&self) -> &JoinConfig {
        &self.config
    }

    /// Recorded intersections of `floor`, ordered by id.
    #[must_use]
    pub fn intersections(&self, floor: FloorId) -> Vec<Intersection> {
        self.intersections
            .get(&floor)
            .map(IntersectionSet::to_vec)
            .unwrap_or_default()
    }

    /// Finds every pairwise wall meeting on `floor` without mutating it.
    #[must_use]
    pub fn detect_intersections(&self, floor: FloorId) -> Vec<Junction> {
        DetectIntersections::new(self.config.tolerance).execute(&self.repo.list(floor))
    }

    /// Whether walls `a` and `b` may be joined at `point`.
    #[must_use]
    pub fn validate_intersection(
        &self,
        floor: FloorId,
        a: WallId,
        b: WallId,
        point: Point2,
    ) -> bool {
        let walls = self.repo.list(floor);
        match validate_intersection(&walls, a, b, &point, self.config.tolerance) {
            Ok(()) => true,
            Err(e) => {
                debug!(floor = floor.0, a = %a, b = %b, error = %e, "intersection rejected");
                false
            }
        }
    }

    /// Resolves a detected junction.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the junction no longer matches the
    /// walls, or a command error if the commit is stale.
    pub fn resolve_intersection(
        &mut self,
        floor: FloorId,
        junction: &Junction,
    ) -> Result<Resolution> {
        let op = ResolveJunction::from_junction(junction).with_tolerance(self.config.tolerance);
        self.plan(floor, "resolve intersection", |draft| op.execute(draft))
    }

    /// Joins two walls at a caller-chosen point.
    ///
    /// # Errors
    ///
    /// Returns a validation error for missing or identical walls or a point
    /// out of tolerance of both walls.
    pub fn create_manual_intersection(
        &mut self,
        floor: FloorId,
        a: WallId,
        b: WallId,
        point: Point2,
    ) -> Result<Resolution> {
        let op = ResolveJunction::manual(a, b, point).with_tolerance(self.config.tolerance);
        self.plan(floor, "create intersection", |draft| op.execute(draft))
    }

    /// Splits a wall at an interior point, returning the new wall's id.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the point is off the wall or on one of
    /// its ends.
    pub fn split_wall(&mut self, floor: FloorId, wall: WallId, point: Point2) -> Result<WallId> {
        let op = SplitWall::new(wall, point).with_tolerance(self.config.tolerance);
        self.plan(floor, "split wall", |draft| op.execute(draft))
    }

    /// Merges a chain of collinear walls into the first one.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NotMergeable` if the walls are not a
    /// collinear chain of identical build-up.
    pub fn merge_walls(&mut self, floor: FloorId, walls: &[WallId]) -> Result<WallId> {
        let op = MergeWalls::new(walls.to_vec()).with_tolerance(self.config.tolerance);
        self.plan(floor, "merge walls", |draft| op.execute(draft))
    }

    /// Joins every corner and T-junction on `floor` as one undo step.
    /// A pass with nothing to do records nothing.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NotConverged` if the pass limit is hit, in
    /// which case nothing is committed, or a command error if the commit is
    /// stale.
    pub fn auto_join_walls(
        &mut self,
        floor: FloorId,
        tolerance: Option<f64>,
    ) -> Result<AutoJoinReport> {
        let config = match tolerance {
            Some(t) => self.config.clone().with_tolerance(t),
            None => self.config.clone(),
        };
        let op = AutoJoin::from_config(&config);
        self.plan(floor, "auto-join walls", |draft| op.execute(draft))
    }

    /// What [`create_manual_intersection`](Self::create_manual_intersection)
    /// would do, without doing it.
    #[must_use]
    pub fn join_preview(
        &self,
        floor: FloorId,
        a: WallId,
        b: WallId,
        point: Point2,
        tolerance: Option<f64>,
    ) -> JoinPreview {
        let walls = self.repo.list(floor);
        let items = self.intersections(floor);
        JoinPreviewQuery::new(a, b, point)
            .with_tolerance(tolerance.unwrap_or(self.config.tolerance))
            .run(floor, &walls, &items, &self.ids)
    }

    /// Adds a wall with default build-up.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::ZeroLengthWall` if `start == end`.
    pub fn add_wall(&mut self, floor: FloorId, start: Point2, end: Point2) -> Result<WallId> {
        self.plan(floor, "add wall", |draft| {
            let id = draft.fresh_wall_id();
            draft.add_wall(WallSegment::new(id, start, end))?;
            Ok(id)
        })
    }

    /// Removes a wall together with its intersections.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::WallNotFound` if the wall is missing.
    pub fn remove_wall(&mut self, floor: FloorId, wall: WallId) -> Result<()> {
        self.plan(floor, "remove wall", |draft| draft.remove_wall(wall).map(|_| ()))
    }

    /// Removes a recorded intersection; the walls stay as they are.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::IntersectionNotFound` if it is missing.
    pub fn remove_intersection(&mut self, floor: FloorId, id: IntersectionId) -> Result<()> {
        self.plan(floor, "remove intersection", |draft| {
            draft.remove_intersection(id).map(|_| ())
        })
    }

    /// Reverts the most recent edit.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::NothingToUndo` or `CommandError::Stale`.
    pub fn undo(&mut self) -> Result<()> {
        Ok(self.history.undo(&mut self.repo, &mut self.intersections)?)
    }

    /// Re-applies the most recently undone edit.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::NothingToRedo` or `CommandError::Stale`.
    pub fn redo(&mut self) -> Result<()> {
        Ok(self.history.redo(&mut self.repo, &mut self.intersections)?)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Runs `edit` on a draft of `floor` and commits whatever it changed.
    fn plan<T>(
        &mut self,
        floor: FloorId,
        description: &str,
        edit: impl FnOnce(&mut Draft<'_>) -> Result<T>,
    ) -> Result<T> {
        let walls = self.repo.list(floor);
        let set = self.intersections.entry(floor).or_default();
        let dropped = set.retain_valid(&walls);
        if !dropped.is_empty() {
            debug!(floor = floor.0, count = dropped.len(), "pruned dangling intersections");
        }

        let mut draft = Draft::new(floor, walls, set.to_vec(), &mut self.ids);
        let out = edit(&mut draft)?;
        if let Some(command) = draft.into_command(description) {
            self.history.execute(command, &mut self.repo, set)?;
        }
        Ok(out)
    }
}
