use crate::error::{GeometryError, Result, ValidationError};
use crate::model::{FloorId, IdGenerator, Intersection, IntersectionId, WallId, WallSegment};

use super::{Command, Mutation};

/// A working copy of one floor on which operations plan their edits.
///
/// Every change is applied to the copy and logged as a [`Mutation`], so
/// several operations can compose into a single [`Command`]. Nothing leaves
/// the draft until [`into_command`](Self::into_command) is committed.
#[derive(Debug)]
pub struct Draft<'a> {
    floor: FloorId,
    walls: Vec<WallSegment>,
    intersections: Vec<Intersection>,
    ids: &'a mut IdGenerator,
    mutations: Vec<Mutation>,
}

impl<'a> Draft<'a> {
    /// Creates a draft over a snapshot of walls and recorded intersections.
    pub fn new(
        floor: FloorId,
        walls: Vec<WallSegment>,
        intersections: Vec<Intersection>,
        ids: &'a mut IdGenerator,
    ) -> Self {
        ids.observe_walls(&walls);
        ids.observe_intersections(&intersections);
        Self {
            floor,
            walls,
            intersections,
            ids,
            mutations: Vec::new(),
        }
    }

    #[must_use]
    pub fn floor(&self) -> FloorId {
        self.floor
    }

    #[must_use]
    pub fn walls(&self) -> &[WallSegment] {
        &self.walls
    }

    #[must_use]
    pub fn wall(&self, id: WallId) -> Option<&WallSegment> {
        self.walls.iter().find(|w| w.id == id)
    }

    /// Looks up a wall, failing validation if it is missing.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::WallNotFound` if no wall has this id.
    pub fn require_wall(&self, id: WallId) -> Result<&WallSegment> {
        self.wall(id)
            .ok_or_else(|| ValidationError::WallNotFound(id).into())
    }

    #[must_use]
    pub fn intersections(&self) -> &[Intersection] {
        &self.intersections
    }

    #[must_use]
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn fresh_wall_id(&mut self) -> WallId {
        self.ids.fresh_wall()
    }

    pub fn fresh_intersection_id(&mut self) -> IntersectionId {
        self.ids.fresh_intersection()
    }

    /// Adds a new wall.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::ZeroLengthWall` for a degenerate wall.
    pub fn add_wall(&mut self, wall: WallSegment) -> Result<()> {
        if wall.is_degenerate() {
            return Err(GeometryError::ZeroLengthWall(wall.id).into());
        }
        self.mutations.push(Mutation::AddWall(wall.clone()));
        self.walls.push(wall);
        Ok(())
    }

    /// Replaces the wall with the same id. Identical values are a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::WallNotFound` if the wall is missing, or
    /// `GeometryError::ZeroLengthWall` if the update would collapse it.
    pub fn update_wall(&mut self, after: WallSegment) -> Result<()> {
        let slot = self
            .walls
            .iter_mut()
            .find(|w| w.id == after.id)
            .ok_or(ValidationError::WallNotFound(after.id))?;
        if *slot == after {
            return Ok(());
        }
        if after.is_degenerate() {
            return Err(GeometryError::ZeroLengthWall(after.id).into());
        }
        let before = std::mem::replace(slot, after.clone());
        self.mutations.push(Mutation::UpdateWall { before, after });
        Ok(())
    }

    /// Removes a wall and every recorded intersection referencing it.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::WallNotFound` if the wall is missing.
    pub fn remove_wall(&mut self, id: WallId) -> Result<WallSegment> {
        let idx = self
            .walls
            .iter()
            .position(|w| w.id == id)
            .ok_or(ValidationError::WallNotFound(id))?;

        let dangling: Vec<IntersectionId> = self
            .intersections
            .iter()
            .filter(|i| i.references(id))
            .map(|i| i.id)
            .collect();
        for item in dangling {
            self.remove_intersection(item)?;
        }

        let wall = self.walls.remove(idx);
        self.mutations.push(Mutation::RemoveWall(wall.clone()));
        Ok(wall)
    }

    /// Records an intersection.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the wall ids are equal or unknown.
    pub fn add_intersection(&mut self, item: Intersection) -> Result<()> {
        self.check_pair(item.walls)?;
        self.mutations.push(Mutation::AddIntersection(item.clone()));
        self.intersections.push(item);
        Ok(())
    }

    /// Replaces the recorded intersection with the same id.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the intersection or its walls are missing.
    pub fn update_intersection(&mut self, after: Intersection) -> Result<()> {
        self.check_pair(after.walls)?;
        let slot = self
            .intersections
            .iter_mut()
            .find(|i| i.id == after.id)
            .ok_or(ValidationError::IntersectionNotFound(after.id))?;
        if *slot == after {
            return Ok(());
        }
        let before = std::mem::replace(slot, after.clone());
        self.mutations
            .push(Mutation::UpdateIntersection { before, after });
        Ok(())
    }

    /// Removes a recorded intersection.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::IntersectionNotFound` if it is missing.
    pub fn remove_intersection(&mut self, id: IntersectionId) -> Result<Intersection> {
        let idx = self
            .intersections
            .iter()
            .position(|i| i.id == id)
            .ok_or(ValidationError::IntersectionNotFound(id))?;
        let item = self.intersections.remove(idx);
        self.mutations.push(Mutation::RemoveIntersection(item.clone()));
        Ok(item)
    }

    /// Marks the current position in the mutation log.
    #[must_use]
    pub fn checkpoint(&self) -> usize {
        self.mutations.len()
    }

    /// Reverts the working copy to an earlier [`checkpoint`](Self::checkpoint).
    pub fn rollback(&mut self, mark: usize) {
        while self.mutations.len() > mark {
            let Some(m) = self.mutations.pop() else {
                break;
            };
            match m {
                Mutation::AddWall(w) => self.walls.retain(|x| x.id != w.id),
                Mutation::UpdateWall { before, .. } => {
                    if let Some(slot) = self.walls.iter_mut().find(|x| x.id == before.id) {
                        *slot = before;
                    }
                }
                Mutation::RemoveWall(w) => self.walls.push(w),
                Mutation::AddIntersection(i) => self.intersections.retain(|x| x.id != i.id),
                Mutation::UpdateIntersection { before, .. } => {
                    if let Some(slot) = self.intersections.iter_mut().find(|x| x.id == before.id) {
                        *slot = before;
                    }
                }
                Mutation::RemoveIntersection(i) => self.intersections.push(i),
            }
        }
        self.walls.sort_by_key(|w| w.id);
        self.intersections.sort_by_key(|i| i.id);
    }

    /// Finishes the draft. Returns `None` if nothing changed.
    #[must_use]
    pub fn into_command(self, description: impl Into<String>) -> Option<Command> {
        if self.mutations.is_empty() {
            return None;
        }
        Some(Command::new(description, self.floor, self.mutations))
    }

    fn check_pair(&self, walls: [WallId; 2]) -> Result<()> {
        if walls[0] == walls[1] {
            return Err(ValidationError::SameWall(walls[0]).into());
        }
        for id in walls {
            self.require_wall(id)?;
        }
        Ok(())
    }
}
