//! Reversible edits.
//!
//! A [`Command`] is a list of [`Mutation`]s carrying explicit before/after
//! values. Operations build commands on a [`Draft`] without touching shared
//! state; [`Command::apply`] re-validates every `before` value and then
//! applies the whole list in one step.

mod draft;
mod history;

pub use draft::Draft;
pub use history::History;

use std::collections::HashMap;

use crate::error::CommandError;
use crate::model::{FloorId, Intersection, IntersectionId, WallId, WallPatch, WallSegment};
use crate::repository::{ElementRepository, IntersectionSet};

/// One primitive change of walls or intersections.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    AddWall(WallSegment),
    UpdateWall {
        before: WallSegment,
        after: WallSegment,
    },
    RemoveWall(WallSegment),
    AddIntersection(Intersection),
    UpdateIntersection {
        before: Intersection,
        after: Intersection,
    },
    RemoveIntersection(Intersection),
}

impl Mutation {
    /// The mutation that undoes this one.
    #[must_use]
    pub fn inverse(&self) -> Self {
        match self {
            Self::AddWall(w) => Self::RemoveWall(w.clone()),
            Self::RemoveWall(w) => Self::AddWall(w.clone()),
            Self::UpdateWall { before, after } => Self::UpdateWall {
                before: after.clone(),
                after: before.clone(),
            },
            Self::AddIntersection(i) => Self::RemoveIntersection(i.clone()),
            Self::RemoveIntersection(i) => Self::AddIntersection(i.clone()),
            Self::UpdateIntersection { before, after } => Self::UpdateIntersection {
                before: after.clone(),
                after: before.clone(),
            },
        }
    }
}

/// A named, atomic set of mutations on one floor: one undo step.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub description: String,
    pub floor: FloorId,
    pub mutations: Vec<Mutation>,
}

impl Command {
    #[must_use]
    pub fn new(description: impl Into<String>, floor: FloorId, mutations: Vec<Mutation>) -> Self {
        Self {
            description: description.into(),
            floor,
            mutations,
        }
    }

    /// The command that reverts this one.
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self {
            description: self.description.clone(),
            floor: self.floor,
            mutations: self.mutations.iter().rev().map(Mutation::inverse).collect(),
        }
    }

    /// Ids of walls created by this command.
    #[must_use]
    pub fn added_walls(&self) -> Vec<WallId> {
        self.mutations
            .iter()
            .filter_map(|m| match m {
                Mutation::AddWall(w) => Some(w.id),
                _ => None,
            })
            .collect()
    }

    /// Checks every `before` value against current state, then applies all
    /// mutations. On a mismatch nothing is applied.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Stale` if the repository or intersection set
    /// no longer matches the state the command was built from.
    pub fn apply<R: ElementRepository + ?Sized>(
        &self,
        repo: &mut R,
        intersections: &mut IntersectionSet,
    ) -> Result<(), CommandError> {
        self.check(repo, intersections)?;

        for m in &self.mutations {
            match m {
                Mutation::AddWall(w) => repo.add(self.floor, w.clone()),
                Mutation::UpdateWall { after, .. } => {
                    repo.update(self.floor, after.id, &WallPatch::replace_with(after));
                }
                Mutation::RemoveWall(w) => {
                    repo.remove(self.floor, w.id);
                }
                Mutation::AddIntersection(i) => intersections.insert(i.clone()),
                Mutation::UpdateIntersection { after, .. } => intersections.insert(after.clone()),
                Mutation::RemoveIntersection(i) => {
                    intersections.remove(i.id);
                }
            }
        }
        Ok(())
    }

    /// Replays the mutations against a shadow copy of the touched entries.
    fn check<R: ElementRepository + ?Sized>(
        &self,
        repo: &R,
        intersections: &IntersectionSet,
    ) -> Result<(), CommandError> {
        let mut walls: HashMap<WallId, Option<WallSegment>> = HashMap::new();
        let mut items: HashMap<IntersectionId, Option<Intersection>> = HashMap::new();

        for m in &self.mutations {
            match m {
                Mutation::AddWall(w) => {
                    let slot = walls.entry(w.id).or_insert_with(|| repo.get(self.floor, w.id));
                    if slot.is_some() {
                        return Err(CommandError::Stale(format!("{} already exists", w.id)));
                    }
                    *slot = Some(w.clone());
                }
                Mutation::UpdateWall { before, after } => {
                    let slot = walls
                        .entry(before.id)
                        .or_insert_with(|| repo.get(self.floor, before.id));
                    if slot.as_ref() != Some(before) {
                        return Err(CommandError::Stale(format!("{} has changed", before.id)));
                    }
                    *slot = Some(after.clone());
                }
                Mutation::RemoveWall(w) => {
                    let slot = walls.entry(w.id).or_insert_with(|| repo.get(self.floor, w.id));
                    if slot.as_ref() != Some(w) {
                        return Err(CommandError::Stale(format!("{} has changed", w.id)));
                    }
                    *slot = None;
                }
                Mutation::AddIntersection(i) => {
                    let slot = items
                        .entry(i.id)
                        .or_insert_with(|| intersections.get(i.id).cloned());
                    if slot.is_some() {
                        return Err(CommandError::Stale(format!("{} already exists", i.id)));
                    }
                    *slot = Some(i.clone());
                }
                Mutation::UpdateIntersection { before, after } => {
                    let slot = items
                        .entry(before.id)
                        .or_insert_with(|| intersections.get(before.id).cloned());
                    if slot.as_ref() != Some(before) {
                        return Err(CommandError::Stale(format!("{} has changed", before.id)));
                    }
                    *slot = Some(after.clone());
                }
                Mutation::RemoveIntersection(i) => {
                    let slot = items
                        .entry(i.id)
                        .or_insert_with(|| intersections.get(i.id).cloned());
                    if slot.as_ref() != Some(i) {
                        return Err(CommandError::Stale(format!("{} has changed", i.id)));
                    }
                    *slot = None;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;
    use crate::repository::InMemoryRepository;

    const FLOOR: FloorId = FloorId(0);

    fn wall(id: u64, x1: f64) -> WallSegment {
        WallSegment::new(WallId(id), Point2::new(0.0, 0.0), Point2::new(x1, 0.0))
    }

    #[test]
    fn apply_then_inverse_restores_state() {
        let mut repo = InMemoryRepository::with_walls(FLOOR, [wall(1, 10.0)]);
        let mut set = IntersectionSet::new();
        let cmd = Command::new(
            "stretch",
            FLOOR,
            vec![
                Mutation::UpdateWall {
                    before: wall(1, 10.0),
                    after: wall(1, 20.0),
                },
                Mutation::AddWall(wall(2, 5.0)),
            ],
        );
        cmd.apply(&mut repo, &mut set).unwrap();
        assert_eq!(repo.get(FLOOR, WallId(1)).unwrap().end.x, 20.0);
        assert!(repo.get(FLOOR, WallId(2)).is_some());

        cmd.inverse().apply(&mut repo, &mut set).unwrap();
        assert_eq!(repo.list(FLOOR), vec![wall(1, 10.0)]);
    }

    #[test]
    fn stale_command_mutates_nothing() {
        let mut repo = InMemoryRepository::with_walls(FLOOR, [wall(1, 10.0)]);
        let mut set = IntersectionSet::new();
        let cmd = Command::new(
            "two edits",
            FLOOR,
            vec![
                Mutation::AddWall(wall(3, 4.0)),
                // Wall 2 does not exist, so the whole command is rejected.
                Mutation::RemoveWall(wall(2, 5.0)),
            ],
        );
        let err = cmd.apply(&mut repo, &mut set).unwrap_err();
        assert!(matches!(err, CommandError::Stale(_)));
        assert_eq!(repo.list(FLOOR).len(), 1);
    }

    #[test]
    fn sequential_updates_of_one_wall_validate() {
        let mut repo = InMemoryRepository::with_walls(FLOOR, [wall(1, 10.0)]);
        let mut set = IntersectionSet::new();
        let cmd = Command::new(
            "two steps",
            FLOOR,
            vec![
                Mutation::UpdateWall {
                    before: wall(1, 10.0),
                    after: wall(1, 12.0),
                },
                Mutation::UpdateWall {
                    before: wall(1, 12.0),
                    after: wall(1, 14.0),
                },
            ],
        );
        cmd.apply(&mut repo, &mut set).unwrap();
        assert_eq!(repo.get(FLOOR, WallId(1)).unwrap().end.x, 14.0);
    }
}
