use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::config::HistoryConfig;
use crate::error::CommandError;
use crate::model::FloorId;
use crate::repository::{ElementRepository, IntersectionSet};

use super::Command;

/// Undo/redo stacks of committed commands.
///
/// Every entry is one user action. Executing a new command clears the redo
/// stack; the undo stack is bounded by [`HistoryConfig::max_depth`].
#[derive(Debug, Default)]
pub struct History {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    config: HistoryConfig,
}

impl History {
    #[must_use]
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            config,
        }
    }

    /// Applies a command and records it as one undo step.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Stale` if the command no longer matches the
    /// repository; nothing is applied or recorded then.
    pub fn execute<R: ElementRepository + ?Sized>(
        &mut self,
        command: Command,
        repo: &mut R,
        intersections: &mut IntersectionSet,
    ) -> Result<(), CommandError> {
        command.apply(repo, intersections)?;
        info!(
            description = %command.description,
            floor = command.floor.0,
            mutations = command.mutations.len(),
            "command executed"
        );
        self.record(command);
        Ok(())
    }

    /// Reverts the most recent command.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::NothingToUndo` on an empty stack, or
    /// `CommandError::Stale` if the floor changed outside the history; the
    /// command then stays on the undo stack.
    pub fn undo<R: ElementRepository + ?Sized>(
        &mut self,
        repo: &mut R,
        intersections: &mut BTreeMap<FloorId, IntersectionSet>,
    ) -> Result<(), CommandError> {
        let command = self.undo_stack.pop().ok_or(CommandError::NothingToUndo)?;
        let set = intersections.entry(command.floor).or_default();
        if let Err(e) = command.inverse().apply(repo, set) {
            warn!(description = %command.description, error = %e, "undo rejected");
            self.undo_stack.push(command);
            return Err(e);
        }
        info!(description = %command.description, "undo");
        self.redo_stack.push(command);
        Ok(())
    }

    /// Re-applies the most recently undone command.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::NothingToRedo` on an empty stack, or
    /// `CommandError::Stale` if the floor changed since the undo; the command
    /// then stays on the redo stack.
    pub fn redo<R: ElementRepository + ?Sized>(
        &mut self,
        repo: &mut R,
        intersections: &mut BTreeMap<FloorId, IntersectionSet>,
    ) -> Result<(), CommandError> {
        let command = self.redo_stack.pop().ok_or(CommandError::NothingToRedo)?;
        let set = intersections.entry(command.floor).or_default();
        if let Err(e) = command.apply(repo, set) {
            warn!(description = %command.description, error = %e, "redo rejected");
            self.redo_stack.push(command);
            return Err(e);
        }
        info!(description = %command.description, "redo");
        self.undo_stack.push(command);
        Ok(())
    }

    fn record(&mut self, command: Command) {
        self.redo_stack.clear();
        self.undo_stack.push(command);
        if self.undo_stack.len() > self.config.max_depth {
            let overflow = self.undo_stack.len() - self.config.max_depth;
            self.undo_stack.drain(..overflow);
            debug!(overflow, "dropped oldest undo entries");
        }
    }

    /// Whether there is a command to undo.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether there is an undone command to redo.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Description of the command the next undo reverts.
    #[must_use]
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.last().map(|c| c.description.as_str())
    }

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::command::Mutation;
    use crate::math::Point2;
    use crate::model::{WallId, WallSegment};
    use crate::repository::InMemoryRepository;

    const FLOOR: FloorId = FloorId(0);

    fn wall(id: u64, len: f64) -> WallSegment {
        WallSegment::new(WallId(id), Point2::new(0.0, 0.0), Point2::new(len, 0.0))
    }

    fn add(id: u64) -> Command {
        Command::new(format!("add {id}"), FLOOR, vec![Mutation::AddWall(wall(id, 10.0))])
    }

    #[test]
    fn undo_then_redo_restores_state() {
        let mut repo = InMemoryRepository::new();
        let mut sets = BTreeMap::new();
        let mut history = History::default();

        history
            .execute(add(1), &mut repo, sets.entry(FLOOR).or_default())
            .unwrap();
        assert_eq!(repo.len(FLOOR), 1);

        history.undo(&mut repo, &mut sets).unwrap();
        assert!(repo.is_empty(FLOOR));
        assert!(history.can_redo());

        history.redo(&mut repo, &mut sets).unwrap();
        assert_eq!(repo.get(FLOOR, WallId(1)), Some(wall(1, 10.0)));
        assert!(!history.can_redo());
    }

    #[test]
    fn execute_clears_redo() {
        let mut repo = InMemoryRepository::new();
        let mut sets = BTreeMap::new();
        let mut history = History::default();

        history.execute(add(1), &mut repo, sets.entry(FLOOR).or_default()).unwrap();
        history.undo(&mut repo, &mut sets).unwrap();
        history.execute(add(2), &mut repo, sets.entry(FLOOR).or_default()).unwrap();
        assert!(!history.can_redo());
        assert_eq!(history.undo_description(), Some("add 2"));
    }

    #[test]
    fn empty_stacks_report_errors() {
        let mut repo = InMemoryRepository::new();
        let mut sets = BTreeMap::new();
        let mut history = History::default();
        assert_eq!(history.undo(&mut repo, &mut sets), Err(CommandError::NothingToUndo));
        assert_eq!(history.redo(&mut repo, &mut sets), Err(CommandError::NothingToRedo));
    }

    #[test]
    fn stale_undo_keeps_the_entry() {
        let mut repo = InMemoryRepository::new();
        let mut sets = BTreeMap::new();
        let mut history = History::default();
        history.execute(add(1), &mut repo, sets.entry(FLOOR).or_default()).unwrap();

        // Changed behind the history's back.
        repo.add(FLOOR, wall(1, 99.0));
        let err = history.undo(&mut repo, &mut sets).unwrap_err();
        assert!(matches!(err, CommandError::Stale(_)));
        assert!(history.can_undo());
        assert_eq!(repo.get(FLOOR, WallId(1)), Some(wall(1, 99.0)));
    }

    #[test]
    fn depth_is_bounded() {
        let mut repo = InMemoryRepository::new();
        let mut sets: BTreeMap<FloorId, IntersectionSet> = BTreeMap::new();
        let mut history = History::new(HistoryConfig::default().with_max_depth(2));
        for id in 1..=3 {
            history.execute(add(id), &mut repo, sets.entry(FLOOR).or_default()).unwrap();
        }
        assert_eq!(history.undo_depth(), 2);
        history.undo(&mut repo, &mut sets).unwrap();
        history.undo(&mut repo, &mut sets).unwrap();
        assert!(!history.can_undo());
        assert_eq!(repo.len(FLOOR), 1);
    }
}
