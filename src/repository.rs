use std::collections::BTreeMap;

use crate::model::{FloorId, Intersection, IntersectionId, WallId, WallPatch, WallSegment};

/// Storage of wall elements, scoped by floor.
///
/// The kernel never caches walls: every operation reads a fresh snapshot via
/// [`list`](Self::list) and writes back through the command layer.
pub trait ElementRepository {
    /// All walls on `floor`, ordered by id.
    fn list(&self, floor: FloorId) -> Vec<WallSegment>;

    fn get(&self, floor: FloorId, id: WallId) -> Option<WallSegment>;

    /// Places `wall` on `floor`, replacing any wall with the same id.
    fn add(&mut self, floor: FloorId, wall: WallSegment);

    /// Applies `patch` to a wall. Returns `false` if the wall does not exist.
    fn update(&mut self, floor: FloorId, id: WallId, patch: &WallPatch) -> bool;

    fn remove(&mut self, floor: FloorId, id: WallId) -> Option<WallSegment>;
}

/// In-memory [`ElementRepository`], used headless and in tests.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    floors: BTreeMap<FloorId, BTreeMap<WallId, WallSegment>>,
}

impl InMemoryRepository {
    /// Creates a new, empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository holding `walls` on `floor`.
    #[must_use]
    pub fn with_walls(floor: FloorId, walls: impl IntoIterator<Item = WallSegment>) -> Self {
        let mut repo = Self::new();
        for wall in walls {
            repo.add(floor, wall);
        }
        repo
    }

    /// Number of walls on `floor`.
    #[must_use]
    pub fn len(&self, floor: FloorId) -> usize {
        self.floors.get(&floor).map_or(0, BTreeMap::len)
    }

    #[must_use]
    pub fn is_empty(&self, floor: FloorId) -> bool {
        self.len(floor) == 0
    }
}

impl ElementRepository for InMemoryRepository {
    fn list(&self, floor: FloorId) -> Vec<WallSegment> {
        self.floors
            .get(&floor)
            .map(|walls| walls.values().cloned().collect())
            .unwrap_or_default()
    }

    fn get(&self, floor: FloorId, id: WallId) -> Option<WallSegment> {
        self.floors.get(&floor)?.get(&id).cloned()
    }

    fn add(&mut self, floor: FloorId, wall: WallSegment) {
        self.floors.entry(floor).or_default().insert(wall.id, wall);
    }

    fn update(&mut self, floor: FloorId, id: WallId, patch: &WallPatch) -> bool {
        match self.floors.get_mut(&floor).and_then(|walls| walls.get_mut(&id)) {
            Some(wall) => {
                patch.apply(wall);
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, floor: FloorId, id: WallId) -> Option<WallSegment> {
        self.floors.get_mut(&floor)?.remove(&id)
    }
}

/// Recorded intersections of one floor.
///
/// Holds wall ids only; entries whose walls disappear are pruned with
/// [`retain_valid`](Self::retain_valid).
#[derive(Debug, Clone, Default)]
pub struct IntersectionSet {
    items: BTreeMap<IntersectionId, Intersection>,
}

impl IntersectionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: IntersectionId) -> Option<&Intersection> {
        self.items.get(&id)
    }

    pub fn insert(&mut self, item: Intersection) {
        self.items.insert(item.id, item);
    }

    pub fn remove(&mut self, id: IntersectionId) -> Option<Intersection> {
        self.items.remove(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Intersection> {
        self.items.values()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Intersection> {
        self.items.values().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drops entries referencing a wall not in `walls`, returning them.
    pub fn retain_valid(&mut self, walls: &[WallSegment]) -> Vec<Intersection> {
        let (keep, dropped): (BTreeMap<_, _>, BTreeMap<_, _>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|(_, item)| item.walls.iter().all(|w| walls.iter().any(|x| x.id == *w)));
        self.items = keep;
        dropped.into_values().collect()
    }
}
