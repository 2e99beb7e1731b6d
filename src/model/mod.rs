pub mod intersection;
pub mod wall;

pub use intersection::{Intersection, IntersectionId, Junction, JunctionKind};
pub use wall::{FloorId, MaterialRef, WallEnd, WallId, WallPatch, WallSegment};

/// Hands out fresh wall and intersection ids.
///
/// The generator keeps a high-water mark: observing existing elements moves
/// it past their ids, so ids added by other writers are never reused.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    next_wall: u64,
    next_intersection: u64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self {
            next_wall: 1,
            next_intersection: 1,
        }
    }
}

impl IdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe_walls<'a>(&mut self, walls: impl IntoIterator<Item = &'a WallSegment>) {
        for w in walls {
            self.next_wall = self.next_wall.max(w.id.0 + 1);
        }
    }

    pub fn observe_intersections<'a>(&mut self, items: impl IntoIterator<Item = &'a Intersection>) {
        for i in items {
            self.next_intersection = self.next_intersection.max(i.id.0 + 1);
        }
    }

    pub fn fresh_wall(&mut self) -> WallId {
        let id = WallId(self.next_wall);
        self.next_wall += 1;
        id
    }

    pub fn fresh_intersection(&mut self) -> IntersectionId {
        let id = IntersectionId(self.next_intersection);
        self.next_intersection += 1;
        id
    }
}
