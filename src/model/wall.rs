use std::fmt;

use crate::math::{distance, Point2, Segment};

/// Unique identifier for a wall.
///
/// Ids are plain values so a removed wall can be restored under the same id
/// by undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WallId(pub u64);

impl fmt::Display for WallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wall#{}", self.0)
    }
}

/// Identifier of the floor an element is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FloorId(pub u32);

/// Reference to a material in the external material library.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MaterialRef(pub String);

impl Default for MaterialRef {
    fn default() -> Self {
        Self("generic".to_owned())
    }
}

/// One of the two ends of a wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WallEnd {
    Start,
    End,
}

impl WallEnd {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Start => Self::End,
            Self::End => Self::Start,
        }
    }
}

/// Default wall thickness, in drawing units.
pub const DEFAULT_THICKNESS: f64 = 10.0;

/// Default wall height, in drawing units.
pub const DEFAULT_HEIGHT: f64 = 240.0;

/// A straight wall, idealized as its centerline segment.
///
/// Thickness, height and material are carried data; they never enter the
/// intersection math.
#[derive(Debug, Clone, PartialEq)]
pub struct WallSegment {
    pub id: WallId,
    pub start: Point2,
    pub end: Point2,
    pub thickness: f64,
    pub height: f64,
    pub material: MaterialRef,
}

impl WallSegment {
    /// Creates a wall with default thickness, height and material.
    #[must_use]
    pub fn new(id: WallId, start: Point2, end: Point2) -> Self {
        Self {
            id,
            start,
            end,
            thickness: DEFAULT_THICKNESS,
            height: DEFAULT_HEIGHT,
            material: MaterialRef::default(),
        }
    }

    #[must_use]
    pub fn with_thickness(mut self, thickness: f64) -> Self {
        self.thickness = thickness;
        self
    }

    #[must_use]
    pub fn with_height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    #[must_use]
    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = MaterialRef(material.into());
        self
    }

    /// The wall's centerline.
    #[must_use]
    pub fn segment(&self) -> Segment {
        Segment::new(self.start, self.end)
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.segment().length()
    }

    /// Whether `start` and `end` coincide.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.segment().is_degenerate()
    }

    /// Whether both walls have identical thickness and material.
    #[must_use]
    pub fn has_same_build_up(&self, other: &Self) -> bool {
        (self.thickness - other.thickness).abs() < f64::EPSILON && self.material == other.material
    }

    #[must_use]
    pub fn endpoint(&self, end: WallEnd) -> Point2 {
        match end {
            WallEnd::Start => self.start,
            WallEnd::End => self.end,
        }
    }

    /// The endpoint closest to `p` and its distance. Ties go to `start`.
    #[must_use]
    pub fn nearest_endpoint(&self, p: &Point2) -> (WallEnd, f64) {
        let ds = distance(&self.start, p);
        let de = distance(&self.end, p);
        if de < ds {
            (WallEnd::End, de)
        } else {
            (WallEnd::Start, ds)
        }
    }

    /// Copy of this wall with one endpoint moved to `p`.
    #[must_use]
    pub fn with_endpoint(&self, end: WallEnd, p: Point2) -> Self {
        let mut next = self.clone();
        match end {
            WallEnd::Start => next.start = p,
            WallEnd::End => next.end = p,
        }
        next
    }

    /// Copy of this wall under a new id with different endpoints.
    #[must_use]
    pub fn derive(&self, id: WallId, start: Point2, end: Point2) -> Self {
        Self {
            id,
            start,
            end,
            ..self.clone()
        }
    }
}

/// Partial update of a wall, as accepted by the element repository.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WallPatch {
    pub start: Option<Point2>,
    pub end: Option<Point2>,
    pub thickness: Option<f64>,
    pub height: Option<f64>,
    pub material: Option<MaterialRef>,
}

impl WallPatch {
    /// A patch that overwrites every field with the values of `wall`.
    #[must_use]
    pub fn replace_with(wall: &WallSegment) -> Self {
        Self {
            start: Some(wall.start),
            end: Some(wall.end),
            thickness: Some(wall.thickness),
            height: Some(wall.height),
            material: Some(wall.material.clone()),
        }
    }

    /// Applies the patch in place.
    pub fn apply(&self, wall: &mut WallSegment) {
        if let Some(start) = self.start {
            wall.start = start;
        }
        if let Some(end) = self.end {
            wall.end = end;
        }
        if let Some(thickness) = self.thickness {
            wall.thickness = thickness;
        }
        if let Some(height) = self.height {
            wall.height = height;
        }
        if let Some(material) = &self.material {
            wall.material = material.clone();
        }
    }
}
