pub mod distance_2d;
pub mod intersect_2d;

pub use distance_2d::{distance, point_to_line_dist, point_to_segment_dist, project_onto_segment};
pub use intersect_2d::{
    collinear, is_parallel, is_point_on_segment, line_line_intersect_2d, segments_intersect,
    segments_intersect_with,
};

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// Numeric guard for parallelism and zero-length checks.
pub const EPSILON: f64 = 1e-9;

/// Default positional tolerance of the geometry primitives, in drawing units.
pub const DEFAULT_TOLERANCE: f64 = 1e-3;

/// A finite line segment between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point2,
    pub end: Point2,
}

impl Segment {
    /// Creates a segment from two points.
    #[must_use]
    pub fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }

    /// Direction vector `end - start` (not normalized).
    #[must_use]
    pub fn direction(&self) -> Vector2 {
        self.end - self.start
    }

    /// Euclidean length of the segment.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.direction().norm()
    }

    /// Whether the segment collapses to a point.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.length() < EPSILON
    }

    /// Point at parameter `t`, where `t = 0` is `start` and `t = 1` is `end`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point2 {
        self.start + self.direction() * t
    }
}

/// Returns true if two points coincide within `tolerance`.
#[must_use]
pub fn points_coincide(a: &Point2, b: &Point2, tolerance: f64) -> bool {
    distance(a, b) <= tolerance
}
