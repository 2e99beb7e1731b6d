//! Measured annotations of walls and openings.
//!
//! Dimensions live in a [`DimensionEngine`] arena keyed by generational ids,
//! like every other auxiliary collection they only reference geometry by
//! value and never keep walls alive.

mod engine;
mod format;

pub use engine::DimensionEngine;
pub use format::{format_value, FormatOptions};

use crate::math::{Point2, Vector2};
use crate::model::WallSegment;

slotmap::new_key_type! {
    /// Unique identifier for a dimension.
    pub struct DimensionId;

    /// Unique identifier for a dimension chain.
    pub struct ChainId;
}

/// What a dimension measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DimensionKind {
    /// Straight distance between the two points.
    Linear,
    /// Direction of `start -> end` in degrees from +x, in `[0, 360)`.
    Angular,
}

/// Display convention of a dimension value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DimensionStyle {
    /// Feet and fractional inches: `5' 3 1/2"`.
    Architectural,
    /// Millimetres, switching to metres at the threshold.
    #[default]
    Metric,
    /// Raw value at the configured precision.
    Engineering,
    /// Feet and decimal inches: `5' 3.50"`.
    Imperial,
}

/// Which drawing a dimension is placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Plan,
    Elevation,
}

/// View a dimension is created for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewContext {
    pub kind: ViewKind,
    /// Drawing units per displayed unit; linear values are divided by it.
    pub scale: f64,
}

impl ViewContext {
    #[must_use]
    pub fn plan() -> Self {
        Self {
            kind: ViewKind::Plan,
            scale: 1.0,
        }
    }

    #[must_use]
    pub fn elevation() -> Self {
        Self {
            kind: ViewKind::Elevation,
            scale: 1.0,
        }
    }

    #[must_use]
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }
}

/// A measured value between two points.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    pub kind: DimensionKind,
    pub start: Point2,
    pub end: Point2,
    /// Derived from the points; recomputed on every endpoint change.
    pub value: f64,
    pub style: DimensionStyle,
    /// A locked dimension rejects every update except unlocking.
    pub locked: bool,
    /// View scale the value was measured with.
    pub scale: f64,
}

impl Dimension {
    /// Same kind and endpoints, in either orientation.
    #[must_use]
    pub fn is_equivalent(
        &self,
        kind: DimensionKind,
        start: &Point2,
        end: &Point2,
        tolerance: f64,
    ) -> bool {
        let near = |a: &Point2, b: &Point2| (a - b).norm() <= tolerance;
        self.kind == kind
            && ((near(&self.start, start) && near(&self.end, end))
                || (near(&self.start, end) && near(&self.end, start)))
    }
}

/// Partial update of a dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DimensionPatch {
    pub start: Option<Point2>,
    pub end: Option<Point2>,
    pub style: Option<DimensionStyle>,
    pub locked: Option<bool>,
}

impl DimensionPatch {
    #[must_use]
    pub fn moving(start: Point2, end: Point2) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn lock(locked: bool) -> Self {
        Self {
            locked: Some(locked),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn moves_endpoint(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// True for a patch whose only effect is clearing the lock.
    #[must_use]
    pub fn only_unlocks(&self) -> bool {
        self.locked == Some(false) && !self.moves_endpoint() && self.style.is_none()
    }
}

/// Ordered dimensions whose values add up to a displayed total.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionChain {
    pub dimensions: Vec<DimensionId>,
    pub direction: Vector2,
    /// Baseline offset from the measured elements, in drawing units.
    pub offset: f64,
    pub total_value: f64,
}

/// Input of automatic dimensioning.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// Measured along its length in plan views.
    Wall(WallSegment),
    /// An opening in elevation coordinates (`x` along the wall, `y` up);
    /// measured from sill to head in elevation views.
    Opening {
        position: f64,
        sill_height: f64,
        head_height: f64,
    },
}
