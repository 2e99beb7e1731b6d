use slotmap::SlotMap;
use tracing::debug;

use crate::error::{DimensionError, Result};
use crate::math::{distance, Point2, Vector2, DEFAULT_TOLERANCE, EPSILON};

use super::format::{format_value, FormatOptions};
use super::{
    ChainId, Dimension, DimensionChain, DimensionId, DimensionKind, DimensionPatch, DimensionStyle,
    Element, ViewContext, ViewKind,
};

/// Arena of dimensions and dimension chains.
#[derive(Debug)]
pub struct DimensionEngine {
    dimensions: SlotMap<DimensionId, Dimension>,
    chains: SlotMap<ChainId, DimensionChain>,
    style: DimensionStyle,
    tolerance: f64,
}

impl Default for DimensionEngine {
    fn default() -> Self {
        Self {
            dimensions: SlotMap::with_key(),
            chains: SlotMap::with_key(),
            style: DimensionStyle::default(),
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl DimensionEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Style given to new dimensions.
    #[must_use]
    pub fn with_style(mut self, style: DimensionStyle) -> Self {
        self.style = style;
        self
    }

    /// Tolerance used to recognise equivalent dimensions.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DimensionId, &Dimension)> {
        self.dimensions.iter()
    }

    /// Measures `start -> end` and stores the dimension.
    ///
    /// # Errors
    ///
    /// Returns `DimensionError::Invalid` for a non-positive view scale or
    /// an angular dimension between coincident points.
    pub fn create_dimension(
        &mut self,
        start: Point2,
        end: Point2,
        kind: DimensionKind,
        view: &ViewContext,
    ) -> Result<DimensionId> {
        let value = measure(kind, &start, &end, view.scale)?;
        let id = self.dimensions.insert(Dimension {
            kind,
            start,
            end,
            value,
            style: self.style,
            locked: false,
            scale: view.scale,
        });
        debug!(?kind, value, "created dimension");
        Ok(id)
    }

    /// Returns the dimension, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns `DimensionError::NotFound` if the id is unknown.
    pub fn dimension(&self, id: DimensionId) -> Result<&Dimension> {
        self.dimensions
            .get(id)
            .ok_or_else(|| DimensionError::NotFound.into())
    }

    /// Applies a patch, re-measuring when an endpoint moves. Chains holding
    /// the dimension get their totals recomputed.
    ///
    /// # Errors
    ///
    /// Returns `DimensionError::NotFound` for an unknown id and
    /// `DimensionError::Locked` for a locked dimension, unless the patch only
    /// unlocks it.
    pub fn update_dimension(
        &mut self,
        id: DimensionId,
        patch: &DimensionPatch,
    ) -> Result<&Dimension> {
        let dim = self
            .dimensions
            .get_mut(id)
            .ok_or(DimensionError::NotFound)?;
        if dim.locked && !patch.only_unlocks() {
            return Err(DimensionError::Locked.into());
        }

        let start = patch.start.unwrap_or(dim.start);
        let end = patch.end.unwrap_or(dim.end);
        let remeasured = patch.moves_endpoint();
        if remeasured {
            dim.value = measure(dim.kind, &start, &end, dim.scale)?;
            dim.start = start;
            dim.end = end;
        }
        if let Some(style) = patch.style {
            dim.style = style;
        }
        if let Some(locked) = patch.locked {
            dim.locked = locked;
        }

        if remeasured {
            self.refresh_chains_with(id)?;
        }
        self.dimension(id)
    }

    /// Removes a dimension and drops it from every chain.
    ///
    /// # Errors
    ///
    /// Returns `DimensionError::NotFound` if the id is unknown.
    pub fn remove_dimension(&mut self, id: DimensionId) -> Result<Dimension> {
        let dim = self.dimensions.remove(id).ok_or(DimensionError::NotFound)?;
        self.refresh_chains_with(id)?;
        Ok(dim)
    }

    fn refresh_chains_with(&mut self, id: DimensionId) -> Result<()> {
        let affected: Vec<ChainId> = self
            .chains
            .iter()
            .filter(|(_, c)| c.dimensions.contains(&id))
            .map(|(cid, _)| cid)
            .collect();
        for cid in affected {
            self.refresh_chain(cid)?;
        }
        Ok(())
    }

    /// Groups dimensions into a chain. Unknown ids are dropped.
    pub fn create_dimension_chain(
        &mut self,
        ids: &[DimensionId],
        direction: Vector2,
        offset: f64,
    ) -> ChainId {
        let dimensions: Vec<DimensionId> = ids
            .iter()
            .copied()
            .filter(|id| self.dimensions.contains_key(*id))
            .collect();
        let total_value = self.sum(&dimensions);
        debug!(members = dimensions.len(), total_value, "created dimension chain");
        self.chains.insert(DimensionChain {
            dimensions,
            direction,
            offset,
            total_value,
        })
    }

    /// Returns the chain, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns `DimensionError::NotFound` if the id is unknown.
    pub fn chain(&self, id: ChainId) -> Result<&DimensionChain> {
        self.chains
            .get(id)
            .ok_or_else(|| DimensionError::NotFound.into())
    }

    /// Drops removed members and recomputes the chain total.
    ///
    /// # Errors
    ///
    /// Returns `DimensionError::NotFound` if the chain id is unknown.
    pub fn refresh_chain(&mut self, id: ChainId) -> Result<f64> {
        let Some(chain) = self.chains.get(id) else {
            return Err(DimensionError::NotFound.into());
        };
        let dimensions: Vec<DimensionId> = chain
            .dimensions
            .iter()
            .copied()
            .filter(|d| self.dimensions.contains_key(*d))
            .collect();
        let total_value = self.sum(&dimensions);

        let chain = self.chains.get_mut(id).ok_or(DimensionError::NotFound)?;
        chain.dimensions = dimensions;
        chain.total_value = total_value;
        Ok(total_value)
    }

    /// Derives dimensions from elements: wall lengths in plan views, opening
    /// heights in elevation views. Elements already carrying an equivalent
    /// dimension are skipped.
    ///
    /// # Errors
    ///
    /// Returns `DimensionError::Invalid` for a non-positive view scale.
    pub fn auto_generate_dimensions(
        &mut self,
        elements: &[Element],
        view: &ViewContext,
    ) -> Result<Vec<DimensionId>> {
        let mut created = Vec::new();
        for element in elements {
            let (start, end) = match (view.kind, element) {
                (ViewKind::Plan, Element::Wall(wall)) => (wall.start, wall.end),
                (
                    ViewKind::Elevation,
                    Element::Opening {
                        position,
                        sill_height,
                        head_height,
                    },
                ) => (
                    Point2::new(*position, *sill_height),
                    Point2::new(*position, *head_height),
                ),
                _ => continue,
            };
            if self.has_equivalent(DimensionKind::Linear, &start, &end) {
                continue;
            }
            created.push(self.create_dimension(start, end, DimensionKind::Linear, view)?);
        }
        debug!(created = created.len(), view = ?view.kind, "generated dimensions");
        Ok(created)
    }

    /// Formats a stored dimension in its own style.
    ///
    /// # Errors
    ///
    /// Returns `DimensionError::NotFound` if the id is unknown.
    pub fn format(&self, id: DimensionId, options: &FormatOptions) -> Result<String> {
        let dim = self.dimension(id)?;
        Ok(format_value(dim.value, dim.style, options))
    }

    fn has_equivalent(&self, kind: DimensionKind, start: &Point2, end: &Point2) -> bool {
        self.dimensions
            .values()
            .any(|d| d.is_equivalent(kind, start, end, self.tolerance))
    }

    fn sum(&self, ids: &[DimensionId]) -> f64 {
        ids.iter()
            .filter_map(|id| self.dimensions.get(*id))
            .map(|d| d.value)
            .sum()
    }
}

/// Measured value of a dimension.
fn measure(kind: DimensionKind, start: &Point2, end: &Point2, scale: f64) -> Result<f64> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(DimensionError::Invalid(format!("view scale {scale}")).into());
    }
    match kind {
        DimensionKind::Linear => Ok(distance(start, end) / scale),
        DimensionKind::Angular => {
            let d = end - start;
            if d.norm() < EPSILON {
                return Err(
                    DimensionError::Invalid("angle between coincident points".into()).into(),
                );
            }
            Ok(d.y.atan2(d.x).to_degrees().rem_euclid(360.0))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::error::JoineryError;
    use crate::model::{WallId, WallSegment};

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn three_four_five() {
        let mut engine = DimensionEngine::new();
        let id = engine
            .create_dimension(p(0.0, 0.0), p(3.0, 4.0), DimensionKind::Linear, &ViewContext::plan())
            .unwrap();
        assert_abs_diff_eq!(engine.dimension(id).unwrap().value, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn view_scale_divides_linear_value() {
        let mut engine = DimensionEngine::new();
        let view = ViewContext::plan().with_scale(50.0);
        let id = engine
            .create_dimension(p(0.0, 0.0), p(1000.0, 0.0), DimensionKind::Linear, &view)
            .unwrap();
        assert_abs_diff_eq!(engine.dimension(id).unwrap().value, 20.0, epsilon = 1e-12);
    }

    #[test]
    fn angular_value_is_direction_in_degrees() {
        let mut engine = DimensionEngine::new();
        let view = ViewContext::plan();
        let up = engine
            .create_dimension(p(1.0, 1.0), p(1.0, 5.0), DimensionKind::Angular, &view)
            .unwrap();
        let down_left = engine
            .create_dimension(p(0.0, 0.0), p(-1.0, -1.0), DimensionKind::Angular, &view)
            .unwrap();
        assert_abs_diff_eq!(engine.dimension(up).unwrap().value, 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(engine.dimension(down_left).unwrap().value, 225.0, epsilon = 1e-9);
        assert!(engine
            .create_dimension(p(0.0, 0.0), p(0.0, 0.0), DimensionKind::Angular, &view)
            .is_err());
    }

    #[test]
    fn moving_an_endpoint_recomputes_value() {
        let mut engine = DimensionEngine::new();
        let id = engine
            .create_dimension(p(0.0, 0.0), p(3.0, 4.0), DimensionKind::Linear, &ViewContext::plan())
            .unwrap();
        let patch = DimensionPatch {
            end: Some(p(6.0, 8.0)),
            ..DimensionPatch::default()
        };
        let dim = engine.update_dimension(id, &patch).unwrap();
        assert_abs_diff_eq!(dim.value, 10.0, epsilon = 1e-12);
        assert_eq!(dim.start, p(0.0, 0.0));
    }

    #[test]
    fn locked_dimension_rejects_updates_until_unlocked() {
        let mut engine = DimensionEngine::new();
        let id = engine
            .create_dimension(p(0.0, 0.0), p(3.0, 4.0), DimensionKind::Linear, &ViewContext::plan())
            .unwrap();
        engine.update_dimension(id, &DimensionPatch::lock(true)).unwrap();

        let err = engine
            .update_dimension(id, &DimensionPatch::moving(p(0.0, 0.0), p(1.0, 0.0)))
            .unwrap_err();
        assert!(matches!(err, JoineryError::Dimension(DimensionError::Locked)));
        assert_abs_diff_eq!(engine.dimension(id).unwrap().value, 5.0, epsilon = 1e-12);

        engine.update_dimension(id, &DimensionPatch::lock(false)).unwrap();
        let dim = engine
            .update_dimension(id, &DimensionPatch::moving(p(0.0, 0.0), p(1.0, 0.0)))
            .unwrap();
        assert_abs_diff_eq!(dim.value, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn chain_drops_unknown_ids_and_sums_members() {
        let mut engine = DimensionEngine::new();
        let view = ViewContext::plan();
        let a = engine
            .create_dimension(p(0.0, 0.0), p(100.0, 0.0), DimensionKind::Linear, &view)
            .unwrap();
        let b = engine
            .create_dimension(p(100.0, 0.0), p(250.0, 0.0), DimensionKind::Linear, &view)
            .unwrap();
        let gone = engine
            .create_dimension(p(0.0, 0.0), p(1.0, 0.0), DimensionKind::Linear, &view)
            .unwrap();
        engine.remove_dimension(gone).unwrap();

        let chain = engine.create_dimension_chain(&[a, gone, b], Vector2::x(), 30.0);
        let stored = engine.chain(chain).unwrap();
        assert_eq!(stored.dimensions, vec![a, b]);
        assert_abs_diff_eq!(stored.total_value, 250.0, epsilon = 1e-12);

        engine
            .update_dimension(b, &DimensionPatch::moving(p(100.0, 0.0), p(300.0, 0.0)))
            .unwrap();
        assert_abs_diff_eq!(engine.chain(chain).unwrap().total_value, 300.0, epsilon = 1e-12);

        engine.remove_dimension(a).unwrap();
        assert_abs_diff_eq!(engine.chain(chain).unwrap().total_value, 200.0, epsilon = 1e-12);
    }

    #[test]
    fn chain_total_follows_member_update() {
        let mut engine = DimensionEngine::new();
        let view = ViewContext::plan();
        let id = engine
            .create_dimension(p(0.0, 0.0), p(100.0, 0.0), DimensionKind::Linear, &view)
            .unwrap();
        let chain = engine.create_dimension_chain(&[id], Vector2::x(), 20.0);

        engine
            .update_dimension(id, &DimensionPatch::moving(p(0.0, 0.0), p(300.0, 0.0)))
            .unwrap();
        assert_abs_diff_eq!(engine.dimension(id).unwrap().value, 300.0, epsilon = 1e-12);
        assert_abs_diff_eq!(engine.chain(chain).unwrap().total_value, 300.0, epsilon = 1e-12);

        // Style-only patches leave the total alone.
        engine
            .update_dimension(
                id,
                &DimensionPatch {
                    style: Some(DimensionStyle::Imperial),
                    ..DimensionPatch::default()
                },
            )
            .unwrap();
        assert_abs_diff_eq!(engine.chain(chain).unwrap().total_value, 300.0, epsilon = 1e-12);
    }

    #[test]
    fn plan_generation_measures_walls_once() {
        let mut engine = DimensionEngine::new();
        let elements = vec![
            Element::Wall(WallSegment::new(WallId(1), p(0.0, 0.0), p(300.0, 0.0))),
            Element::Wall(WallSegment::new(WallId(2), p(300.0, 0.0), p(300.0, 400.0))),
            Element::Opening {
                position: 50.0,
                sill_height: 90.0,
                head_height: 210.0,
            },
        ];
        let created = engine
            .auto_generate_dimensions(&elements, &ViewContext::plan())
            .unwrap();
        assert_eq!(created.len(), 2);
        assert_abs_diff_eq!(engine.dimension(created[1]).unwrap().value, 400.0, epsilon = 1e-12);

        // A reversed wall over the same points is already dimensioned.
        let reversed = [Element::Wall(WallSegment::new(WallId(3), p(300.0, 0.0), p(0.0, 0.0)))];
        let again = engine
            .auto_generate_dimensions(&reversed, &ViewContext::plan())
            .unwrap();
        assert!(again.is_empty());
        assert_eq!(engine.len(), 2);
    }

    #[test]
    fn elevation_generation_measures_openings() {
        let mut engine = DimensionEngine::new();
        let elements = vec![
            Element::Wall(WallSegment::new(WallId(1), p(0.0, 0.0), p(300.0, 0.0))),
            Element::Opening {
                position: 50.0,
                sill_height: 90.0,
                head_height: 210.0,
            },
        ];
        let created = engine
            .auto_generate_dimensions(&elements, &ViewContext::elevation())
            .unwrap();
        assert_eq!(created.len(), 1);
        assert_abs_diff_eq!(engine.dimension(created[0]).unwrap().value, 120.0, epsilon = 1e-12);
    }

    #[test]
    fn format_uses_dimension_style() {
        let mut engine = DimensionEngine::new().with_style(DimensionStyle::Architectural);
        let id = engine
            .create_dimension(
                p(0.0, 0.0),
                p(63.5, 0.0),
                DimensionKind::Linear,
                &ViewContext::plan(),
            )
            .unwrap();
        assert_eq!(engine.format(id, &FormatOptions::default()).unwrap(), "5' 3 1/2\"");
    }
}
