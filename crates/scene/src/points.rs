use std::collections::HashMap;

use foundation::bounds::Aabb2;
use foundation::color::{NEUTRAL_GRAY, Rgb};
use foundation::math::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::selection::SelectionSet;
use crate::trajectory::Trajectory;

/// Opaque cell index; stable across recolouring of the same dataset.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(pub u32);

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Point {
    pub id: CellId,
    pub position: Vec2,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoordinateError {
    #[error("column lengths differ: ids={ids} x={x} y={y}")]
    LengthMismatch { ids: usize, x: usize, y: usize },
    #[error("duplicate cell id {0:?}")]
    DuplicateId(CellId),
}

/// One embedding of one dataset. Immutable once built.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CoordinateSet {
    pub dataset: String,
    pub embedding: String,
    ids: Vec<CellId>,
    positions: Vec<Vec2>,
    pub trajectory: Trajectory,
}

impl CoordinateSet {
    pub fn empty(dataset: impl Into<String>, embedding: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            embedding: embedding.into(),
            ..Self::default()
        }
    }

    /// Builds a set from the column layout used on the wire.
    pub fn from_columns(
        dataset: impl Into<String>,
        embedding: impl Into<String>,
        ids: Vec<CellId>,
        x: &[f64],
        y: &[f64],
    ) -> Result<Self, CoordinateError> {
        if ids.len() != x.len() || ids.len() != y.len() {
            return Err(CoordinateError::LengthMismatch {
                ids: ids.len(),
                x: x.len(),
                y: y.len(),
            });
        }
        let mut seen = std::collections::HashSet::with_capacity(ids.len());
        for id in &ids {
            if !seen.insert(*id) {
                return Err(CoordinateError::DuplicateId(*id));
            }
        }
        let positions = x.iter().zip(y).map(|(&x, &y)| Vec2::new(x, y)).collect();
        Ok(Self {
            dataset: dataset.into(),
            embedding: embedding.into(),
            ids,
            positions,
            trajectory: Trajectory::default(),
        })
    }

    pub fn with_trajectory(mut self, trajectory: Trajectory) -> Self {
        self.trajectory = trajectory;
        self
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[CellId] {
        &self.ids
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    pub fn bounds(&self) -> Option<Aabb2> {
        Aabb2::from_points(self.positions.iter().copied())
    }
}

/// Points currently shown by one viewer.
///
/// Replaced wholesale when coordinates change; colours are mutated in place.
#[derive(Debug, Default, Clone)]
pub struct PointStore {
    dataset: Option<String>,
    embedding: Option<String>,
    points: Vec<Point>,
    index: HashMap<CellId, u32>,
    bounds: Option<Aabb2>,
    trajectory: Trajectory,
}

impl PointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, set: &CoordinateSet) {
        self.points = set
            .ids()
            .iter()
            .zip(set.positions())
            .map(|(&id, &position)| Point {
                id,
                position,
                color: NEUTRAL_GRAY,
            })
            .collect();
        self.index = self
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id, i as u32))
            .collect();
        self.bounds = set.bounds();
        self.trajectory = set.trajectory.clone();
        self.dataset = Some(set.dataset.clone());
        self.embedding = Some(set.embedding.clone());
        debug!(points = self.points.len(), "point store replaced");
    }

    /// Assigns colours by position; points past the end of `colors` get the neutral gray.
    ///
    /// Returns the number of colours taken from `colors`.
    pub fn recolor(&mut self, colors: &[Rgb]) -> usize {
        for (i, p) in self.points.iter_mut().enumerate() {
            p.color = colors.get(i).copied().unwrap_or(NEUTRAL_GRAY);
        }
        colors.len().min(self.points.len())
    }

    /// Forgets the dataset along with its points.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn set_trajectory(&mut self, trajectory: Trajectory) {
        self.trajectory = trajectory;
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn dataset(&self) -> Option<&str> {
        self.dataset.as_deref()
    }

    pub fn embedding(&self) -> Option<&str> {
        self.embedding.as_deref()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn get(&self, index: u32) -> Option<&Point> {
        self.points.get(index as usize)
    }

    pub fn index_of(&self, id: CellId) -> Option<u32> {
        self.index.get(&id).copied()
    }

    pub fn colors(&self) -> Vec<Rgb> {
        self.points.iter().map(|p| p.color).collect()
    }

    pub fn bounds(&self) -> Option<Aabb2> {
        self.bounds
    }

    /// Indices of the given ids that exist in this store; unknown ids are skipped.
    pub fn resolve(&self, ids: &[CellId]) -> SelectionSet {
        let mut out = SelectionSet::new();
        for id in ids {
            if let Some(idx) = self.index_of(*id) {
                out.insert(idx);
            }
        }
        out
    }

    /// Ids of the points in `set`, in ascending index order.
    pub fn ids_of(&self, set: &SelectionSet) -> Vec<CellId> {
        set.iter()
            .filter_map(|idx| self.get(idx).map(|p| p.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{CellId, CoordinateError, CoordinateSet, PointStore};
    use foundation::color::{NEUTRAL_GRAY, Rgb};
    use pretty_assertions::assert_eq;

    fn ids(v: &[u32]) -> Vec<CellId> {
        v.iter().copied().map(CellId).collect()
    }

    fn sample() -> CoordinateSet {
        CoordinateSet::from_columns("ds", "umap", ids(&[10, 11, 12]), &[0.0, 1.0, 2.0], &[0.0, 1.0, 4.0])
            .expect("coords")
    }

    #[test]
    fn rejects_ragged_columns() {
        let err = CoordinateSet::from_columns("ds", "umap", ids(&[1, 2]), &[0.0], &[0.0, 1.0]);
        assert_eq!(
            err,
            Err(CoordinateError::LengthMismatch { ids: 2, x: 1, y: 2 })
        );
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = CoordinateSet::from_columns("ds", "umap", ids(&[1, 1]), &[0.0, 1.0], &[0.0, 1.0]);
        assert_eq!(err, Err(CoordinateError::DuplicateId(CellId(1))));
    }

    #[test]
    fn replace_matches_coordinate_count() {
        let mut store = PointStore::new();
        store.replace(&sample());
        assert_eq!(store.len(), 3);
        assert_eq!(store.index_of(CellId(12)), Some(2));
        assert!(store.points().iter().all(|p| p.color == NEUTRAL_GRAY));
        assert_eq!(store.dataset(), Some("ds"));
    }

    #[test]
    fn recolor_pads_with_gray_and_keeps_identity() {
        let mut store = PointStore::new();
        store.replace(&sample());
        let red = Rgb::new(255, 0, 0);
        assert_eq!(store.recolor(&[red, red]), 2);
        assert_eq!(store.colors(), vec![red, red, NEUTRAL_GRAY]);
        assert_eq!(
            store.points().iter().map(|p| p.id).collect::<Vec<_>>(),
            ids(&[10, 11, 12])
        );
    }

    #[test]
    fn resolve_skips_unknown_ids() {
        let mut store = PointStore::new();
        store.replace(&sample());
        let set = store.resolve(&ids(&[12, 99, 10]));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(store.ids_of(&set), ids(&[10, 12]));
    }

    #[test]
    fn clear_empties_everything() {
        let mut store = PointStore::new();
        store.replace(&sample());
        store.clear();
        assert!(store.is_empty());
        assert!(store.bounds().is_none());
        assert_eq!(store.index_of(CellId(10)), None);
        assert_eq!(store.dataset(), None);
    }
}
