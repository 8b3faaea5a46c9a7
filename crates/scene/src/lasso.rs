use std::collections::BTreeMap;
use std::sync::Arc;

use foundation::color::Rgb;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::points::CellId;

/// Monotonic per-session selection id.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionId(pub u64);

/// Share of a selection falling into one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterOverlap {
    pub cluster: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LassoSelection {
    pub id: SelectionId,
    pub color: Rgb,
    pub points: Vec<CellId>,
    pub source_viewer: String,
    pub source_dataset: String,
    pub selected: bool,
    /// Translated ids keyed by destination viewer name.
    pub translations: BTreeMap<String, Vec<CellId>>,
    pub overlaps: Option<Vec<ClusterOverlap>>,
}

impl LassoSelection {
    /// Ids usable by `viewer` showing `dataset`, if any are known yet.
    pub fn ids_for(&self, viewer: &str, dataset: &str) -> Option<&[CellId]> {
        if self.source_dataset == dataset {
            return Some(&self.points);
        }
        self.translations.get(viewer).map(Vec::as_slice)
    }
}

/// Read-only view handed to consumers; never mutated after publication.
pub type SelectionSnapshot = Arc<Vec<LassoSelection>>;

/// Page-wide list of lasso selections.
///
/// Writers mutate through `Arc::make_mut`, so snapshots already handed out
/// keep their contents.
#[derive(Debug, Default)]
pub struct SelectionStore {
    next_id: u64,
    version: u64,
    current: SelectionSnapshot,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> SelectionSnapshot {
        Arc::clone(&self.current)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    pub fn get(&self, id: SelectionId) -> Option<&LassoSelection> {
        self.current.iter().find(|s| s.id == id)
    }

    /// Appends a new visible selection. Empty point lists are rejected.
    pub fn commit(
        &mut self,
        color: Rgb,
        points: Vec<CellId>,
        source_viewer: &str,
        source_dataset: &str,
    ) -> Option<SelectionId> {
        if points.is_empty() {
            return None;
        }
        let id = SelectionId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        info!(id = id.0, points = points.len(), viewer = source_viewer, "selection committed");
        self.write().push(LassoSelection {
            id,
            color,
            points,
            source_viewer: source_viewer.to_string(),
            source_dataset: source_dataset.to_string(),
            selected: true,
            translations: BTreeMap::new(),
            overlaps: None,
        });
        Some(id)
    }

    /// Flips `selected`; returns the new value.
    pub fn toggle(&mut self, id: SelectionId) -> Option<bool> {
        let sel = self.write().iter_mut().find(|s| s.id == id)?;
        sel.selected = !sel.selected;
        Some(sel.selected)
    }

    pub fn remove(&mut self, id: SelectionId) -> bool {
        let Some(pos) = self.current.iter().position(|s| s.id == id) else {
            return false;
        };
        self.write().remove(pos);
        true
    }

    pub fn attach_overlaps(&mut self, id: SelectionId, overlaps: Vec<ClusterOverlap>) -> bool {
        let Some(sel) = self.write().iter_mut().find(|s| s.id == id) else {
            return false;
        };
        sel.overlaps = Some(overlaps);
        true
    }

    fn write(&mut self) -> &mut Vec<LassoSelection> {
        self.version += 1;
        Arc::make_mut(&mut self.current)
    }
}
