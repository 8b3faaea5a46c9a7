use std::collections::{BTreeMap, HashMap, HashSet};

use foundation::color::Rgb;
use scene::{CellId, LassoSelection, PointStore, SelectionId, SelectionSet, SelectionSnapshot};
use streaming::{Outbox, Query, Request};
use tracing::{debug, warn};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TranslationStatus {
    /// Selection comes from the dataset this viewer shows.
    Native,
    Cached,
    Requested,
    InFlight,
}

/// One viewer's private copy of the page's selections.
///
/// Shared snapshots are cloned before translated ids are attached, so other
/// viewers never observe this viewer's translations.
#[derive(Debug)]
pub struct SelectionView {
    viewer: String,
    local: Vec<LassoSelection>,
    /// Translated ids keyed by selection and destination dataset.
    cache: HashMap<(SelectionId, String), Vec<CellId>>,
    in_flight: HashMap<Request, (SelectionId, String)>,
    requested: HashSet<(SelectionId, String)>,
    translation_requests: u64,
}

impl SelectionView {
    pub fn new(viewer: impl Into<String>) -> Self {
        Self {
            viewer: viewer.into(),
            local: Vec::new(),
            cache: HashMap::new(),
            in_flight: HashMap::new(),
            requested: HashSet::new(),
            translation_requests: 0,
        }
    }

    pub fn selections(&self) -> &[LassoSelection] {
        &self.local
    }

    pub fn translation_requests(&self) -> u64 {
        self.translation_requests
    }

    /// Replaces the local copies with `snapshot`, re-attaching cached
    /// translations and requesting the missing ones.
    pub fn sync(&mut self, snapshot: &SelectionSnapshot, dataset: &str, outbox: &mut Outbox) {
        self.local = snapshot.iter().cloned().collect();
        let mut missing = Vec::new();
        for sel in &mut self.local {
            if sel.source_dataset == dataset {
                continue;
            }
            match self.cache.get(&(sel.id, dataset.to_string())) {
                Some(ids) => {
                    sel.translations.insert(self.viewer.clone(), ids.clone());
                }
                None if sel.selected => missing.push(sel.id),
                None => {}
            }
        }
        for id in missing {
            self.translate(id, dataset, outbox);
        }
    }

    /// Makes `id` usable in `dataset`, issuing at most one request per pair.
    pub fn translate(&mut self, id: SelectionId, dataset: &str, outbox: &mut Outbox) -> Option<TranslationStatus> {
        let sel = self.local.iter_mut().find(|s| s.id == id)?;
        if sel.source_dataset == dataset {
            return Some(TranslationStatus::Native);
        }
        let key = (id, dataset.to_string());
        if let Some(ids) = self.cache.get(&key) {
            sel.translations.insert(self.viewer.clone(), ids.clone());
            return Some(TranslationStatus::Cached);
        }
        if self.requested.contains(&key) {
            return Some(TranslationStatus::InFlight);
        }
        let token = outbox.submit(Query::TranslateSelection {
            source_dataset: sel.source_dataset.clone(),
            dest_dataset: dataset.to_string(),
            ids: sel.points.clone(),
        });
        debug!(viewer = %self.viewer, selection = id.0, dataset, "translation requested");
        self.translation_requests += 1;
        self.requested.insert(key.clone());
        self.in_flight.insert(token, key);
        Some(TranslationStatus::Requested)
    }

    /// Stores a translation reply; returns `true` if it changed what this viewer shows.
    pub fn on_translation(&mut self, token: Request, ids: Vec<CellId>, dataset: &str) -> bool {
        let Some(key) = self.in_flight.remove(&token) else {
            return false;
        };
        let visible = key.1 == dataset;
        if visible {
            if let Some(sel) = self.local.iter_mut().find(|s| s.id == key.0) {
                sel.translations.insert(self.viewer.clone(), ids.clone());
            }
        }
        self.cache.insert(key, ids);
        visible
    }

    /// Forgets a failed request so a later sync may retry it.
    pub fn on_translation_failed(&mut self, token: Request, reason: &str) {
        if let Some(key) = self.in_flight.remove(&token) {
            warn!(viewer = %self.viewer, selection = key.0.0, reason, "translation failed");
            self.requested.remove(&key);
        }
    }

    /// Highlight layers for visible selections usable in `dataset`.
    pub fn highlights(&self, store: &PointStore, dataset: &str) -> Vec<(SelectionId, Rgb, SelectionSet)> {
        self.local
            .iter()
            .filter(|s| s.selected)
            .filter_map(|s| {
                let ids = s.ids_for(&self.viewer, dataset)?;
                Some((s.id, s.color, store.resolve(ids)))
            })
            .collect()
    }

    /// Per-viewer translations currently attached, keyed by selection.
    pub fn translations(&self) -> BTreeMap<SelectionId, &[CellId]> {
        self.local
            .iter()
            .filter_map(|s| s.translations.get(&self.viewer).map(|ids| (s.id, ids.as_slice())))
            .collect()
    }

    pub fn clear(&mut self) {
        self.local.clear();
        self.in_flight.clear();
        self.requested.retain(|k| self.cache.contains_key(k));
    }
}
