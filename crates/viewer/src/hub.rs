use std::collections::HashMap;

use foundation::color::Rgb;
use foundation::math::Vec2;
use runtime::event_bus::{PageBus, PageId, Subscription};
use scene::{CellId, ClusterOverlap, SelectionId, SelectionSnapshot, SelectionStore};
use tracing::debug;

use crate::config::{CustomScale, FeatureSelection};
use crate::transform::TransformBroadcast;

/// Page-level control changes every viewer reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    FeaturesChanged(FeatureSelection),
    ScaleChanged(CustomScale),
}

#[derive(Debug, Default)]
struct PageState {
    selections: SelectionStore,
    last_transform: Option<TransformBroadcast>,
    pointer: Option<Vec2>,
    features: FeatureSelection,
    scale: CustomScale,
}

/// Subscriptions held by one mounted viewer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HubSubscriptions {
    pub transforms: Subscription,
    pub selections: Subscription,
    pub controls: Subscription,
}

/// Shared surface through which viewers on a page communicate.
#[derive(Debug, Default)]
pub struct PageHub {
    transforms: PageBus<TransformBroadcast>,
    selections: PageBus<SelectionSnapshot>,
    controls: PageBus<ControlEvent>,
    pages: HashMap<PageId, PageState>,
}

impl PageHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn page_mut(&mut self, page: &PageId) -> &mut PageState {
        self.pages.entry(page.clone()).or_insert_with(|| PageState {
            selections: SelectionStore::new(),
            ..PageState::default()
        })
    }

    /// Subscribes to every channel of `page`. The last broadcast transform is
    /// queued as an `Init` seed, and current selections are delivered at once.
    pub fn subscribe(&mut self, page: &PageId) -> HubSubscriptions {
        let subs = HubSubscriptions {
            transforms: self.transforms.subscribe(page.clone()),
            selections: self.selections.subscribe(page.clone()),
            controls: self.controls.subscribe(page.clone()),
        };
        let state = self.page_mut(page);
        let seed = state.last_transform.as_ref().map(TransformBroadcast::reseeded);
        let snapshot = state.selections.snapshot();
        if let Some(seed) = seed {
            self.transforms.deliver(subs.transforms, seed);
        }
        if !snapshot.is_empty() {
            self.selections.deliver(subs.selections, snapshot);
        }
        subs
    }

    pub fn unsubscribe(&mut self, subs: HubSubscriptions) {
        self.transforms.unsubscribe(subs.transforms);
        self.selections.unsubscribe(subs.selections);
        self.controls.unsubscribe(subs.controls);
    }

    pub fn viewer_count(&self, page: &PageId) -> usize {
        self.transforms.subscriber_count(page)
    }

    pub fn broadcast_transform(&mut self, page: &PageId, broadcast: TransformBroadcast) -> usize {
        self.page_mut(page).last_transform = Some(broadcast.clone());
        self.transforms.publish(page, broadcast)
    }

    pub fn last_transform(&self, page: &PageId) -> Option<&TransformBroadcast> {
        self.pages.get(page)?.last_transform.as_ref()
    }

    pub fn drain_transforms(&mut self, sub: Subscription) -> Vec<TransformBroadcast> {
        self.transforms.drain(sub)
    }

    /// Host-reported pointer position in page coordinates.
    pub fn set_pointer(&mut self, page: &PageId, pointer: Option<Vec2>) {
        self.page_mut(page).pointer = pointer;
    }

    pub fn pointer(&self, page: &PageId) -> Option<Vec2> {
        self.pages.get(page)?.pointer
    }

    pub fn selections(&self, page: &PageId) -> SelectionSnapshot {
        self.pages
            .get(page)
            .map(|p| p.selections.snapshot())
            .unwrap_or_default()
    }

    pub fn drain_selections(&mut self, sub: Subscription) -> Vec<SelectionSnapshot> {
        self.selections.drain(sub)
    }

    pub fn commit_selection(
        &mut self,
        page: &PageId,
        color: Rgb,
        points: Vec<CellId>,
        source_viewer: &str,
        source_dataset: &str,
    ) -> Option<SelectionId> {
        let id = self
            .page_mut(page)
            .selections
            .commit(color, points, source_viewer, source_dataset)?;
        self.publish_selections(page);
        Some(id)
    }

    /// Flips a selection's visibility; returns the new value.
    pub fn toggle_selection(&mut self, page: &PageId, id: SelectionId) -> Option<bool> {
        let selected = self.page_mut(page).selections.toggle(id)?;
        self.publish_selections(page);
        Some(selected)
    }

    pub fn remove_selection(&mut self, page: &PageId, id: SelectionId) -> bool {
        if !self.page_mut(page).selections.remove(id) {
            return false;
        }
        self.publish_selections(page);
        true
    }

    pub fn attach_overlaps(&mut self, page: &PageId, id: SelectionId, overlaps: Vec<ClusterOverlap>) -> bool {
        if !self.page_mut(page).selections.attach_overlaps(id, overlaps) {
            debug!(selection = id.0, "overlaps for removed selection dropped");
            return false;
        }
        self.publish_selections(page);
        true
    }

    fn publish_selections(&mut self, page: &PageId) {
        let snapshot = self.page_mut(page).selections.snapshot();
        self.selections.publish(page, snapshot);
    }

    pub fn features(&self, page: &PageId) -> FeatureSelection {
        self.pages.get(page).map(|p| p.features.clone()).unwrap_or_default()
    }

    pub fn set_features(&mut self, page: &PageId, features: FeatureSelection) {
        self.page_mut(page).features = features.clone();
        self.controls.publish(page, ControlEvent::FeaturesChanged(features));
    }

    pub fn scale(&self, page: &PageId) -> CustomScale {
        self.pages.get(page).map(|p| p.scale).unwrap_or_default()
    }

    pub fn set_scale(&mut self, page: &PageId, slot: usize, bounds: Option<[f64; 2]>) -> bool {
        let state = self.page_mut(page);
        if !state.scale.set(slot, bounds) {
            return false;
        }
        let scale = state.scale;
        self.controls.publish(page, ControlEvent::ScaleChanged(scale));
        true
    }

    pub fn drain_controls(&mut self, sub: Subscription) -> Vec<ControlEvent> {
        self.controls.drain(sub)
    }
}
