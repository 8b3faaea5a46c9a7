use std::collections::HashMap;

use foundation::math::Vec2;
use gpu::{RenderFrame, SpriteRenderer, ZoomTransform};
use runtime::event_bus::PageId;
use runtime::frame::Frame;
use runtime::metrics::Instrumentation;
use runtime::paint::PaintKind;
use scene::{CoordinateSet, PointStore, SelectionId, Trajectory, pick_polygon};
use streaming::{CoordinatesReply, Inbound, Outbound, Outbox, Query, Reply, Request, RequestKind};
use tracing::{debug, info, warn};

use crate::callbacks::{Alert, NoCallbacks, ViewerCallbacks};
use crate::config::{DataSelection, ViewerConfig, ViewerSettings};
use crate::error::ViewerError;
use crate::hub::{ControlEvent, HubSubscriptions, PageHub};
use crate::lasso::LassoEngine;
use crate::pipeline::{LabelBatch, colors_query, decode_color_reply, label_queries};
use crate::transform::{GestureEvent, GestureKind, Rect, TransformBroadcaster};
use crate::translation::SelectionView;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    /// A coordinate request is outstanding (or never came back).
    Loading,
    Ready,
    /// The data source had no coordinates for the request.
    Empty,
}

/// One rendering surface showing one dataset/embedding.
///
/// All I/O goes through the outbox: the host sends [`Viewer::drain_outbox`]
/// to the data source and hands replies back with [`Viewer::handle_reply`].
pub struct Viewer {
    name: String,
    page: PageId,
    config: ViewerConfig,
    settings: ViewerSettings,
    rect: Rect,
    data: Option<DataSelection>,
    pending_data: Option<(Request, DataSelection)>,
    pending_trajectory: Option<Trajectory>,
    store: PointStore,
    renderer: SpriteRenderer,
    broadcaster: TransformBroadcaster,
    lasso: LassoEngine,
    selections: SelectionView,
    latest_selections: scene::SelectionSnapshot,
    outbox: Outbox,
    labels: LabelBatch,
    overlap_requests: HashMap<Request, SelectionId>,
    subs: Option<HubSubscriptions>,
    load_state: LoadState,
    connected: bool,
    callbacks: Box<dyn ViewerCallbacks>,
    instrumentation: Option<Box<dyn Instrumentation>>,
}

impl std::fmt::Debug for Viewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewer")
            .field("name", &self.name)
            .field("page", &self.page)
            .field("data", &self.data)
            .field("points", &self.store.len())
            .field("load_state", &self.load_state)
            .finish_non_exhaustive()
    }
}

impl Viewer {
    pub fn new(name: impl Into<String>, page: PageId, config: ViewerConfig) -> Self {
        let name = name.into();
        Self {
            page,
            settings: ViewerSettings::default(),
            rect: Rect::default(),
            data: None,
            pending_data: None,
            pending_trajectory: None,
            store: PointStore::new(),
            renderer: SpriteRenderer::new(config.renderer.clone()),
            broadcaster: TransformBroadcaster::new(name.clone(), config.min_scale),
            lasso: LassoEngine::new(config.color_seed),
            selections: SelectionView::new(name.clone()),
            latest_selections: Default::default(),
            outbox: Outbox::new(),
            labels: LabelBatch::new(),
            overlap_requests: HashMap::new(),
            subs: None,
            load_state: LoadState::Idle,
            connected: true,
            callbacks: Box::new(NoCallbacks),
            instrumentation: None,
            config,
            name,
        }
    }

    pub fn with_callbacks(mut self, callbacks: Box<dyn ViewerCallbacks>) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn set_instrumentation(&mut self, hook: Option<Box<dyn Instrumentation>>) {
        self.instrumentation = hook;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn page(&self) -> &PageId {
        &self.page
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn data(&self) -> Option<&DataSelection> {
        self.data.as_ref()
    }

    pub fn store(&self) -> &PointStore {
        &self.store
    }

    pub fn renderer(&self) -> &SpriteRenderer {
        &self.renderer
    }

    pub fn transform(&self) -> ZoomTransform {
        self.broadcaster.current()
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_mounted(&self) -> bool {
        self.subs.is_some()
    }

    pub fn selections(&self) -> &SelectionView {
        &self.selections
    }

    pub fn lasso(&self) -> &LassoEngine {
        &self.lasso
    }

    fn count(&mut self, name: &'static str, by: u64) {
        if let Some(hook) = self.instrumentation.as_mut() {
            hook.count(name, by);
        }
    }

    /// Joins the page and sizes the renderer to `rect`.
    pub fn mount(&mut self, hub: &mut PageHub, rect: Rect) {
        if self.subs.is_some() {
            return;
        }
        if self.renderer.is_destroyed() {
            self.renderer = SpriteRenderer::new(self.config.renderer.clone());
            self.renderer.set_sort_before_render(self.settings.sort_before_render);
            self.renderer.set_show_labels(self.settings.show_labels);
            self.broadcaster = TransformBroadcaster::new(self.name.clone(), self.config.min_scale);
            debug!(viewer = %self.name, "renderer recreated for remount");
        }
        self.subs = Some(hub.subscribe(&self.page));
        self.rect = rect;
        self.renderer.initialize(rect.width, rect.height);
        info!(viewer = %self.name, page = %self.page.0, "viewer mounted");
    }

    /// Leaves the page and releases every renderer resource.
    pub fn unmount(&mut self, hub: &mut PageHub) {
        if let Some(subs) = self.subs.take() {
            hub.unsubscribe(subs);
        }
        self.lasso.cancel();
        self.outbox.clear();
        self.overlap_requests.clear();
        self.selections.clear();
        self.latest_selections = Default::default();
        self.labels = LabelBatch::new();
        self.store.clear();
        self.data = None;
        self.pending_data = None;
        self.pending_trajectory = None;
        self.load_state = LoadState::Idle;
        self.renderer.destroy();
        info!(viewer = %self.name, "viewer unmounted");
    }

    pub fn set_settings(&mut self, settings: ViewerSettings) {
        self.renderer.set_sort_before_render(settings.sort_before_render);
        self.renderer.set_show_labels(settings.show_labels);
        self.settings = settings;
    }

    /// New viewport size or position; the current transform is kept.
    pub fn set_rect(&mut self, rect: Rect) {
        let resized = rect.size() != self.rect.size();
        self.rect = rect;
        if resized {
            self.renderer.resize(rect.width, rect.height);
        }
    }

    pub fn set_lasso_tool(&mut self, active: bool) {
        self.lasso.set_tool_active(active);
        if !active {
            self.broadcaster.set_enabled(true);
            self.renderer.clear_lasso();
        }
    }

    /// Requests coordinates and the active trajectory for `data`.
    ///
    /// A later call makes the replies to this one stale.
    pub fn load_coordinates(&mut self, data: DataSelection) -> Request {
        let token = self.outbox.submit(Query::Coordinates {
            dataset: data.dataset.clone(),
            embedding: data.embedding.clone(),
            annotation_filter: data.annotation_filter.clone(),
            logic_op: data.logic_op,
        });
        self.outbox.submit(Query::ActiveTrajectory {
            embedding: data.embedding.clone(),
        });
        self.pending_data = Some((token, data));
        self.pending_trajectory = None;
        self.load_state = LoadState::Loading;
        token
    }

    /// Requests colours for the page's current features, or paints gray without any.
    pub fn recolor(&mut self, hub: &PageHub) -> Option<Request> {
        let data = self.data.clone()?;
        let features = hub.features(&self.page);
        match colors_query(&data, &features, &hub.scale(&self.page), &self.settings) {
            Some(query) => Some(self.outbox.submit(query)),
            None => {
                self.outbox.cancel(RequestKind::Colors);
                self.store.recolor(&[]);
                self.renderer.recolor(&self.store.colors());
                None
            }
        }
    }

    /// Requests labels for annotation features. Without any, the label layer is cleared.
    pub fn load_labels(&mut self, hub: &PageHub) -> usize {
        let Some(data) = self.data.clone() else {
            return 0;
        };
        let queries = label_queries(&data, &hub.features(&self.page));
        self.labels.begin(self.settings.label_size);
        if queries.is_empty() {
            self.renderer.set_labels(self.labels.layer().clone());
            return 0;
        }
        let n = queries.len();
        for (feature, query) in queries {
            let token = self.outbox.submit(query);
            self.labels.track(token, feature);
        }
        n
    }

    pub fn drain_outbox(&mut self) -> Vec<Outbound> {
        self.outbox.drain()
    }

    /// Applies a local pan/zoom and broadcasts it to the page when allowed.
    pub fn local_gesture(&mut self, hub: &mut PageHub, event: GestureEvent) -> Option<GestureKind> {
        hub.set_pointer(&self.page, Some(event.pointer));
        let outcome = self
            .broadcaster
            .local_gesture(event, self.rect, self.settings.dissociate_viewers)?;
        if outcome.kind != GestureKind::Unchanged {
            self.renderer.apply_transform(outcome.transform);
        }
        if let Some(broadcast) = outcome.broadcast {
            hub.broadcast_transform(&self.page, broadcast);
            self.count("viewer.broadcasts", 1);
        }
        Some(outcome.kind)
    }

    pub fn pointer_down(&mut self, hub: &mut PageHub, pointer: Vec2) -> bool {
        hub.set_pointer(&self.page, Some(pointer));
        if !self.lasso.pointer_down(pointer, self.rect) {
            return false;
        }
        self.broadcaster.set_enabled(false);
        self.renderer
            .set_lasso(self.lasso.color(), self.lasso.vertices(), false);
        true
    }

    pub fn pointer_move(&mut self, hub: &mut PageHub, pointer: Vec2) -> bool {
        hub.set_pointer(&self.page, Some(pointer));
        if !self.lasso.pointer_move(pointer, self.rect) {
            return false;
        }
        self.renderer
            .set_lasso(self.lasso.color(), self.lasso.vertices(), false);
        true
    }

    /// Closes the lasso and commits a selection if any point falls inside.
    pub fn pointer_up(&mut self, hub: &mut PageHub) -> Option<SelectionId> {
        if !self.lasso.is_drawing() {
            return None;
        }
        let closed = self.lasso.pointer_up();
        self.broadcaster.set_enabled(true);
        self.renderer.clear_lasso();
        let closed = closed?;

        let hit = pick_polygon(self.renderer.screen_positions(), &closed.polygon);
        if hit.is_empty() {
            debug!(viewer = %self.name, "empty lasso discarded");
            return None;
        }
        let ids = self.store.ids_of(&hit);
        let dataset = self.store.dataset().unwrap_or_default().to_string();
        let id = hub.commit_selection(&self.page, closed.color, ids.clone(), &self.name, &dataset)?;
        let token = self.outbox.submit(Query::ClusterOverlaps { dataset, ids });
        self.overlap_requests.insert(token, id);
        Some(id)
    }

    /// Processes everything the page published since the last call.
    pub fn pump(&mut self, hub: &mut PageHub) {
        let Some(subs) = self.subs else {
            return;
        };

        let pointer = hub.pointer(&self.page);
        for broadcast in hub.drain_transforms(subs.transforms) {
            if let Some(t) = self.broadcaster.remote(
                &broadcast,
                self.rect,
                pointer,
                self.settings.dissociate_viewers,
            ) {
                self.renderer.apply_transform(t);
            }
        }

        if let Some(snapshot) = hub.drain_selections(subs.selections).pop() {
            self.latest_selections = snapshot;
            self.sync_selections();
        }

        for event in hub.drain_controls(subs.controls) {
            match event {
                ControlEvent::FeaturesChanged(_) => {
                    self.recolor(hub);
                    self.load_labels(hub);
                }
                ControlEvent::ScaleChanged(scale) => {
                    self.callbacks.on_scale_changed(&self.name, &scale);
                    self.recolor(hub);
                }
            }
        }
    }

    fn sync_selections(&mut self) {
        let Some(dataset) = self.store.dataset().map(str::to_string) else {
            return;
        };
        self.selections
            .sync(&self.latest_selections, &dataset, &mut self.outbox);
        self.refresh_highlights();
    }

    fn refresh_highlights(&mut self) {
        let dataset = self.store.dataset().unwrap_or_default();
        let highlights = self.selections.highlights(&self.store, dataset);
        self.renderer.set_highlights(highlights);
    }

    /// Delivers one reply from the data source.
    pub fn handle_reply(&mut self, hub: &mut PageHub, inbound: Inbound) {
        let stale_before = self.outbox.stale_dropped();
        let Some((token, kind, reply)) = self.outbox.accept(inbound) else {
            let dropped = self.outbox.stale_dropped() - stale_before;
            self.count("viewer.stale_replies", dropped);
            return;
        };

        if let Reply::TransportFailed { message } = &reply {
            self.on_transport_failed(token, kind, message);
            return;
        }
        if !self.connected {
            self.connected = true;
            self.callbacks.on_connectivity(true);
        }

        match (kind, reply) {
            (RequestKind::Coordinates, Reply::Coordinates(reply)) => {
                self.on_coordinates(hub, token, reply);
            }
            (RequestKind::Colors, Reply::Colors(reply)) => match decode_color_reply(&reply) {
                Ok(update) => {
                    self.store.recolor(&update.colors);
                    self.renderer.recolor(&self.store.colors());
                    self.callbacks.on_legend_changed(&self.name, &update.legend);
                }
                Err(err) => self.alert(err),
            },
            (RequestKind::Labels, Reply::Labels(reply)) => {
                if self.labels.accept(token, &reply) {
                    self.renderer.set_labels(self.labels.layer().clone());
                }
            }
            (RequestKind::Overlaps, Reply::Overlaps(overlaps)) => {
                if let Some(id) = self.overlap_requests.remove(&token) {
                    hub.attach_overlaps(&self.page, id, overlaps);
                }
            }
            (RequestKind::Translation, Reply::Translation(ids)) => {
                let dataset = self.store.dataset().unwrap_or_default().to_string();
                if self.selections.on_translation(token, ids, &dataset) {
                    self.refresh_highlights();
                }
            }
            (RequestKind::Trajectory, Reply::Trajectory(trajectory)) => {
                let trajectory = trajectory.unwrap_or_default();
                if self.pending_data.is_some() {
                    self.pending_trajectory = Some(trajectory);
                } else {
                    self.renderer.set_trajectory(trajectory.segments());
                    self.store.set_trajectory(trajectory);
                }
            }
            (kind, reply) => {
                warn!(viewer = %self.name, ?kind, ?reply, "reply does not match request");
            }
        }
    }

    fn on_transport_failed(&mut self, token: Request, kind: RequestKind, message: &str) {
        let err = ViewerError::Transport(message.to_string());
        warn!(viewer = %self.name, token = token.0, ?kind, %err, "request failed");
        if self.connected {
            self.connected = false;
            self.callbacks.on_connectivity(false);
        }
        match kind {
            RequestKind::Translation => self.selections.on_translation_failed(token, message),
            RequestKind::Overlaps => {
                self.overlap_requests.remove(&token);
            }
            _ => {}
        }
    }

    fn on_coordinates(&mut self, hub: &mut PageHub, token: Request, reply: Option<CoordinatesReply>) {
        let Some((pending, data)) = self.pending_data.take() else {
            return;
        };
        if pending != token {
            self.pending_data = Some((pending, data));
            return;
        }

        let set = match reply {
            Some(c) => CoordinateSet::from_columns(&data.dataset, &data.embedding, c.ids, &c.x, &c.y)
                .map_err(ViewerError::from),
            None => Ok(CoordinateSet::empty(&data.dataset, &data.embedding)),
        };
        let set = set.unwrap_or_else(|err| {
            warn!(viewer = %self.name, %err, "coordinates rejected");
            CoordinateSet::empty(&data.dataset, &data.embedding)
        });
        let set = set.with_trajectory(self.pending_trajectory.take().unwrap_or_default());

        self.store.replace(&set);
        self.renderer.set_points(self.store.points());
        self.renderer.set_trajectory(set.trajectory.segments());
        self.renderer.apply_transform(self.broadcaster.current());
        self.load_state = if set.is_empty() {
            LoadState::Empty
        } else {
            LoadState::Ready
        };
        info!(
            viewer = %self.name,
            dataset = %data.dataset,
            embedding = %data.embedding,
            points = set.len(),
            "coordinates applied"
        );
        if let Some(hook) = self.instrumentation.as_mut() {
            hook.observe("viewer.points", set.len() as i64);
        }
        self.data = Some(data);

        self.sync_selections();
        self.recolor(hub);
        self.load_labels(hub);
    }

    fn alert(&mut self, err: ViewerError) {
        warn!(viewer = %self.name, %err, "colour update rejected");
        self.callbacks.on_alert(Alert {
            viewer: self.name.clone(),
            message: err.to_string(),
        });
    }

    /// Runs the scheduled paint for this frame, if any.
    pub fn tick(&mut self, frame: Frame) -> Option<RenderFrame> {
        let (kind, out) = self.renderer.paint(frame)?;
        self.count("viewer.paints", 1);
        if kind == PaintKind::Relayout {
            self.count("viewer.relayouts", 1);
        }
        Some(out)
    }
}
