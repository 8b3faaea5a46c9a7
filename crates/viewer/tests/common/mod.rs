#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use foundation::math::Vec2;
use runtime::event_bus::PageId;
use scene::{CellId, ClusterOverlap, Trajectory};
use streaming::{
    ColorsReply, CoordinatesReply, DataSource, FeatureLabel, Inbound, LabelsReply, Query, Reply,
};
use viewer::{Alert, CustomScale, DataSelection, PageHub, Rect, Viewer, ViewerCallbacks, ViewerConfig};

/// The five points used by the end-to-end scenario.
pub const FIVE: [(f64, f64); 5] = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0), (0.5, 0.5)];

#[derive(Default)]
pub struct FakeSource {
    pub datasets: HashMap<String, CoordinatesReply>,
    pub colors: Option<ColorsReply>,
    pub trajectory: Option<Trajectory>,
    pub offline: bool,
    pub log: Vec<Query>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(mut self, name: &str, first_id: u32, points: &[(f64, f64)]) -> Self {
        self.datasets.insert(
            name.to_string(),
            CoordinatesReply {
                ids: (0..points.len() as u32).map(|i| CellId(first_id + i)).collect(),
                x: points.iter().map(|p| p.0).collect(),
                y: points.iter().map(|p| p.1).collect(),
            },
        );
        self
    }

    pub fn count(&self, pred: impl Fn(&Query) -> bool) -> usize {
        self.log.iter().filter(|q| pred(q)).count()
    }

    pub fn translations(&self) -> usize {
        self.count(|q| matches!(q, Query::TranslateSelection { .. }))
    }
}

impl DataSource for FakeSource {
    fn fetch(&mut self, query: &Query) -> Reply {
        self.log.push(query.clone());
        if self.offline {
            return Reply::TransportFailed {
                message: "connection refused".into(),
            };
        }
        match query {
            Query::Coordinates { dataset, .. } => Reply::Coordinates(self.datasets.get(dataset).cloned()),
            Query::CellColors { dataset, .. } => {
                if let Some(reply) = &self.colors {
                    return Reply::Colors(reply.clone());
                }
                let n = self.datasets.get(dataset).map(|d| d.ids.len()).unwrap_or(0);
                Reply::Colors(ColorsReply {
                    colors: Some(
                        (0..n)
                            .map(|i| format!("#{:02x}0000", (i * 40) % 256))
                            .collect(),
                    ),
                    legend: serde_json::json!({ "min": 0, "max": n }),
                    ..ColorsReply::default()
                })
            }
            Query::FeatureLabels { feature, .. } => Reply::Labels(LabelsReply {
                labels: vec![FeatureLabel {
                    label: format!("{feature}-0"),
                    colour: "#123456".into(),
                    coordinate: [0.5, 0.5],
                }],
            }),
            Query::ClusterOverlaps { ids, .. } => Reply::Overlaps(vec![ClusterOverlap {
                cluster: "c0".into(),
                count: ids.len() as u64,
                fraction: 1.0,
            }]),
            Query::TranslateSelection { ids, .. } => {
                Reply::Translation(ids.iter().map(|id| CellId(id.0 + 100)).collect())
            }
            Query::ActiveTrajectory { .. } => Reply::Trajectory(self.trajectory.clone()),
        }
    }
}

#[derive(Debug, Default)]
pub struct Log {
    pub legends: Vec<serde_json::Value>,
    pub scales: Vec<CustomScale>,
    pub alerts: Vec<Alert>,
    pub connectivity: Vec<bool>,
}

#[derive(Clone, Default)]
pub struct Recorder(pub Rc<RefCell<Log>>);

impl ViewerCallbacks for Recorder {
    fn on_legend_changed(&mut self, _viewer: &str, legend: &serde_json::Value) {
        self.0.borrow_mut().legends.push(legend.clone());
    }

    fn on_scale_changed(&mut self, _viewer: &str, scale: &CustomScale) {
        self.0.borrow_mut().scales.push(*scale);
    }

    fn on_alert(&mut self, alert: Alert) {
        self.0.borrow_mut().alerts.push(alert);
    }

    fn on_connectivity(&mut self, connected: bool) {
        self.0.borrow_mut().connectivity.push(connected);
    }
}

pub fn page() -> PageId {
    PageId::from("compare")
}

pub fn config() -> ViewerConfig {
    ViewerConfig {
        color_seed: Some(42),
        ..ViewerConfig::default()
    }
}

pub fn mounted(hub: &mut PageHub, name: &str, rect: Rect) -> Viewer {
    let mut v = Viewer::new(name, page(), config());
    v.mount(hub, rect);
    v
}

/// Answers every outstanding query until the viewers go quiet.
pub fn settle(hub: &mut PageHub, viewers: &mut [&mut Viewer], source: &mut FakeSource) {
    for _ in 0..16 {
        let mut idle = true;
        for v in viewers.iter_mut() {
            v.pump(hub);
            let out = v.drain_outbox();
            idle &= out.is_empty();
            for o in out {
                let reply = source.fetch(&o.query);
                v.handle_reply(hub, Inbound { token: o.token, reply });
            }
        }
        if idle {
            return;
        }
    }
}

pub fn load(hub: &mut PageHub, v: &mut Viewer, source: &mut FakeSource, dataset: &str) {
    v.load_coordinates(DataSelection::new(dataset, "umap"));
    settle(hub, &mut [v], source);
}

/// Page coordinates of a data-space point in `v`.
pub fn page_pos(v: &Viewer, x: f64, y: f64) -> Vec2 {
    let local = v.renderer().data_to_screen(Vec2::new(x, y));
    let r = v.rect();
    Vec2::new(local.x + r.left, local.y + r.top)
}

/// Draws a lasso through the given data-space vertices.
pub fn draw_lasso(hub: &mut PageHub, v: &mut Viewer, vertices: &[(f64, f64)]) -> Option<scene::SelectionId> {
    v.set_lasso_tool(true);
    let (first, rest) = vertices.split_first()?;
    let p = page_pos(v, first.0, first.1);
    v.pointer_down(hub, p);
    for (x, y) in rest {
        let p = page_pos(v, *x, *y);
        v.pointer_move(hub, p);
    }
    v.pointer_up(hub)
}
