use foundation::arena::Arena;
use foundation::bounds::Aabb2;
use foundation::color::{NEUTRAL_GRAY, Rgb};
use foundation::math::Vec2;
use layers::{LabelLayoutConfig, LabelProjector, LabelsLayer, layout_labels_2d};
use runtime::frame::Frame;
use runtime::paint::{PaintKind, PaintScheduler};
use scene::{CellId, Point, SelectionId, SelectionSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::commands::{RenderCommand, RenderFrame, SpriteInstance};
use crate::transform::{Layout, ZoomTransform};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub initial_sprite_capacity: usize,
    pub point_radius_px: f32,
    pub highlight_radius_px: f32,
    pub lasso_fill_alpha: f32,
    pub trajectory_width_px: f32,
    pub label_cell_px: f32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            initial_sprite_capacity: 1024,
            point_radius_px: 2.0,
            highlight_radius_px: 3.0,
            lasso_fill_alpha: 0.25,
            trajectory_width_px: 1.5,
            label_cell_px: 32.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct Sprite {
    id: CellId,
    data: Vec2,
    screen: Vec2,
    tint: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
struct Highlight {
    selection: SelectionId,
    color: Rgb,
    points: SelectionSet,
}

#[derive(Debug, Clone, PartialEq)]
struct LassoOverlay {
    color: Rgb,
    vertices: Vec<Vec2>,
    closed: bool,
}

/// Live resource counters; all zero after [`SpriteRenderer::destroy`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ResourceStats {
    pub sprite_capacity: usize,
    pub live_sprites: usize,
    pub containers_created: u64,
    pub live_layers: usize,
}

/// Retained-mode point renderer for one viewer.
///
/// State mutations only schedule a paint; [`SpriteRenderer::paint`] produces
/// at most one [`RenderFrame`] per frame.
#[derive(Debug)]
pub struct SpriteRenderer {
    config: RendererConfig,
    sprites: Arena<Sprite>,
    draw_order: Vec<u32>,
    sort_before_render: bool,
    bounds: Option<Aabb2>,
    layout: Layout,
    transform: ZoomTransform,
    highlights: Vec<Highlight>,
    lasso: Option<LassoOverlay>,
    trajectory: Vec<(Vec2, Vec2)>,
    labels: LabelsLayer,
    show_labels: bool,
    paint: PaintScheduler,
    initialized: bool,
    destroyed: bool,
}

impl SpriteRenderer {
    pub fn new(config: RendererConfig) -> Self {
        let sprites = Arena::with_capacity(config.initial_sprite_capacity);
        Self {
            config,
            sprites,
            draw_order: Vec::new(),
            sort_before_render: false,
            bounds: None,
            layout: Layout::default(),
            transform: ZoomTransform::IDENTITY,
            highlights: Vec::new(),
            lasso: None,
            trajectory: Vec::new(),
            labels: LabelsLayer::default(),
            show_labels: true,
            paint: PaintScheduler::new(),
            initialized: false,
            destroyed: false,
        }
    }

    pub fn initialize(&mut self, width: f64, height: f64) {
        if self.guard("initialize") {
            return;
        }
        self.initialized = true;
        self.layout = Layout::fit(self.bounds, [width, height]);
        self.relayout();
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized && !self.destroyed
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn viewport(&self) -> [f64; 2] {
        self.layout.viewport
    }

    pub fn scaling_factor(&self) -> u32 {
        self.layout.scaling_factor
    }

    pub fn transform(&self) -> ZoomTransform {
        self.transform
    }

    /// Refits the layout to a new viewport; sprites keep identity, position and tint.
    pub fn resize(&mut self, width: f64, height: f64) {
        if self.guard("resize") {
            return;
        }
        let needed = self.sprites.len();
        if self.sprites.ensure_capacity(needed) {
            debug!(capacity = self.sprites.capacity(), "sprite container recreated");
        }
        self.layout = Layout::fit(self.bounds, [width, height]);
        self.relayout();
    }

    /// Replaces every sprite. The scaling factor is recomputed for the new set.
    pub fn set_points(&mut self, points: &[Point]) {
        if self.guard("set_points") {
            return;
        }
        if self.sprites.ensure_capacity(points.len()) {
            debug!(
                capacity = self.sprites.capacity(),
                points = points.len(),
                "sprite container recreated"
            );
        }
        self.sprites.clear();
        for p in points {
            let sprite = Sprite {
                id: p.id,
                data: p.position,
                screen: p.position,
                tint: p.color,
            };
            if let Err(err) = self.sprites.alloc(sprite) {
                warn!(%err, "sprite dropped");
                break;
            }
        }
        self.bounds = Aabb2::from_points(points.iter().map(|p| p.position));
        self.layout = Layout::fit(self.bounds, self.layout.viewport);
        self.highlights.clear();
        self.rebuild_draw_order();
        self.relayout();
    }

    /// Updates tints in place; missing entries fall back to the neutral gray.
    pub fn recolor(&mut self, colors: &[Rgb]) {
        if self.guard("recolor") {
            return;
        }
        for (i, s) in self.sprites.iter_mut().enumerate() {
            s.tint = colors.get(i).copied().unwrap_or(NEUTRAL_GRAY);
        }
        self.rebuild_draw_order();
        self.paint.request(PaintKind::Repaint);
    }

    pub fn set_sort_before_render(&mut self, enabled: bool) {
        if self.sort_before_render == enabled {
            return;
        }
        self.sort_before_render = enabled;
        self.rebuild_draw_order();
        self.paint.request(PaintKind::Repaint);
    }

    /// Repositions every layer. A changed scale is a full re-layout, a pure pan only a repaint.
    pub fn apply_transform(&mut self, transform: ZoomTransform) {
        if self.guard("apply_transform") {
            return;
        }
        let zoomed = transform.k != self.transform.k;
        self.transform = transform;
        for s in self.sprites.iter_mut() {
            s.screen = transform.apply(self.layout.to_layout(s.data));
        }
        self.paint.request(if zoomed {
            PaintKind::Relayout
        } else {
            PaintKind::Repaint
        });
    }

    pub fn set_highlights<I>(&mut self, highlights: I)
    where
        I: IntoIterator<Item = (SelectionId, Rgb, SelectionSet)>,
    {
        if self.guard("set_highlights") {
            return;
        }
        self.highlights = highlights
            .into_iter()
            .map(|(selection, color, points)| Highlight {
                selection,
                color,
                points,
            })
            .collect();
        self.paint.request(PaintKind::Repaint);
    }

    /// Draws the in-progress lasso; vertices are in the viewer's local pixel frame.
    pub fn set_lasso(&mut self, color: Rgb, vertices: &[Vec2], closed: bool) {
        if self.guard("set_lasso") {
            return;
        }
        self.lasso = Some(LassoOverlay {
            color,
            vertices: vertices.to_vec(),
            closed,
        });
        self.paint.request(PaintKind::Repaint);
    }

    pub fn clear_lasso(&mut self) {
        if self.lasso.take().is_some() {
            self.paint.request(PaintKind::Repaint);
        }
    }

    pub fn set_trajectory(&mut self, segments: Vec<(Vec2, Vec2)>) {
        if self.guard("set_trajectory") {
            return;
        }
        self.trajectory = segments;
        self.paint.request(PaintKind::Repaint);
    }

    pub fn set_labels(&mut self, labels: LabelsLayer) {
        if self.guard("set_labels") {
            return;
        }
        self.labels = labels;
        self.paint.request(PaintKind::Repaint);
    }

    pub fn set_show_labels(&mut self, show: bool) {
        if self.show_labels != show {
            self.show_labels = show;
            self.paint.request(PaintKind::Repaint);
        }
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn sprite_capacity(&self) -> usize {
        self.sprites.capacity()
    }

    pub fn tints(&self) -> Vec<Rgb> {
        self.sprites.iter().map(|s| s.tint).collect()
    }

    pub fn ids(&self) -> Vec<CellId> {
        self.sprites.iter().map(|s| s.id).collect()
    }

    /// Sprite indices in the order they are drawn.
    pub fn draw_order(&self) -> &[u32] {
        &self.draw_order
    }

    /// `(sprite index, screen position)` for every sprite.
    pub fn screen_positions(&self) -> impl Iterator<Item = (u32, Vec2)> + '_ {
        self.sprites
            .iter()
            .enumerate()
            .map(|(i, s)| (i as u32, s.screen))
    }

    pub fn data_to_screen(&self, p: Vec2) -> Vec2 {
        self.transform.apply(self.layout.to_layout(p))
    }

    pub fn paint_pending(&self) -> Option<PaintKind> {
        self.paint.pending()
    }

    /// Runs the scheduled paint for `frame`, if any.
    pub fn paint(&mut self, frame: Frame) -> Option<(PaintKind, RenderFrame)> {
        if self.destroyed {
            return None;
        }
        let kind = self.paint.take(frame)?;
        if kind == PaintKind::Relayout {
            self.relayout_positions();
        }
        Some((kind, self.build_frame()))
    }

    /// Builds the current frame without touching the paint schedule.
    pub fn build_frame(&self) -> RenderFrame {
        let mut frame = RenderFrame::default();
        if self.destroyed {
            return frame;
        }

        frame.commands.push(RenderCommand::Sprites {
            radius_px: self.config.point_radius_px,
            instances: self
                .draw_order
                .iter()
                .filter_map(|&i| self.sprites.get(i as usize))
                .map(|s| SpriteInstance {
                    id: s.id,
                    position: to_f32(s.screen),
                    color: s.tint.to_rgba_f32(1.0),
                })
                .collect(),
        });

        for h in &self.highlights {
            frame.commands.push(RenderCommand::Highlight {
                selection: h.selection,
                radius_px: self.config.highlight_radius_px,
                color: h.color.to_rgba_f32(1.0),
                positions: h
                    .points
                    .iter()
                    .filter_map(|i| self.sprites.get(i as usize))
                    .map(|s| to_f32(s.screen))
                    .collect(),
            });
        }

        if let Some(lasso) = &self.lasso {
            frame.commands.push(RenderCommand::Polygon {
                fill: lasso.color.to_rgba_f32(self.config.lasso_fill_alpha),
                stroke: lasso.color.to_rgba_f32(1.0),
                vertices: lasso.vertices.iter().copied().map(to_f32).collect(),
                closed: lasso.closed,
            });
        }

        if !self.trajectory.is_empty() {
            frame.commands.push(RenderCommand::Lines {
                color: [0.0, 0.0, 0.0, 1.0],
                width_px: self.config.trajectory_width_px,
                segments: self
                    .trajectory
                    .iter()
                    .map(|(a, b)| [to_f32(self.data_to_screen(*a)), to_f32(self.data_to_screen(*b))])
                    .collect(),
            });
        }

        if self.show_labels && !self.labels.is_empty() {
            let viewport = self.layout.viewport;
            let placed = layout_labels_2d(
                &self.labels,
                self,
                LabelLayoutConfig {
                    viewport_px: [viewport[0] as f32, viewport[1] as f32],
                    cell_px: self.config.label_cell_px,
                    ..LabelLayoutConfig::default()
                },
            );
            frame
                .commands
                .extend(placed.into_iter().map(RenderCommand::Text));
        }

        frame
    }

    pub fn resources(&self) -> ResourceStats {
        if self.destroyed {
            return ResourceStats {
                containers_created: self.sprites.allocations(),
                ..ResourceStats::default()
            };
        }
        let overlays = usize::from(self.lasso.is_some())
            + usize::from(!self.trajectory.is_empty())
            + usize::from(!self.labels.is_empty());
        ResourceStats {
            sprite_capacity: self.sprites.capacity(),
            live_sprites: self.sprites.len(),
            containers_created: self.sprites.allocations(),
            live_layers: 1 + self.highlights.len() + overlays,
        }
    }

    /// Releases every resource. Later calls are ignored with a warning.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.sprites.release();
        self.draw_order = Vec::new();
        self.highlights = Vec::new();
        self.lasso = None;
        self.trajectory = Vec::new();
        self.labels = LabelsLayer::default();
        self.paint.cancel();
        self.destroyed = true;
        info!("renderer destroyed");
    }

    fn guard(&self, op: &'static str) -> bool {
        if self.destroyed {
            warn!(op, "call on destroyed renderer ignored");
        }
        self.destroyed
    }

    fn relayout(&mut self) {
        self.relayout_positions();
        self.paint.request(PaintKind::Relayout);
    }

    fn relayout_positions(&mut self) {
        let layout = self.layout;
        let transform = self.transform;
        for s in self.sprites.iter_mut() {
            s.screen = transform.apply(layout.to_layout(s.data));
        }
    }

    fn rebuild_draw_order(&mut self) {
        self.draw_order = (0..self.sprites.len() as u32).collect();
        if self.sort_before_render {
            let sprites = &self.sprites;
            self.draw_order.sort_by_key(|&i| {
                sprites
                    .get(i as usize)
                    .map(|s| s.tint.channel_sum())
                    .unwrap_or(0)
            });
        }
    }
}

impl LabelProjector for SpriteRenderer {
    fn project(&self, position: Vec2) -> Option<[f32; 2]> {
        let p = self.data_to_screen(position);
        p.is_finite().then(|| to_f32(p))
    }
}

fn to_f32(p: Vec2) -> [f32; 2] {
    [p.x as f32, p.y as f32]
}

#[cfg(test)]
mod tests {
    use super::{RendererConfig, SpriteRenderer};
    use crate::commands::RenderCommand;
    use crate::transform::ZoomTransform;
    use foundation::color::{NEUTRAL_GRAY, Rgb};
    use foundation::math::Vec2;
    use layers::{LayerKind, LabelsLayer};
    use pretty_assertions::assert_eq;
    use runtime::frame::Frame;
    use runtime::paint::PaintKind;
    use scene::{CellId, Point, SelectionId, SelectionSet};
    use streaming::protocol::FeatureLabel;

    fn points(n: u32) -> Vec<Point> {
        (0..n)
            .map(|i| Point {
                id: CellId(i),
                position: Vec2::new(f64::from(i), f64::from(i % 3)),
                color: NEUTRAL_GRAY,
            })
            .collect()
    }

    fn renderer(capacity: usize) -> SpriteRenderer {
        let mut r = SpriteRenderer::new(RendererConfig {
            initial_sprite_capacity: capacity,
            ..RendererConfig::default()
        });
        r.initialize(200.0, 100.0);
        r
    }

    #[test]
    fn growth_recreates_container_and_keeps_all_points() {
        let mut r = renderer(4);
        r.set_points(&points(10));
        assert_eq!(r.len(), 10);
        assert!(r.sprite_capacity() >= 10);
        assert_eq!(r.resources().containers_created, 2);

        r.set_points(&points(3));
        assert_eq!(r.resources().containers_created, 2);
        assert_eq!(r.ids(), vec![CellId(0), CellId(1), CellId(2)]);
    }

    #[test]
    fn recolor_keeps_identity_and_pads_gray() {
        let mut r = renderer(16);
        r.set_points(&points(3));
        let red = Rgb::new(255, 0, 0);
        r.recolor(&[red]);
        assert_eq!(r.tints(), vec![red, NEUTRAL_GRAY, NEUTRAL_GRAY]);
        assert_eq!(r.ids(), vec![CellId(0), CellId(1), CellId(2)]);
    }

    #[test]
    fn sort_before_render_orders_by_channel_sum_stably() {
        let mut r = renderer(16);
        r.set_points(&points(4));
        r.set_sort_before_render(true);
        let white = Rgb::new(255, 255, 255);
        let dark = Rgb::new(10, 10, 10);
        r.recolor(&[white, dark, white, dark]);
        assert_eq!(r.draw_order(), &[1, 3, 0, 2]);
        assert_eq!(r.ids(), vec![CellId(0), CellId(1), CellId(2), CellId(3)]);
    }

    #[test]
    fn paints_coalesce_to_one_per_frame() {
        let mut r = renderer(16);
        r.set_points(&points(3));
        r.apply_transform(ZoomTransform::new(5.0, 0.0, 1.0));
        r.recolor(&[]);
        let frame = Frame::new(1, 1.0 / 60.0);
        let (kind, _) = r.paint(frame).expect("paint");
        assert_eq!(kind, PaintKind::Relayout);
        r.recolor(&[]);
        assert!(r.paint(frame).is_none());
        assert!(r.paint(frame.next()).is_some());
    }

    #[test]
    fn pan_only_requests_repaint() {
        let mut r = renderer(16);
        r.set_points(&points(3));
        let _ = r.paint(Frame::new(0, 1.0));
        r.apply_transform(ZoomTransform::new(3.0, 4.0, 1.0));
        assert_eq!(r.paint_pending(), Some(PaintKind::Repaint));
        r.apply_transform(ZoomTransform::new(3.0, 4.0, 2.0));
        assert_eq!(r.paint_pending(), Some(PaintKind::Relayout));
    }

    #[test]
    fn frame_layers_are_ordered() {
        let mut r = renderer(16);
        r.set_points(&points(3));
        r.set_highlights([(SelectionId(1), Rgb::new(0, 0, 255), SelectionSet::from_iter([0, 2]))]);
        r.set_lasso(Rgb::new(0, 255, 0), &[Vec2::new(0.0, 0.0), Vec2::new(5.0, 5.0)], false);
        r.set_trajectory(vec![(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0))]);
        let mut labels = LabelsLayer::default();
        labels.extend_from_reply(
            "leiden",
            &[FeatureLabel {
                label: "T".into(),
                colour: "#000000".into(),
                coordinate: [1.0, 1.0],
            }],
        );
        r.set_labels(labels);

        let frame = r.build_frame();
        assert!(frame.is_layer_ordered());
        let kinds: Vec<LayerKind> = frame.commands.iter().map(RenderCommand::layer).collect();
        assert_eq!(
            kinds,
            vec![
                LayerKind::Points,
                LayerKind::Highlights,
                LayerKind::Lasso,
                LayerKind::Trajectory,
                LayerKind::Labels
            ]
        );
    }

    #[test]
    fn hidden_labels_are_not_drawn() {
        let mut r = renderer(16);
        let mut labels = LabelsLayer::default();
        labels.extend_from_reply(
            "leiden",
            &[FeatureLabel {
                label: "T".into(),
                colour: "#000000".into(),
                coordinate: [0.0, 0.0],
            }],
        );
        r.set_labels(labels);
        r.set_show_labels(false);
        assert_eq!(r.build_frame().layer(LayerKind::Labels).count(), 0);
    }

    #[test]
    fn resize_scales_screen_positions_with_scaling_factor() {
        let mut r = renderer(16);
        r.set_points(&points(5));
        let s0 = f64::from(r.scaling_factor());
        let before: Vec<Vec2> = r.screen_positions().map(|(_, p)| p).collect();
        r.resize(400.0, 200.0);
        let s1 = f64::from(r.scaling_factor());
        let after: Vec<Vec2> = r.screen_positions().map(|(_, p)| p).collect();
        assert_eq!(before.len(), after.len());
        for (a, b) in before.iter().zip(&after) {
            let da = (a.x - 100.0) / s0;
            let db = (b.x - 200.0) / s1;
            assert!((da - db).abs() < 1e-9);
        }
    }

    #[test]
    fn destroy_releases_everything() {
        let mut r = renderer(16);
        r.set_points(&points(3));
        r.set_lasso(Rgb::new(0, 0, 0), &[Vec2::ZERO], false);
        r.destroy();
        let stats = r.resources();
        assert_eq!(stats.live_sprites, 0);
        assert_eq!(stats.sprite_capacity, 0);
        assert_eq!(stats.live_layers, 0);
        r.set_points(&points(3));
        assert!(r.is_empty());
        assert!(r.paint(Frame::new(9, 1.0)).is_none());
    }
}
