use std::collections::HashSet;

use foundation::color::{NEUTRAL_GRAY, Rgb};
use foundation::math::Vec2;
use streaming::protocol::FeatureLabel;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct LabelStyle {
    pub font_size_px: f32,
    pub halo_color: [f32; 4],
    pub halo_width_px: f32,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            font_size_px: 14.0,
            halo_color: [1.0, 1.0, 1.0, 0.85],
            halo_width_px: 2.0,
        }
    }
}

impl LabelStyle {
    pub fn with_font_size(font_size_px: f32) -> Self {
        Self {
            font_size_px,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelsConfig {
    pub max_labels: usize,
    pub max_text_len: usize,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            max_labels: 10_000,
            max_text_len: 256,
        }
    }
}

/// A label pinned to a position in data space.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelAnchor {
    pub feature: String,
    pub text: String,
    pub position: Vec2,
    pub color: Rgb,
    /// Higher priorities are placed first.
    pub priority: f32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabelsLayer {
    pub config: LabelsConfig,
    pub style: LabelStyle,
    anchors: Vec<LabelAnchor>,
}

impl LabelsLayer {
    pub fn new(config: LabelsConfig, style: LabelStyle) -> Self {
        Self {
            config,
            style,
            anchors: Vec::new(),
        }
    }

    pub fn anchors(&self) -> &[LabelAnchor] {
        &self.anchors
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn clear(&mut self) {
        self.anchors.clear();
    }

    /// Adds the labels returned for one feature. Earlier features keep priority.
    pub fn extend_from_reply(&mut self, feature: &str, labels: &[FeatureLabel]) {
        let priority = -(self.features().len() as f32);
        for label in labels {
            let text = label.label.trim();
            if text.is_empty() || text.len() > self.config.max_text_len {
                continue;
            }
            if !label.coordinate.iter().all(|c| c.is_finite()) {
                continue;
            }
            if self.anchors.len() >= self.config.max_labels {
                debug!(feature, "label limit reached");
                break;
            }
            self.anchors.push(LabelAnchor {
                feature: feature.to_string(),
                text: text.to_string(),
                position: Vec2::from(label.coordinate),
                color: Rgb::from_hex(&label.colour).unwrap_or(NEUTRAL_GRAY),
                priority,
            });
        }
    }

    fn features(&self) -> HashSet<&str> {
        self.anchors.iter().map(|a| a.feature.as_str()).collect()
    }
}

/// Maps a data-space position to screen pixels.
pub trait LabelProjector {
    fn project(&self, position: Vec2) -> Option<[f32; 2]>;
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LabelLayoutConfig {
    pub viewport_px: [f32; 2],
    pub cell_px: f32,
    pub padding_px: f32,
    pub max_labels: usize,
}

impl Default for LabelLayoutConfig {
    fn default() -> Self {
        Self {
            viewport_px: [1.0, 1.0],
            cell_px: 32.0,
            padding_px: 4.0,
            max_labels: 400,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLabel2D {
    pub text: String,
    pub screen_pos_px: [f32; 2],
    pub size_px: [f32; 2],
    pub color: Rgb,
    pub font_size_px: f32,
}

/// Places labels on an occupancy grid; a label touching an occupied cell is culled.
///
/// Ordering contract:
/// - Higher priority first, then input order.
pub fn layout_labels_2d<P: LabelProjector>(
    layer: &LabelsLayer,
    projector: &P,
    config: LabelLayoutConfig,
) -> Vec<PlacedLabel2D> {
    let mut order: Vec<&LabelAnchor> = layer.anchors.iter().collect();
    order.sort_by(|a, b| b.priority.total_cmp(&a.priority));

    let mut out = Vec::new();
    let mut occupied: HashSet<u64> = HashSet::new();

    for label in order {
        if out.len() >= config.max_labels {
            break;
        }

        let Some(screen) = projector.project(label.position) else {
            continue;
        };
        if !screen[0].is_finite() || !screen[1].is_finite() {
            continue;
        }

        let size = estimate_text_size(&label.text, &layer.style);
        let half_w = size[0] * 0.5 + config.padding_px;
        let half_h = size[1] * 0.5 + config.padding_px;

        if screen[0] + half_w < 0.0
            || screen[1] + half_h < 0.0
            || screen[0] - half_w > config.viewport_px[0]
            || screen[1] - half_h > config.viewport_px[1]
        {
            continue;
        }

        if !try_place_label(&mut occupied, screen, [half_w, half_h], config.cell_px) {
            continue;
        }

        out.push(PlacedLabel2D {
            text: label.text.clone(),
            screen_pos_px: screen,
            size_px: size,
            color: label.color,
            font_size_px: layer.style.font_size_px,
        });
    }

    out
}

fn estimate_text_size(text: &str, style: &LabelStyle) -> [f32; 2] {
    let count = text.chars().count().max(1) as f32;
    [style.font_size_px * 0.6 * count, style.font_size_px]
}

fn try_place_label(
    occupied: &mut HashSet<u64>,
    screen: [f32; 2],
    half_size: [f32; 2],
    cell_px: f32,
) -> bool {
    let cell_px = cell_px.max(1.0);
    let min_x = ((screen[0] - half_size[0]) / cell_px).floor() as i32;
    let max_x = ((screen[0] + half_size[0]) / cell_px).floor() as i32;
    let min_y = ((screen[1] - half_size[1]) / cell_px).floor() as i32;
    let max_y = ((screen[1] + half_size[1]) / cell_px).floor() as i32;

    for cy in min_y..=max_y {
        for cx in min_x..=max_x {
            if occupied.contains(&cell_key(cx, cy)) {
                return false;
            }
        }
    }

    for cy in min_y..=max_y {
        for cx in min_x..=max_x {
            occupied.insert(cell_key(cx, cy));
        }
    }

    true
}

fn cell_key(cx: i32, cy: i32) -> u64 {
    ((cx as u32 as u64) << 32) | (cy as u32 as u64)
}
