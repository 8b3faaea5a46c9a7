use gpu::RendererConfig;
use serde::{Deserialize, Serialize};
use streaming::{FeatureSlot, LogicOp};

use crate::error::ViewerError;

/// Maximum number of feature slots on one page.
pub const MAX_FEATURE_SLOTS: usize = 3;

/// UI-owned settings, read again at every pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub show_labels: bool,
    pub label_size: f32,
    pub sort_before_render: bool,
    pub dissociate_viewers: bool,
    pub log_transform: bool,
    pub cpm_transform: bool,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            show_labels: true,
            label_size: 14.0,
            sort_before_render: false,
            dissociate_viewers: false,
            log_transform: false,
            cpm_transform: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Lower clamp for the zoom factor.
    pub min_scale: f64,
    /// Seed for selection colours; entropy when unset.
    pub color_seed: Option<u64>,
    #[serde(flatten)]
    pub renderer: RendererConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            color_seed: None,
            renderer: RendererConfig::default(),
        }
    }
}

impl ViewerConfig {
    pub fn from_json(s: &str) -> Result<Self, ViewerError> {
        Ok(serde_json::from_str(s)?)
    }
}

/// What a viewer shows: dataset, embedding and the cell filter applied to it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataSelection {
    pub dataset: String,
    pub embedding: String,
    #[serde(default)]
    pub annotation_filter: Vec<String>,
    #[serde(default)]
    pub logic_op: LogicOp,
}

impl DataSelection {
    pub fn new(dataset: impl Into<String>, embedding: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            embedding: embedding.into(),
            ..Self::default()
        }
    }
}

/// Up to [`MAX_FEATURE_SLOTS`] features driving colours and labels.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureSelection {
    slots: [Option<FeatureSlot>; MAX_FEATURE_SLOTS],
}

impl FeatureSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if `slot` is out of range.
    pub fn set(&mut self, slot: usize, feature: Option<FeatureSlot>) -> bool {
        match self.slots.get_mut(slot) {
            Some(s) => {
                *s = feature;
                true
            }
            None => false,
        }
    }

    pub fn with(mut self, slot: usize, feature: FeatureSlot) -> Self {
        self.set(slot, Some(feature));
        self
    }

    /// Filled slots with their index, in slot order.
    pub fn active(&self) -> impl Iterator<Item = (usize, &FeatureSlot)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (i, s)))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn annotations(&self) -> impl Iterator<Item = &FeatureSlot> + '_ {
        self.active().map(|(_, s)| s).filter(|s| s.is_annotation())
    }
}

/// Per-slot `[min, max]` overrides of the data-driven colour range.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CustomScale {
    slots: [Option<[f64; 2]>; MAX_FEATURE_SLOTS],
}

impl CustomScale {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bounds for `slot`; bounds are stored low-to-high.
    pub fn set(&mut self, slot: usize, bounds: Option<[f64; 2]>) -> bool {
        let Some(s) = self.slots.get_mut(slot) else {
            return false;
        };
        *s = bounds.map(|[a, b]| if a <= b { [a, b] } else { [b, a] });
        true
    }

    pub fn get(&self, slot: usize) -> Option<[f64; 2]> {
        self.slots.get(slot).copied().flatten()
    }

    pub fn vmin(&self, slots: &[usize]) -> Vec<Option<f64>> {
        slots.iter().map(|&i| self.get(i).map(|b| b[0])).collect()
    }

    pub fn vmax(&self, slots: &[usize]) -> Vec<Option<f64>> {
        slots.iter().map(|&i| self.get(i).map(|b| b[1])).collect()
    }
}
