use std::collections::BTreeMap;

use foundation::color::Rgb;
use layers::{LabelStyle, LabelsConfig, LabelsLayer};
use streaming::{ColorsReply, LabelsReply, Query, Request, decode_colors};

use crate::config::{CustomScale, DataSelection, FeatureSelection, ViewerSettings};
use crate::error::ViewerError;

#[derive(Debug, Clone, PartialEq)]
pub struct ColorUpdate {
    pub colors: Vec<Rgb>,
    pub legend: serde_json::Value,
}

/// Colour request for the active features, or `None` when no feature is selected.
pub fn colors_query(
    data: &DataSelection,
    features: &FeatureSelection,
    scale: &CustomScale,
    settings: &ViewerSettings,
) -> Option<Query> {
    if features.is_empty() {
        return None;
    }
    let (slots, active): (Vec<usize>, Vec<_>) =
        features.active().map(|(i, f)| (i, f.clone())).unzip();
    Some(Query::CellColors {
        dataset: data.dataset.clone(),
        thresholds: active.iter().map(|f| f.threshold).collect(),
        features: active,
        annotation_filter: data.annotation_filter.clone(),
        vmin: scale.vmin(&slots),
        vmax: scale.vmax(&slots),
        logic_op: data.logic_op,
        log_transform: settings.log_transform,
        cpm_transform: settings.cpm_transform,
    })
}

/// One label request per annotation feature.
pub fn label_queries(data: &DataSelection, features: &FeatureSelection) -> Vec<(String, Query)> {
    features
        .annotations()
        .map(|f| {
            (
                f.feature.clone(),
                Query::FeatureLabels {
                    dataset: data.dataset.clone(),
                    embedding: data.embedding.clone(),
                    feature: f.feature.clone(),
                },
            )
        })
        .collect()
}

/// Turns a colour reply into per-point colours; a reported error wins over any payload.
pub fn decode_color_reply(reply: &ColorsReply) -> Result<ColorUpdate, ViewerError> {
    if let Some(message) = &reply.error {
        return Err(ViewerError::Domain(message.clone()));
    }
    Ok(ColorUpdate {
        colors: decode_colors(reply)?,
        legend: reply.legend.clone(),
    })
}

/// Label replies belonging to the most recent label request batch.
#[derive(Debug, Default)]
pub struct LabelBatch {
    generation: u64,
    pending: BTreeMap<Request, String>,
    layer: LabelsLayer,
}

impl LabelBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new batch; replies to older batches are ignored from now on.
    pub fn begin(&mut self, font_size_px: f32) -> u64 {
        self.generation += 1;
        self.pending.clear();
        self.layer = LabelsLayer::new(LabelsConfig::default(), LabelStyle::with_font_size(font_size_px));
        self.generation
    }

    pub fn track(&mut self, token: Request, feature: String) {
        self.pending.insert(token, feature);
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }

    /// Returns `false` if `token` is not part of the current batch.
    pub fn accept(&mut self, token: Request, reply: &LabelsReply) -> bool {
        let Some(feature) = self.pending.remove(&token) else {
            return false;
        };
        self.layer.extend_from_reply(&feature, &reply.labels);
        true
    }

    pub fn layer(&self) -> &LabelsLayer {
        &self.layer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use streaming::{FeatureLabel, FeatureSlot, LogicOp};

    fn data() -> DataSelection {
        DataSelection::new("pbmc", "umap")
    }

    #[test]
    fn no_features_means_no_colour_request() {
        let q = colors_query(&data(), &FeatureSelection::new(), &CustomScale::new(), &ViewerSettings::default());
        assert!(q.is_none());
    }

    #[test]
    fn colour_request_carries_slot_scales() {
        let mut gene = FeatureSlot::gene("CD3E");
        gene.threshold = 0.5;
        let features = FeatureSelection::new()
            .with(0, gene.clone())
            .with(2, FeatureSlot::gene("MS4A1"));
        let mut scale = CustomScale::new();
        scale.set(2, Some([0.0, 3.0]));
        let settings = ViewerSettings {
            log_transform: true,
            ..ViewerSettings::default()
        };
        let q = colors_query(&data(), &features, &scale, &settings).expect("query");
        assert_eq!(
            q,
            Query::CellColors {
                dataset: "pbmc".into(),
                features: vec![gene, FeatureSlot::gene("MS4A1")],
                thresholds: vec![0.5, 0.0],
                annotation_filter: vec![],
                vmin: vec![None, Some(0.0)],
                vmax: vec![None, Some(3.0)],
                logic_op: LogicOp::And,
                log_transform: true,
                cpm_transform: false,
            }
        );
    }

    #[test]
    fn labels_only_for_annotations() {
        let features = FeatureSelection::new()
            .with(0, FeatureSlot::gene("CD3E"))
            .with(1, FeatureSlot::annotation("leiden"));
        let qs = label_queries(&data(), &features);
        assert_eq!(qs.len(), 1);
        assert_eq!(qs[0].0, "leiden");
        assert!(label_queries(&data(), &FeatureSelection::new()).is_empty());
    }

    #[test]
    fn error_field_becomes_domain_error() {
        let reply = ColorsReply {
            colors: Some(vec!["#000000".into()]),
            error: Some("invalid feature combination".into()),
            ..ColorsReply::default()
        };
        assert!(matches!(decode_color_reply(&reply), Err(ViewerError::Domain(m)) if m == "invalid feature combination"));
    }

    #[test]
    fn label_batch_ignores_old_tokens() {
        let mut batch = LabelBatch::new();
        batch.begin(12.0);
        batch.track(Request(1), "leiden".into());
        batch.begin(12.0);
        batch.track(Request(2), "leiden".into());
        let reply = LabelsReply {
            labels: vec![FeatureLabel {
                label: "T".into(),
                colour: "#000000".into(),
                coordinate: [0.0, 0.0],
            }],
        };
        assert!(!batch.accept(Request(1), &reply));
        assert!(batch.accept(Request(2), &reply));
        assert!(batch.is_complete());
        assert_eq!(batch.layer().anchors().len(), 1);
        assert_eq!(batch.layer().style.font_size_px, 12.0);
    }
}
