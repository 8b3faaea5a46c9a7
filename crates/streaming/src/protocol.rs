//! Wire types exchanged with the data-access collaborator.
//!
//! The viewer never performs I/O itself: it emits [`Query`] values tagged with
//! a request token and receives [`Reply`] values back through the host.

use scene::{CellId, ClusterOverlap, Trajectory};
use serde::{Deserialize, Serialize};

use crate::request::RequestKind;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicOp {
    #[default]
    And,
    Or,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Gene,
    Annotation,
}

/// One feature slot as selected on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSlot {
    #[serde(rename = "type")]
    pub kind: FeatureKind,
    /// Collaborator-defined sub-type, e.g. `"continuous"` or `"categorical"`.
    #[serde(default)]
    pub feature_type: String,
    pub feature: String,
    #[serde(default)]
    pub threshold: f64,
}

impl FeatureSlot {
    pub fn gene(feature: impl Into<String>) -> Self {
        Self {
            kind: FeatureKind::Gene,
            feature_type: "continuous".to_string(),
            feature: feature.into(),
            threshold: 0.0,
        }
    }

    pub fn annotation(feature: impl Into<String>) -> Self {
        Self {
            kind: FeatureKind::Annotation,
            feature_type: "categorical".to_string(),
            feature: feature.into(),
            threshold: 0.0,
        }
    }

    pub fn is_annotation(&self) -> bool {
        self.kind == FeatureKind::Annotation
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Query {
    Coordinates {
        dataset: String,
        embedding: String,
        annotation_filter: Vec<String>,
        logic_op: LogicOp,
    },
    CellColors {
        dataset: String,
        features: Vec<FeatureSlot>,
        thresholds: Vec<f64>,
        annotation_filter: Vec<String>,
        vmin: Vec<Option<f64>>,
        vmax: Vec<Option<f64>>,
        logic_op: LogicOp,
        log_transform: bool,
        cpm_transform: bool,
    },
    FeatureLabels {
        dataset: String,
        embedding: String,
        feature: String,
    },
    ClusterOverlaps {
        dataset: String,
        ids: Vec<CellId>,
    },
    TranslateSelection {
        source_dataset: String,
        dest_dataset: String,
        ids: Vec<CellId>,
    },
    ActiveTrajectory {
        embedding: String,
    },
}

impl Query {
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::Coordinates { .. } => RequestKind::Coordinates,
            Self::CellColors { .. } => RequestKind::Colors,
            Self::FeatureLabels { .. } => RequestKind::Labels,
            Self::ClusterOverlaps { .. } => RequestKind::Overlaps,
            Self::TranslateSelection { .. } => RequestKind::Translation,
            Self::ActiveTrajectory { .. } => RequestKind::Trajectory,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoordinatesReply {
    pub ids: Vec<CellId>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorsReply {
    /// Literal `#rrggbb` (or `rrggbb`) codes, one per point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    /// Base64 of a zlib stream of concatenated 6-digit hex codes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compressed_colors: Option<String>,
    /// Opaque legend payload forwarded to the UI.
    #[serde(default)]
    pub legend: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureLabel {
    pub label: String,
    pub colour: String,
    pub coordinate: [f64; 2],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelsReply {
    #[serde(default)]
    pub labels: Vec<FeatureLabel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reply", content = "body", rename_all = "snake_case")]
pub enum Reply {
    /// `None` when the collaborator has no coordinates for the request.
    Coordinates(Option<CoordinatesReply>),
    Colors(ColorsReply),
    Labels(LabelsReply),
    Overlaps(Vec<ClusterOverlap>),
    Translation(Vec<CellId>),
    Trajectory(Option<Trajectory>),
    /// The collaborator could not be reached.
    TransportFailed { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn query_kind_matches_variant() {
        let q = Query::ActiveTrajectory {
            embedding: "umap".into(),
        };
        assert_eq!(q.kind(), RequestKind::Trajectory);
        let q = Query::TranslateSelection {
            source_dataset: "a".into(),
            dest_dataset: "b".into(),
            ids: vec![CellId(1)],
        };
        assert_eq!(q.kind(), RequestKind::Translation);
    }

    #[test]
    fn feature_slot_uses_type_key() {
        let slot: FeatureSlot =
            serde_json::from_str(r#"{"type":"annotation","feature":"leiden"}"#).expect("json");
        assert!(slot.is_annotation());
        assert_eq!(slot.threshold, 0.0);
        let json = serde_json::to_value(FeatureSlot::gene("CD3E")).expect("json");
        assert_eq!(json["type"], "gene");
    }

    #[test]
    fn colors_reply_fields_are_optional() {
        let reply: ColorsReply = serde_json::from_str(r#"{"error":"bad combination"}"#).expect("json");
        assert_eq!(reply.error.as_deref(), Some("bad combination"));
        assert!(reply.colors.is_none());
        assert!(reply.legend.is_null());
    }

    #[test]
    fn empty_coordinates_reply_is_none() {
        let reply: Reply = serde_json::from_str(r#"{"reply":"coordinates","body":null}"#).expect("json");
        assert_eq!(reply, Reply::Coordinates(None));
    }
}
