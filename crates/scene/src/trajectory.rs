use std::collections::HashMap;

use foundation::math::Vec2;
use serde::{Deserialize, Serialize};

/// Pseudotime graph drawn over an embedding.
///
/// `coordinates[i]` positions `nodes[i]`; edges reference nodes by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default)]
    pub edges: Vec<[String; 2]>,
    #[serde(default)]
    pub coordinates: Vec<[f64; 2]>,
}

impl Trajectory {
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Line segments in data space. Edges naming unknown nodes are skipped.
    pub fn segments(&self) -> Vec<(Vec2, Vec2)> {
        let by_name: HashMap<&str, Vec2> = self
            .nodes
            .iter()
            .zip(&self.coordinates)
            .map(|(n, c)| (n.as_str(), Vec2::from(*c)))
            .collect();
        self.edges
            .iter()
            .filter_map(|[a, b]| Some((*by_name.get(a.as_str())?, *by_name.get(b.as_str())?)))
            .collect()
    }
}
