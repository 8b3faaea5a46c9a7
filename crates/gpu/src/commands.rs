use layers::{LayerKind, PlacedLabel2D};
use scene::{CellId, SelectionId};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SpriteInstance {
    pub id: CellId,
    pub position: [f32; 2],
    pub color: [f32; 4],
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    Sprites {
        radius_px: f32,
        instances: Vec<SpriteInstance>,
    },
    Highlight {
        selection: SelectionId,
        radius_px: f32,
        color: [f32; 4],
        positions: Vec<[f32; 2]>,
    },
    Polygon {
        fill: [f32; 4],
        stroke: [f32; 4],
        vertices: Vec<[f32; 2]>,
        closed: bool,
    },
    Lines {
        color: [f32; 4],
        width_px: f32,
        segments: Vec<[[f32; 2]; 2]>,
    },
    Text(PlacedLabel2D),
}

impl RenderCommand {
    pub fn layer(&self) -> LayerKind {
        match self {
            Self::Sprites { .. } => LayerKind::Points,
            Self::Highlight { .. } => LayerKind::Highlights,
            Self::Polygon { .. } => LayerKind::Lasso,
            Self::Lines { .. } => LayerKind::Trajectory,
            Self::Text(_) => LayerKind::Labels,
        }
    }
}

/// One paint's worth of draw commands, back to front.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RenderFrame {
    pub commands: Vec<RenderCommand>,
}

impl RenderFrame {
    pub fn layer(&self, kind: LayerKind) -> impl Iterator<Item = &RenderCommand> + '_ {
        self.commands.iter().filter(move |c| c.layer() == kind)
    }

    /// Point sprites in draw order.
    pub fn sprites(&self) -> Vec<SpriteInstance> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::Sprites { instances, .. } => Some(instances.as_slice()),
                _ => None,
            })
            .flatten()
            .copied()
            .collect()
    }

    pub fn is_layer_ordered(&self) -> bool {
        self.commands
            .windows(2)
            .all(|w| w[0].layer() <= w[1].layer())
    }
}
