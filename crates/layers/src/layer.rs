/// Retained layers of a viewer, in back-to-front draw order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayerKind {
    Points,
    Highlights,
    Lasso,
    Trajectory,
    Labels,
}

impl LayerKind {
    pub const DRAW_ORDER: [LayerKind; 5] = [
        LayerKind::Points,
        LayerKind::Highlights,
        LayerKind::Lasso,
        LayerKind::Trajectory,
        LayerKind::Labels,
    ];

    pub fn z_index(self) -> u8 {
        self as u8
    }
}
