use foundation::bounds::Aabb2;
use foundation::geometry::scaling_factor;
use foundation::math::Vec2;
use serde::{Deserialize, Serialize};

/// Pan/zoom state applied on top of the fitted layout.
///
/// `screen = layout * k + (x, y)`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoomTransform {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ZoomTransform {
    pub const IDENTITY: ZoomTransform = ZoomTransform {
        x: 0.0,
        y: 0.0,
        k: 1.0,
    };

    pub fn new(x: f64, y: f64, k: f64) -> Self {
        Self { x, y, k }
    }

    pub fn apply(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x * self.k + self.x, p.y * self.k + self.y)
    }

    /// Inverse of [`ZoomTransform::apply`]; `None` for a zero scale.
    pub fn invert(&self, p: Vec2) -> Option<Vec2> {
        if self.k == 0.0 || !self.k.is_finite() {
            return None;
        }
        Some(Vec2::new((p.x - self.x) / self.k, (p.y - self.y) / self.k))
    }
}

/// Fit of a coordinate set into a viewport.
///
/// Data is centred on the viewport, scaled by an integer factor and y-flipped.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Layout {
    pub center: Vec2,
    pub scaling_factor: u32,
    pub viewport: [f64; 2],
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            center: Vec2::ZERO,
            scaling_factor: 1,
            viewport: [0.0, 0.0],
        }
    }
}

impl Layout {
    pub fn fit(bounds: Option<Aabb2>, viewport: [f64; 2]) -> Self {
        Self {
            center: bounds.map(|b| b.center()).unwrap_or(Vec2::ZERO),
            scaling_factor: scaling_factor(bounds, viewport),
            viewport,
        }
    }

    pub fn to_layout(&self, p: Vec2) -> Vec2 {
        let s = f64::from(self.scaling_factor);
        Vec2::new(
            (p.x - self.center.x) * s + self.viewport[0] * 0.5,
            -(p.y - self.center.y) * s + self.viewport[1] * 0.5,
        )
    }
}
