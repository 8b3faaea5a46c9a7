use foundation::color::{NEUTRAL_GRAY, Rgb};
use foundation::math::Vec2;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::transform::Rect;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LassoState {
    Idle,
    Drawing,
}

/// A finished lasso, closed by repeating its first vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedLasso {
    pub color: Rgb,
    pub polygon: Vec<Vec2>,
}

/// Pointer-driven polygon capture for one viewer.
///
/// Vertices are stored in the viewer's local pixel frame.
#[derive(Debug)]
pub struct LassoEngine {
    tool_active: bool,
    state: LassoState,
    vertices: Vec<Vec2>,
    color: Rgb,
    rng: StdRng,
}

impl LassoEngine {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            tool_active: false,
            state: LassoState::Idle,
            vertices: Vec::new(),
            color: NEUTRAL_GRAY,
            rng,
        }
    }

    pub fn set_tool_active(&mut self, active: bool) {
        self.tool_active = active;
        if !active {
            self.cancel();
        }
    }

    pub fn is_tool_active(&self) -> bool {
        self.tool_active
    }

    pub fn state(&self) -> LassoState {
        self.state
    }

    pub fn is_drawing(&self) -> bool {
        self.state == LassoState::Drawing
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    /// Starts a new polygon, discarding any unfinished one.
    pub fn pointer_down(&mut self, pointer: Vec2, rect: Rect) -> bool {
        if !self.tool_active {
            return false;
        }
        self.vertices.clear();
        self.vertices.push(rect.to_local(pointer));
        self.color = Rgb::random(&mut self.rng);
        self.state = LassoState::Drawing;
        true
    }

    pub fn pointer_move(&mut self, pointer: Vec2, rect: Rect) -> bool {
        if !self.is_drawing() {
            return false;
        }
        self.vertices.push(rect.to_local(pointer));
        true
    }

    /// Closes the polygon. Fewer than two vertices yield nothing to hit-test.
    pub fn pointer_up(&mut self) -> Option<ClosedLasso> {
        if !self.is_drawing() {
            return None;
        }
        self.state = LassoState::Idle;
        let mut polygon = std::mem::take(&mut self.vertices);
        if polygon.len() < 2 {
            return None;
        }
        polygon.push(polygon[0]);
        Some(ClosedLasso {
            color: self.color,
            polygon,
        })
    }

    pub fn cancel(&mut self) {
        self.state = LassoState::Idle;
        self.vertices.clear();
    }
}
