//! Planar predicates used by lasso hit-testing and viewport fitting.

use crate::bounds::Aabb2;
use crate::math::Vec2;

/// Absolute tolerance for "on the boundary" tests, in the polygon's units.
pub const EDGE_EPSILON: f64 = 1e-9;

/// Polygon containment with an inclusive boundary.
///
/// The polygon may be open or closed (last vertex equal to the first).
/// Points within [`EDGE_EPSILON`] of any edge count as inside; all other
/// points use the even-odd crossing rule.
pub fn point_in_polygon(p: Vec2, polygon: &[Vec2]) -> bool {
    let n = polygon.len();
    if n == 0 {
        return false;
    }
    if n == 1 {
        return (p - polygon[0]).length() <= EDGE_EPSILON;
    }

    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        if distance_to_segment(p, a, b) <= EDGE_EPSILON {
            return true;
        }
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let vi = polygon[i];
        let vj = polygon[j];
        if (vi.y > p.y) != (vj.y > p.y) {
            let x_cross = (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

pub fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f64 {
    let ab = b - a;
    let len2 = ab.dot(ab);
    if len2 <= 0.0 {
        return (p - a).length();
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).length()
}

/// Largest integer scale `>= 1` at which `bounds` fits inside `viewport_px`.
///
/// An axis with zero extent places no constraint; when both collapse (all
/// points identical) or there are no bounds the factor is 1.
pub fn scaling_factor(bounds: Option<Aabb2>, viewport_px: [f64; 2]) -> u32 {
    let Some(b) = bounds else {
        return 1;
    };
    let fit = |extent: f64, px: f64| {
        if extent > 0.0 {
            px / extent
        } else {
            f64::INFINITY
        }
    };
    let s = fit(b.width(), viewport_px[0]).min(fit(b.height(), viewport_px[1]));
    if !s.is_finite() || s < 1.0 {
        return 1;
    }
    s.floor().min(u32::MAX as f64) as u32
}
