use foundation::bounds::Aabb2;
use foundation::geometry::{EDGE_EPSILON, point_in_polygon};
use foundation::math::Vec2;

use crate::selection::SelectionSet;

/// Indices of the points that fall inside `polygon` (boundary inclusive).
///
/// Points are `(index, screen position)` pairs. Polygons with fewer than
/// two vertices select nothing.
pub fn pick_polygon<I>(points: I, polygon: &[Vec2]) -> SelectionSet
where
    I: IntoIterator<Item = (u32, Vec2)>,
{
    let mut out = SelectionSet::new();
    if polygon.len() < 2 {
        return out;
    }
    let Some(bounds) = Aabb2::from_points(polygon.iter().copied()) else {
        return out;
    };
    let bounds = bounds.inflated(EDGE_EPSILON);
    for (idx, p) in points {
        if bounds.contains(p) && point_in_polygon(p, polygon) {
            out.insert(idx);
        }
    }
    out
}
