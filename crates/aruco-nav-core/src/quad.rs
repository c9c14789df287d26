//! Helpers for four-corner image polygons.

use nalgebra::Point2;

/// Four image-space corners of a candidate or detected marker.
pub type Quad = [Point2<f32>; 4];

#[inline]
fn cross(o: Point2<f32>, a: Point2<f32>, b: Point2<f32>) -> f32 {
    let d1 = a - o;
    let d2 = b - o;
    d1.x * d2.y - d1.y * d2.x
}

pub fn perimeter(q: &Quad) -> f32 {
    (0..4).map(|i| (q[(i + 1) % 4] - q[i]).norm()).sum()
}

pub fn min_side_length(q: &Quad) -> f32 {
    (0..4)
        .map(|i| (q[(i + 1) % 4] - q[i]).norm())
        .fold(f32::INFINITY, f32::min)
}

/// True when all four turns have the same, non-zero orientation.
pub fn is_convex(q: &Quad) -> bool {
    let turns: [f32; 4] = std::array::from_fn(|i| cross(q[i], q[(i + 1) % 4], q[(i + 2) % 4]));
    turns.iter().all(|&t| t > 0.0) || turns.iter().all(|&t| t < 0.0)
}

/// Reorder corners so they run clockwise on screen (y axis pointing down).
///
/// Corner 0 is kept in place; only the winding direction is fixed.
pub fn order_clockwise(q: Quad) -> Quad {
    if cross(q[0], q[1], q[2]) < 0.0 {
        [q[0], q[3], q[2], q[1]]
    } else {
        q
    }
}

/// Mean distance between corresponding corners, minimized over the four
/// cyclic shifts of `b`.
pub fn mean_corner_distance(a: &Quad, b: &Quad) -> f32 {
    (0..4)
        .map(|shift| {
            (0..4)
                .map(|i| (a[i] - b[(i + shift) % 4]).norm())
                .sum::<f32>()
                / 4.0
        })
        .fold(f32::INFINITY, f32::min)
}
