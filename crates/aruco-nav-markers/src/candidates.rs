//! Square candidate search: threshold, trace outer borders, keep convex 4-gons.

use crate::threshold::adaptive_threshold_inv;
use crate::DetectorParams;
use aruco_nav_core::{
    is_convex, mean_corner_distance, min_side_length, order_clockwise, perimeter, Quad,
};
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Find marker-shaped quads in `gray`, clockwise, without decoding them.
///
/// Every configured threshold window contributes candidates; near-duplicates
/// found at several scales are merged, keeping the larger outline. The result
/// is in reading order of each quad's top-most corner.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(width = gray.width(), height = gray.height()))
)]
pub(crate) fn find_candidates(gray: &GrayImage, params: &DetectorParams) -> Vec<Quad> {
    let (w, h) = gray.dimensions();
    let max_dim = w.max(h) as f64;
    let min_len = params.min_marker_perimeter_rate * max_dim;
    let max_len = params.max_marker_perimeter_rate * max_dim;

    let mut found: Vec<(Quad, f32)> = Vec::new();
    for window in params.threshold_windows() {
        let binary = adaptive_threshold_inv(gray, window, params.adaptive_thresh_constant);
        let before = found.len();

        for contour in find_contours::<i32>(&binary) {
            if contour.border_type != BorderType::Outer {
                continue;
            }
            let len = contour.points.len() as f64;
            if len < min_len || len > max_len {
                continue;
            }
            let Some(quad) = approx_quad(&contour.points, params.polygonal_approx_accuracy_rate)
            else {
                continue;
            };
            if !passes_shape_gates(&quad, w, h, params) {
                continue;
            }
            found.push((quad, perimeter(&quad)));
        }

        log::trace!("window {window}: {} quads", found.len() - before);
    }

    let mut kept = merge_near_duplicates(found, params.min_marker_distance_rate);
    kept.sort_by(|a, b| {
        let (row_a, x_a) = reading_key(a);
        let (row_b, x_b) = reading_key(b);
        row_a.cmp(&row_b).then(x_a.total_cmp(&x_b))
    });
    kept
}

fn passes_shape_gates(quad: &Quad, w: u32, h: u32, params: &DetectorParams) -> bool {
    if !is_convex(quad) {
        return false;
    }
    if min_side_length(quad) < params.min_corner_distance_rate * perimeter(quad) {
        return false;
    }
    let margin = params.min_distance_to_border as f32;
    quad.iter().all(|p| {
        p.x >= margin && p.y >= margin && p.x <= w as f32 - 1.0 - margin && p.y <= h as f32 - 1.0 - margin
    })
}

/// Closed-curve Douglas–Peucker reduced to exactly four vertices, or `None`.
fn approx_quad(points: &[Point<i32>], accuracy_rate: f64) -> Option<Quad> {
    if points.len() < 4 {
        return None;
    }
    let epsilon = accuracy_rate * arc_length(points, true);
    if epsilon <= 0.0 {
        return None;
    }

    // Split the loop at two far-apart points so each half has a proper chord.
    let far = farthest_from(points, 0);
    if far == 0 {
        return None;
    }
    let mut poly = approximate_polygon_dp(&points[..=far], epsilon, false);
    let mut back: Vec<Point<i32>> = points[far..].to_vec();
    back.push(points[0]);
    let back = approximate_polygon_dp(&back, epsilon, false);

    // `poly` ends and `back` starts at `far`; `back` ends at the start point.
    poly.pop();
    poly.extend(back);
    poly.pop();

    let poly = drop_flat_vertices(poly, epsilon);
    if poly.len() != 4 {
        return None;
    }

    let quad: Quad = std::array::from_fn(|i| Point2::new(poly[i].x as f32, poly[i].y as f32));
    Some(order_clockwise(quad))
}

fn farthest_from(points: &[Point<i32>], from: usize) -> usize {
    let o = points[from];
    points
        .iter()
        .enumerate()
        .max_by_key(|(_, p)| {
            let dx = (p.x - o.x) as i64;
            let dy = (p.y - o.y) as i64;
            dx * dx + dy * dy
        })
        .map(|(i, _)| i)
        .unwrap_or(from)
}

// The split point can land mid-edge; remove vertices that sit on the chord
// between their neighbours.
fn drop_flat_vertices(mut poly: Vec<Point<i32>>, epsilon: f64) -> Vec<Point<i32>> {
    loop {
        let n = poly.len();
        if n <= 3 {
            return poly;
        }
        let flat = (0..n).find(|&i| {
            let prev = poly[(i + n - 1) % n];
            let next = poly[(i + 1) % n];
            distance_to_chord(poly[i], prev, next) < epsilon
        });
        match flat {
            Some(i) => {
                poly.remove(i);
            }
            None => return poly,
        }
    }
}

fn distance_to_chord(p: Point<i32>, a: Point<i32>, b: Point<i32>) -> f64 {
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (dx, dy) = (b.x as f64 - ax, b.y as f64 - ay);
    let (px, py) = (p.x as f64 - ax, p.y as f64 - ay);
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1e-9 {
        return (px * px + py * py).sqrt();
    }
    (dx * py - dy * px).abs() / len
}

fn merge_near_duplicates(found: Vec<(Quad, f32)>, distance_rate: f32) -> Vec<Quad> {
    let mut kept: Vec<(Quad, f32)> = Vec::with_capacity(found.len());
    for (quad, perim) in found {
        let dup = kept.iter_mut().find(|(k, kp)| {
            mean_corner_distance(k, &quad) < distance_rate * kp.min(perim)
        });
        match dup {
            Some(slot) => {
                if perim > slot.1 {
                    *slot = (quad, perim);
                }
            }
            None => kept.push((quad, perim)),
        }
    }
    kept.into_iter().map(|(q, _)| q).collect()
}

fn reading_key(quad: &Quad) -> (i32, f32) {
    let top = quad
        .iter()
        .min_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)))
        .copied()
        .unwrap_or(quad[0]);
    // Rows are coarse (8 px) so small tilts do not reorder markers on one line.
    ((top.y / 8.0).floor() as i32, top.x)
}
