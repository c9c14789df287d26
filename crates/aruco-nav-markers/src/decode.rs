//! Bit extraction from a candidate quad and dictionary lookup.

use crate::threshold::otsu_threshold_from_samples;
use crate::Matcher;
use aruco_nav_core::{homography_from_4pt, sample_bilinear_u8, GrayImageView, Homography, Quad};
use nalgebra::Point2;

/// Side of one marker cell in the canonical (rectified) frame.
const CANONICAL_CELL_PX: f32 = 10.0;
/// Threshold samples per cell side.
const THRESH_SUBDIV: usize = 3;

/// A candidate that decoded to a dictionary id.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DecodedMarker {
    pub id: u32,
    pub rotation: u8,
    pub hamming: u8,
    pub border_score: f32,
    /// Corners rotated so corner 0 is the marker's own top-left.
    pub corners: Quad,
}

#[derive(Clone, Copy, Debug)]
struct MarkerObservation {
    code: u64,
    border_score: f32,
}

struct SampleGrid {
    cells: usize,
    points: Vec<Point2<f32>>, // row-major: cy * cells + cx
    threshold_points: Vec<Point2<f32>>,
    square: Quad,
}

impl SampleGrid {
    fn new(cells: usize) -> Self {
        let side = cells as f32 * CANONICAL_CELL_PX;

        let points = (0..cells * cells)
            .map(|i| {
                let (cx, cy) = (i % cells, i / cells);
                Point2::new(
                    (cx as f32 + 0.5) * CANONICAL_CELL_PX,
                    (cy as f32 + 0.5) * CANONICAL_CELL_PX,
                )
            })
            .collect();

        let grid = cells * THRESH_SUBDIV;
        let step = side / grid as f32;
        let threshold_points = (0..grid * grid)
            .map(|i| {
                let (tx, ty) = (i % grid, i / grid);
                Point2::new((tx as f32 + 0.5) * step, (ty as f32 + 0.5) * step)
            })
            .collect();

        let square = [
            Point2::new(0.0, 0.0),
            Point2::new(side, 0.0),
            Point2::new(side, side),
            Point2::new(0.0, side),
        ];

        Self {
            cells,
            points,
            threshold_points,
            square,
        }
    }
}

/// Reusable decoder for one dictionary geometry.
pub(crate) struct QuadDecoder {
    bits: usize,
    border: usize,
    min_border_score: f32,
    detect_inverted: bool,
    grid: SampleGrid,
    scratch_bits: Vec<u8>,
    scratch_thr: Vec<u8>,
}

impl QuadDecoder {
    pub fn new(bits: usize, border: usize, min_border_score: f32, detect_inverted: bool) -> Self {
        let grid = SampleGrid::new(bits + 2 * border);
        Self {
            bits,
            border,
            min_border_score,
            detect_inverted,
            scratch_bits: Vec::with_capacity(grid.points.len()),
            scratch_thr: Vec::with_capacity(grid.threshold_points.len()),
            grid,
        }
    }

    /// Read the quad's bits and match them. `None` means the quad is rejected.
    pub fn decode(
        &mut self,
        img: &GrayImageView<'_>,
        quad: &Quad,
        matcher: &Matcher,
    ) -> Option<DecodedMarker> {
        let h = homography_from_4pt(&self.grid.square, quad)?;
        let obs = self.observe(img, &h)?;
        let m = matcher.match_code(obs.code)?;

        let r = m.rotation as usize;
        let corners = std::array::from_fn(|i| quad[(i + r) % 4]);

        Some(DecodedMarker {
            id: m.id,
            rotation: m.rotation,
            hamming: m.hamming,
            border_score: obs.border_score,
            corners,
        })
    }

    fn observe(&mut self, img: &GrayImageView<'_>, h: &Homography) -> Option<MarkerObservation> {
        self.scratch_bits.clear();
        for p in &self.grid.points {
            let q = h.apply(*p);
            self.scratch_bits.push(sample_mean_3x3(img, q.x, q.y)?);
        }

        let (max_x, max_y) = ((img.width - 1) as f32, (img.height - 1) as f32);
        self.scratch_thr.clear();
        for p in &self.grid.threshold_points {
            let q = h.apply(*p);
            if q.x >= 0.0 && q.y >= 0.0 && q.x < max_x && q.y < max_y {
                self.scratch_thr.push(sample_bilinear_u8(img, q.x, q.y));
            }
        }

        decode_samples(
            &self.scratch_bits,
            &self.scratch_thr,
            self.grid.cells,
            self.bits,
            self.border,
            self.min_border_score,
            self.detect_inverted,
        )
    }
}

fn decode_samples(
    samples: &[u8],
    thr_samples: &[u8],
    cells: usize,
    bits: usize,
    border: usize,
    min_border_score: f32,
    detect_inverted: bool,
) -> Option<MarkerObservation> {
    if samples.len() != cells * cells {
        return None;
    }

    let thr = if thr_samples.is_empty() {
        otsu_threshold_from_samples(samples)
    } else {
        otsu_threshold_from_samples(thr_samples)
    };

    let polarities: &[bool] = if detect_inverted {
        &[false, true]
    } else {
        &[false]
    };

    let mut best: Option<MarkerObservation> = None;
    for &inverted in polarities {
        let mut border_ok = 0u32;
        let mut border_total = 0u32;
        let mut code: u64 = 0;

        for cy in 0..cells {
            for cx in 0..cells {
                let is_black = (samples[cy * cells + cx] < thr) != inverted;

                let is_border =
                    border > 0 && (cx < border || cy < border || cx + border >= cells || cy + border >= cells);
                if is_border {
                    border_total += 1;
                    border_ok += is_black as u32;
                } else if is_black {
                    let idx = (cy - border) * bits + (cx - border); // row-major
                    code |= 1u64 << idx;
                }
            }
        }

        let border_score = if border > 0 {
            border_ok as f32 / border_total.max(1) as f32
        } else {
            1.0
        };
        if border_score < min_border_score {
            continue;
        }
        if best.is_none_or(|b| border_score > b.border_score) {
            best = Some(MarkerObservation { code, border_score });
        }
    }

    best
}

fn sample_mean_3x3(img: &GrayImageView<'_>, x: f32, y: f32) -> Option<u8> {
    let ix = x.floor() as i32;
    let iy = y.floor() as i32;
    if ix - 1 < 0 || iy - 1 < 0 || ix + 1 >= img.width as i32 || iy + 1 >= img.height as i32 {
        return None;
    }

    let mut sum = 0u32;
    for dy in -1..=1 {
        for dx in -1..=1 {
            sum += img.get(ix + dx, iy + dy) as u32;
        }
    }
    Some((sum / 9) as u8)
}
