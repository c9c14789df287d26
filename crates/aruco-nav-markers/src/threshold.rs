//! Thresholding for candidate search and bit decoding.

use image::{GrayImage, Luma};
use imageproc::filter::box_filter;

/// Inverted adaptive threshold.
///
/// A pixel becomes foreground (255) when it is darker than the mean of its
/// `window × window` neighbourhood by more than `constant`, so dark marker
/// borders on light paper turn into foreground rings.
pub(crate) fn adaptive_threshold_inv(gray: &GrayImage, window: u32, constant: f32) -> GrayImage {
    let radius = (window / 2).max(1);
    let mean = box_filter(gray, radius, radius);

    let mut out = GrayImage::new(gray.width(), gray.height());
    for (dst, (src, m)) in out
        .pixels_mut()
        .zip(gray.pixels().zip(mean.pixels()))
    {
        let fg = (src[0] as f32) < m[0] as f32 - constant;
        *dst = Luma([if fg { 255 } else { 0 }]);
    }
    out
}

/// Compute Otsu threshold from a set of sample intensities.
pub(crate) fn otsu_threshold_from_samples(samples: &[u8]) -> u8 {
    if samples.is_empty() {
        return 127;
    }

    let (min_v, max_v) = samples
        .iter()
        .fold((255u8, 0u8), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if min_v == max_v {
        return min_v;
    }

    let mut hist = [0u32; 256];
    for &v in samples {
        hist[v as usize] += 1;
    }
    let nonzero_bins = hist.iter().filter(|&&h| h > 0).count();
    if nonzero_bins <= 2 {
        // Two-level input: split halfway so both levels land on opposite sides.
        return ((min_v as u16 + max_v as u16 + 1) / 2) as u8;
    }

    let total = samples.len() as f64;
    let sum_total: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &h)| i as f64 * h as f64)
        .sum();

    let mut sum_b = 0f64;
    let mut w_b = 0f64;
    let mut best_var = -1f64;
    let mut best_t = 127u8;

    for (t, &h) in hist.iter().enumerate() {
        w_b += h as f64;
        if w_b < 1.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f < 1.0 {
            break;
        }

        sum_b += t as f64 * h as f64;
        let m_b = sum_b / w_b;
        let m_f = (sum_total - sum_b) / w_f;

        let var_between = w_b * w_f * (m_b - m_f) * (m_b - m_f);
        if var_between > best_var {
            best_var = var_between;
            // Pixels `< threshold` are dark, so the cut sits just above the background class.
            best_t = (t as u8).saturating_add(1);
        }
    }

    best_t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otsu_splits_bimodal_samples() {
        let mut samples = vec![20u8; 50];
        samples.extend(std::iter::repeat_n(30u8, 10));
        samples.extend(std::iter::repeat_n(220u8, 40));
        samples.extend(std::iter::repeat_n(230u8, 10));
        let t = otsu_threshold_from_samples(&samples);
        assert!(t > 30 && t <= 220, "threshold {t}");
    }

    #[test]
    fn otsu_two_levels_cut_between_them() {
        let samples = [0u8, 0, 255, 255, 0];
        assert_eq!(otsu_threshold_from_samples(&samples), 128);
    }

    #[test]
    fn otsu_uniform_input_returns_the_level() {
        assert_eq!(otsu_threshold_from_samples(&[90, 90, 90]), 90);
    }

    #[test]
    fn adaptive_threshold_marks_dark_edge_only() {
        let mut gray = GrayImage::from_pixel(40, 20, Luma([230]));
        for y in 0..20 {
            for x in 20..40 {
                gray.put_pixel(x, y, Luma([10]));
            }
        }
        let bin = adaptive_threshold_inv(&gray, 7, 7.0);
        assert_eq!(bin.get_pixel(21, 10)[0], 255, "dark side of the edge");
        assert_eq!(bin.get_pixel(18, 10)[0], 0, "light side of the edge");
        assert_eq!(bin.get_pixel(5, 10)[0], 0, "flat light area");
        assert_eq!(bin.get_pixel(35, 10)[0], 0, "flat dark area");
    }
}
