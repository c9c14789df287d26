//! Rasterize a dictionary entry into a printable marker image.

use crate::Dictionary;
use aruco_nav_core::GrayImage;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RenderError {
    #[error("marker id {id} is not in dictionary {dictionary} ({len} entries)")]
    UnknownId {
        id: u32,
        dictionary: String,
        len: usize,
    },
    #[error("marker side {side_px} px is smaller than its {cells} cells")]
    TooSmall { side_px: usize, cells: usize },
}

/// Render marker `id` as a `side_px` square, black border included.
///
/// Black is 0 and white is 255. Each pixel takes the value of the cell it
/// falls into (nearest neighbour), so `side_px` need not be a multiple of
/// the cell count.
pub fn generate_marker_image(
    dict: &Dictionary,
    id: u32,
    side_px: usize,
    border_bits: usize,
) -> Result<GrayImage, RenderError> {
    let code = dict.code(id).ok_or_else(|| RenderError::UnknownId {
        id,
        dictionary: dict.name.to_string(),
        len: dict.len(),
    })?;

    let n = dict.marker_size;
    let cells = n + 2 * border_bits;
    if side_px < cells {
        return Err(RenderError::TooSmall { side_px, cells });
    }

    let cell_of = |px: usize| px * cells / side_px;
    let mut img = GrayImage::filled(side_px, side_px, 0);
    for y in 0..side_px {
        let cy = cell_of(y);
        if cy < border_bits || cy >= border_bits + n {
            continue;
        }
        for x in 0..side_px {
            let cx = cell_of(x);
            if cx < border_bits || cx >= border_bits + n {
                continue;
            }
            let bit = (cy - border_bits) * n + (cx - border_bits);
            if (code >> bit) & 1 == 0 {
                img.data[y * side_px + x] = 255;
            }
        }
    }

    log::debug!("rendered {} id {id} at {side_px}px", dict.name);
    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;

    fn cell_value(img: &GrayImage, cells: usize, cx: usize, cy: usize) -> u8 {
        let side = img.width;
        let px = (cx * side + side / 2) / cells;
        let py = (cy * side + side / 2) / cells;
        img.data[py * side + px]
    }

    #[test]
    fn pixels_follow_code_bits() {
        let dict = builtins::DICT_6X6_250;
        let img = generate_marker_image(&dict, 42, 80, 1).expect("render");
        assert_eq!((img.width, img.height), (80, 80));

        let code = dict.code(42).expect("id 42");
        for cy in 0..8 {
            for cx in 0..8 {
                let v = cell_value(&img, 8, cx, cy);
                let border = cx == 0 || cy == 0 || cx == 7 || cy == 7;
                let black = border || (code >> ((cy - 1) * 6 + (cx - 1))) & 1 == 1;
                assert_eq!(v, if black { 0 } else { 255 }, "cell ({cx},{cy})");
            }
        }
    }

    #[test]
    fn only_black_and_white_pixels() {
        let img = generate_marker_image(&builtins::DICT_6X6_250, 0, 101, 2).expect("render");
        assert!(img.data.iter().all(|&v| v == 0 || v == 255));
        assert_eq!(img.data[0], 0);
    }

    #[test]
    fn unknown_id_is_an_error() {
        let err = generate_marker_image(&builtins::DICT_6X6_250, 250, 100, 1).unwrap_err();
        assert!(matches!(err, RenderError::UnknownId { id: 250, len: 250, .. }));
    }

    #[test]
    fn side_smaller_than_grid_is_an_error() {
        let err = generate_marker_image(&builtins::DICT_6X6_250, 1, 7, 1).unwrap_err();
        assert_eq!(err, RenderError::TooSmall { side_px: 7, cells: 8 });
    }
}
