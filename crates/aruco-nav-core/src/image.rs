use thiserror::Error;

/// Raised when a raw pixel buffer does not match the declared dimensions.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid grayscale buffer: {width}x{height} needs {expected} bytes, got {got}")]
pub struct ImageBufferError {
    pub width: usize,
    pub height: usize,
    pub expected: usize,
    pub got: usize,
}

#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

impl<'a> GrayImageView<'a> {
    /// Wrap a row-major 8-bit buffer, checking its length.
    pub fn new(width: usize, height: usize, data: &'a [u8]) -> Result<Self, ImageBufferError> {
        let expected = width * height;
        if data.len() != expected {
            return Err(ImageBufferError {
                width,
                height,
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Pixel value, or 0 outside the image.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return 0;
        }
        self.data[y as usize * self.width + x as usize]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    /// Image of the given size filled with `value`.
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }
}

#[inline]
pub fn sample_bilinear(src: &GrayImageView<'_>, x: f32, y: f32) -> f32 {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = src.get(x0, y0) as f32;
    let p10 = src.get(x0 + 1, y0) as f32;
    let p01 = src.get(x0, y0 + 1) as f32;
    let p11 = src.get(x0 + 1, y0 + 1) as f32;

    let a = p00 + fx * (p10 - p00);
    let b = p01 + fx * (p11 - p01);
    a + fy * (b - a)
}

#[inline]
pub fn sample_bilinear_u8(src: &GrayImageView<'_>, x: f32, y: f32) -> u8 {
    sample_bilinear(src, x, y).clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_rejects_short_buffer() {
        let data = [0u8; 5];
        let err = GrayImageView::new(3, 2, &data).unwrap_err();
        assert_eq!(err.expected, 6);
        assert_eq!(err.got, 5);
    }

    #[test]
    fn out_of_bounds_reads_black() {
        let img = GrayImage::filled(2, 2, 200);
        let view = img.view();
        assert_eq!(view.get(1, 1), 200);
        assert_eq!(view.get(-1, 0), 0);
        assert_eq!(view.get(0, 2), 0);
    }

    #[test]
    fn bilinear_interpolates_between_columns() {
        let img = GrayImage {
            width: 2,
            height: 1,
            data: vec![0, 100],
        };
        let v = sample_bilinear(&img.view(), 0.25, 0.0);
        assert!((v - 25.0).abs() < 1e-4);
    }
}
