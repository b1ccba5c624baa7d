//! Turning a reconstructed solution vector into a viewable image.
//!
//! A solution `f` of length `width * height` is interpreted row-major.
//! [`ImageFrame::normalize`] maps it to `[0, 1]`,
//! [`ImageFrame::suppress_background`] isolates the strongest reflectors and
//! [`ImageFrame::write_pgm`] encodes it as an ASCII greymap.

use std::io::Write;

use tracing::warn;

use crate::error::{ImageError, ValidationError};

/// Default cut-off for [`ImageFrame::suppress_background`].
pub const DEFAULT_BACKGROUND_PERCENTILE: f64 = 0.97;

/// Spans below this are treated as a constant image.
const MIN_RANGE: f64 = 1e-12;

/// A pixel survives non-maximum suppression when within this of the local max.
const NMS_TOLERANCE: f64 = 1e-9;

/// A row-major greyscale image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFrame {
    width: usize,
    height: usize,
    pixels: Vec<f64>,
}

impl ImageFrame {
    /// Wrap a solution vector as a `width x height` image.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Shape`] if `f.len() != width * height`.
    pub fn from_solution(f: &[f64], width: usize, height: usize) -> Result<Self, ImageError> {
        let expected = width.checked_mul(height).ok_or_else(|| {
            ValidationError::DimensionMismatch(format!("{width}x{height} overflows usize"))
        })?;
        if f.len() != expected {
            return Err(ValidationError::DimensionMismatch(format!(
                "solution length {} does not equal width * height = {}",
                f.len(),
                expected,
            ))
            .into());
        }
        Ok(Self {
            width,
            height,
            pixels: f.to_vec(),
        })
    }

    /// Pixels per row.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major pixel values.
    #[inline]
    pub fn pixels(&self) -> &[f64] {
        &self.pixels
    }

    /// Min/max scale every pixel into `[0, 1]`.
    ///
    /// Non-finite pixels are replaced first (NaN and -inf by 0, +inf by 1).
    /// A constant image maps to all zeros.
    pub fn normalize(mut self) -> Self {
        let non_finite = self.pixels.iter().filter(|v| !v.is_finite()).count();
        if non_finite > 0 {
            warn!("image: replacing {non_finite} non-finite pixel(s)");
            for v in self.pixels.iter_mut().filter(|v| !v.is_finite()) {
                *v = if *v == f64::INFINITY { 1.0 } else { 0.0 };
            }
        }

        let (min, max) = self
            .pixels
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        let mut range = max - min;
        if range < MIN_RANGE {
            range = 1.0;
        }
        for v in &mut self.pixels {
            *v = (*v - min) / range;
        }
        self
    }

    /// Zero every pixel below the `percentile` quantile, then keep only
    /// pixels that are maxima of their 3x3 neighbourhood.
    ///
    /// `percentile` is clamped to `[0, 1]`; the threshold is the sorted value
    /// at index `floor(len * percentile)`.
    pub fn suppress_background(mut self, percentile: f64) -> Self {
        if self.pixels.is_empty() {
            return self;
        }

        let mut sorted = self.pixels.clone();
        sorted.sort_by(f64::total_cmp);
        let cut = ((sorted.len() as f64 * percentile.clamp(0.0, 1.0)) as usize)
            .min(sorted.len() - 1);
        let threshold = sorted[cut];

        for v in &mut self.pixels {
            if *v < threshold {
                *v = 0.0;
            }
        }

        self.pixels = self.non_maximum_suppression();
        self
    }

    fn non_maximum_suppression(&self) -> Vec<f64> {
        let (w, h) = (self.width, self.height);
        let mut out = vec![0.0f64; self.pixels.len()];

        for y in 0..h {
            for x in 0..w {
                let val = self.pixels[y * w + x];
                if val == 0.0 {
                    continue;
                }

                let mut max_neighbor = f64::NEG_INFINITY;
                for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
                    for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                        max_neighbor = max_neighbor.max(self.pixels[ny * w + nx]);
                    }
                }

                if val >= max_neighbor - NMS_TOLERANCE {
                    out[y * w + x] = val;
                }
            }
        }
        out
    }

    /// Encode as ASCII PGM (`P2`, max value 255), one image row per line.
    ///
    /// Pixels are expected in `[0, 1]`; values outside are clamped.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Io`] if the writer fails.
    pub fn write_pgm<W: Write>(&self, mut writer: W) -> Result<(), ImageError> {
        write!(writer, "P2\n{} {}\n255\n", self.width, self.height)?;
        if self.width > 0 {
            for row in self.pixels.chunks_exact(self.width) {
                for &v in row {
                    write!(writer, "{} ", (v * 255.0).clamp(0.0, 255.0) as u8)?;
                }
                writeln!(writer)?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pgm_string(frame: &ImageFrame) -> String {
        let mut buf = Vec::new();
        frame.write_pgm(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn shape_mismatch() {
        let err = ImageFrame::from_solution(&[0.0; 5], 2, 3).unwrap_err();
        assert!(matches!(err, ImageError::Shape(_)));
    }

    #[test]
    fn normalize_scales_to_unit_interval() {
        let frame = ImageFrame::from_solution(&[-1.0, 0.0, 1.0, 3.0], 2, 2)
            .unwrap()
            .normalize();
        assert_eq!(frame.pixels(), &[0.0, 0.25, 0.5, 1.0]);
    }

    #[test]
    fn normalize_constant_image_is_zero() {
        let frame = ImageFrame::from_solution(&[5.0; 4], 2, 2).unwrap().normalize();
        assert_eq!(frame.pixels(), &[0.0; 4]);
    }

    #[test]
    fn normalize_sanitises_non_finite() {
        let frame = ImageFrame::from_solution(&[f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 0.5], 4, 1)
            .unwrap()
            .normalize();
        assert_eq!(frame.pixels(), &[0.0, 1.0, 0.0, 0.5]);
    }

    #[test]
    fn suppression_keeps_isolated_peaks() {
        // 5x5 background with two separated peaks.
        let mut f = vec![0.1; 25];
        f[6] = 0.9; // (1, 1)
        f[18] = 1.0; // (3, 3)
        let frame = ImageFrame::from_solution(&f, 5, 5)
            .unwrap()
            .suppress_background(0.95);

        let kept: Vec<usize> = frame
            .pixels()
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v > 0.0)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(kept, vec![6, 18]);
    }

    #[test]
    fn suppression_removes_non_maxima() {
        // Threshold keeps 0.8 and 1.0, but 0.8 neighbours 1.0.
        let f = vec![0.0, 0.8, 1.0, 0.0];
        let frame = ImageFrame::from_solution(&f, 4, 1)
            .unwrap()
            .suppress_background(0.5);
        assert_eq!(frame.pixels(), &[0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn pgm_layout() {
        let frame = ImageFrame::from_solution(&[0.0, 1.0, 0.5, 0.25], 2, 2).unwrap();
        assert_eq!(pgm_string(&frame), "P2\n2 2\n255\n0 255 \n127 63 \n");
    }

    #[test]
    fn pgm_clamps_out_of_range() {
        let frame = ImageFrame::from_solution(&[-0.5, 2.0], 2, 1).unwrap();
        assert_eq!(pgm_string(&frame), "P2\n2 1\n255\n0 255 \n");
    }
}
