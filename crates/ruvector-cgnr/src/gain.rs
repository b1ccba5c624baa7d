//! Depth-dependent signal gain applied to observations before solving.
//!
//! Observations arrive as `sensors` rows of `samples` values each (row-major).
//! Row `l` is attenuated with depth, so it is amplified by
//! `gamma_l = sqrt(100 + l^2 / 20)` before reconstruction.

use tracing::debug;

use crate::error::ValidationError;

/// Gain factor for sensor row `l`.
#[inline]
pub fn signal_gain(l: usize) -> f64 {
    let l = l as f64;
    (100.0 + l * l / 20.0).sqrt()
}

/// Return a copy of `g` with row `l` scaled by [`signal_gain`]`(l)`.
///
/// # Errors
///
/// Returns [`ValidationError::DimensionMismatch`] if
/// `g.len() != sensors * samples`.
pub fn apply_signal_gain(
    g: &[f64],
    sensors: usize,
    samples: usize,
) -> Result<Vec<f64>, ValidationError> {
    let expected = sensors.checked_mul(samples).ok_or_else(|| {
        ValidationError::DimensionMismatch(format!("{sensors}x{samples} overflows usize"))
    })?;
    if g.len() != expected {
        return Err(ValidationError::DimensionMismatch(format!(
            "observation length {} does not equal sensors * samples = {}",
            g.len(),
            expected,
        )));
    }

    let mut out = g.to_vec();
    if samples > 0 {
        for (l, row) in out.chunks_exact_mut(samples).enumerate() {
            let gamma = signal_gain(l);
            row.iter_mut().for_each(|v| *v *= gamma);
        }
    }

    debug!("signal gain applied to {sensors} sensor rows x {samples} samples");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_row_gain_is_ten() {
        assert_eq!(signal_gain(0), 10.0);
    }

    #[test]
    fn gain_grows_with_depth() {
        // sqrt(100 + 400 / 20) = sqrt(120)
        assert!((signal_gain(20) - 120f64.sqrt()).abs() < 1e-12);
        assert!(signal_gain(50) > signal_gain(49));
    }

    #[test]
    fn rows_scaled_independently() {
        let g = vec![1.0, 2.0, 1.0, 2.0];
        let out = apply_signal_gain(&g, 2, 2).unwrap();
        assert_eq!(&out[..2], &[10.0, 20.0]);
        let g1 = signal_gain(1);
        assert_eq!(&out[2..], &[g1, 2.0 * g1]);
    }

    #[test]
    fn length_mismatch() {
        let err = apply_signal_gain(&[1.0; 5], 2, 3).unwrap_err();
        assert!(matches!(err, ValidationError::DimensionMismatch(_)));
    }

    #[test]
    fn empty_input() {
        assert!(apply_signal_gain(&[], 0, 4).unwrap().is_empty());
        assert!(apply_signal_gain(&[], 3, 0).unwrap().is_empty());
    }
}
