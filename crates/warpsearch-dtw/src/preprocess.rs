//! Series preprocessing applied before a search: z-normalization and derivative transform.

use crate::error::{DerivativeError, PreprocessError};
use crate::series::TimeSeries;

/// Population mean and standard deviation.
fn moments(data: &[f64]) -> (f64, f64) {
    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    let variance = data.iter().map(|&x| (x - mean) * (x - mean)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Z-normalize a series to zero mean and unit population variance.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`PreprocessError::ConstantSeries`] | All values are identical (zero variance) |
#[must_use = "returns a new normalized series; the original is unchanged"]
pub fn z_normalize(series: &TimeSeries) -> Result<TimeSeries, PreprocessError> {
    let data = series.as_slice();
    let (mean, std) = moments(data);
    if std == 0.0 {
        return Err(PreprocessError::ConstantSeries {
            n: data.len(),
            value: data[0],
        });
    }
    let normalized = data.iter().map(|&x| (x - mean) / std).collect();
    Ok(TimeSeries::new(normalized).expect("finite input with non-zero spread stays finite"))
}

/// Z-normalize every series of a training or test set.
///
/// # Errors
///
/// Returns the first [`PreprocessError`] encountered.
#[must_use = "returns a new vector of normalized series"]
pub fn z_normalize_batch(series: &[TimeSeries]) -> Result<Vec<TimeSeries>, PreprocessError> {
    series.iter().map(z_normalize).collect()
}

/// Keogh-Pazzani first derivative: `d[i] = ((x[i] - x[i-1]) + (x[i+1] - x[i-1]) / 2) / 2`
/// over the interior points, so the output is two samples shorter.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`DerivativeError::TooShort`] | Series has fewer than 3 elements |
#[must_use = "returns a new derivative series; the original is unchanged"]
pub fn derivative(series: &TimeSeries) -> Result<TimeSeries, DerivativeError> {
    let data = series.as_slice();
    if data.len() < 3 {
        return Err(DerivativeError::TooShort { len: data.len() });
    }
    let deriv = data
        .windows(3)
        .map(|w| ((w[1] - w[0]) + (w[2] - w[0]) / 2.0) / 2.0)
        .collect();
    Ok(TimeSeries::new(deriv).expect("differences of finite values are finite"))
}

/// Apply [`derivative`] to every series.
///
/// # Errors
///
/// Returns the first [`DerivativeError`] encountered.
#[must_use = "returns a new vector of derivative series"]
pub fn derivative_batch(series: &[TimeSeries]) -> Result<Vec<TimeSeries>, DerivativeError> {
    series.iter().map(derivative).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(values: &[f64]) -> TimeSeries {
        TimeSeries::new(values.to_vec()).unwrap()
    }

    #[test]
    fn normalized_series_has_zero_mean_and_unit_variance() {
        let normalized = z_normalize(&ts(&[1.0, 2.0, 3.0, 4.0, 5.0])).unwrap();
        let (mean, std) = moments(normalized.as_slice());
        assert!(mean.abs() < 1e-12, "mean was {mean}");
        assert!((std - 1.0).abs() < 1e-12, "std was {std}");
    }

    #[test]
    fn constant_series_cannot_be_normalized() {
        let result = z_normalize(&ts(&[5.0, 5.0, 5.0]));
        assert!(
            matches!(result, Err(PreprocessError::ConstantSeries { n: 3, value: 5.0 })),
            "got {result:?}"
        );
    }

    #[test]
    fn batch_stops_at_the_first_constant_series() {
        let batch = vec![ts(&[1.0, 2.0]), ts(&[7.0, 7.0]), ts(&[4.0, 6.0])];
        assert!(z_normalize_batch(&batch).is_err());
        assert_eq!(z_normalize_batch(&batch[..1]).unwrap().len(), 1);
    }

    #[test]
    fn derivative_of_a_ramp_is_its_slope() {
        let d = derivative(&ts(&[0.0, 2.0, 4.0, 6.0, 8.0])).unwrap();
        assert_eq!(d.len(), 3);
        for &v in d.as_slice() {
            assert!((v - 2.0).abs() < 1e-12, "expected 2.0, got {v}");
        }
    }

    #[test]
    fn derivative_needs_interior_points() {
        let result = derivative_batch(&[ts(&[1.0, 2.0, 3.0]), ts(&[1.0, 2.0])]);
        assert!(matches!(result, Err(DerivativeError::TooShort { len: 2 })));
    }
}
