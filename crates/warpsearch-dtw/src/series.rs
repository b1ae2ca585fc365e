//! Validated univariate series.

use std::ops::Index;

use crate::error::DtwError;

fn validate(values: &[f64]) -> Result<(), DtwError> {
    if values.is_empty() {
        return Err(DtwError::EmptySeries);
    }
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(DtwError::NonFiniteValue { index }),
        None => Ok(()),
    }
}

/// Owned time series. Guaranteed non-empty with all finite values.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries(Vec<f64>);

impl TimeSeries {
    /// Create a new time series, validating that it is non-empty and all values are finite.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::EmptySeries`] | `values` is empty |
    /// | [`DtwError::NonFiniteValue`] | Any value is NaN or infinite |
    pub fn new(values: Vec<f64>) -> Result<Self, DtwError> {
        validate(&values)?;
        Ok(Self(values))
    }

    /// Borrow this series as a zero-copy view.
    #[must_use]
    pub fn as_view(&self) -> TimeSeriesView<'_> {
        TimeSeriesView(&self.0)
    }

    /// Return the samples.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Return the number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false` for a constructed series; present for the `len_without_is_empty` lint.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume and return the inner vector.
    #[must_use]
    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl AsRef<[f64]> for TimeSeries {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

impl TryFrom<Vec<f64>> for TimeSeries {
    type Error = DtwError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

/// Borrowed view of a validated series, used for queries that are not part of a training set.
#[derive(Debug, Clone, Copy)]
pub struct TimeSeriesView<'a>(&'a [f64]);

impl<'a> TimeSeriesView<'a> {
    /// Validate a borrowed slice.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::EmptySeries`] | `slice` is empty |
    /// | [`DtwError::NonFiniteValue`] | Any value is NaN or infinite |
    pub fn new(slice: &'a [f64]) -> Result<Self, DtwError> {
        validate(slice)?;
        Ok(Self(slice))
    }

    /// Return the underlying slice.
    #[must_use]
    pub fn as_slice(&self) -> &'a [f64] {
        self.0
    }

    /// Return the number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false` for a constructed view.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy the view into an owned series.
    #[must_use]
    pub fn to_series(&self) -> TimeSeries {
        TimeSeries(self.0.to_vec())
    }
}

impl Index<usize> for TimeSeriesView<'_> {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl AsRef<[f64]> for TimeSeriesView<'_> {
    fn as_ref(&self) -> &[f64] {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_rejected() {
        assert!(matches!(TimeSeries::new(vec![]), Err(DtwError::EmptySeries)));
        assert!(matches!(TimeSeriesView::new(&[]), Err(DtwError::EmptySeries)));
    }

    #[test]
    fn first_non_finite_index_is_reported() {
        let result = TimeSeries::new(vec![0.5, f64::NEG_INFINITY, f64::NAN]);
        assert!(matches!(result, Err(DtwError::NonFiniteValue { index: 1 })));

        let data = [1.0, 2.0, f64::INFINITY];
        let result = TimeSeriesView::new(&data);
        assert!(matches!(result, Err(DtwError::NonFiniteValue { index: 2 })));
    }

    #[test]
    fn view_shares_samples_with_owner() {
        let ts = TimeSeries::new(vec![3.0, 1.0, 2.0]).unwrap();
        let view = ts.as_view();
        assert_eq!(view.len(), 3);
        assert_eq!(view[1], 1.0);
        assert_eq!(view.as_slice(), ts.as_slice());
    }

    #[test]
    fn view_copies_into_owned_series() {
        let data = [4.0, 5.0];
        let owned = TimeSeriesView::new(&data).unwrap().to_series();
        assert_eq!(owned.into_inner(), vec![4.0, 5.0]);
    }

    #[test]
    fn try_from_vec() {
        let ts: Result<TimeSeries, _> = vec![1.0, 2.0].try_into();
        assert!(ts.is_ok());
    }
}
