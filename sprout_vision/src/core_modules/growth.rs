// THEORY:
// Growth is measured as the change in green density per day between the earliest and
// the latest photograph of a plant. Intermediate observations are kept for display
// but never enter the rate.
//
// Time is counted in whole days, truncated toward zero. Two photographs taken less
// than 24 hours apart therefore have an elapsed time of zero and cannot produce a
// rate; that is reported as `InvalidDuration` rather than as an infinity or NaN.
//
// A negative elapsed time is accepted by `compute_growth_rate` and simply flips the
// sign of the result. Only a zero duration is rejected.

use chrono::NaiveDateTime;
use log::info;
use serde::{Deserialize, Serialize};

use crate::core_modules::density::Density;
use crate::error::GrowthError;

/// Change in density per day. Unbounded; negative means decline.
pub type GrowthRate = f64;

/// One density observation. Immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensitySample {
    pub timestamp: NaiveDateTime,
    pub density: Density,
}

impl DensitySample {
    pub fn new(timestamp: NaiveDateTime, density: Density) -> Self {
        Self { timestamp, density }
    }
}

/// Density observations of one plant, kept in ascending timestamp order.
/// Samples sharing a timestamp keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DensitySeries {
    samples: Vec<DensitySample>,
}

impl DensitySeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: DensitySample) {
        let position = self
            .samples
            .partition_point(|existing| existing.timestamp <= sample.timestamp);
        self.samples.insert(position, sample);
    }

    pub fn samples(&self) -> &[DensitySample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&DensitySample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&DensitySample> {
        self.samples.last()
    }
}

impl From<Vec<DensitySample>> for DensitySeries {
    fn from(mut samples: Vec<DensitySample>) -> Self {
        samples.sort_by_key(|sample| sample.timestamp);
        Self { samples }
    }
}

impl FromIterator<DensitySample> for DensitySeries {
    fn from_iter<I: IntoIterator<Item = DensitySample>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

/// Result of a series computation: the rate plus everything it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesGrowth {
    pub rate: GrowthRate,
    pub first: DensitySample,
    pub last: DensitySample,
    pub elapsed_days: i64,
    pub data_points: Vec<DensitySample>,
}

/// Whole days from `first` to `last`, truncated toward zero.
pub fn elapsed_whole_days(first: NaiveDateTime, last: NaiveDateTime) -> i64 {
    (last - first).num_days()
}

/// `(density_t2 - density_t1) / elapsed_days`; zero days is an error.
pub fn compute_growth_rate(
    density_t1: Density,
    density_t2: Density,
    elapsed_days: i64,
) -> Result<GrowthRate, GrowthError> {
    if elapsed_days == 0 {
        return Err(GrowthError::InvalidDuration { elapsed_days });
    }
    Ok((density_t2 - density_t1) / elapsed_days as f64)
}

pub fn compute_series_growth(series: &DensitySeries) -> Result<SeriesGrowth, GrowthError> {
    let (first, last) = match (series.first(), series.last()) {
        (Some(first), Some(last)) if series.len() >= 2 => (*first, *last),
        _ => {
            return Err(GrowthError::InsufficientData {
                samples: series.len(),
            });
        }
    };

    let elapsed_days = elapsed_whole_days(first.timestamp, last.timestamp);
    let rate = compute_growth_rate(first.density, last.density, elapsed_days)?;
    info!(
        "growth rate {:.6}/day over {} days ({} samples)",
        rate,
        elapsed_days,
        series.len()
    );

    Ok(SeriesGrowth {
        rate,
        first,
        last,
        elapsed_days,
        data_points: series.samples().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    const TOLERANCE: f64 = 1e-12;

    fn day(offset: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
            + Duration::days(offset)
    }

    fn sample(offset: i64, density: f64) -> DensitySample {
        DensitySample::new(day(offset), density)
    }

    #[test]
    fn rate_is_density_change_per_day() {
        let rate = compute_growth_rate(0.2, 0.5, 10).unwrap();
        assert!((rate - 0.03).abs() < TOLERANCE);
    }

    #[test]
    fn unchanged_density_is_zero_rate() {
        assert_eq!(compute_growth_rate(0.5, 0.5, 5).unwrap(), 0.0);
    }

    #[test]
    fn zero_duration_is_rejected() {
        for (a, b) in [(0.0, 0.0), (0.1, 0.9), (1.0, 0.0)] {
            assert_eq!(
                compute_growth_rate(a, b, 0),
                Err(GrowthError::InvalidDuration { elapsed_days: 0 })
            );
        }
    }

    #[test]
    fn negative_duration_flips_sign() {
        // Reversed time direction with reversed densities yields the same positive rate.
        let rate = compute_growth_rate(0.5, 0.2, -10).unwrap();
        assert!((rate - 0.03).abs() < TOLERANCE);
    }

    #[test]
    fn decline_is_negative() {
        let rate = compute_growth_rate(0.6, 0.3, 3).unwrap();
        assert!((rate + 0.1).abs() < TOLERANCE);
    }

    #[test]
    fn elapsed_days_truncate_partial_days() {
        let start = day(0);
        assert_eq!(elapsed_whole_days(start, start + Duration::hours(23)), 0);
        assert_eq!(elapsed_whole_days(start, start + Duration::hours(47)), 1);
        assert_eq!(elapsed_whole_days(start + Duration::hours(47), start), -1);
    }

    #[test]
    fn series_needs_two_samples() {
        assert_eq!(
            compute_series_growth(&DensitySeries::new()),
            Err(GrowthError::InsufficientData { samples: 0 })
        );
        let single: DensitySeries = vec![sample(0, 0.4)].into();
        assert_eq!(
            compute_series_growth(&single),
            Err(GrowthError::InsufficientData { samples: 1 })
        );
    }

    #[test]
    fn same_timestamp_series_is_invalid_duration() {
        let series: DensitySeries = vec![sample(0, 0.1), sample(0, 0.3)].into();
        assert_eq!(
            compute_series_growth(&series),
            Err(GrowthError::InvalidDuration { elapsed_days: 0 })
        );
    }

    #[test]
    fn same_day_series_is_invalid_duration() {
        let morning = day(0);
        let evening = morning + Duration::hours(10);
        let series: DensitySeries =
            vec![DensitySample::new(morning, 0.1), DensitySample::new(evening, 0.2)].into();
        assert!(matches!(
            compute_series_growth(&series),
            Err(GrowthError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn series_rate_uses_only_first_and_last() {
        let series: DensitySeries =
            vec![sample(0, 0.10), sample(5, 0.25), sample(10, 0.40)].into();
        let growth = compute_series_growth(&series).unwrap();
        assert!((growth.rate - 0.03).abs() < TOLERANCE);
        assert_eq!(growth.elapsed_days, 10);
        assert_eq!(growth.first, sample(0, 0.10));
        assert_eq!(growth.last, sample(10, 0.40));
        assert_eq!(growth.data_points.len(), 3);

        // Changing the middle observation does not change the rate.
        let skewed: DensitySeries =
            vec![sample(0, 0.10), sample(5, 0.99), sample(10, 0.40)].into();
        assert_eq!(compute_series_growth(&skewed).unwrap().rate, growth.rate);
    }

    #[test]
    fn series_orders_unsorted_input() {
        let series: DensitySeries =
            vec![sample(10, 0.40), sample(0, 0.10), sample(5, 0.25)].into();
        let timestamps: Vec<_> = series.samples().iter().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, vec![day(0), day(5), day(10)]);
    }

    #[test]
    fn push_keeps_order_and_ties_stable() {
        let mut series = DensitySeries::new();
        series.push(sample(3, 0.3));
        series.push(sample(1, 0.1));
        series.push(sample(3, 0.35));
        series.push(sample(2, 0.2));
        let densities: Vec<f64> = series.samples().iter().map(|s| s.density).collect();
        assert_eq!(densities, vec![0.1, 0.2, 0.3, 0.35]);
    }
}
