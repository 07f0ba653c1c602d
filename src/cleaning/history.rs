// src/cleaning/history.rs

use crate::cleaning::CleaningError;
use crate::domain::Review;
use chrono::{Datelike, NaiveDate};
use std::collections::HashSet;

/// Months in the window that `missing_months` is measured against.
const GAP_WINDOW_MONTHS: u32 = 12;

/// Review activity of a single listing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoricalMetrics {
    pub total_reviews: u32,
    /// Inclusive month span from the earliest to the latest review.
    pub total_months: u32,
    /// Months without a review inside a one-year window. Only computed when the
    /// span is at most 12 months; longer histories report 0.
    pub missing_months: u32,
    /// Rounded to two decimals, half away from zero.
    pub avg_reviews_per_month: f64,
}

impl HistoricalMetrics {
    /// Computes metrics straight from reviews. A malformed timestamp fails the
    /// whole computation instead of dropping the review.
    pub fn from_reviews(reviews: &[Review]) -> Result<Self, CleaningError> {
        let dates = reviews
            .iter()
            .map(Review::date)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_dates(&dates))
    }

    pub fn from_dates(dates: &[NaiveDate]) -> Self {
        let total_reviews = dates.len() as u32;

        let total_months = match (dates.iter().min(), dates.iter().max()) {
            (Some(earliest), Some(latest)) => month_span(*earliest, *latest),
            _ => 0,
        };

        let active_months: HashSet<(i32, u32)> =
            dates.iter().map(|d| (d.year(), d.month())).collect();

        let missing_months = if total_months <= GAP_WINDOW_MONTHS {
            GAP_WINDOW_MONTHS.saturating_sub(active_months.len() as u32)
        } else {
            0
        };

        let avg_reviews_per_month = if total_months > 0 {
            round2(total_reviews as f64 / total_months as f64)
        } else {
            0.0
        };

        Self {
            total_reviews,
            total_months,
            missing_months,
            avg_reviews_per_month,
        }
    }
}

/// Calendar months touched from `earliest` to `latest`, both ends included.
fn month_span(earliest: NaiveDate, latest: NaiveDate) -> u32 {
    let months = (latest.year() - earliest.year()) * 12 + latest.month() as i32
        - earliest.month() as i32
        + 1;
    months.max(0) as u32
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn no_reviews() {
        let metrics = HistoricalMetrics::from_dates(&[]);
        assert_eq!(metrics.total_reviews, 0);
        assert_eq!(metrics.total_months, 0);
        assert_eq!(metrics.missing_months, 12);
        assert_eq!(metrics.avg_reviews_per_month, 0.0);
    }

    #[test]
    fn three_reviews_over_two_months() {
        let metrics =
            HistoricalMetrics::from_dates(&[day(2023, 1, 5), day(2023, 1, 20), day(2023, 2, 10)]);
        assert_eq!(metrics.total_reviews, 3);
        assert_eq!(metrics.total_months, 2);
        assert_eq!(metrics.missing_months, 10);
        assert_eq!(metrics.avg_reviews_per_month, 1.5);
    }

    #[test]
    fn single_month_is_a_span_of_one() {
        let one = HistoricalMetrics::from_dates(&[day(2024, 6, 30)]);
        assert_eq!(one.total_months, 1);

        let many = HistoricalMetrics::from_dates(&[
            day(2024, 6, 1),
            day(2024, 6, 12),
            day(2024, 6, 13),
            day(2024, 6, 30),
        ]);
        assert_eq!(many.total_months, 1);
        assert_eq!(many.missing_months, 11);
        assert_eq!(many.avg_reviews_per_month, 4.0);
    }

    #[test]
    fn span_counts_calendar_months_not_days() {
        // Dec 31 -> Jan 1 is one day apart but touches two months.
        let metrics = HistoricalMetrics::from_dates(&[day(2022, 12, 31), day(2023, 1, 1)]);
        assert_eq!(metrics.total_months, 2);
    }

    #[test]
    fn missing_months_only_within_a_year() {
        // Exactly 12 months: Jan..Dec with 4 active months.
        let year = HistoricalMetrics::from_dates(&[
            day(2023, 1, 1),
            day(2023, 4, 1),
            day(2023, 8, 1),
            day(2023, 12, 1),
        ]);
        assert_eq!(year.total_months, 12);
        assert_eq!(year.missing_months, 8);

        // 13 months: not computed.
        let longer = HistoricalMetrics::from_dates(&[day(2023, 1, 1), day(2024, 1, 1)]);
        assert_eq!(longer.total_months, 13);
        assert_eq!(longer.missing_months, 0);
    }

    #[test]
    fn average_rounds_half_away_from_zero() {
        // 3 reviews over 24 months = 0.125 -> 0.13
        let metrics = HistoricalMetrics::from_dates(&[
            day(2022, 1, 10),
            day(2022, 6, 1),
            day(2023, 12, 20),
        ]);
        assert_eq!(metrics.total_months, 24);
        assert_eq!(metrics.avg_reviews_per_month, 0.13);

        assert_eq!(round2(2.0 / 3.0), 0.67);
        assert_eq!(round2(0.5), 0.5);
    }

    #[test]
    fn review_order_does_not_matter() {
        let forward = HistoricalMetrics::from_dates(&[day(2023, 1, 5), day(2023, 3, 1)]);
        let backward = HistoricalMetrics::from_dates(&[day(2023, 3, 1), day(2023, 1, 5)]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn from_reviews_surfaces_parse_errors() {
        let good: Vec<Review> = serde_json::from_value(json!([
            {"createdAt": "2023-01-05T10:00:00.000Z"},
            {"createdAt": "2023-01-20T10:00:00.000Z"},
            {"createdAt": "2023-02-10T10:00:00.000Z"}
        ]))
        .unwrap();
        let metrics = HistoricalMetrics::from_reviews(&good).unwrap();
        assert_eq!(metrics.avg_reviews_per_month, 1.5);

        let bad: Vec<Review> =
            serde_json::from_value(json!([{"createdAt": "2023-13-45T00:00:00.000Z"}])).unwrap();
        assert!(matches!(
            HistoricalMetrics::from_reviews(&bad),
            Err(CleaningError::Timestamp { .. })
        ));
    }
}
