// src/cleaning/pipeline.rs

use crate::cleaning::season::count_in_quarter;
use crate::cleaning::{
    build_table, classify, detect_high_season, parse_bedrooms, ClassifiedListing, CleaningError,
    HighSeason, HistoricalMetrics, OutputTable, Quarter,
};
use crate::config::Thresholds;
use crate::domain::{value_text, Listing};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

/// Everything derived for one listing before classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedMetrics {
    pub total_reviews: u32,
    pub total_months: u32,
    pub missing_months: u32,
    pub avg_reviews_per_month: f64,
    /// This listing's reviews that fall in the run-wide high season.
    pub high_season_reviews: u32,
    pub high_season: Option<Quarter>,
    pub bedrooms: u32,
}

impl DerivedMetrics {
    pub fn new(
        history: HistoricalMetrics,
        high_season: Option<Quarter>,
        high_season_reviews: u32,
        bedrooms: u32,
    ) -> Self {
        Self {
            total_reviews: history.total_reviews,
            total_months: history.total_months,
            missing_months: history.missing_months,
            avg_reviews_per_month: history.avg_reviews_per_month,
            high_season_reviews,
            high_season,
            bedrooms,
        }
    }
}

/// A listing that was left out of the table.
#[derive(Debug)]
pub struct ListingFailure {
    /// 1-based position in the input.
    pub position: usize,
    pub listing: String,
    pub error: CleaningError,
}

#[derive(Debug)]
pub struct CleaningOutcome {
    pub table: OutputTable,
    pub high_season: HighSeason,
    pub failures: Vec<ListingFailure>,
}

/// Runs the whole cleaning pass over one batch of raw listings.
///
/// A top-level shape other than a list of objects fails the run. A listing with
/// a bad record or a bad review timestamp is skipped and reported in
/// `failures`; the rest of the batch still gets classified.
pub fn clean_listings(raw: &Value, thresholds: &Thresholds) -> Result<CleaningOutcome, CleaningError> {
    info!("Starting to clean listing data");

    let entries = raw
        .as_array()
        .ok_or_else(|| CleaningError::InvalidInput("expected a list of listings".to_string()))?;
    if let Some(position) = entries.iter().position(|e| !e.is_object()) {
        return Err(CleaningError::InvalidInput(format!(
            "entry {} is not a listing object",
            position + 1
        )));
    }

    let mut failures = Vec::new();
    let mut parsed: Vec<(Listing, Vec<NaiveDate>)> = Vec::with_capacity(entries.len());

    for (idx, entry) in entries.iter().enumerate() {
        let position = idx + 1;
        let listing = match Listing::deserialize(entry).map_err(CleaningError::from) {
            Ok(listing) => listing,
            Err(error) => {
                warn!("Listing {position}: skipped, {error}");
                failures.push(ListingFailure {
                    position,
                    listing: entry_label(entry),
                    error,
                });
                continue;
            }
        };
        match listing.review_dates() {
            Ok(dates) => parsed.push((listing, dates)),
            Err(error) => {
                warn!("Listing {position} ({}): skipped, {error}", listing.label());
                failures.push(ListingFailure {
                    position,
                    listing: listing.label(),
                    error,
                });
            }
        }
    }

    let pooled: Vec<NaiveDate> = parsed.iter().flat_map(|(_, d)| d.iter().copied()).collect();
    let high_season = detect_high_season(&pooled, thresholds.season_override);
    match high_season.quarter {
        Some(q) => info!(
            "High season is {q} with {} reviews across {} listings",
            high_season.review_count,
            parsed.len()
        ),
        None => info!("No high season detected"),
    }

    let mut classified = Vec::with_capacity(parsed.len());
    for (idx, (listing, dates)) in parsed.into_iter().enumerate() {
        let history = HistoricalMetrics::from_dates(&dates);
        let high_season_reviews = high_season
            .quarter
            .map_or(0, |q| count_in_quarter(&dates, q) as u32);
        let bedrooms = parse_bedrooms(listing.bedroom_text().as_deref());

        let metrics = DerivedMetrics::new(history, high_season.quarter, high_season_reviews, bedrooms);
        let classification = classify(&metrics, thresholds);
        info!(
            "Listing {}: {} ({:?})",
            idx + 1,
            classification.tier,
            metrics
        );

        classified.push(ClassifiedListing {
            listing,
            metrics,
            classification,
        });
    }

    let table = build_table(classified);
    info!(
        "Listing data cleaned: {} rows, {} skipped",
        table.len(),
        failures.len()
    );

    Ok(CleaningOutcome {
        table,
        high_season,
        failures,
    })
}

fn entry_label(entry: &Value) -> String {
    entry
        .get("name")
        .and_then(value_text)
        .unwrap_or_else(|| "<unnamed listing>".to_string())
}
