// src/cleaning/table.rs

use crate::cleaning::{Classification, DerivedMetrics, Quarter, Tier};
use crate::domain::Listing;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Leading columns of every export, in order. Pass-through listing fields follow.
pub const FIXED_COLUMNS: [&str; 16] = [
    "Listing Name",
    "Data Quality Category",
    "Quality Rating Reason",
    "bedrooms",
    "total_reviews",
    "total_months",
    "missing_months",
    "avg_reviews_per_month",
    "high_season_reviews",
    "high_season",
    "High Season Insights",
    "numberOfGuests",
    "url",
    "name",
    "Location",
    "stars",
];

/// A single cell, typed so spreadsheet sinks can write numbers as numbers.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Integer(i64),
    Float(f64),
}

impl CellValue {
    fn from_json(value: &Value) -> CellValue {
        match value {
            Value::Null => CellValue::Empty,
            Value::Bool(b) => CellValue::Text(b.to_string()),
            Value::Number(n) => match n.as_i64() {
                Some(i) => CellValue::Integer(i),
                None => n.as_f64().map(CellValue::Float).unwrap_or(CellValue::Empty),
            },
            Value::String(s) => CellValue::Text(s.clone()),
            // Nested values (review lists, host objects) are kept as JSON text.
            other => CellValue::Text(other.to_string()),
        }
    }
}

fn cell(value: Option<&Value>) -> CellValue {
    value.map_or(CellValue::Empty, CellValue::from_json)
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(x) => write!(f, "{x}"),
        }
    }
}

/// A listing with everything the pipeline derived for it.
#[derive(Debug, Clone)]
pub struct ClassifiedListing {
    pub listing: Listing,
    pub metrics: DerivedMetrics,
    pub classification: Classification,
}

/// One export row. Derived values are stored as-is so reading them back is lossless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRow {
    pub listing_name: String,
    pub tier: Tier,
    pub reason: String,
    pub bedrooms: u32,
    pub total_reviews: u32,
    pub total_months: u32,
    pub missing_months: u32,
    pub avg_reviews_per_month: f64,
    pub high_season_reviews: u32,
    pub high_season: Option<u8>,
    pub high_season_insights: String,
    /// Display fields exactly as the source sent them.
    pub number_of_guests: Option<Value>,
    pub url: Option<Value>,
    pub name: Option<Value>,
    pub location: Option<Value>,
    pub stars: Option<Value>,
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl OutputRow {
    pub fn from_classified(classified: ClassifiedListing) -> Self {
        let ClassifiedListing {
            listing,
            metrics,
            classification,
        } = classified;

        let high_season_insights = match metrics.high_season {
            Some(quarter) => format!("{} Reviews in {quarter}", metrics.high_season_reviews),
            None => "No high season".to_string(),
        };

        let listing_name = listing.display_name().unwrap_or_default();
        let mut extra: Map<String, Value> = listing
            .extra
            .into_iter()
            .filter(|(key, _)| !FIXED_COLUMNS.contains(&key.as_str()))
            .collect();
        if let Some(label) = &listing.bedroom_label {
            extra.insert("bedroomLabel".to_string(), label.clone());
        }
        if !listing.reviews.is_empty() {
            let reviews = serde_json::to_value(&listing.reviews).unwrap_or(Value::Null);
            extra.insert("reviews".to_string(), reviews);
        }

        OutputRow {
            listing_name,
            tier: classification.tier,
            reason: classification.reason.to_string(),
            bedrooms: metrics.bedrooms,
            total_reviews: metrics.total_reviews,
            total_months: metrics.total_months,
            missing_months: metrics.missing_months,
            avg_reviews_per_month: metrics.avg_reviews_per_month,
            high_season_reviews: metrics.high_season_reviews,
            high_season: metrics.high_season.map(Quarter::number),
            high_season_insights,
            number_of_guests: listing.number_of_guests,
            url: listing.url,
            name: listing.name,
            location: listing.location,
            stars: listing.stars,
            extra,
        }
    }

    /// The derived metrics as carried by this row.
    pub fn metrics(&self) -> DerivedMetrics {
        DerivedMetrics {
            total_reviews: self.total_reviews,
            total_months: self.total_months,
            missing_months: self.missing_months,
            avg_reviews_per_month: self.avg_reviews_per_month,
            high_season_reviews: self.high_season_reviews,
            high_season: self.high_season.and_then(Quarter::new),
            bedrooms: self.bedrooms,
        }
    }

    /// Cell for a named column; unknown columns are empty.
    pub fn get(&self, column: &str) -> CellValue {
        match column {
            "Listing Name" => CellValue::Text(self.listing_name.clone()),
            "Data Quality Category" => CellValue::Text(self.tier.label().to_string()),
            "Quality Rating Reason" => CellValue::Text(self.reason.clone()),
            "bedrooms" => CellValue::Integer(self.bedrooms.into()),
            "total_reviews" => CellValue::Integer(self.total_reviews.into()),
            "total_months" => CellValue::Integer(self.total_months.into()),
            "missing_months" => CellValue::Integer(self.missing_months.into()),
            "avg_reviews_per_month" => CellValue::Float(self.avg_reviews_per_month),
            "high_season_reviews" => CellValue::Integer(self.high_season_reviews.into()),
            "high_season" => self
                .high_season
                .map_or(CellValue::Empty, |q| CellValue::Integer(q.into())),
            "High Season Insights" => CellValue::Text(self.high_season_insights.clone()),
            "numberOfGuests" => cell(self.number_of_guests.as_ref()),
            "url" => cell(self.url.as_ref()),
            "name" => cell(self.name.as_ref()),
            "Location" => cell(self.location.as_ref()),
            "stars" => cell(self.stars.as_ref()),
            other => cell(self.extra.get(other)),
        }
    }
}

/// The ordered result of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputTable {
    rows: Vec<OutputRow>,
    extra_columns: Vec<String>,
}

impl OutputTable {
    /// Wraps rows that are already in output order.
    pub fn from_rows(rows: Vec<OutputRow>) -> Self {
        let mut extra_columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.extra.keys() {
                if !extra_columns.contains(key) {
                    extra_columns.push(key.clone());
                }
            }
        }
        Self {
            rows,
            extra_columns,
        }
    }

    pub fn rows(&self) -> &[OutputRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> Vec<&str> {
        FIXED_COLUMNS
            .iter()
            .copied()
            .chain(self.extra_columns.iter().map(String::as_str))
            .collect()
    }

    /// Rows as cells aligned with `columns()`.
    pub fn records(&self) -> impl Iterator<Item = Vec<CellValue>> + '_ {
        let columns = self.columns();
        self.rows
            .iter()
            .map(move |row| columns.iter().map(|c| row.get(c)).collect())
    }
}

/// Builds the export table: best tier first, input order kept within a tier.
pub fn build_table(listings: Vec<ClassifiedListing>) -> OutputTable {
    let mut rows: Vec<OutputRow> = listings
        .into_iter()
        .map(OutputRow::from_classified)
        .collect();
    // sort_by is stable
    rows.sort_by(|a, b| b.tier.cmp(&a.tier));
    OutputTable::from_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaning::classifier::Reason;
    use serde_json::json;

    fn classified(name: &str, tier: Tier, extra: Value) -> ClassifiedListing {
        let mut raw = json!({ "name": name, "url": format!("https://rentals.example/{name}") });
        if let (Some(obj), Value::Object(more)) = (raw.as_object_mut(), extra) {
            obj.extend(more);
        }
        ClassifiedListing {
            listing: serde_json::from_value(raw).unwrap(),
            metrics: DerivedMetrics {
                total_reviews: 3,
                total_months: 2,
                missing_months: 10,
                avg_reviews_per_month: 1.5,
                high_season_reviews: 2,
                high_season: Quarter::new(1),
                bedrooms: 2,
            },
            classification: Classification {
                tier,
                reason: Reason::Good,
            },
        }
    }

    #[test]
    fn best_tier_first_and_stable_within_a_tier() {
        let table = build_table(vec![
            classified("a", Tier::Good, json!({})),
            classified("b", Tier::NotGood, json!({})),
            classified("c", Tier::PossiblyGood, json!({})),
            classified("d", Tier::Good, json!({})),
            classified("e", Tier::NotGood, json!({})),
        ]);

        let order: Vec<&str> = table.rows().iter().map(|r| r.listing_name.as_str()).collect();
        assert_eq!(order, ["a", "d", "c", "b", "e"]);
    }

    #[test]
    fn fixed_columns_lead_and_extras_follow() {
        let table = build_table(vec![
            classified("a", Tier::Good, json!({"id": "1", "bedroomLabel": "2 bedrooms"})),
            classified("b", Tier::Good, json!({"host": "Ann", "id": "2"})),
        ]);

        let columns = table.columns();
        assert_eq!(&columns[..16], &FIXED_COLUMNS[..]);
        assert_eq!(&columns[16..], &["bedroomLabel", "id", "host"]);

        let records: Vec<Vec<CellValue>> = table.records().collect();
        assert_eq!(records[0].len(), columns.len());
        // "host" is missing on the first row.
        assert_eq!(records[0][18], CellValue::Empty);
        assert_eq!(records[1][18], CellValue::Text("Ann".to_string()));
    }

    #[test]
    fn insight_text() {
        let table = build_table(vec![classified("a", Tier::Good, json!({}))]);
        assert_eq!(table.rows()[0].high_season_insights, "2 Reviews in Q1");

        let mut none = classified("b", Tier::Good, json!({}));
        none.metrics.high_season = None;
        none.metrics.high_season_reviews = 0;
        let table = build_table(vec![none]);
        assert_eq!(table.rows()[0].high_season_insights, "No high season");
        assert_eq!(table.rows()[0].get("high_season"), CellValue::Empty);
    }

    #[test]
    fn leading_columns_reproduce_the_metrics() {
        let source = classified("a", Tier::Good, json!({}));
        let expected = source.metrics;
        let table = build_table(vec![source]);
        let row = &table.rows()[0];

        assert_eq!(row.metrics(), expected);
        assert_eq!(row.get("total_reviews"), CellValue::Integer(3));
        assert_eq!(row.get("total_months"), CellValue::Integer(2));
        assert_eq!(row.get("missing_months"), CellValue::Integer(10));
        assert_eq!(row.get("bedrooms"), CellValue::Integer(2));
        assert_eq!(row.get("high_season"), CellValue::Integer(1));
        match row.get("avg_reviews_per_month") {
            CellValue::Float(v) => assert_eq!(v.to_bits(), 1.5f64.to_bits()),
            other => panic!("unexpected cell {other:?}"),
        }

        // Through JSON, as the results store keeps it.
        let stored = serde_json::to_string(table.rows()).unwrap();
        let restored: Vec<OutputRow> = serde_json::from_str(&stored).unwrap();
        assert_eq!(OutputTable::from_rows(restored), table);
    }

    #[test]
    fn input_fields_do_not_shadow_fixed_columns() {
        let table = build_table(vec![classified(
            "a",
            Tier::Good,
            json!({"total_reviews": 999, "stars": 4.8, "numberOfGuests": 4}),
        )]);
        let row = &table.rows()[0];
        assert_eq!(row.get("total_reviews"), CellValue::Integer(3));
        assert_eq!(row.get("stars"), CellValue::Float(4.8));
        assert_eq!(row.get("numberOfGuests"), CellValue::Integer(4));
        assert!(!row.extra.contains_key("total_reviews"));
    }

    #[test]
    fn display_fields_keep_their_source_type() {
        let table = build_table(vec![classified(
            "a",
            Tier::Good,
            json!({"name": 123, "stars": "New", "numberOfGuests": 4.0, "Location": null}),
        )]);
        let row = &table.rows()[0];
        assert_eq!(row.listing_name, "123");
        assert_eq!(row.get("name"), CellValue::Integer(123));
        assert_eq!(row.get("stars"), CellValue::Text("New".to_string()));
        assert_eq!(row.get("numberOfGuests"), CellValue::Float(4.0));
        assert_eq!(row.get("Location"), CellValue::Empty);
    }
}
