// src/domain/listing.rs

use crate::cleaning::CleaningError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Timestamp layout of review `createdAt` values, e.g. `2023-01-05T14:03:11.000Z`.
const REVIEW_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// One scraped rental listing as delivered by the listing source.
///
/// Display fields keep whatever JSON type the scrape used (`"stars": "New"`,
/// `"numberOfGuests": 4.0`). Everything else lands in `extra` untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Value>,
    #[serde(rename = "Location", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stars: Option<Value>,
    #[serde(rename = "numberOfGuests", default, skip_serializing_if = "Option::is_none")]
    pub number_of_guests: Option<Value>,
    /// Usually free text such as "2 bedrooms" or "Studio".
    #[serde(rename = "bedroomLabel", default, skip_serializing_if = "Option::is_none")]
    pub bedroom_label: Option<Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub reviews: Vec<Review>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Listing {
    /// Source identifier, when the scrape carried one.
    pub fn id(&self) -> Option<String> {
        self.extra.get("id").and_then(value_text)
    }

    pub fn display_name(&self) -> Option<String> {
        self.name.as_ref().and_then(value_text)
    }

    pub fn bedroom_text(&self) -> Option<String> {
        self.bedroom_label.as_ref().and_then(value_text)
    }

    /// Name used in logs and failure markers.
    pub fn label(&self) -> String {
        self.display_name()
            .or_else(|| self.id())
            .unwrap_or_else(|| "<unnamed listing>".to_string())
    }

    /// Parses every review date. The first malformed timestamp fails the whole listing.
    pub fn review_dates(&self) -> Result<Vec<NaiveDate>, CleaningError> {
        self.reviews.iter().map(Review::date).collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Review {
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Review {
    pub fn date(&self) -> Result<NaiveDate, CleaningError> {
        let raw = self
            .created_at
            .as_deref()
            .ok_or(CleaningError::MissingTimestamp)?;
        parse_review_timestamp(raw)
    }
}

/// Parses a review timestamp down to its UTC calendar date.
///
/// The scraper emits `...T..:..:..(.fff)Z`; full RFC 3339 offsets are accepted as well.
pub fn parse_review_timestamp(raw: &str) -> Result<NaiveDate, CleaningError> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, REVIEW_TIMESTAMP_FORMAT)
        .map(|dt| dt.date())
        .or_else(|err| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc).date_naive())
                .map_err(|_| err)
        })
        .map_err(|source| CleaningError::Timestamp {
            value: raw.to_string(),
            source,
        })
}

/// Scalar JSON as text: strings as-is, numbers and booleans printed. Null,
/// arrays and objects have no text form.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn null_as_empty<'de, D>(d: D) -> Result<Vec<Review>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Review>>::deserialize(d)?.unwrap_or_default())
}
