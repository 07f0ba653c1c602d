// src/config.rs

use crate::cleaning::Quarter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Default Apify actor used to scrape listings with their reviews.
pub const DEFAULT_ACTOR_ID: &str = "GsNzxEKzE2vQ5d9HN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Invalid(String),
}

/// The on-disk configuration. Section names match the JSON file written by the web form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(rename = "Search Variables", default)]
    pub search: SearchVariables,
    #[serde(rename = "Logic Variables", default)]
    pub logic: LogicVariables,
    #[serde(rename = "General", default)]
    pub general: General,
}

/// Parameters forwarded to the listing source. The cleaning core never reads these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchVariables {
    pub actor_id: String,
    pub location_query: String,
    #[serde(deserialize_with = "lenient::string_list")]
    pub start_urls: Vec<String>,
    #[serde(deserialize_with = "lenient::u32")]
    pub max_listings: u32,
    #[serde(deserialize_with = "lenient::bool")]
    pub include_reviews: bool,
    #[serde(deserialize_with = "lenient::u32")]
    pub max_reviews: u32,
    #[serde(deserialize_with = "lenient::u32")]
    pub calendar_months: u32,
    #[serde(deserialize_with = "lenient::bool")]
    pub add_more_host_info: bool,
    pub currency: String,
    pub check_in: String,
    pub check_out: String,
    #[serde(deserialize_with = "lenient::u32")]
    pub limit_points: u32,
}

impl Default for SearchVariables {
    fn default() -> Self {
        Self {
            actor_id: DEFAULT_ACTOR_ID.to_string(),
            location_query: String::new(),
            start_urls: Vec::new(),
            max_listings: 100,
            include_reviews: true,
            max_reviews: 100,
            calendar_months: 0,
            add_more_host_info: false,
            currency: "USD".to_string(),
            check_in: String::new(),
            check_out: String::new(),
            limit_points: 100,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LogicVariables {
    #[serde(rename = "Good Data", default)]
    pub good_data: ThresholdSet,
    #[serde(rename = "Possibly Good Data", default)]
    pub possibly_good_data: ThresholdSet,
    /// Empty means auto-detect. Otherwise the trailing digit picks the quarter ("Q3" -> 3).
    #[serde(default)]
    pub high_season_override: String,
}

/// One tier of thresholds. `None` means the key is absent from the config,
/// and an absent key never blocks a listing (see `Criterion::passes`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ThresholdSet {
    #[serde(default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub total_months: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub missing_months: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub avg_reviews_per_month: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub min_reviews: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub high_season_reviews: Option<f64>,
}

impl ThresholdSet {
    pub const KEYS: [&'static str; 5] = [
        "total_months",
        "missing_months",
        "avg_reviews_per_month",
        "min_reviews",
        "high_season_reviews",
    ];

    pub fn get(&self, key: &str) -> Option<f64> {
        match key {
            "total_months" => self.total_months,
            "missing_months" => self.missing_months,
            "avg_reviews_per_month" => self.avg_reviews_per_month,
            "min_reviews" => self.min_reviews,
            "high_season_reviews" => self.high_season_reviews,
            _ => None,
        }
    }

    fn slot(&mut self, key: &str) -> Option<&mut Option<f64>> {
        match key {
            "total_months" => Some(&mut self.total_months),
            "missing_months" => Some(&mut self.missing_months),
            "avg_reviews_per_month" => Some(&mut self.avg_reviews_per_month),
            "min_reviews" => Some(&mut self.min_reviews),
            "high_season_reviews" => Some(&mut self.high_season_reviews),
            _ => None,
        }
    }

    fn validate(&self, tier: &str) -> Result<(), ConfigError> {
        for key in Self::KEYS {
            if let Some(value) = self.get(key) {
                if !value.is_finite() || value < 0.0 {
                    return Err(ConfigError::Invalid(format!(
                        "{tier}.{key} must be a non-negative number, got {value}"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct General {
    #[serde(deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub min_bedrooms: Option<f64>,
    pub output_file_name: String,
    /// "csv" or "excel". Interpreted by the export sink only.
    pub output_file_format: String,
    /// Older config files kept the override here instead of under "Logic Variables".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_season_override: Option<String>,
}

impl Default for General {
    fn default() -> Self {
        Self {
            min_bedrooms: None,
            output_file_name: "cleaned_listings".to_string(),
            output_file_format: "csv".to_string(),
            high_season_override: None,
        }
    }
}

/// Validated, typed view of everything the classifier needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Thresholds {
    pub good: ThresholdSet,
    pub possibly_good: ThresholdSet,
    pub min_bedrooms: Option<u32>,
    pub season_override: Option<Quarter>,
}

impl AppConfig {
    /// Reads and validates the config file. Invalid thresholds are rejected here
    /// rather than surfacing halfway through a run.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let config: AppConfig = serde_json::from_str(&text)?;
        config.thresholds()?;
        Ok(config)
    }

    /// Like `load`, but a missing file yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            debug!("{} not found, using default config", path.display());
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn thresholds(&self) -> Result<Thresholds, ConfigError> {
        self.logic.good_data.validate("Good Data")?;
        self.logic.possibly_good_data.validate("Possibly Good Data")?;

        let min_bedrooms = match self.general.min_bedrooms {
            None => None,
            Some(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => {
                Some(v as u32)
            }
            Some(v) => {
                return Err(ConfigError::Invalid(format!(
                    "min_bedrooms must be a whole non-negative number, got {v}"
                )))
            }
        };

        let token = if self.logic.high_season_override.trim().is_empty() {
            self.general.high_season_override.as_deref().unwrap_or("")
        } else {
            self.logic.high_season_override.as_str()
        };
        let season_override = Quarter::parse_override(token).map_err(ConfigError::Invalid)?;

        Ok(Thresholds {
            good: self.logic.good_data.clone(),
            possibly_good: self.logic.possibly_good_data.clone(),
            min_bedrooms,
            season_override,
        })
    }

    /// Merges submitted form fields into the config and re-validates it.
    ///
    /// Threshold inputs are named `good.<key>` / `possibly_good.<key>`; an empty
    /// value removes the key. Unknown fields are ignored.
    pub fn apply_form(&mut self, form: &HashMap<String, String>) -> Result<(), ConfigError> {
        for (key, value) in form {
            let value = value.trim();
            match key.as_str() {
                "location_query" => self.search.location_query = value.to_string(),
                "currency" => self.search.currency = value.to_string(),
                "check_in" => self.search.check_in = value.to_string(),
                "check_out" => self.search.check_out = value.to_string(),
                "start_urls" => {
                    self.search.start_urls = value
                        .lines()
                        .map(str::trim)
                        .filter(|l| !l.is_empty())
                        .map(String::from)
                        .collect()
                }
                "max_listings" => self.search.max_listings = parse_form_u32(key, value)?,
                "max_reviews" => self.search.max_reviews = parse_form_u32(key, value)?,
                "calendar_months" => self.search.calendar_months = parse_form_u32(key, value)?,
                "limit_points" => self.search.limit_points = parse_form_u32(key, value)?,
                "include_reviews" => self.search.include_reviews = parse_form_bool(key, value)?,
                "add_more_host_info" => {
                    self.search.add_more_host_info = parse_form_bool(key, value)?
                }
                "high_season_override" => self.logic.high_season_override = value.to_string(),
                "min_bedrooms" => self.general.min_bedrooms = parse_form_number(key, value)?,
                "output_file_name" => self.general.output_file_name = value.to_string(),
                "output_file_format" => self.general.output_file_format = value.to_string(),
                other => {
                    let (set, field) = match other.split_once('.') {
                        Some(("good", field)) => (&mut self.logic.good_data, field),
                        Some(("possibly_good", field)) => (&mut self.logic.possibly_good_data, field),
                        _ => {
                            debug!("ignoring unknown form field {other}");
                            continue;
                        }
                    };
                    let parsed = parse_form_number(other, value)?;
                    let slot = set.slot(field).ok_or_else(|| {
                        ConfigError::Invalid(format!("unknown threshold field {other}"))
                    })?;
                    *slot = parsed;
                }
            }
        }

        self.thresholds()?;
        Ok(())
    }
}

fn parse_form_number(key: &str, value: &str) -> Result<Option<f64>, ConfigError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .map(Some)
        .map_err(|_| ConfigError::Invalid(format!("{key} must be a number, got {value:?}")))
}

fn parse_form_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value
        .parse::<u32>()
        .map_err(|_| ConfigError::Invalid(format!("{key} must be a whole number, got {value:?}")))
}

fn parse_form_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Ok(true),
        "false" | "off" | "0" | "no" | "" => Ok(false),
        _ => Err(ConfigError::Invalid(format!("{key} must be true or false, got {value:?}"))),
    }
}

/// Deserializers that accept both JSON values and the strings the web form writes back.
mod lenient {
    use serde::de::{self, Deserializer};
    use serde::Deserialize;
    use serde_json::Value;

    pub fn opt_number<'de, D>(d: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| de::Error::custom("number out of range")),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("expected a number, got {s:?}"))),
            Some(other) => Err(de::Error::custom(format!("expected a number, got {other}"))),
        }
    }

    pub fn u32<'de, D>(d: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(d)? {
            Value::Number(n) => n
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| de::Error::custom(format!("expected a whole number, got {n}"))),
            Value::String(s) => s
                .trim()
                .parse::<u32>()
                .map_err(|_| de::Error::custom(format!("expected a whole number, got {s:?}"))),
            other => Err(de::Error::custom(format!("expected a whole number, got {other}"))),
        }
    }

    pub fn bool<'de, D>(d: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(d)? {
            Value::Bool(b) => Ok(b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "on" | "1" | "yes" => Ok(true),
                "false" | "off" | "0" | "no" | "" => Ok(false),
                _ => Err(de::Error::custom(format!("expected true or false, got {s:?}"))),
            },
            other => Err(de::Error::custom(format!("expected true or false, got {other}"))),
        }
    }

    pub fn string_list<'de, D>(d: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(d)? {
            Value::Null => Ok(Vec::new()),
            Value::String(s) => Ok(s
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect()),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    // Apify style {"url": "..."} entries
                    Value::Object(map) => map
                        .get("url")
                        .and_then(Value::as_str)
                        .map(String::from)
                        .ok_or_else(|| de::Error::custom("start url object without \"url\"")),
                    other => Err(de::Error::custom(format!("expected a url, got {other}"))),
                })
                .collect(),
            other => Err(de::Error::custom(format!("expected a list of urls, got {other}"))),
        }
    }
}
