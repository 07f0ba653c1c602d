// src/cleaning/classifier.rs

use crate::cleaning::DerivedMetrics;
use crate::config::{ThresholdSet, Thresholds};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

/// Data quality tier. Ordered Good > Possibly Good > Not Good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    #[serde(rename = "Good Data")]
    Good,
    #[serde(rename = "Possibly Good Data")]
    PossiblyGood,
    #[serde(rename = "Not Good Data")]
    NotGood,
}

impl Tier {
    pub fn label(self) -> &'static str {
        match self {
            Tier::Good => "Good Data",
            Tier::PossiblyGood => "Possibly Good Data",
            Tier::NotGood => "Not Good Data",
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            Tier::Good => 2,
            Tier::PossiblyGood => 1,
            Tier::NotGood => 0,
        }
    }
}

impl Ord for Tier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Tier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One numeric check a listing is held to in every tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    TotalMonths,
    MissingMonths,
    AvgReviewsPerMonth,
    TotalReviews,
    HighSeasonReviews,
}

#[derive(Debug, Clone, Copy)]
enum Bound {
    AtLeast,
    AtMost,
}

impl Criterion {
    pub const ALL: [Criterion; 5] = [
        Criterion::TotalMonths,
        Criterion::MissingMonths,
        Criterion::AvgReviewsPerMonth,
        Criterion::TotalReviews,
        Criterion::HighSeasonReviews,
    ];

    pub fn metric_name(self) -> &'static str {
        match self {
            Criterion::TotalMonths => "total_months",
            Criterion::MissingMonths => "missing_months",
            Criterion::AvgReviewsPerMonth => "avg_reviews_per_month",
            Criterion::TotalReviews => "total_reviews",
            Criterion::HighSeasonReviews => "high_season_reviews",
        }
    }

    fn threshold_key(self) -> &'static str {
        match self {
            Criterion::TotalReviews => "min_reviews",
            other => other.metric_name(),
        }
    }

    fn bound(self) -> Bound {
        match self {
            Criterion::MissingMonths => Bound::AtMost,
            _ => Bound::AtLeast,
        }
    }

    pub fn actual(self, metrics: &DerivedMetrics) -> f64 {
        match self {
            Criterion::TotalMonths => metrics.total_months as f64,
            Criterion::MissingMonths => metrics.missing_months as f64,
            Criterion::AvgReviewsPerMonth => metrics.avg_reviews_per_month,
            Criterion::TotalReviews => metrics.total_reviews as f64,
            Criterion::HighSeasonReviews => metrics.high_season_reviews as f64,
        }
    }

    pub fn threshold(self, set: &ThresholdSet) -> Option<f64> {
        set.get(self.threshold_key())
    }

    /// An absent threshold always passes: "at least" checks compare against
    /// negative infinity and "at most" checks against positive infinity.
    ///
    /// TODO: confirm with the config owners whether a missing key should block
    /// instead; flipping this makes every listing fail that criterion.
    pub fn passes(self, actual: f64, threshold: Option<f64>) -> bool {
        match self.bound() {
            Bound::AtLeast => actual >= threshold.unwrap_or(f64::NEG_INFINITY),
            Bound::AtMost => actual <= threshold.unwrap_or(f64::INFINITY),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standing {
    Good,
    PossiblyGood,
    BelowPossiblyGood,
}

/// How one metric compares against both tiers.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub criterion: Criterion,
    pub actual: f64,
    pub standing: Standing,
    /// The Possibly Good threshold, quoted in the message.
    pub threshold: Option<f64>,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metric = self.criterion.metric_name();
        let threshold = match self.threshold {
            Some(t) => t.to_string(),
            None => "none".to_string(),
        };
        match self.standing {
            Standing::Good => write!(f, "{metric} is Good Data: {}", self.actual),
            Standing::PossiblyGood => write!(
                f,
                "{metric} is Possibly Good Data: {} (threshold: {threshold})",
                self.actual
            ),
            Standing::BelowPossiblyGood => write!(
                f,
                "{metric} is below Possibly Good Data threshold: {} (threshold: {threshold})",
                self.actual
            ),
        }
    }
}

/// Why a listing got its tier. Rendered to text only when the table is built.
#[derive(Debug, Clone, PartialEq)]
pub enum Reason {
    Good,
    BedroomGate { bedrooms: u32, min_bedrooms: u32 },
    Breakdown(Vec<Verdict>),
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::Good => f.write_str(Tier::Good.label()),
            Reason::BedroomGate {
                bedrooms,
                min_bedrooms,
            } => write!(
                f,
                "Only {bedrooms} bedrooms, requires at least {min_bedrooms} bedrooms"
            ),
            Reason::Breakdown(verdicts) => {
                for (i, verdict) in verdicts.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{verdict}")?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub tier: Tier,
    pub reason: Reason,
}

/// True when every criterion passes against `set`.
pub fn meets_tier(metrics: &DerivedMetrics, set: &ThresholdSet) -> bool {
    Criterion::ALL
        .iter()
        .all(|c| c.passes(c.actual(metrics), c.threshold(set)))
}

/// Compares each metric against both tiers. Only criteria whose metric name is
/// itself a key of `keys_from` are reported, so `min_reviews` gates tiers but
/// never shows up here.
pub fn compare_report(
    metrics: &DerivedMetrics,
    keys_from: &ThresholdSet,
    thresholds: &Thresholds,
) -> Vec<Verdict> {
    Criterion::ALL
        .iter()
        .filter(|c| c.threshold_key() == c.metric_name() && c.threshold(keys_from).is_some())
        .map(|&criterion| {
            let actual = criterion.actual(metrics);
            let possibly_good = criterion.threshold(&thresholds.possibly_good);

            let standing = if criterion.passes(actual, criterion.threshold(&thresholds.good)) {
                Standing::Good
            } else if criterion.passes(actual, possibly_good) {
                Standing::PossiblyGood
            } else {
                Standing::BelowPossiblyGood
            };

            Verdict {
                criterion,
                actual,
                standing,
                threshold: possibly_good,
            }
        })
        .collect()
}

/// Assigns a tier. The bedroom gate comes first and short-circuits to Not Good,
/// then Good, then Possibly Good.
pub fn classify(metrics: &DerivedMetrics, thresholds: &Thresholds) -> Classification {
    if let Some(min_bedrooms) = thresholds.min_bedrooms {
        if metrics.bedrooms < min_bedrooms {
            return Classification {
                tier: Tier::NotGood,
                reason: Reason::BedroomGate {
                    bedrooms: metrics.bedrooms,
                    min_bedrooms,
                },
            };
        }
    }

    if meets_tier(metrics, &thresholds.good) {
        return Classification {
            tier: Tier::Good,
            reason: Reason::Good,
        };
    }

    if meets_tier(metrics, &thresholds.possibly_good) {
        return Classification {
            tier: Tier::PossiblyGood,
            reason: Reason::Breakdown(compare_report(
                metrics,
                &thresholds.possibly_good,
                thresholds,
            )),
        };
    }

    Classification {
        tier: Tier::NotGood,
        reason: Reason::Breakdown(compare_report(metrics, &thresholds.good, thresholds)),
    }
}

fn first_integer() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("static regex"))
}

/// Bedroom count from a label like "2 bedrooms". Studios are 0 whatever digits
/// they carry; labels without a number are 0 too.
pub fn parse_bedrooms(label: Option<&str>) -> u32 {
    let Some(label) = label else {
        return 0;
    };
    if label.to_lowercase().contains("studio") {
        return 0;
    }
    first_integer()
        .find(label)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}
