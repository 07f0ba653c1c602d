// src/cleaning/season.rs

use chrono::{Datelike, NaiveDate};
use std::fmt;

/// A calendar quarter, 1 through 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Quarter(u8);

impl Quarter {
    pub const ALL: [Quarter; 4] = [Quarter(1), Quarter(2), Quarter(3), Quarter(4)];

    pub fn new(number: u8) -> Option<Quarter> {
        (1..=4).contains(&number).then_some(Quarter(number))
    }

    pub fn of(date: NaiveDate) -> Quarter {
        Quarter((date.month0() / 3 + 1) as u8)
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// Reads a manual high-season override. Blank means "auto-detect";
    /// otherwise the trailing character picks the quarter, so "Q3", "3" and
    /// "quarter 3" all force quarter 3.
    pub fn parse_override(token: &str) -> Result<Option<Quarter>, String> {
        let token = token.trim();
        let Some(last) = token.chars().last() else {
            return Ok(None);
        };

        last.to_digit(10)
            .and_then(|d| Quarter::new(d as u8))
            .map(Some)
            .ok_or_else(|| {
                format!("high season override {token:?} must end in a quarter number 1-4")
            })
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.0)
    }
}

/// The run-wide high season decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HighSeason {
    pub quarter: Option<Quarter>,
    /// Pooled reviews (all listings) that fall in `quarter`.
    pub review_count: usize,
}

/// Picks the high season over the pooled review dates of every listing in the run.
///
/// With an override the quarter is forced but the count still comes from the
/// pooled dates. Without one, the busiest quarter wins and ties go to the lowest
/// quarter number. No reviews and no override yields no quarter.
pub fn detect_high_season(pooled: &[NaiveDate], season_override: Option<Quarter>) -> HighSeason {
    let mut counts = [0usize; 4];
    for date in pooled {
        counts[(Quarter::of(*date).number() - 1) as usize] += 1;
    }

    let quarter = season_override.or_else(|| {
        let mut best: Option<(Quarter, usize)> = None;
        for (quarter, &count) in Quarter::ALL.iter().zip(counts.iter()) {
            if count == 0 {
                continue;
            }
            match best {
                Some((_, best_count)) if best_count >= count => {}
                _ => best = Some((*quarter, count)),
            }
        }
        best.map(|(quarter, _)| quarter)
    });

    let review_count = quarter
        .map(|q| counts[(q.number() - 1) as usize])
        .unwrap_or(0);

    HighSeason {
        quarter,
        review_count,
    }
}

/// How many of one listing's reviews land in the run-wide high season quarter.
pub fn count_in_quarter(dates: &[NaiveDate], quarter: Quarter) -> usize {
    dates.iter().filter(|d| Quarter::of(**d) == quarter).count()
}
