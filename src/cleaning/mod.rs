mod cleaning_error;
pub mod classifier;
pub mod history;
pub mod pipeline;
pub mod season;
pub mod table;

pub use classifier::{classify, parse_bedrooms, Classification, Tier};
pub use cleaning_error::CleaningError;
pub use history::HistoricalMetrics;
pub use pipeline::{clean_listings, CleaningOutcome, DerivedMetrics, ListingFailure};
pub use season::{detect_high_season, HighSeason, Quarter};
pub use table::{build_table, CellValue, ClassifiedListing, OutputRow, OutputTable};
