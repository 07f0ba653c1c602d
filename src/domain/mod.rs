pub mod listing;

pub use listing::{value_text, Listing, Review};
