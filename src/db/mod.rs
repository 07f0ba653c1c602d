pub mod connection;
pub mod results;
pub mod runs;

pub use connection::{init_db, Database};
