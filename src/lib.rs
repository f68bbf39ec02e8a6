pub mod constants;
pub mod currencies;
pub mod db;
pub mod errors;
pub mod fx;
pub mod market_data;
pub mod schema;

pub use errors::{Error, Result};
