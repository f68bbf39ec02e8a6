pub(crate) mod bundesbank_provider;
pub(crate) mod market_data_errors;
pub(crate) mod market_data_provider;
pub(crate) mod sdmx_parser;

pub use bundesbank_provider::BundesbankProvider;
pub use market_data_errors::MarketDataError;
pub use market_data_provider::MarketDataProvider;
pub use sdmx_parser::{parse_currencies, parse_exchange_rates};
