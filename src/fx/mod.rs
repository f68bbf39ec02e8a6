pub(crate) mod completeness;
pub(crate) mod conversion;
pub(crate) mod fx_errors;
pub(crate) mod fx_model;
pub(crate) mod fx_repository;
pub(crate) mod fx_service;
pub(crate) mod fx_traits;
pub(crate) mod history_cache;


pub use conversion::{Conversion, CurrencyConverter};
pub use fx_errors::FxError;
pub use fx_model::{
    ConversionResult, DatePage, ExchangeRate, ExchangeRateDB, RatesHistoryPage, RatesOnDate,
};
pub use fx_repository::FxRepository;
pub use fx_service::FxService;
pub use fx_traits::{FxRepositoryTrait, FxServiceTrait};
