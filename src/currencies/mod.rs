pub(crate) mod currency_model;
pub(crate) mod currency_repository;
pub(crate) mod currency_service;
pub(crate) mod currency_traits;

pub use currency_model::{Currency, CurrencyDB};
pub use currency_repository::CurrencyRepository;
pub use currency_service::CurrencyService;
pub use currency_traits::{CurrencyRepositoryTrait, CurrencyServiceTrait};
