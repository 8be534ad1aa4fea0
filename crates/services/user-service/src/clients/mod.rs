//! Outbound HTTP clients.

mod base;
mod dadata;

pub use base::{classify_response, ApiClient, ApiRequest};
pub use dadata::{
    country_cache_key, CountryData, CountryLookup, CountryResponse, CountrySuggestion,
    DadataClient, COUNTRY_CACHE_TTL_SECONDS, SUGGEST_COUNTRY_PATH,
};

#[cfg(any(test, feature = "test-utils"))]
pub use dadata::MockCountryLookup;
