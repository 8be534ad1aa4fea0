//! Dadata country suggestions.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;

use common::{AppResult, ExternalApiConfig};

use super::base::{ApiClient, ApiRequest};
use crate::cache::{CacheHandler, CacheStore};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Country suggestion endpoint, relative to the Dadata base URL.
pub const SUGGEST_COUNTRY_PATH: &str = "/api/4_1/rs/suggest/country";
/// Lookups are cached for five hours.
pub const COUNTRY_CACHE_TTL_SECONDS: u64 = 60 * 60 * 5;
const CACHE_NAMESPACE: &str = "my_project";

/// Cache key for the suggestions of one country name.
pub fn country_cache_key(country: &str) -> String {
    format!("{}_get_country_info_{}", CACHE_NAMESPACE, country)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryData {
    #[serde(deserialize_with = "code_from_int_or_str")]
    pub code: i64,
    #[serde(default)]
    pub alfa2: String,
    #[serde(default)]
    pub alfa3: String,
    #[serde(default)]
    pub name_short: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountrySuggestion {
    pub value: String,
    #[serde(default)]
    pub unrestricted_value: String,
    pub data: CountryData,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CountryResponse {
    #[serde(default)]
    pub suggestions: Vec<CountrySuggestion>,
}

impl CountryResponse {
    /// Code of the best suggestion.
    pub fn first_code(&self) -> Option<i64> {
        self.suggestions.first().map(|s| s.data.code)
    }
}

/// Dadata sends the numeric code as a string; accept both.
fn code_from_int_or_str<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCode {
        Int(i64),
        Text(String),
    }

    match RawCode::deserialize(deserializer)? {
        RawCode::Int(code) => Ok(code),
        RawCode::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Country name to country code lookup.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CountryLookup: Send + Sync {
    async fn get_country_info(&self, country: &str) -> AppResult<CountryResponse>;
}

/// Dadata-backed [`CountryLookup`] with a read-through cache per country.
pub struct DadataClient {
    api: ApiClient,
    api_key: String,
    cache: Arc<CacheStore>,
}

impl DadataClient {
    pub fn new(config: &ExternalApiConfig, cache: Arc<CacheStore>) -> AppResult<Self> {
        let api = ApiClient::new(
            config.base_url.clone(),
            std::time::Duration::from_millis(config.timeout_ms),
        )?;
        Ok(Self {
            api,
            api_key: config.api_key.clone(),
            cache,
        })
    }
}

#[async_trait]
impl CountryLookup for DadataClient {
    async fn get_country_info(&self, country: &str) -> AppResult<CountryResponse> {
        let handler = CacheHandler::new(
            self.cache.clone(),
            country_cache_key(country),
            Some(COUNTRY_CACHE_TTL_SECONDS),
        );
        let request = ApiRequest::post(SUGGEST_COUNTRY_PATH)
            .header("authorization", self.api_key.as_str())
            .json(json!({ "query": country }));

        let (_, body) = self.api.cached_request(&handler, request).await?;
        Ok(serde_json::from_value(body)?)
    }
}
