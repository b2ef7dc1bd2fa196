//! HTTP client for the statistics API.

use crate::{
    cache::ResponseCache,
    config::ClientConfig,
    error::{GeostatError, Result},
    language::Language,
    payload::{parse_data, parse_metadata, DataPayload, Metadata},
    request::RequestKey,
};
use futures::future::try_join_all;
use log::{debug, info};
use reqwest::{Client, Url};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};

/// Fetches dataset `data` and `metadata` documents, sharing responses between
/// callers that ask for the same key.
pub struct StatsClient {
    http: Client,
    config: ClientConfig,
    cache: Mutex<ResponseCache<RequestKey, Arc<Value>>>,
}

impl StatsClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(StatsClient {
            http,
            config,
            cache: Mutex::new(ResponseCache::new()),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Request URL for `key`. The dataset id is escaped as a single path
    /// segment and the query pairs are form-encoded.
    pub fn url_for(&self, key: &RequestKey) -> Result<Url> {
        let invalid_base = || GeostatError::Config(format!("invalid base URL: {}", self.config.base_url));
        let mut url = Url::parse(&self.config.base_url).map_err(|_| invalid_base())?;
        url.path_segments_mut()
            .map_err(|_| invalid_base())?
            .pop_if_empty()
            .push(key.dataset.trim_matches('/'))
            .push(key.kind.as_path());
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("lang", key.language.code());
            if let Some(year) = key.year {
                query.append_pair("year", &year.to_string());
            }
        }
        Ok(url)
    }

    fn cache(&self) -> MutexGuard<'_, ResponseCache<RequestKey, Arc<Value>>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fetch one JSON document.
    pub async fn fetch(&self, key: &RequestKey) -> Result<Arc<Value>> {
        if self.config.cache_enabled {
            if let Some(cached) = self.cache().get(key) {
                debug!("Cache hit for {}", key);
                return Ok(cached);
            }
        }
        let ticket = if self.config.cache_enabled {
            Some(self.cache().begin(key.clone()))
        } else {
            None
        };
        let url = self.url_for(key)?;
        info!("Fetching {}", url);

        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeostatError::BadStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.text().await?;
        let value = Arc::new(serde_json::from_str::<Value>(&body)?);

        if let Some(ticket) = ticket {
            if !self.cache().complete(&ticket, value.clone()) {
                debug!("A newer request for {} superseded this response", key);
            }
        }
        Ok(value)
    }

    pub async fn fetch_data(&self, dataset: &str, language: Language) -> Result<DataPayload> {
        let body = self.fetch(&RequestKey::data(dataset, language)).await?;
        Ok(parse_data(&body))
    }

    pub async fn fetch_data_for_year(
        &self,
        dataset: &str,
        language: Language,
        year: i32,
    ) -> Result<DataPayload> {
        let key = RequestKey::data(dataset, language).with_year(year);
        let body = self.fetch(&key).await?;
        Ok(parse_data(&body))
    }

    pub async fn fetch_metadata(&self, dataset: &str, language: Language) -> Result<Metadata> {
        let body = self.fetch(&RequestKey::metadata(dataset, language)).await?;
        Ok(parse_metadata(&body))
    }

    /// Data and metadata of one dataset, requested concurrently. Fails if
    /// either request fails.
    pub async fn fetch_series(
        &self,
        dataset: &str,
        language: Language,
    ) -> Result<(DataPayload, Metadata)> {
        tokio::try_join!(
            self.fetch_data(dataset, language),
            self.fetch_metadata(dataset, language)
        )
    }

    /// Georgian and English metadata of one dataset, requested concurrently.
    pub async fn fetch_localized_metadata(&self, dataset: &str) -> Result<(Metadata, Metadata)> {
        tokio::try_join!(
            self.fetch_metadata(dataset, Language::Georgian),
            self.fetch_metadata(dataset, Language::English)
        )
    }

    /// Several documents at once, in request order. The first failure fails
    /// the whole group.
    pub async fn fetch_many(&self, keys: &[RequestKey]) -> Result<Vec<Arc<Value>>> {
        try_join_all(keys.iter().map(|key| self.fetch(key))).await
    }
}
