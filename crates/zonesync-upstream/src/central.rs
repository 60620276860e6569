//! Central subscriber service client
//!
//! The central service lists subscribers in `limit`/`offset` pages answered as
//! `{results: [...], next: <url>|null}`. Every request carries a static API key.

use crate::http::{build_client, read_json};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};
use zonesync_common::{HttpConfig, SubscriberRecord, SyncResult};

const SERVICE: &str = "central";

/// Source of subscriber records
#[async_trait]
pub trait SubscriberSource: Send + Sync {
    /// Whole subscriber universe, in page arrival order
    async fn fetch_all(&self) -> SyncResult<Vec<SubscriberRecord>>;

    /// Every subscriber contract carrying `national_id`
    async fn find_by_national_id(&self, national_id: &str) -> SyncResult<Vec<SubscriberRecord>>;
}

#[derive(Debug, Deserialize)]
struct SubscriberPage {
    #[serde(default)]
    results: Vec<SubscriberRecord>,
    #[serde(default)]
    next: Option<String>,
}

/// Central subscriber service client
pub struct CentralClient {
    client: Client,
    base_url: String,
    api_key: String,
    page_size: usize,
}

impl CentralClient {
    /// Create new client
    pub fn new(base_url: &str, api_key: &str, http: &HttpConfig) -> SyncResult<Self> {
        Ok(Self {
            client: build_client(http)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            page_size: 300,
        })
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn listing_url(&self) -> String {
        format!("{}/api/clientes/", self.base_url)
    }

    async fn get_page(&self, query: &[(&str, String)]) -> SyncResult<SubscriberPage> {
        let url = self.listing_url();
        debug!(url = %url, ?query, "GET subscriber page");

        let response = self
            .client
            .get(&url)
            .query(query)
            .header("Authorization", format!("Api-Key {}", self.api_key))
            .header("Accept", "application/json")
            .send()
            .await;

        read_json(SERVICE, &url, response).await
    }

    /// Walk pages from offset 0 until an empty page or a missing cursor.
    ///
    /// Any page failure aborts the walk; records from earlier pages are dropped.
    async fn fetch_pages(&self, filter: Option<(&str, &str)>) -> SyncResult<Vec<SubscriberRecord>> {
        let mut records = Vec::new();
        let mut offset = 0usize;

        loop {
            let mut query = vec![("limit", self.page_size.to_string()), ("offset", offset.to_string())];
            if let Some((name, value)) = filter {
                query.push((name, value.to_string()));
            }

            let page = self.get_page(&query).await?;
            if page.results.is_empty() {
                break;
            }

            records.extend(page.results);
            if page.next.as_deref().map_or(true, str::is_empty) {
                break;
            }
            offset += self.page_size;
        }

        Ok(records)
    }
}

#[async_trait]
impl SubscriberSource for CentralClient {
    async fn fetch_all(&self) -> SyncResult<Vec<SubscriberRecord>> {
        let records = self.fetch_pages(None).await?;
        info!(count = records.len(), "fetched subscriber universe");
        Ok(records)
    }

    async fn find_by_national_id(&self, national_id: &str) -> SyncResult<Vec<SubscriberRecord>> {
        let records = self.fetch_pages(Some(("cedula", national_id))).await?;
        debug!(national_id, count = records.len(), "subscriber lookup by national id");
        Ok(records)
    }
}
