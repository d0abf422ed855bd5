//! Pixabay photo-search client.

use crate::Result;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const SEARCH_ENDPOINT: &str = "https://pixabay.com/api/";
const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Response body of the search endpoint. Only the fields we read.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: Vec<Hit>,
}

/// A single search hit.
#[derive(Debug, Deserialize)]
pub struct Hit {
    #[serde(rename = "webformatURL")]
    pub webformat_url: Option<String>,

    #[serde(rename = "largeImageURL")]
    pub large_image_url: Option<String>,
}

/// Pick the download URL from a search response: the first hit's
/// medium-resolution URL, falling back to the large one when the former is
/// absent or empty. Returns `None` for an empty result set, or when the
/// first hit carries neither field.
pub fn choose_url(response: SearchResponse) -> Option<String> {
    let hit = response.hits.into_iter().next()?;
    hit.webformat_url
        .filter(|url| !url.is_empty())
        .or_else(|| hit.large_image_url.filter(|url| !url.is_empty()))
}

/// Thin client over the Pixabay REST API.
pub struct SearchClient {
    http: reqwest::Client,
}

impl SearchClient {
    /// Build a client with the search timeout applied.
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder().timeout(SEARCH_TIMEOUT).build()?;
        Ok(Self { http })
    }

    /// Search for `query` and return the first usable image URL.
    ///
    /// `Ok(None)` means the provider had no hits; transport and HTTP errors
    /// are returned as `Err` and are expected to terminate the run. The
    /// caller must supply a non-empty key.
    pub async fn first_image_url(&self, api_key: &str, query: &str) -> Result<Option<String>> {
        debug!("searching pixabay for '{}'", query);
        let response = self
            .http
            .get(SEARCH_ENDPOINT)
            .query(&[
                ("key", api_key),
                ("q", query),
                ("image_type", "photo"),
                ("safesearch", "true"),
                ("per_page", "50"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: SearchResponse = response.json().await?;
        Ok(choose_url(body))
    }
}
