use std::fmt::{self, Debug, Display};

use async_trait::async_trait;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue},
};
use serde::Deserialize;

use crate::{
    config::GeoApiConfig,
    error::LoadError,
    model::{OptionPage, SelectableOption},
};

/// Turns the text typed so far into one page of options.
///
/// This is the whole contract between the data side and whatever renders the
/// dropdown: debounce and rendering live on the other side of it.
#[async_trait]
pub trait OptionLoader: Send + Sync + Debug {
    async fn load_options(&self, input: &str) -> Result<OptionPage, LoadError>;
}

/// Loader backed by the GeoDB cities endpoint.
#[derive(Debug, Clone)]
pub struct GeoDbCityLoader {
    config: GeoApiConfig,
    http: Client,
}

impl GeoDbCityLoader {
    pub fn new(config: GeoApiConfig) -> Result<Self, LoadError> {
        let mut headers = HeaderMap::new();

        let mut key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| LoadError::Setup(format!("invalid API key header: {e}")))?;
        key.set_sensitive(true);
        headers.insert("X-RapidAPI-Key", key);

        let host = HeaderValue::from_str(&config.api_host)
            .map_err(|e| LoadError::Setup(format!("invalid API host header: {e}")))?;
        headers.insert("X-RapidAPI-Host", host);

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| LoadError::Setup(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &GeoApiConfig {
        &self.config
    }

    async fn fetch(&self, input: &str) -> Result<OptionPage, LoadError> {
        let url = format!("{}/cities", self.config.base_url.trim_end_matches('/'));
        let min_population = self.config.min_population.to_string();

        let res = self
            .http
            .get(&url)
            .query(&[("minPopulation", min_population.as_str()), ("namePrefix", input)])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(LoadError::Status { status: status.as_u16(), body: truncate_body(&body) });
        }

        let parsed: GeoCitiesResponse = serde_json::from_str(&body)?;

        Ok(parsed.data.into_iter().map(GeoCity::into_option).collect())
    }
}

#[async_trait]
impl OptionLoader for GeoDbCityLoader {
    async fn load_options(&self, input: &str) -> Result<OptionPage, LoadError> {
        tracing::debug!(input, "loading city options");

        match self.fetch(input).await {
            Ok(page) => {
                tracing::debug!(input, count = page.len(), "city options loaded");
                Ok(page)
            }
            Err(e) => {
                tracing::warn!(input, kind = ?e.kind(), "city lookup failed: {e}");
                Err(e)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeoCitiesResponse {
    data: Vec<GeoCity>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeoCity {
    latitude: Coordinate,
    longitude: Coordinate,
    name: String,
    country_code: String,
}

impl GeoCity {
    fn into_option(self) -> SelectableOption {
        SelectableOption::from_city(self.latitude, self.longitude, &self.name, &self.country_code)
    }
}

/// The service sends numbers, but some mirrors send strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Coordinate {
    Number(f64),
    Text(String),
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coordinate::Number(n) => write!(f, "{n}"),
            Coordinate::Text(s) => f.write_str(s),
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
