use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use choosy_core::catalog::CatalogQuery;
use choosy_core::error::FetchError;
use choosy_core::models::{RecipeDetail, RecipeListItem};
use choosy_core::service::RecipeSource;

use crate::config::ApiConfig;

const RECIPES_PATH: &[&str] = &["api", "recipes"];
const CATEGORIES_PATH: &[&str] = &["api", "recipes", "categories", "list"];

/// Async half of the client. Cheap to clone so each fan-out task owns one.
#[derive(Clone)]
struct Fetcher {
    client: reqwest::Client,
    base_url: Url,
    retries: u32,
    retry_delay: Duration,
}

impl Fetcher {
    /// Base URL plus `segments`, each percent-encoded as one path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| FetchError::Network(format!("invalid base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&'static str, String)],
        resource: &str,
    ) -> Result<T, FetchError> {
        let url = self.endpoint(segments)?;
        let mut attempt = 1;
        loop {
            debug!(%url, attempt, "GET");
            match self.try_get(&url, query, resource).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.retries => {
                    warn!(%url, attempt, error = %e, "request failed, retrying");
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_get<T: DeserializeOwned>(
        &self,
        url: &Url,
        query: &[(&'static str, String)],
        resource: &str,
    ) -> Result<T, FetchError> {
        let resp = self
            .client
            .get(url.clone())
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(resource.to_string()));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }

    async fn recipe_detail(&self, recipe_id: &str) -> Result<RecipeDetail, FetchError> {
        let mut segments = RECIPES_PATH.to_vec();
        segments.push(recipe_id);
        self.get_json(&segments, &[], recipe_id).await
    }
}

/// Pull a readable message out of an error body: the JSON `message` or
/// `detail` field when present, otherwise the raw text.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["message", "detail"] {
            if let Some(msg) = value.get(field).and_then(serde_json::Value::as_str) {
                return msg.to_string();
            }
        }
    }
    body.trim().chars().take(200).collect()
}

/// Blocking client for the recipe REST API. Owns a small runtime so the
/// synchronous service layer can drive it.
pub struct ApiClient {
    fetcher: Fetcher,
    rt: tokio::runtime::Runtime,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(format!("choosy-cli/{}", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .connect_timeout(config.timeout.min(Duration::from_secs(5)));
        if is_loopback(&config.base_url) {
            builder = builder.no_proxy();
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid API base URL: '{}'", config.base_url))?;
        if base_url.cannot_be_a_base() {
            bail!("Invalid API base URL: '{}'", config.base_url);
        }

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start async runtime")?;

        Ok(Self {
            fetcher: Fetcher {
                client,
                base_url,
                retries: config.retries.max(1),
                retry_delay: config.retry_delay,
            },
            rt,
        })
    }

    pub fn recipes(&self, query: &CatalogQuery) -> Result<Vec<RecipeListItem>, FetchError> {
        let pairs = query.to_query_pairs();
        self.rt
            .block_on(self.fetcher.get_json(RECIPES_PATH, &pairs, "recipes"))
    }

    pub fn categories(&self) -> Result<Vec<String>, FetchError> {
        self.rt
            .block_on(self.fetcher.get_json(CATEGORIES_PATH, &[], "categories"))
    }
}

impl RecipeSource for ApiClient {
    fn recipe_detail(&self, recipe_id: &str) -> Result<RecipeDetail, FetchError> {
        self.rt.block_on(self.fetcher.recipe_detail(recipe_id))
    }

    /// One request per id, all in flight together. Dropping the set on the
    /// first error aborts whatever is still running.
    fn recipe_details(&self, recipe_ids: &[String]) -> Result<Vec<RecipeDetail>, FetchError> {
        self.rt.block_on(async {
            let mut set = JoinSet::new();
            for (idx, id) in recipe_ids.iter().cloned().enumerate() {
                let fetcher = self.fetcher.clone();
                set.spawn(async move { (idx, fetcher.recipe_detail(&id).await) });
            }

            let mut details: Vec<Option<RecipeDetail>> = vec![None; recipe_ids.len()];
            while let Some(joined) = set.join_next().await {
                let (idx, result) =
                    joined.map_err(|e| FetchError::Network(format!("fetch task failed: {e}")))?;
                details[idx] = Some(result?);
            }
            Ok(details.into_iter().flatten().collect())
        })
    }
}

fn is_loopback(base_url: &str) -> bool {
    let host = base_url
        .split_once("://")
        .map_or(base_url, |(_, rest)| rest);
    host.starts_with("127.0.0.1") || host.starts_with("localhost") || host.starts_with("[::1]")
}
