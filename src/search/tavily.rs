//! `TavilySearchClient` - REST implementation of the Tavily search API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::{SearchClient, SearchError};
use crate::config::DEFAULT_REQUEST_TIMEOUT;
use crate::model::state::CookingTip;

const BASE_URL: &str = "https://api.tavily.com/search";

/// Search client backed by the Tavily HTTP API.
#[derive(Clone)]
pub struct TavilySearchClient {
    client: Client,
    api_key: String,
    timeout: Duration,
}

impl TavilySearchClient {
    /// Creates a client with the provided credential.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Overrides the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl SearchClient for TavilySearchClient {
    async fn find_tips(
        &self,
        recipe_title: &str,
        ingredients: &[String],
        limit: usize,
    ) -> Result<Vec<CookingTip>, SearchError> {
        let query = build_query(recipe_title, ingredients);
        debug!(%query, limit, "querying search provider");

        let body = SearchRequest {
            api_key: &self.api_key,
            query,
            max_results: limit,
        };

        let response = self
            .client
            .post(BASE_URL)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    SearchError::Timeout
                } else {
                    SearchError::Transport(err.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    SearchError::InvalidCredential(body_text)
                }
                _ => SearchError::Provider(format!("{status}: {body_text}")),
            });
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|err| SearchError::Provider(err.to_string()))?;

        Ok(tips_from_results(parsed.results, limit))
    }
}

/// One bounded query built from the recipe title and leading ingredients.
fn build_query(recipe_title: &str, ingredients: &[String]) -> String {
    let mut query = format!("{recipe_title} recipe cooking tips best practices");
    let leading: Vec<&str> = ingredients.iter().take(3).map(String::as_str).collect();
    if !leading.is_empty() {
        query.push_str(&format!(" with {}", leading.join(", ")));
    }
    query
}

/// Maps provider results to cooking tips, skipping entries whose URL does
/// not parse, and truncates to the cap.
fn tips_from_results(results: Vec<SearchResult>, limit: usize) -> Vec<CookingTip> {
    results
        .into_iter()
        .filter_map(|result| {
            let source_url = Url::parse(&result.url).ok()?;
            let tip_text = if result.content.trim().is_empty() {
                result.title
            } else {
                result.content
            };
            Some(CookingTip {
                tip_text,
                source_url,
            })
        })
        .take(limit)
        .collect()
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: String,
    max_results: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct SearchResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    content: String,
}
