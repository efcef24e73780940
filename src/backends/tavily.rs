// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Web search through the Tavily search API.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::consts::TAVILY_API_KEY_VAR;
use crate::config::SearchConfig;
use crate::engine::RunContext;
use crate::errors::ServiceError;
use crate::observability::messages::service::{SearchCompleted, ServiceCallFailed};
use crate::observability::messages::StructuredLog;
use crate::traits::WebSearcher;

const SERVICE: &str = "tavily";

pub const NO_RESULTS: &str = "No relevant search results found.";

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'static str,
    max_results: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
}

/// Render results as one text block for a prompt.
pub fn format_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return NO_RESULTS.to_string();
    }

    let mut text = String::from("Web search results:\n\n");
    for (i, result) in results.iter().enumerate() {
        text.push_str(&format!(
            "Source {}: {} ({})\nContent: {}\n\n",
            i + 1,
            result.title,
            result.url,
            result.content
        ));
    }
    text
}

pub struct TavilySearch {
    http: reqwest::Client,
    api_key: String,
    config: SearchConfig,
}

impl TavilySearch {
    pub fn new(api_key: impl Into<String>, config: SearchConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            config,
        }
    }

    pub fn from_env(config: SearchConfig) -> Result<Self, ServiceError> {
        match std::env::var(TAVILY_API_KEY_VAR) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key, config)),
            _ => Err(ServiceError::MissingCredential {
                var: TAVILY_API_KEY_VAR,
            }),
        }
    }

    /// The configured search timeout, shortened to the run's remaining time.
    fn request_timeout(&self, ctx: &RunContext) -> Duration {
        ctx.bound_timeout(self.config.timeout())
    }

    async fn send(&self, query: &str, timeout: Duration) -> Result<SearchResponse, ServiceError> {
        let request = SearchRequest {
            api_key: &self.api_key,
            query,
            search_depth: self.config.depth.as_str(),
            max_results: self.config.max_results,
        };

        let response = self
            .http
            .post(&self.config.api_url)
            .timeout(timeout)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl WebSearcher for TavilySearch {
    async fn search(&self, ctx: &RunContext, query: &str) -> Result<String, ServiceError> {
        let started = Instant::now();
        match self.send(query, self.request_timeout(ctx)).await {
            Ok(response) => {
                SearchCompleted {
                    query,
                    result_count: response.results.len(),
                    duration: started.elapsed(),
                }
                .log();
                Ok(format_results(&response.results))
            }
            Err(error) => {
                ServiceCallFailed {
                    service: SERVICE,
                    error: &error,
                }
                .log();
                Err(error)
            }
        }
    }
}
