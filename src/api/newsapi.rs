use super::NewsSource;
use crate::models::Article;
use crate::{BotError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

pub const NEWSAPI_BASE: &str = "https://newsapi.org/v2";
const RATE_LIMIT_RPM: u32 = 30;
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 1000;

type NewsRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EverythingResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    source: Option<RawSource>,
    #[serde(default)]
    published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    #[serde(default)]
    name: Option<String>,
}

/// Client for the NewsAPI `/everything` endpoint
#[derive(Clone)]
pub struct NewsApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    page_size: u32,
    initial_backoff: Duration,
    rate_limiter: Arc<NewsRateLimiter>,
}

impl NewsApiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        page_size: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let quota = Quota::per_minute(NonZeroU32::new(RATE_LIMIT_RPM).unwrap_or(NonZeroU32::MIN));

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            page_size: page_size.clamp(1, 100),
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    pub fn with_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    /// Rate-limited GET with retry on 429, 5xx and network errors
    async fn request(&self, query: &str) -> Result<reqwest::Response> {
        let url = format!("{}/everything", self.base_url);
        let page_size = self.page_size.to_string();
        let mut last_error = None;

        for attempt in 1..=MAX_RETRIES {
            self.rate_limiter.until_ready().await;

            let sent = self
                .client
                .get(&url)
                .query(&[
                    ("q", query),
                    ("sortBy", "publishedAt"),
                    ("language", "en"),
                    ("pageSize", page_size.as_str()),
                ])
                .header("X-Api-Key", &self.api_key)
                .send()
                .await;

            match sent {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    if status.as_u16() != 429 && !status.is_server_error() {
                        let detail = response.text().await.unwrap_or_default();
                        return Err(BotError::News(format!(
                            "request rejected ({}): {}",
                            status, detail
                        )));
                    }
                    last_error = Some(BotError::News(format!("status {}", status)));
                }
                Err(e) => last_error = Some(BotError::Http(e)),
            }

            if attempt < MAX_RETRIES {
                let backoff = self.initial_backoff * 2_u32.pow(attempt - 1);
                tracing::warn!(
                    "News request attempt {}/{} failed, retrying in {}ms",
                    attempt,
                    MAX_RETRIES,
                    backoff.as_millis()
                );
                tokio::time::sleep(backoff).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| BotError::News(format!("failed after {} retries", MAX_RETRIES))))
    }
}

#[async_trait]
impl NewsSource for NewsApiClient {
    async fn fetch(&self, query: &str) -> Result<Vec<Article>> {
        let response: EverythingResponse = self.request(query).await?.json().await?;

        if response.status != "ok" {
            return Err(BotError::News(
                response
                    .message
                    .unwrap_or_else(|| format!("status '{}'", response.status)),
            ));
        }

        let articles: Vec<Article> = response
            .articles
            .into_iter()
            .filter_map(|raw| {
                let title = raw.title.filter(|t| !t.trim().is_empty())?;
                Some(Article {
                    title,
                    description: raw.description,
                    source: raw.source.and_then(|s| s.name),
                    published_at: raw.published_at,
                })
            })
            .collect();

        tracing::info!(query, count = articles.len(), "Fetched news articles");
        Ok(articles)
    }

    fn name(&self) -> &str {
        "NewsAPI"
    }
}
