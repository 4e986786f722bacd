//! Hashtag search against the Twitter/X v2 recent-search API.
//!
//! [`HashtagClient::search`] reports failures as a typed [`SearchError`].
//! [`HashtagClient::search_or_fallback`] turns a failure into a
//! [`SearchOutcome::Fallback`] carrying fixed demo tweets and the reason, so
//! callers can degrade without losing track of the outage.

mod fallback;

pub use fallback::fallback_tweets;

use std::collections::HashMap;
use std::fmt;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

/// A hashtag with any leading `#` and surrounding whitespace removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hashtag(String);

impl Hashtag {
    /// Clean a raw tag. Returns `None` if nothing is left.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let tag = trimmed.strip_prefix('#').unwrap_or(trimmed).trim();
        if tag.is_empty() {
            None
        } else {
            Some(Self(tag.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recent-search query for original English posts carrying this tag.
    #[must_use]
    pub fn search_query(&self) -> String {
        format!("#{} lang:en -is:retweet", self.0)
    }
}

impl fmt::Display for Hashtag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A search result in the shape the client renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tweet {
    pub id: String,
    pub text: String,
    pub author_name: String,
    /// Author handle, prefixed with `@`.
    pub author_id: String,
    pub likes: u64,
    pub retweets: u64,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("hashtag search is not configured: TWITTER_BEARER_TOKEN is unset")]
    NotConfigured,
    #[error("search request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("search API rejected credentials ({0})")]
    Unauthorized(StatusCode),
    #[error("search API rate limit reached")]
    RateLimited,
    #[error("search API returned {status}: {body}")]
    Upstream { status: StatusCode, body: String },
    #[error("failed to decode search response: {0}")]
    Decode(#[source] reqwest::Error),
}

impl SearchError {
    /// Short machine-readable label for logs and response headers.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotConfigured => "not_configured",
            Self::Transport(_) => "transport",
            Self::Unauthorized(_) => "unauthorized",
            Self::RateLimited => "rate_limited",
            Self::Upstream { .. } => "upstream",
            Self::Decode(_) => "decode",
        }
    }
}

/// Result of a search after the fallback policy has been applied.
#[derive(Debug)]
pub enum SearchOutcome {
    Live(Vec<Tweet>),
    Fallback {
        tweets: Vec<Tweet>,
        reason: SearchError,
    },
}

impl SearchOutcome {
    #[must_use]
    pub fn tweets(&self) -> &[Tweet] {
        match self {
            Self::Live(tweets) | Self::Fallback { tweets, .. } => tweets,
        }
    }

    #[must_use]
    pub fn into_tweets(self) -> Vec<Tweet> {
        match self {
            Self::Live(tweets) | Self::Fallback { tweets, .. } => tweets,
        }
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    /// `"live"` or `"fallback"`.
    #[must_use]
    pub fn source(&self) -> &'static str {
        if self.is_fallback() {
            "fallback"
        } else {
            "live"
        }
    }
}

// ---- Remote API shapes ----

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    data: Vec<RemoteTweet>,
    #[serde(default)]
    includes: Option<Includes>,
}

#[derive(Debug, Deserialize)]
struct RemoteTweet {
    id: String,
    text: String,
    #[serde(default)]
    author_id: Option<String>,
    #[serde(default)]
    public_metrics: Option<PublicMetrics>,
}

#[derive(Debug, Default, Deserialize)]
struct PublicMetrics {
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    retweet_count: u64,
}

#[derive(Debug, Default, Deserialize)]
struct Includes {
    #[serde(default)]
    users: Vec<RemoteUser>,
}

#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    username: Option<String>,
}

/// Map a recent-search response into client tweets, resolving authors via `includes.users`.
pub(crate) fn map_response(response: SearchResponse) -> Vec<Tweet> {
    let users: HashMap<String, RemoteUser> = response
        .includes
        .map(|i| i.users)
        .unwrap_or_default()
        .into_iter()
        .map(|u| (u.id.clone(), u))
        .collect();

    response
        .data
        .into_iter()
        .map(|tweet| {
            let author = tweet.author_id.as_ref().and_then(|id| users.get(id));
            let author_name = author
                .and_then(|u| u.name.clone())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "Twitter User".to_string());
            let handle = author
                .and_then(|u| u.username.as_deref())
                .filter(|n| !n.is_empty())
                .unwrap_or("user");
            let metrics = tweet.public_metrics.unwrap_or_default();

            Tweet {
                id: tweet.id,
                text: tweet.text,
                author_name,
                author_id: format!("@{handle}"),
                likes: metrics.like_count,
                retweets: metrics.retweet_count,
            }
        })
        .collect()
}

/// Client for the recent-search endpoint.
#[derive(Clone)]
pub struct HashtagClient {
    http: reqwest::Client,
    api_url: String,
    bearer_token: Option<String>,
    max_results: u32,
}

impl HashtagClient {
    /// Create a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .context("Failed to create hashtag search HTTP client")?;

        Ok(Self {
            http,
            api_url: config.twitter_api_url.clone(),
            bearer_token: config.twitter_bearer_token.clone(),
            max_results: config.twitter_max_results,
        })
    }

    /// Check if a bearer token is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.bearer_token.is_some()
    }

    /// Fetch the first page of recent tweets for a tag.
    ///
    /// # Errors
    ///
    /// Returns a [`SearchError`] describing why the remote search failed.
    pub async fn search(&self, tag: &Hashtag) -> Result<Vec<Tweet>, SearchError> {
        let token = self
            .bearer_token
            .as_deref()
            .ok_or(SearchError::NotConfigured)?;

        debug!(tag = %tag, url = %self.api_url, "Searching hashtag");

        let query = tag.search_query();
        let max_results = self.max_results.to_string();
        let response = self
            .http
            .get(&self.api_url)
            .bearer_auth(token)
            .query(&[
                ("query", query.as_str()),
                ("max_results", max_results.as_str()),
                ("tweet.fields", "created_at,author_id,public_metrics"),
                ("expansions", "author_id"),
                ("user.fields", "name,username,profile_image_url"),
            ])
            .send()
            .await
            .map_err(SearchError::Transport)?;

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(SearchError::Unauthorized(status));
            }
            StatusCode::TOO_MANY_REQUESTS => return Err(SearchError::RateLimited),
            s if !s.is_success() => {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unknown".to_string());
                return Err(SearchError::Upstream { status, body });
            }
            _ => {}
        }

        let body: SearchResponse = response.json().await.map_err(SearchError::Decode)?;
        let tweets = map_response(body);
        debug!(tag = %tag, count = tweets.len(), "Hashtag search complete");
        Ok(tweets)
    }

    /// Search, substituting the demo tweets on any failure.
    pub async fn search_or_fallback(&self, tag: &Hashtag) -> SearchOutcome {
        match self.search(tag).await {
            Ok(tweets) => SearchOutcome::Live(tweets),
            Err(reason) => {
                warn!(tag = %tag, kind = reason.kind(), error = %reason, "Hashtag search failed, using fallback tweets");
                SearchOutcome::Fallback {
                    tweets: fallback_tweets(tag),
                    reason,
                }
            }
        }
    }
}
