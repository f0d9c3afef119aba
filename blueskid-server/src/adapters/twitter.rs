//! Twitter adapter
//!
//! Tweets are read through the v2 API, which needs a bearer token. The author
//! reported by the API must match the username in the tweet URL.

use async_trait::async_trait;
use blueskid_core::{Adapter, AdapterError, Pid, Post};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::fetch_body;

const PLATFORM: &str = "twitter.com";
const HOSTS: &[&str] = &["twitter.com", "www.twitter.com", "mobile.twitter.com", "x.com"];

#[derive(Debug, Deserialize)]
pub(crate) struct Tweet {
    data: Option<TweetData>,
    #[serde(default)]
    includes: TweetIncludes,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    text: String,
}

#[derive(Debug, Default, Deserialize)]
struct TweetIncludes {
    #[serde(default)]
    users: Vec<TweetUser>,
}

#[derive(Debug, Deserialize)]
struct TweetUser {
    username: String,
}

pub struct TwitterAdapter {
    client: Client,
    api_base: String,
    bearer_token: Option<String>,
}

impl TwitterAdapter {
    pub fn new(client: Client, api_base: &str, bearer_token: Option<String>) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            bearer_token,
        }
    }
}

/// Username and tweet ID from `https://twitter.com/<user>/status/<digits>`
pub(crate) fn parse_tweet_url(url: &Url) -> Result<(String, String), AdapterError> {
    let invalid = || AdapterError::InvalidUrl(url.to_string());

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();
    if segments.len() < 2 {
        return Err(invalid());
    }

    let username = segments[0];
    let id = segments[segments.len() - 1];
    if !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    Ok((username.to_string(), id.to_string()))
}

/// Author and text of an API response for a tweet posted by `url_username`
pub(crate) fn post_from_tweet(
    tweet: Tweet,
    url_username: &str,
    post_url: &str,
) -> Result<Post, AdapterError> {
    let data = tweet
        .data
        .ok_or_else(|| AdapterError::NoAssertionFound(post_url.to_string()))?;
    let api_username = tweet
        .includes
        .users
        .first()
        .map(|u| u.username.as_str())
        .unwrap_or_default();
    if api_username != url_username {
        return Err(AdapterError::AuthorMismatch {
            expected: url_username.to_string(),
            actual: api_username.to_string(),
        });
    }

    let author = Pid::from_parts(PLATFORM, url_username)
        .map_err(|_| AdapterError::InvalidUrl(post_url.to_string()))?;
    Ok(Post {
        author,
        body: data.text,
    })
}

#[async_trait]
impl Adapter for TwitterAdapter {
    fn platform(&self) -> &'static str {
        PLATFORM
    }

    fn handles(&self, url: &Url) -> bool {
        url.scheme() == "https" && url.host_str().is_some_and(|h| HOSTS.contains(&h))
    }

    async fn fetch(&self, url: &Url) -> Result<Post, AdapterError> {
        let (username, id) = parse_tweet_url(url)?;
        let token = self
            .bearer_token
            .as_deref()
            .ok_or_else(|| AdapterError::Unavailable {
                platform: PLATFORM,
                reason: "TWITTER_BEARER_TOKEN not set".to_string(),
            })?;

        let query = format!(
            "{}/2/tweets/{}?expansions=author_id&tweet.fields=author_id",
            self.api_base, id
        );
        let request = self.client.get(query).bearer_auth(token);
        let body = fetch_body(PLATFORM, url.as_str(), request).await?;

        let tweet: Tweet = serde_json::from_str(&body).map_err(|e| AdapterError::Unreachable {
            platform: PLATFORM,
            reason: format!("error parsing twitter JSON: {}", e),
        })?;
        post_from_tweet(tweet, &username, url.as_str())
    }
}
