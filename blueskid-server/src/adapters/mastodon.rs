//! Mastodon adapter
//!
//! Only instances whose host starts with `mastodon.` are recognized, since a
//! Mastodon status URL cannot otherwise be told apart from any other site's.
//! The author PID is qualified by the instance host: `<host>@<user>`.

use async_trait::async_trait;
use blueskid_core::{Adapter, AdapterError, Pid, Post};
use html_escape::decode_html_entities;
use reqwest::Client;
use url::Url;

use super::{extract_div, fetch_body};

const PLATFORM: &str = "mastodon";
const HOST_PREFIX: &str = "mastodon.";
const CONTENT_DIV: &str = "<div class='e-content'>";

pub struct MastodonAdapter {
    client: Client,
}

impl MastodonAdapter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn instance_host(url: &Url) -> Option<&str> {
    if url.scheme() != "https" {
        return None;
    }
    url.host_str()
        .filter(|host| host.len() > HOST_PREFIX.len() && host.starts_with(HOST_PREFIX))
}

/// Author PID of `https://mastodon.<x>/@<user>/<id>`
pub(crate) fn author_of(url: &Url) -> Result<Pid, AdapterError> {
    let invalid = || AdapterError::InvalidUrl(url.to_string());
    let host = instance_host(url).ok_or_else(invalid)?;

    let mut segments = url.path_segments().ok_or_else(invalid)?;
    let user = segments
        .next()
        .and_then(|seg| seg.strip_prefix('@'))
        .filter(|user| !user.is_empty())
        .ok_or_else(invalid)?;
    // A status ID must follow the account
    if segments.next().map_or(true, str::is_empty) {
        return Err(invalid());
    }

    Pid::from_parts(host, user).map_err(|_| invalid())
}

/// Status text from a Mastodon page
pub(crate) fn post_text(html: &str) -> Option<String> {
    extract_div(html, CONTENT_DIV).map(|content| decode_html_entities(content).into_owned())
}

#[async_trait]
impl Adapter for MastodonAdapter {
    fn platform(&self) -> &'static str {
        PLATFORM
    }

    fn handles(&self, url: &Url) -> bool {
        instance_host(url).is_some()
    }

    async fn fetch(&self, url: &Url) -> Result<Post, AdapterError> {
        let author = author_of(url)?;
        let html = fetch_body(PLATFORM, url.as_str(), self.client.get(url.clone())).await?;
        let body =
            post_text(&html).ok_or_else(|| AdapterError::NoAssertionFound(url.to_string()))?;
        Ok(Post { author, body })
    }
}
