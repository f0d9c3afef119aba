//! Platform adapters
//!
//! Each adapter knows how one platform's post URLs look, who wrote a post and
//! where the post text sits in what the platform serves.

mod mastodon;
mod tumblr;
mod twitter;

use blueskid_core::{AdapterError, AdapterRegistry};
use reqwest::{Client, RequestBuilder, StatusCode};

use crate::config::Config;

pub use mastodon::MastodonAdapter;
pub use tumblr::TumblrAdapter;
pub use twitter::TwitterAdapter;

const USER_AGENT: &str = concat!("blueskid-server/", env!("CARGO_PKG_VERSION"));

/// HTTP client shared by all adapters
pub fn http_client(config: &Config) -> anyhow::Result<Client> {
    let client = Client::builder()
        .timeout(config.http_timeout)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Registry with every supported platform
pub fn default_registry(config: &Config) -> anyhow::Result<AdapterRegistry> {
    let client = http_client(config)?;
    Ok(AdapterRegistry::new()
        .with(TwitterAdapter::new(
            client.clone(),
            &config.twitter_api_base,
            config.twitter_bearer_token.clone(),
        ))
        .with(TumblrAdapter::new(client.clone()))
        .with(MastodonAdapter::new(client)))
}

/// Send `request` and return the response text
///
/// Transport failures, 5xx and 429 are reported as unreachable. Any other
/// unsuccessful status means there is no post to read an assertion from.
pub(crate) async fn fetch_body(
    platform: &'static str,
    post_url: &str,
    request: RequestBuilder,
) -> Result<String, AdapterError> {
    let unreachable = |reason: String| AdapterError::Unreachable { platform, reason };

    let response = request.send().await.map_err(|e| unreachable(e.to_string()))?;
    let status = response.status();
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        return Err(unreachable(format!("HTTP error: {}", status)));
    }
    if !status.is_success() {
        tracing::debug!(platform, %status, post_url, "post not retrievable");
        return Err(AdapterError::NoAssertionFound(post_url.to_string()));
    }

    response.text().await.map_err(|e| unreachable(e.to_string()))
}

/// Contents of the first `open_tag` element, up to the next `</div>`
pub(crate) fn extract_div<'a>(html: &'a str, open_tag: &str) -> Option<&'a str> {
    let start = html.find(open_tag)? + open_tag.len();
    let rest = &html[start..];
    let end = rest.find("</div>")?;
    Some(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_div() {
        let html = r#"<p>x</p> <div class="copy"><p>hello</p></div><div class="copy">two</div>"#;
        assert_eq!(extract_div(html, r#"<div class="copy">"#), Some("<p>hello</p>"));
        assert_eq!(extract_div(html, "<div class='e-content'>"), None);
        assert_eq!(extract_div(r#"<div class="copy">unterminated"#, r#"<div class="copy">"#), None);
    }

    #[test]
    fn test_default_registry_platforms() {
        let registry = default_registry(&Config::default()).unwrap();
        assert_eq!(
            registry.platforms(),
            vec!["twitter.com", "tumblr.com", "mastodon"]
        );
    }
}
