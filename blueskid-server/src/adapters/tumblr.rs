//! Tumblr adapter
//!
//! Post URLs look like `https://<blog>.tumblr.com/post/<id>/<slug>`; the blog
//! name is the author. The post text sits in the first `copy` div of the page.

use async_trait::async_trait;
use blueskid_core::{Adapter, AdapterError, Pid, Post};
use html_escape::decode_html_entities;
use reqwest::Client;
use url::Url;

use super::{extract_div, fetch_body};

const PLATFORM: &str = "tumblr.com";
const HOST_SUFFIX: &str = ".tumblr.com";
const COPY_DIV: &str = r#"<div class="copy">"#;

pub struct TumblrAdapter {
    client: Client,
}

impl TumblrAdapter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Blog name of a post URL
fn blog_name(url: &Url) -> Option<&str> {
    if url.scheme() != "https" {
        return None;
    }
    let blog = url.host_str()?.strip_suffix(HOST_SUFFIX)?;
    if blog.is_empty() || blog.contains('.') {
        return None;
    }
    Some(blog)
}

/// Author PID of a post URL
pub(crate) fn author_of(url: &Url) -> Result<Pid, AdapterError> {
    blog_name(url)
        .and_then(|blog| Pid::from_parts(PLATFORM, blog).ok())
        .ok_or_else(|| AdapterError::InvalidUrl(url.to_string()))
}

/// Post text from a Tumblr page
pub(crate) fn post_text(html: &str) -> Option<String> {
    extract_div(html, COPY_DIV).map(|copy| decode_html_entities(copy).into_owned())
}

#[async_trait]
impl Adapter for TumblrAdapter {
    fn platform(&self) -> &'static str {
        PLATFORM
    }

    fn handles(&self, url: &Url) -> bool {
        blog_name(url).is_some()
    }

    async fn fetch(&self, url: &Url) -> Result<Post, AdapterError> {
        let author = author_of(url)?;
        let html = fetch_body(PLATFORM, url.as_str(), self.client.get(url.clone())).await?;
        let body =
            post_text(&html).ok_or_else(|| AdapterError::NoAssertionFound(url.to_string()))?;
        Ok(Post { author, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    const PAGE: &str = r#"<html><body><article>
        <div class="post-content">
          <div class="copy"><p>Accepting &amp; confirming:
&#129345;A&#127928;55555&#127928;2021-09-15T05:25:47Z.A&#127928;MCowBQYDK2VwAyEAX51DzwGncOsU87Y4xVoiFlNLLH8FTgSSIPG3ZutQbGc=&#127928;W+kWrsb6WS1y2DPwYbQUtRSDm/b78WE98H6wifrgwSuYjgiWl7kOkVn4xbXcAbdYzGVd51zz+zao2FFk68E+AQ==&#127928;twitter.com@timbray&#129345;</p></div>
          <div class="copy">footer</div>
        </div>
    </article></body></html>"#;

    #[test]
    fn test_author_of() {
        let pid = author_of(&url(
            "https://t-runic.tumblr.com/post/662425486899691520/blueskid-assertion",
        ))
        .unwrap();
        assert_eq!(pid.as_str(), "tumblr.com@t-runic");

        for bad in [
            "http://tumblr.com/",
            "https://tumblr.com",
            "http://t-runic.tumblr.com/post/1",
            "https://t-runic.tumblr.co/post/1",
            "https://a.b.tumblr.com/post/1",
        ] {
            assert!(author_of(&url(bad)).is_err(), "accepted {}", bad);
        }
    }

    #[test]
    fn test_post_text() {
        let text = post_text(PAGE).unwrap();
        assert!(text.starts_with("<p>Accepting & confirming:"));
        assert!(text.contains("🥁A🎸55555🎸2021-09-15T05:25:47Z.A🎸"));
        assert!(!text.contains("footer"));

        let fields = blueskid_core::assertion::locate(&text, 6).unwrap();
        assert_eq!(fields[5], "twitter.com@timbray");
    }

    #[test]
    fn test_post_text_decodes_named_entities() {
        let page = r#"<div class="copy"><p>It&rsquo;s mine&hellip; &ldquo;&#129345;C&#127928;B1&#129345;&rdquo;</p></div>"#;
        assert_eq!(
            post_text(page).unwrap(),
            "<p>It\u{2019}s mine\u{2026} \u{201c}🥁C🎸B1🥁\u{201d}</p>"
        );
    }

    #[test]
    fn test_page_without_copy_div() {
        assert_eq!(post_text("<html><div class='other'>x</div></html>"), None);
    }
}
