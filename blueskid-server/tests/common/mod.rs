//! Common test utilities for server integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use axum_test::TestServer;
use blueskid_core::{Adapter, AdapterError, AdapterRegistry, Ledger, Pid, Post};
use blueskid_server::{routes, AppState};
use serde_json::{json, Value};
use url::Url;

pub const HOST: &str = "example.social";

/// In-memory platform whose posts are published by the test itself
#[derive(Default, Clone)]
pub struct StaticAdapter {
    /// Published posts and injected failures, by URL
    pub posts: Arc<RwLock<HashMap<String, Result<Post, AdapterError>>>>,
    next_id: Arc<AtomicUsize>,
}

impl StaticAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_url(&self) -> String {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        format!("https://{}/posts/{}", HOST, id)
    }

    /// Publish `body` as written by `author` and return the post URL
    pub fn publish(&self, author: &str, body: &str) -> String {
        let url = self.next_url();
        let post = Post {
            author: Pid::parse(author).unwrap(),
            body: body.to_string(),
        };
        self.posts.write().unwrap().insert(url.clone(), Ok(post));
        url
    }

    /// A post URL whose fetch fails with `err`
    pub fn failing(&self, err: AdapterError) -> String {
        let url = self.next_url();
        self.posts.write().unwrap().insert(url.clone(), Err(err));
        url
    }
}

#[async_trait]
impl Adapter for StaticAdapter {
    fn platform(&self) -> &'static str {
        HOST
    }

    fn handles(&self, url: &Url) -> bool {
        url.host_str() == Some(HOST)
    }

    async fn fetch(&self, url: &Url) -> Result<Post, AdapterError> {
        self.posts
            .read()
            .unwrap()
            .get(url.as_str())
            .cloned()
            .unwrap_or_else(|| Err(AdapterError::NoAssertionFound(url.to_string())))
    }
}

/// Create a test server backed by a static adapter
pub fn create_test_server() -> (TestServer, StaticAdapter) {
    create_test_server_with_ledger(Ledger::new())
}

/// Create a test server that starts from an existing ledger
pub fn create_test_server_with_ledger(ledger: Ledger) -> (TestServer, StaticAdapter) {
    let adapter = StaticAdapter::new();
    let registry = AdapterRegistry::new().with(adapter.clone());
    let state = Arc::new(AppState::with_ledger(ledger, registry));

    let app = routes::create_router(state);
    let server = TestServer::new(app).expect("Failed to create test server");

    (server, adapter)
}

/// Ask the server for a claim assertion and publish it
pub async fn publish_claim(
    server: &TestServer,
    platform: &StaticAdapter,
    author: &str,
    bid: &str,
) -> String {
    let response = server
        .post("/claim-assertion")
        .json(&json!({ "BID": bid }))
        .await;
    response.assert_status_ok();
    let assertion = response.json::<Value>()["Assertion"]
        .as_str()
        .unwrap()
        .to_string();
    platform.publish(author, &format!("Claiming my BID {}", assertion))
}

/// Claim `bid` for `author` through the HTTP API
pub async fn claim(server: &TestServer, platform: &StaticAdapter, author: &str, bid: &str) {
    let post = publish_claim(server, platform, author, bid).await;
    server
        .post("/claim-bid")
        .json(&json!({ "Post": post }))
        .await
        .assert_status_ok();
}

/// Generated grant and accept assertion texts
pub async fn grant_assertions(
    server: &TestServer,
    bid: &str,
    granter: &str,
    accepter: &str,
) -> (String, String) {
    let response = server
        .post("/grant-assertions")
        .json(&json!({ "BID": bid, "Granter": granter, "Accepter": accepter }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    (
        body["GrantAssertion"].as_str().unwrap().to_string(),
        body["AcceptAssertion"].as_str().unwrap().to_string(),
    )
}

/// Publish both halves of a grant and return their post URLs
pub async fn publish_grant(
    server: &TestServer,
    platform: &StaticAdapter,
    bid: &str,
    granter: &str,
    accepter: &str,
) -> (String, String) {
    let (grant, accept) = grant_assertions(server, bid, granter, accepter).await;
    (
        platform.publish(granter, &grant),
        platform.publish(accepter, &format!("accepted! {}", accept)),
    )
}

/// Sorted string array from a JSON response field
pub fn strings(body: &Value, field: &str) -> Vec<String> {
    let mut values: Vec<String> = body[field]
        .as_array()
        .unwrap_or_else(|| panic!("{} is not an array: {}", field, body))
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    values.sort();
    values
}
