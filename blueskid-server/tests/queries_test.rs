//! Ledger query endpoint tests

mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use blueskid_core::{Bid, Ledger, LedgerRecord, Pid};
use common::{
    claim, create_test_server, create_test_server_with_ledger, publish_claim, publish_grant,
    strings, StaticAdapter,
};
use serde_json::{json, Value};

/// p1 claims BB1 and grants it to p2 and p3; p2 claims BB2 and grants it to
/// p3; p3 claims BB3
async fn grant_chain() -> (TestServer, StaticAdapter) {
    let (server, platform) = create_test_server();
    claim(&server, &platform, "twitter.com@p1", "BB1").await;
    claim(&server, &platform, "reddit.com@p2", "BB2").await;
    claim(&server, &platform, "tumblr.com@p3", "BB3").await;

    for (bid, granter, accepter) in [
        ("BB1", "twitter.com@p1", "reddit.com@p2"),
        ("BB1", "twitter.com@p1", "tumblr.com@p3"),
        ("BB2", "reddit.com@p2", "tumblr.com@p3"),
    ] {
        let (grant_post, accept_post) =
            publish_grant(&server, &platform, bid, granter, accepter).await;
        server
            .post("/grant-bid")
            .json(&json!({ "GrantPost": grant_post, "AcceptPost": accept_post }))
            .await
            .assert_status_ok();
    }
    (server, platform)
}

#[tokio::test]
async fn test_pid_group() {
    let (server, _) = grant_chain().await;

    for pid in ["twitter.com@p1", "reddit.com@p2", "tumblr.com@p3"] {
        let body: Value = server
            .get("/get-pid-group")
            .add_query_param("pid", pid)
            .await
            .json();
        assert_eq!(
            strings(&body, "PIDGroup"),
            vec!["reddit.com@p2", "tumblr.com@p3", "twitter.com@p1"],
            "group of {}",
            pid
        );
    }
}

#[tokio::test]
async fn test_pid_group_of_stranger() {
    let (server, _) = grant_chain().await;

    let response = server
        .get("/get-pid-group")
        .add_query_param("pid", "nowhere.example@friendless")
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({ "PIDGroup": ["nowhere.example@friendless"] }));
}

#[tokio::test]
async fn test_queries_accept_any_pid_string() {
    let (server, _) = grant_chain().await;

    let response = server
        .get("/get-pid-group")
        .add_query_param("pid", "unrelated")
        .await;
    response.assert_status_ok();
    response.assert_json(&json!({ "PIDGroup": ["unrelated"] }));

    let response = server
        .get("/get-bids-for-pid")
        .add_query_param("pid", "unrelated")
        .await;
    response.assert_status_ok();
    response.assert_json(&json!({ "BIDs": [] }));
}

#[tokio::test]
async fn test_bids_for_pid() {
    let (server, _) = grant_chain().await;

    let body: Value = server
        .get("/get-bids-for-pid")
        .add_query_param("pid", "tumblr.com@p3")
        .await
        .json();
    assert_eq!(
        strings(&body, "BIDs"),
        vec!["0000000000000BB1", "0000000000000BB2", "0000000000000BB3"]
    );

    let body: Value = server
        .get("/get-bids-for-pid")
        .add_query_param("pid", "twitter.com@p1")
        .await
        .json();
    assert_eq!(strings(&body, "BIDs"), vec!["0000000000000BB1"]);
}

#[tokio::test]
async fn test_pids_for_bid_accepts_either_form() {
    let (server, _) = grant_chain().await;

    for bid in ["bb2", "0000000000000BB2"] {
        let body: Value = server
            .get("/get-pids-for-bid")
            .add_query_param("bid", bid)
            .await
            .json();
        assert_eq!(strings(&body, "PIDs"), vec!["reddit.com@p2", "tumblr.com@p3"]);
    }
}

#[tokio::test]
async fn test_unknown_keys_are_empty() {
    let (server, _) = create_test_server();

    let response = server
        .get("/get-pids-for-bid")
        .add_query_param("bid", "FFFF")
        .await;
    response.assert_status_ok();
    response.assert_json(&json!({ "PIDs": [] }));

    let response = server
        .get("/get-bids-for-pid")
        .add_query_param("pid", "twitter.com@nobody")
        .await;
    response.assert_status_ok();
    response.assert_json(&json!({ "BIDs": [] }));
}

#[tokio::test]
async fn test_missing_or_malformed_parameters() {
    let (server, _) = create_test_server();

    for (path, param, value) in [
        ("/get-pid-group", None, ""),
        ("/get-pid-group", Some("pid"), ""),
        ("/get-bids-for-pid", None, ""),
        ("/get-pids-for-bid", None, ""),
        ("/get-pids-for-bid", Some("bid"), "xyz"),
    ] {
        let mut request = server.get(path);
        if let Some(param) = param {
            request = request.add_query_param(param, value);
        }
        let response = request.await;
        assert_eq!(
            response.status_code(),
            StatusCode::BAD_REQUEST,
            "{} {:?}={}",
            path,
            param,
            value
        );
        assert_eq!(response.json::<Value>()["success"], false);
    }
}

#[tokio::test]
async fn test_malformed_bid_reason() {
    let (server, _) = create_test_server();

    let response = server
        .get("/get-pids-for-bid")
        .add_query_param("bid", "xyz")
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let reason = response.json::<Value>()["reason"].as_str().unwrap().to_string();
    assert!(reason.contains("invalid parameter 'bid'"), "{}", reason);
    assert!(!reason.contains("assertion"), "{}", reason);
}

#[tokio::test]
async fn test_preloaded_ledger() {
    let p1 = Pid::parse("twitter.com@p1").unwrap();
    let p2 = Pid::parse("reddit.com@p2").unwrap();
    let records = vec![
        LedgerRecord::claim(Bid::new(0xd1), p1.clone(), "https://example.social/posts/a"),
        LedgerRecord::grant(
            Bid::new(0xd1),
            p1.clone(),
            p2.clone(),
            "MCowBQYDK2VwAyEAX51DzwGncOsU87Y4xVoiFlNLLH8FTgSSIPG3ZutQbGc=",
            [
                "https://example.social/posts/b".to_string(),
                "https://example.social/posts/c".to_string(),
            ],
        ),
        LedgerRecord::unclaim(Bid::new(0xd1), p1, "https://example.social/posts/d"),
    ];
    let (server, platform) = create_test_server_with_ledger(Ledger::from_records(&records).unwrap());

    let owners: Value = server
        .get("/get-pids-for-bid")
        .add_query_param("bid", "D1")
        .await
        .json();
    assert_eq!(strings(&owners, "PIDs"), vec!["reddit.com@p2"]);

    let body: Value = server.get("/ledger").await.json();
    assert_eq!(body["Records"].as_array().unwrap().len(), 3);

    // The imported claim still burns the BID
    let post = publish_claim(&server, &platform, "twitter.com@p1", "D1").await;
    let response = server.post("/claim-bid").json(&json!({ "Post": post })).await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_ledger_dump() {
    let (server, _) = grant_chain().await;

    let body: Value = server.get("/ledger").await.json();
    let records = body["Records"].as_array().unwrap();

    assert_eq!(records.len(), 6);
    let grants: Vec<&Value> = records.iter().filter(|r| r["RecType"] == "Grant").collect();
    assert_eq!(grants.len(), 3);
    for grant in grants {
        assert_eq!(grant["PIDs"].as_array().unwrap().len(), 2);
        assert_eq!(grant["PostURLs"].as_array().unwrap().len(), 2);
        assert!(grant["Key"].is_string());
    }
}
