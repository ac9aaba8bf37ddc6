//! Integration tests for the vote ledger against mocked collaborators.

use std::sync::Arc;

use hotfeed::config::Config;
use hotfeed::error::FeedError;
use hotfeed::feed::{TargetKind, VoteDirection, VoteLedger};
use hotfeed::identity::IdentityClient;
use hotfeed::store::RecordStore;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn make_ledger(store: &MockServer, identity: &MockServer, moderators: &[&str]) -> VoteLedger {
    let mut config = Config::for_testing(&store.uri(), &identity.uri());
    config.moderators = moderators.iter().map(ToString::to_string).collect();
    let config = Arc::new(config);
    VoteLedger::new(
        RecordStore::new(&config),
        IdentityClient::new(&config),
        config,
    )
}

/// Mock a session resolving to the given user id.
async fn mock_session(identity: &MockServer, session_id: &str, user_id: &str) {
    Mock::given(method("POST"))
        .and(path("/readSession"))
        .and(body_partial_json(json!({ "sessionId": session_id })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session": { "id": session_id, "userId": user_id }
        })))
        .mount(identity)
        .await;
}

fn post_record() -> Value {
    json!({
        "id": "p1",
        "title": "a post",
        "sub": "rust",
        "content": "text",
        "upvotes": 2.0,
        "downvotes": 1.0,
        "score": 1.0,
        "created": "2024-01-01T00:00:00Z"
    })
}

#[tokio::test]
async fn first_vote_creates_receipt_then_increments() {
    let store = MockServer::start().await;
    let identity = MockServer::start().await;
    mock_session(&identity, "sess-1", "u1").await;

    Mock::given(method("POST"))
        .and(path("/read"))
        .and(body_partial_json(json!({ "table": "posts", "id": "p1" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "records": [post_record()] })),
        )
        .mount(&store)
        .await;

    // No receipt yet
    Mock::given(method("POST"))
        .and(path("/read"))
        .and(body_partial_json(json!({ "table": "post_votes", "id": "p1u1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "records": [] })))
        .mount(&store)
        .await;

    Mock::given(method("POST"))
        .and(path("/create"))
        .and(body_partial_json(
            json!({ "table": "post_votes", "record": { "id": "p1u1" } }),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "p1u1" })))
        .expect(1)
        .mount(&store)
        .await;

    Mock::given(method("POST"))
        .and(path("/update"))
        .and(body_partial_json(json!({
            "table": "posts",
            "id": "p1",
            "record": { "upvotes": 3.0, "downvotes": 1.0, "score": 2.0 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&store)
        .await;

    let ledger = make_ledger(&store, &identity, &[]);
    ledger
        .cast_vote("p1", TargetKind::Post, "sess-1", VoteDirection::Up)
        .await
        .expect("vote should succeed");
}

#[tokio::test]
async fn second_vote_fails_already_voted_without_writes() {
    let store = MockServer::start().await;
    let identity = MockServer::start().await;
    mock_session(&identity, "sess-1", "u1").await;

    Mock::given(method("POST"))
        .and(path("/read"))
        .and(body_partial_json(json!({ "table": "posts", "id": "p1" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "records": [post_record()] })),
        )
        .mount(&store)
        .await;

    // Receipt already exists for (p1, u1)
    Mock::given(method("POST"))
        .and(path("/read"))
        .and(body_partial_json(json!({ "table": "post_votes", "id": "p1u1" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "records": [{ "id": "p1u1" }] })),
        )
        .mount(&store)
        .await;

    // State must not change: no receipt creation, no counter update
    Mock::given(method("POST"))
        .and(path("/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&store)
        .await;
    Mock::given(method("POST"))
        .and(path("/update"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&store)
        .await;

    let ledger = make_ledger(&store, &identity, &[]);
    let err = ledger
        .cast_vote("p1", TargetKind::Post, "sess-1", VoteDirection::Down)
        .await
        .expect_err("second vote must fail");
    assert!(matches!(err, FeedError::AlreadyVoted));
}

#[tokio::test]
async fn moderator_revotes_with_weighted_magnitude_and_no_receipt() {
    let store = MockServer::start().await;
    let identity = MockServer::start().await;
    mock_session(&identity, "sess-m", "mod-1").await;

    Mock::given(method("POST"))
        .and(path("/read"))
        .and(body_partial_json(json!({ "table": "posts", "id": "p1" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "records": [post_record()] })),
        )
        .mount(&store)
        .await;

    // A receipt exists, but moderators are exempt from it
    Mock::given(method("POST"))
        .and(path("/read"))
        .and(body_partial_json(json!({ "table": "post_votes", "id": "p1mod-1" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "records": [{ "id": "p1mod-1" }] })),
        )
        .mount(&store)
        .await;

    // No receipt is ever written for a moderator vote
    Mock::given(method("POST"))
        .and(path("/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&store)
        .await;

    Mock::given(method("POST"))
        .and(path("/update"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&store)
        .await;

    let ledger = make_ledger(&store, &identity, &["mod-1"]);
    for _ in 0..2 {
        ledger
            .cast_vote("p1", TargetKind::Post, "sess-m", VoteDirection::Up)
            .await
            .expect("moderator vote should always succeed");
    }

    // Each vote is a fresh draw in 4..=16 applied on top of upvotes=2,
    // and the stored score stays upvotes - downvotes.
    let requests = store
        .received_requests()
        .await
        .expect("request recording enabled");
    let updates: Vec<Value> = requests
        .iter()
        .filter(|r| r.url.path() == "/update")
        .map(|r| r.body_json::<Value>().expect("json body"))
        .collect();
    assert_eq!(updates.len(), 2);
    for update in updates {
        let record = &update["record"];
        let upvotes = record["upvotes"].as_f64().expect("upvotes");
        let downvotes = record["downvotes"].as_f64().expect("downvotes");
        let score = record["score"].as_f64().expect("score");
        let magnitude = upvotes - 2.0;
        assert!(
            (4.0..=16.0).contains(&magnitude),
            "magnitude {magnitude} out of range"
        );
        assert!((score - (upvotes - downvotes)).abs() < 1e-9);
    }
}

#[tokio::test]
async fn comment_votes_use_comment_collections() {
    let store = MockServer::start().await;
    let identity = MockServer::start().await;
    mock_session(&identity, "sess-1", "u1").await;

    Mock::given(method("POST"))
        .and(path("/read"))
        .and(body_partial_json(json!({ "table": "comments", "id": "c1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{ "id": "c1", "postId": "p1", "content": "hi" }]
        })))
        .mount(&store)
        .await;

    Mock::given(method("POST"))
        .and(path("/read"))
        .and(body_partial_json(json!({ "table": "comment_votes", "id": "c1u1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "records": [] })))
        .mount(&store)
        .await;

    Mock::given(method("POST"))
        .and(path("/create"))
        .and(body_partial_json(json!({ "table": "comment_votes" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "c1u1" })))
        .expect(1)
        .mount(&store)
        .await;

    // Counters absent on the record default to zero before incrementing
    Mock::given(method("POST"))
        .and(path("/update"))
        .and(body_partial_json(json!({
            "table": "comments",
            "id": "c1",
            "record": { "upvotes": 0.0, "downvotes": 1.0, "score": -1.0 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&store)
        .await;

    let ledger = make_ledger(&store, &identity, &[]);
    ledger
        .cast_vote("c1", TargetKind::Comment, "sess-1", VoteDirection::Down)
        .await
        .expect("vote should succeed");
}

#[tokio::test]
async fn empty_target_id_is_rejected_before_any_call() {
    let store = MockServer::start().await;
    let identity = MockServer::start().await;

    let ledger = make_ledger(&store, &identity, &[]);
    let err = ledger
        .cast_vote("", TargetKind::Post, "sess-1", VoteDirection::Up)
        .await
        .expect_err("empty id must fail");
    assert!(matches!(err, FeedError::MissingTarget));

    let requests = store.received_requests().await.expect("recording");
    assert!(requests.is_empty());
}

#[tokio::test]
async fn unknown_target_fails_not_found() {
    let store = MockServer::start().await;
    let identity = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/read"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "records": [] })))
        .mount(&store)
        .await;

    let ledger = make_ledger(&store, &identity, &[]);
    let err = ledger
        .cast_vote("nope", TargetKind::Post, "sess-1", VoteDirection::Up)
        .await
        .expect_err("missing target must fail");
    assert!(matches!(err, FeedError::TargetNotFound(_)));
}

#[tokio::test]
async fn unresolved_session_fails_unauthenticated() {
    let store = MockServer::start().await;
    let identity = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/read"))
        .and(body_partial_json(json!({ "table": "posts" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "records": [post_record()] })),
        )
        .mount(&store)
        .await;

    // Session resolves but carries no user id
    Mock::given(method("POST"))
        .and(path("/readSession"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session": { "id": "sess-1", "userId": "" }
        })))
        .mount(&identity)
        .await;

    let ledger = make_ledger(&store, &identity, &[]);
    let err = ledger
        .cast_vote("p1", TargetKind::Post, "sess-1", VoteDirection::Up)
        .await
        .expect_err("anonymous vote must fail");
    assert!(matches!(err, FeedError::Unauthenticated));
}

#[tokio::test]
async fn store_failure_propagates() {
    let store = MockServer::start().await;
    let identity = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/read"))
        .respond_with(ResponseTemplate::new(500).set_body_string("store down"))
        .mount(&store)
        .await;

    let ledger = make_ledger(&store, &identity, &[]);
    let err = ledger
        .cast_vote("p1", TargetKind::Post, "sess-1", VoteDirection::Up)
        .await
        .expect_err("store failure must propagate");
    assert!(matches!(err, FeedError::Store(_)));
}
