// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Contract tests for the SQLite request store: create-fails-if-exists,
//! field round-tripping, single-write updates.

use serde_json::json;
use tempoftp_core::domain::repository::{RepositoryError, RequestRepository};
use tempoftp_core::domain::request::{RequestState, TransferRequest};
use tempoftp_core::infrastructure::repositories::SqliteRequestRepository;

fn sample(id: &str) -> TransferRequest {
    let mut request = TransferRequest::new(id, "alice@example.com", "10.0.0.1:/data/src", 5);
    request.info = json!({
        "account": "ftp_alice_example",
        "secret_enc": "opaque-token",
        "message": "request received",
    });
    request
}

#[tokio::test]
async fn create_and_get_round_trip() {
    let repo = SqliteRequestRepository::connect(":memory:").await.unwrap();
    repo.create(&sample("rt-1")).await.unwrap();

    let loaded = repo.get("rt-1").await.unwrap().unwrap();
    assert_eq!(loaded.id, "rt-1");
    assert_eq!(loaded.owner_contact, "alice@example.com");
    assert_eq!(loaded.source_path, "10.0.0.1:/data/src");
    assert_eq!(loaded.validity_days, 5);
    assert_eq!(loaded.state, RequestState::Received);
    assert_eq!(loaded.info["account"], "ftp_alice_example");
}

#[tokio::test]
async fn second_create_with_same_id_fails_without_mutation() {
    let repo = SqliteRequestRepository::connect(":memory:").await.unwrap();
    repo.create(&sample("dup-1")).await.unwrap();

    let mut second = sample("dup-1");
    second.owner_contact = "mallory@evil.example".to_string();
    let err = repo.create(&second).await.unwrap_err();
    assert!(matches!(err, RepositoryError::AlreadyExists(id) if id == "dup-1"));

    let loaded = repo.get("dup-1").await.unwrap().unwrap();
    assert_eq!(loaded.owner_contact, "alice@example.com");
}

#[tokio::test]
async fn update_replaces_state_and_info() {
    let repo = SqliteRequestRepository::connect(":memory:").await.unwrap();
    repo.create(&sample("up-1")).await.unwrap();

    let info = json!({ "message": "verifying available space" });
    repo.update("up-1", RequestState::Preparing, &info)
        .await
        .unwrap();

    let loaded = repo.get("up-1").await.unwrap().unwrap();
    assert_eq!(loaded.state, RequestState::Preparing);
    assert_eq!(loaded.info["message"], "verifying available space");
}

#[tokio::test]
async fn update_of_unknown_id_is_not_found() {
    let repo = SqliteRequestRepository::connect(":memory:").await.unwrap();
    let err = repo
        .update("ghost", RequestState::Error, &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound(_)));
}

#[tokio::test]
async fn get_of_unknown_id_is_none_and_ping_succeeds() {
    let repo = SqliteRequestRepository::connect(":memory:").await.unwrap();
    assert!(repo.get("nobody").await.unwrap().is_none());
    repo.ping().await.unwrap();
}

#[tokio::test]
async fn file_backed_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("requests.db");
    let path = path.to_str().unwrap();

    {
        let repo = SqliteRequestRepository::connect(path).await.unwrap();
        repo.create(&sample("durable-1")).await.unwrap();
        repo.update("durable-1", RequestState::Ready, &json!({ "message": "done" }))
            .await
            .unwrap();
    }

    let reopened = SqliteRequestRepository::connect(path).await.unwrap();
    let loaded = reopened.get("durable-1").await.unwrap().unwrap();
    assert_eq!(loaded.state, RequestState::Ready);
    assert_eq!(loaded.info["message"], "done");
}
