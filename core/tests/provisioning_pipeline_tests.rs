// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! End-to-end pipeline tests over the simulated capability set: admission
//! semantics (duplicates, validation), state-machine observation, secret
//! hygiene, and the terminal outcomes of the background pipeline.

use std::sync::Arc;
use std::time::Duration;

use tempoftp_core::application::provisioner::{
    AdmitRequest, PipelineSettings, ProvisioningService, StandardProvisioningService, StatusView,
};
use tempoftp_core::domain::provision::ProvisionError;
use tempoftp_core::domain::request::RequestState;
use tempoftp_core::infrastructure::accounts::{HashScheme, InMemoryAccountDirectory};
use tempoftp_core::infrastructure::crypto::SecretCipher;
use tempoftp_core::infrastructure::repositories::InMemoryRequestRepository;
use tempoftp_core::infrastructure::simulation::{
    ForcedOutcome, SimulatedDataMover, SimulatedSizeProbe, SimulatedSpaceChecker,
    SimulationSettings,
};

struct Harness {
    service: Arc<StandardProvisioningService>,
    accounts: Arc<InMemoryAccountDirectory>,
    cipher: Arc<SecretCipher>,
    _staging: tempfile::TempDir,
}

fn harness(sim: SimulationSettings, scheme: HashScheme) -> Harness {
    let staging = tempfile::tempdir().unwrap();
    let accounts = Arc::new(InMemoryAccountDirectory::new(scheme));
    let cipher = Arc::new(SecretCipher::new("pipeline-test-key"));
    let service = Arc::new(StandardProvisioningService::new(
        Arc::new(InMemoryRequestRepository::new()),
        Arc::new(SimulatedSizeProbe::new(sim)),
        Arc::new(SimulatedSpaceChecker::new(sim)),
        Arc::new(SimulatedDataMover),
        accounts.clone(),
        cipher.clone(),
        PipelineSettings {
            staging_root: staging.path().to_path_buf(),
            min_free_bytes: 0,
            owner: None,
        },
    ));
    Harness {
        service,
        accounts,
        cipher,
        _staging: staging,
    }
}

fn force(outcome: ForcedOutcome) -> SimulationSettings {
    SimulationSettings {
        force: Some(outcome),
        ..Default::default()
    }
}

fn admit_payload(id: &str) -> AdmitRequest {
    AdmitRequest {
        id: id.to_string(),
        owner_contact: "alice@example.com".to_string(),
        source_path: "10.0.0.1:/data/src".to_string(),
        validity_days: 5,
    }
}

async fn wait_terminal(service: &dyn ProvisioningService, id: &str) -> StatusView {
    for _ in 0..400 {
        let status = service.status(id).await.unwrap();
        if status.state.is_terminal() {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("request {id} never reached a terminal state");
}

#[tokio::test]
async fn happy_path_provisions_a_ready_account() {
    let h = harness(force(ForcedOutcome::Succeed), HashScheme::Sha512);
    let ack = h.service.admit(admit_payload("req1")).await.unwrap();
    assert_eq!(ack.id, "req1");
    assert_eq!(ack.state, RequestState::Received);

    let status = wait_terminal(h.service.as_ref(), "req1").await;
    assert_eq!(status.state, RequestState::Ready);
    assert_eq!(status.account.as_deref(), Some("ftp_alice_example"));
    assert_eq!(status.validity_days, Some(5));
    assert!(status.message.contains('5'));

    // The surfaced secret is the encrypted form, and decrypts back to a
    // generated alphanumeric secret.
    let token = status.secret.expect("ready status carries the secret");
    let plaintext = h.cipher.decrypt(&token).unwrap();
    assert_eq!(plaintext.len(), 12);
    assert!(plaintext.chars().all(|c| c.is_ascii_alphanumeric()));

    // And the account landed in the directory, enabled, with a home under
    // the staging root.
    let record = h.accounts.get("ftp_alice_example").unwrap();
    assert!(record.enabled);
    assert!(record.homedir.ends_with("ftp_alice_example"));
}

#[tokio::test]
async fn insufficient_space_terminates_in_error() {
    let sim = SimulationSettings {
        force: None,
        source_bytes: Some(2_000_000),
        free_bytes: Some(1_000_000),
    };
    let h = harness(sim, HashScheme::Sha512);
    h.service.admit(admit_payload("req-space")).await.unwrap();

    let status = wait_terminal(h.service.as_ref(), "req-space").await;
    assert_eq!(status.state, RequestState::Error);
    assert!(status.message.contains("space"), "got: {}", status.message);
    assert!(status.secret.is_none());
    assert!(status.account.is_none());
}

#[tokio::test]
async fn duplicate_admission_is_rejected_and_mutates_nothing() {
    let h = harness(force(ForcedOutcome::Succeed), HashScheme::Sha512);
    h.service.admit(admit_payload("req2")).await.unwrap();
    let first = wait_terminal(h.service.as_ref(), "req2").await;

    let err = h.service.admit(admit_payload("req2")).await.unwrap_err();
    match &err {
        ProvisionError::DuplicateRequest { id, state } => {
            assert_eq!(id, "req2");
            assert_eq!(*state, RequestState::Ready);
        }
        other => panic!("expected DuplicateRequest, got {other}"),
    }
    assert!(err.to_string().contains("req2"));
    assert!(err.to_string().contains("ready"));

    let after = h.service.status("req2").await.unwrap();
    assert_eq!(after.state, first.state);
    assert_eq!(after.secret, first.secret);
    assert_eq!(after.account, first.account);
}

#[tokio::test]
async fn malformed_source_is_rejected_synchronously_without_a_record() {
    let h = harness(force(ForcedOutcome::Succeed), HashScheme::Sha512);
    let mut payload = admit_payload("req3");
    payload.source_path = "nohostnopath".to_string();

    let err = h.service.admit(payload).await.unwrap_err();
    assert!(matches!(err, ProvisionError::InvalidSource(_)));
    assert!(matches!(
        h.service.status("req3").await.unwrap_err(),
        ProvisionError::NotFound(_)
    ));
}

#[tokio::test]
async fn empty_host_with_user_is_rejected() {
    let h = harness(force(ForcedOutcome::Succeed), HashScheme::Sha512);
    let mut payload = admit_payload("req4");
    payload.source_path = "user@:/a/b".to_string();
    assert!(matches!(
        h.service.admit(payload).await.unwrap_err(),
        ProvisionError::InvalidSource(_)
    ));
}

#[tokio::test]
async fn zero_validity_is_rejected() {
    let h = harness(force(ForcedOutcome::Succeed), HashScheme::Sha512);
    let mut payload = admit_payload("req5");
    payload.validity_days = 0;
    assert!(matches!(
        h.service.admit(payload).await.unwrap_err(),
        ProvisionError::InvalidValidity
    ));
}

#[tokio::test]
async fn observed_states_are_monotonic() {
    let h = harness(force(ForcedOutcome::Succeed), HashScheme::Sha512);
    h.service.admit(admit_payload("req-order")).await.unwrap();

    let mut observed = Vec::new();
    for _ in 0..400 {
        let status = h.service.status("req-order").await.unwrap();
        observed.push(status.state);
        if status.state.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert_eq!(*observed.last().unwrap(), RequestState::Ready);
    for pair in observed.windows(2) {
        assert!(
            pair[0].rank() <= pair[1].rank(),
            "state regressed: {:?}",
            observed
        );
    }
}

#[tokio::test]
async fn non_ready_status_never_exposes_a_secret() {
    let h = harness(force(ForcedOutcome::Fail), HashScheme::Sha512);
    h.service.admit(admit_payload("req-hygiene")).await.unwrap();
    let status = wait_terminal(h.service.as_ref(), "req-hygiene").await;
    assert_eq!(status.state, RequestState::Error);
    assert!(status.secret.is_none());

    // The serialized view carries no secret-bearing fields at all.
    let body = serde_json::to_value(&status).unwrap();
    assert!(body.get("secret").is_none());
    assert!(body.get("account").is_none());
}

#[tokio::test]
async fn same_owner_reprovisions_onto_the_same_account_and_secret() {
    // Cleartext scheme: the directory's stored secret is reusable verbatim,
    // so a second request for the same owner must issue the same credential.
    let h = harness(force(ForcedOutcome::Succeed), HashScheme::Cleartext);

    h.service.admit(admit_payload("owner-a-1")).await.unwrap();
    let first = wait_terminal(h.service.as_ref(), "owner-a-1").await;
    let secret1 = h.cipher.decrypt(&first.secret.unwrap()).unwrap();

    h.service.admit(admit_payload("owner-a-2")).await.unwrap();
    let second = wait_terminal(h.service.as_ref(), "owner-a-2").await;
    let secret2 = h.cipher.decrypt(&second.secret.unwrap()).unwrap();

    assert_eq!(first.account, second.account);
    assert_eq!(secret1, secret2);
    // Directory still holds exactly that secret.
    assert_eq!(
        h.accounts.get("ftp_alice_example").unwrap().secret,
        secret1
    );
}
