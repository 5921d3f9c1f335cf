mod common;

use common::TestIssuer;
use std::collections::BTreeMap;
use tokengate_crypto::KeyPair;
use tokengate_engine::{UsageLedger, UsageRequest};
use tokengate_types::DeviceId;

fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn request(action: &str, pairs: &[(&str, &str)]) -> UsageRequest {
    UsageRequest {
        action: action.to_string(),
        params: params(pairs),
    }
}

// ── Append ───────────────────────────────────────────────────────

#[test]
fn append_increments_state_index() {
    let issuer = TestIssuer::new();
    let device = KeyPair::generate();
    let mut token = issuer.issue_bound("LIC-1", "app.demo", &device, &DeviceId::new("D1"));

    let entry = UsageLedger::append(&mut token, &device.signing_key, &request("api_call", &[]))
        .unwrap();
    assert_eq!(entry.seq, 0);
    assert_eq!(token.state_index, 1);
    assert_eq!(token.usage_chain.len(), 1);
}

#[test]
fn first_entry_chains_to_base_state() {
    let issuer = TestIssuer::new();
    let device = KeyPair::generate();
    let mut token = issuer.issue_bound("LIC-1", "app.demo", &device, &DeviceId::new("D1"));
    let base = token.base_state_digest();

    let entry = UsageLedger::append(
        &mut token,
        &device.signing_key,
        &request("api_call", &[("fn", "x")]),
    )
    .unwrap();
    assert_eq!(entry.hash_prev, base);
}

#[test]
fn sequence_has_no_gaps() {
    let issuer = TestIssuer::new();
    let device = KeyPair::generate();
    let mut token = issuer.issue_bound("LIC-1", "app.demo", &device, &DeviceId::new("D1"));

    for i in 0..5 {
        let entry = UsageLedger::append(
            &mut token,
            &device.signing_key,
            &request("tick", &[("i", &i.to_string())]),
        )
        .unwrap();
        assert_eq!(entry.seq, i);
    }
    assert_eq!(token.state_index, 5);
}

// ── Verification ─────────────────────────────────────────────────

#[test]
fn empty_chain_verifies() {
    let issuer = TestIssuer::new();
    let device = KeyPair::generate();
    let token = issuer.issue_bound("LIC-1", "app.demo", &device, &DeviceId::new("D1"));
    assert!(UsageLedger::verify_chain(&token).is_ok());
}

#[test]
fn chain_of_appends_verifies() {
    let issuer = TestIssuer::new();
    let device = KeyPair::generate();
    let mut token = issuer.issue_bound("LIC-1", "app.demo", &device, &DeviceId::new("D1"));

    for action in ["open", "run", "close"] {
        UsageLedger::append(&mut token, &device.signing_key, &request(action, &[])).unwrap();
    }
    assert!(UsageLedger::verify_chain(&token).is_ok());
}

#[test]
fn tampered_first_entry_params_reports_seq_zero() {
    let issuer = TestIssuer::new();
    let device = KeyPair::generate();
    let mut token = issuer.issue_bound("LIC-1", "app.demo", &device, &DeviceId::new("D1"));

    UsageLedger::append(
        &mut token,
        &device.signing_key,
        &request("api_call", &[("fn", "x")]),
    )
    .unwrap();
    UsageLedger::append(&mut token, &device.signing_key, &request("api_call", &[])).unwrap();

    token.usage_chain[0]
        .params
        .insert("fn".to_string(), "forged".to_string());

    let err = UsageLedger::verify_chain(&token).unwrap_err();
    assert_eq!(err.seq, 0);
}

#[test]
fn tampered_middle_entry_reports_its_seq() {
    let issuer = TestIssuer::new();
    let device = KeyPair::generate();
    let mut token = issuer.issue_bound("LIC-1", "app.demo", &device, &DeviceId::new("D1"));

    for i in 0..4 {
        UsageLedger::append(
            &mut token,
            &device.signing_key,
            &request("tick", &[("i", &i.to_string())]),
        )
        .unwrap();
    }
    token.usage_chain[2].action = "forged".to_string();

    let err = UsageLedger::verify_chain(&token).unwrap_err();
    assert_eq!(err.seq, 2);
}

#[test]
fn entry_signed_by_foreign_key_rejected() {
    let issuer = TestIssuer::new();
    let device = KeyPair::generate();
    let intruder = KeyPair::generate();
    let mut token = issuer.issue_bound("LIC-1", "app.demo", &device, &DeviceId::new("D1"));

    UsageLedger::append(&mut token, &device.signing_key, &request("legit", &[])).unwrap();
    UsageLedger::append(&mut token, &intruder.signing_key, &request("forged", &[])).unwrap();

    let err = UsageLedger::verify_chain(&token).unwrap_err();
    assert_eq!(err.seq, 1);
}

#[test]
fn state_index_mismatch_detected() {
    let issuer = TestIssuer::new();
    let device = KeyPair::generate();
    let mut token = issuer.issue_bound("LIC-1", "app.demo", &device, &DeviceId::new("D1"));

    UsageLedger::append(&mut token, &device.signing_key, &request("tick", &[])).unwrap();
    token.state_index = 7;

    assert!(UsageLedger::verify_chain(&token).is_err());
}

#[test]
fn chain_without_binding_rejected() {
    let issuer = TestIssuer::new();
    let device = KeyPair::generate();
    let mut token = issuer.issue_bound("LIC-1", "app.demo", &device, &DeviceId::new("D1"));

    UsageLedger::append(&mut token, &device.signing_key, &request("tick", &[])).unwrap();
    token.device_binding = None;

    let err = UsageLedger::verify_chain(&token).unwrap_err();
    assert_eq!(err.seq, 0);
}

// ── UsageRequest parsing ─────────────────────────────────────────

#[test]
fn request_parses_action_and_params() {
    let request =
        UsageRequest::from_json(r#"{"action":"api_call","params":{"fn":"x","n":"3"}}"#).unwrap();
    assert_eq!(request.action, "api_call");
    assert_eq!(request.params.get("fn").map(String::as_str), Some("x"));
    assert_eq!(request.params.len(), 2);
}

#[test]
fn request_params_default_empty() {
    let request = UsageRequest::from_json(r#"{"action":"ping"}"#).unwrap();
    assert!(request.params.is_empty());
}

#[test]
fn request_rejects_unknown_fields() {
    assert!(UsageRequest::from_json(r#"{"action":"x","extra":1}"#).is_err());
}

#[test]
fn request_rejects_missing_action() {
    assert!(UsageRequest::from_json(r#"{"params":{}}"#).is_err());
}

#[test]
fn request_rejects_empty_action() {
    assert!(UsageRequest::from_json(r#"{"action":""}"#).is_err());
}

#[test]
fn request_rejects_non_json() {
    assert!(UsageRequest::from_json("not json").is_err());
}
