use tokengate_types::{DeviceId, TokenId};

// ── TokenId ──────────────────────────────────────────────────────

#[test]
fn token_id_unique() {
    let a = TokenId::new();
    let b = TokenId::new();
    assert_ne!(a, b);
}

#[test]
fn token_id_parse_roundtrip() {
    let id = TokenId::new();
    let parsed = TokenId::parse(&id.to_string()).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn token_id_parse_invalid() {
    assert!(TokenId::parse("not-a-uuid").is_err());
}

#[test]
fn token_id_serde_transparent() {
    let id = TokenId::new();
    let json = serde_json::to_string(&id).unwrap();
    // Serializes as a bare string, not an object.
    assert!(json.starts_with('"'));
    let restored: TokenId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, restored);
}

#[test]
fn token_id_from_uuid() {
    let uuid = uuid::Uuid::new_v4();
    let id = TokenId::from_uuid(uuid);
    assert_eq!(id.as_uuid(), uuid);
}

// ── DeviceId ─────────────────────────────────────────────────────

#[test]
fn device_id_equality() {
    let a = DeviceId::new("fp-1234");
    let b = DeviceId::from("fp-1234");
    assert_eq!(a, b);
    assert_ne!(a, DeviceId::new("fp-5678"));
}

#[test]
fn device_id_display() {
    let id = DeviceId::new("fp-abcd");
    assert_eq!(id.to_string(), "fp-abcd");
    assert_eq!(id.as_str(), "fp-abcd");
}

#[test]
fn device_id_empty() {
    assert!(DeviceId::new("").is_empty());
    assert!(!DeviceId::new("x").is_empty());
}

#[test]
fn device_id_serde_transparent() {
    let id = DeviceId::new("fp-serde");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"fp-serde\"");
    let restored: DeviceId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, restored);
}
