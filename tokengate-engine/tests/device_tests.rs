use tokengate_engine::DeviceFingerprint;

#[test]
fn fingerprint_is_stable() {
    let a = DeviceFingerprint::generate();
    let b = DeviceFingerprint::generate();
    assert_eq!(a.id(), b.id());
}

#[test]
fn fingerprint_matches_current() {
    let fp = DeviceFingerprint::generate();
    assert!(fp.matches_current());
}

#[test]
fn fingerprint_not_empty() {
    let fp = DeviceFingerprint::generate();
    assert!(!fp.id().is_empty());
    assert!(!fp.device_id().is_empty());
}

#[test]
fn fingerprint_serde_roundtrip() {
    let fp = DeviceFingerprint::generate();
    let json = serde_json::to_string(&fp).unwrap();
    let restored: DeviceFingerprint = serde_json::from_str(&json).unwrap();
    assert_eq!(fp, restored);
}
