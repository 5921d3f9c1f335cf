use pretty_assertions::assert_eq;
use tokengate_types::Timestamp;

#[test]
fn now_is_positive() {
    assert!(Timestamp::now().as_secs() > 0);
}

#[test]
fn never_sentinel() {
    assert!(Timestamp::NEVER.is_never());
    assert_eq!(Timestamp::NEVER.as_secs(), 0);
    assert!(!Timestamp::from_secs(1).is_never());
}

#[test]
fn never_is_not_past() {
    assert!(!Timestamp::NEVER.is_past());
}

#[test]
fn past_and_future() {
    let past = Timestamp::now().offset(-3600);
    let future = Timestamp::now().offset(3600);
    assert!(past.is_past());
    assert!(!future.is_past());
}

#[test]
fn ordering() {
    let early = Timestamp::from_secs(100);
    let late = Timestamp::from_secs(200);
    assert!(early < late);
}

#[test]
fn serde_transparent() {
    let ts = Timestamp::from_secs(1_700_000_000);
    let json = serde_json::to_string(&ts).unwrap();
    assert_eq!(json, "1700000000");
    let restored: Timestamp = serde_json::from_str(&json).unwrap();
    assert_eq!(ts, restored);
}

#[test]
fn from_i64() {
    let ts: Timestamp = 42i64.into();
    assert_eq!(ts.as_secs(), 42);
}
