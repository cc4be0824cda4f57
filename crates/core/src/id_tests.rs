// SPDX-License-Identifier: MIT

use super::*;

crate::define_id! {
    /// Test-only ID type.
    pub struct ProbeId("pb-");
}

#[test]
fn generated_id_has_prefix_and_length() {
    let id = ProbeId::new();
    assert!(id.as_str().starts_with("pb-"));
    assert_eq!(id.as_str().len(), 3 + 19);
}

#[test]
fn generated_ids_are_unique() {
    let a = ProbeId::new();
    let b = ProbeId::new();
    assert_ne!(a, b);
}

#[test]
fn from_string_round_trips() {
    let id = ProbeId::from_string("pb-fixed");
    assert_eq!(id.as_str(), "pb-fixed");
    assert_eq!(id.to_string(), "pb-fixed");
}

#[test]
fn short_strips_prefix() {
    let id = ProbeId::from_string("pb-abcdefgh");
    assert_eq!(id.short(4), "abcd");
    assert_eq!(id.short(100), "abcdefgh");
}

#[test]
fn serde_is_transparent() {
    let id = ProbeId::from_string("pb-serde");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"pb-serde\"");
    let back: ProbeId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}

#[test]
fn deserialize_rejects_oversized() {
    let long = format!("\"{}\"", "x".repeat(ID_MAX_LEN + 1));
    assert!(serde_json::from_str::<ProbeId>(&long).is_err());
}

#[test]
fn idbuf_borrow_matches_hash() {
    use std::collections::HashMap;
    let mut map: HashMap<IdBuf, u32> = HashMap::new();
    map.insert(IdBuf::new("pb-key"), 7);
    assert_eq!(map.get("pb-key"), Some(&7));
}

#[test]
fn empty_idbuf() {
    assert!(IdBuf::empty().is_empty());
    assert_eq!(IdBuf::empty().as_str(), "");
}
