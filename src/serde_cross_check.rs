//! Structural cross-checks against `serde_json`, mirroring the teacher's own
//! use of `serde_json` as a second, independent parser to validate against.

use crate::value::Value;
use crate::{decode, encode};

fn as_canonical_string(value: &serde_json::Value) -> String {
    // A normalized textual form both trees can be compared through without
    // caring about object key order on either side.
    match value {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => format!("{s:?}"),
        serde_json::Value::Array(items) => {
            let parts: Vec<_> = items.iter().map(as_canonical_string).collect();
            format!("[{}]", parts.join(","))
        }
        serde_json::Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().collect();
            keys.sort();
            let parts: Vec<_> = keys
                .into_iter()
                .map(|k| format!("{k:?}:{}", as_canonical_string(&map[k])))
                .collect();
            format!("{{{}}}", parts.join(","))
        }
    }
}

fn as_canonical_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Infinity(sign) => {
            if *sign < 0 {
                "-inf".to_string()
            } else {
                "inf".to_string()
            }
        }
        Value::NaN => "NaN".to_string(),
        Value::String(bytes) => format!("{:?}", String::from_utf8_lossy(bytes)),
        Value::Array(items) => {
            let parts: Vec<_> = items.iter().map(as_canonical_value).collect();
            format!("[{}]", parts.join(","))
        }
        Value::Object(obj) => {
            let mut entries: Vec<_> = obj
                .iter()
                .map(|(k, v)| (String::from_utf8_lossy(k).into_owned(), v))
                .collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let parts: Vec<_> = entries
                .into_iter()
                .map(|(k, v)| format!("{k:?}:{}", as_canonical_value(v)))
                .collect();
            format!("{{{}}}", parts.join(","))
        }
    }
}

/// Canonical JSON (no JSON5 extensions) must decode to the same shape
/// whether it's parsed by `serde_json` or by this crate.
#[test]
fn canonical_json_matches_serde_json_shape() {
    let fixture = r#"
    {
        "name": "widget",
        "count": 12,
        "price": 4.5,
        "tags": ["a", "b", "c"],
        "meta": {"active": true, "owner": null},
        "nested": [1, [2, 3], {"k": "v"}]
    }
    "#;

    let via_serde: serde_json::Value = serde_json::from_str(fixture).unwrap();
    let via_this_crate = match decode(fixture.as_bytes()) {
        Ok(v) => v,
        Err(err) => panic!("decode failed: {err}"),
    };

    assert_eq!(
        as_canonical_string(&via_serde),
        as_canonical_value(&via_this_crate)
    );
}

#[test]
fn canonical_json_survives_a_decode_encode_roundtrip_against_serde() {
    let fixture = r#"{"a": [1, 2, 3], "b": "hello", "c": {"d": false}}"#;
    let via_serde: serde_json::Value = serde_json::from_str(fixture).unwrap();

    let decoded = decode(fixture.as_bytes()).unwrap();
    let encoded = encode(&decoded).unwrap();
    let redecoded = match decode(&encoded) {
        Ok(v) => v,
        Err(err) => panic!(
            "re-decode of {:?} failed: {err}",
            String::from_utf8_lossy(&encoded)
        ),
    };

    assert_eq!(
        as_canonical_string(&via_serde),
        as_canonical_value(&redecoded)
    );
}
