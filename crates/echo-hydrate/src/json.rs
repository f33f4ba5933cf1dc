// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! JSON bridge: build value graphs from `serde_json` trees.
//!
//! JSON has no identity, so every container becomes a fresh node and the
//! resulting graph is a tree. Object key order is preserved.

use crate::value::{Object, Record, Value};

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::from(s),
            serde_json::Value::Array(items) => {
                Object::array(items.into_iter().map(Self::from)).into()
            }
            serde_json::Value::Object(map) => {
                let mut record = Record::new();
                for (key, value) in map {
                    record.insert(key, Self::from(value));
                }
                Object::record(record).into()
            }
        }
    }
}

/// Parse JSON text into a fresh value tree. `None` when the text is not JSON.
pub fn parse_json(text: &str) -> Option<Value> {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .map(Value::from)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::value::ObjectKind;

    #[test]
    fn scalars() {
        assert_eq!(parse_json("null"), Some(Value::Null));
        assert_eq!(parse_json("true"), Some(Value::Bool(true)));
        assert_eq!(parse_json("-1.5"), Some(Value::Number(-1.5)));
        assert_eq!(parse_json("\"hi\""), Some(Value::from("hi")));
        assert_eq!(parse_json("nope"), None);
        assert_eq!(parse_json(""), None);
    }

    #[test]
    fn object_keys_keep_document_order() {
        let Some(Value::Object(obj)) = parse_json(r#"{"z":1,"a":2,"m":3}"#) else {
            panic!("expected object");
        };
        let kind = obj.kind();
        let ObjectKind::Record(record) = &*kind else {
            panic!("expected record");
        };
        let keys: Vec<String> = record.string_entries().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }
}
