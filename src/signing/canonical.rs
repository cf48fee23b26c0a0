//! Canonical JSON
//!
//! The byte sequence a host signs: the document without its signature,
//! object keys sorted recursively, no insignificant whitespace.

use serde_json::Value;

use crate::matches::document::MatchDocument;
use crate::matches::fields;

/// Render `value` canonically.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            // Map iteration is insertion order if any crate in the build
            // turns on serde_json's `preserve_order`.
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// The message a host signature covers.
pub fn signing_payload(doc: &MatchDocument) -> String {
    let mut unsigned = doc.clone();
    unsigned.remove(fields::MATCH_HOST_SIGNATURE);
    canonical_json(&Value::from(unsigned))
}
