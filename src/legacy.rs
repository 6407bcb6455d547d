//! Dual-naming serialization boundary for legacy callers.
//!
//! Existing consumers of the settings/tax APIs read both `snake_case` and
//! `camelCase` spellings of every field off the same object. Internally this
//! crate is canonical snake_case; the duplication lives only here, applied on
//! the way out.

use serde::Serialize;
use serde_json::{Map, Value};

/// Serialize a model and expand every snake_case key with a camelCase alias,
/// recursively. Both spellings carry identical values.
pub fn to_legacy_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).map(expand).unwrap_or(Value::Null)
}

fn expand(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len() * 2);
            for (key, v) in map {
                let v = expand(v);
                let camel = to_camel_case(&key);
                if camel != key {
                    out.insert(camel, v.clone());
                }
                out.insert(key, v);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(expand).collect()),
        other => other,
    }
}

fn to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut upper_next = false;
    for c in s.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn camel_case_conversion() {
        assert_eq!(to_camel_case("tax_rate"), "taxRate");
        assert_eq!(to_camel_case("hsn_sac_code"), "hsnSacCode");
        assert_eq!(to_camel_case("code"), "code");
    }

    #[test]
    fn both_spellings_present_with_same_value() {
        #[derive(Serialize)]
        struct Row {
            tax_rate: u32,
            is_default: bool,
        }

        let v = to_legacy_json(&Row {
            tax_rate: 18,
            is_default: true,
        });
        assert_eq!(v["tax_rate"], json!(18));
        assert_eq!(v["taxRate"], json!(18));
        assert_eq!(v["is_default"], json!(true));
        assert_eq!(v["isDefault"], json!(true));
    }

    #[test]
    fn expansion_recurses_into_nested_objects_and_arrays() {
        let v = expand(json!({
            "tax_details": [{ "tax_amount": 360 }],
            "line_item": { "gst_rate": 18 }
        }));
        assert_eq!(v["taxDetails"][0]["taxAmount"], json!(360));
        assert_eq!(v["tax_details"][0]["tax_amount"], json!(360));
        assert_eq!(v["lineItem"]["gstRate"], json!(18));
    }

    #[test]
    fn already_camel_keys_are_not_duplicated() {
        let v = expand(json!({ "code": "0012" }));
        let obj = v.as_object().unwrap();
        assert_eq!(obj.len(), 1);
    }
}
