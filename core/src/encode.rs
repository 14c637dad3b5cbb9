//! Parameter encoders.
//!
//! GET parameters go into the query string. Everything else becomes a body
//! in exactly one of three encodings. Form and query values, like header
//! values, are coerced to strings first.

use crate::error::ConfigurationError;
use crate::types::{Json, Params};

pub const CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_MSGPACK: &str = "application/msgpack";
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";

/// Render a JSON value as a string: strings verbatim, everything else as
/// compact JSON text.
pub fn stringify(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Key/value pairs with every value stringified, in insertion order.
pub fn string_pairs(params: &Params) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(k, v)| (k.clone(), stringify(v)))
        .collect()
}

/// Append `params` to `url` as a query string. Empty params leave the URL
/// untouched, since some APIs reject a bare `?`.
pub fn append_query(url: &str, params: &Params) -> Result<String, ConfigurationError> {
    if params.is_empty() {
        return Ok(url.to_string());
    }
    let query = serde_urlencoded::to_string(string_pairs(params))
        .map_err(|e| ConfigurationError::Serialization(e.to_string()))?;
    let separator = if url.contains('?') { '&' } else { '?' };
    Ok(format!("{url}{separator}{query}"))
}

pub fn encode_json(params: &Params) -> Result<Vec<u8>, ConfigurationError> {
    serde_json::to_vec(params).map_err(|e| ConfigurationError::Serialization(e.to_string()))
}

/// MessagePack with string map keys. `None` encodes as msgpack nil.
pub fn encode_msgpack(params: Option<&Params>) -> Result<Vec<u8>, ConfigurationError> {
    rmp_serde::to_vec_named(&params).map_err(|e| ConfigurationError::Serialization(e.to_string()))
}

pub fn encode_form(params: &Params) -> Result<Vec<u8>, ConfigurationError> {
    serde_urlencoded::to_string(string_pairs(params))
        .map(String::into_bytes)
        .map_err(|e| ConfigurationError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Json) -> Params {
        match value {
            Json::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn stringify_leaves_strings_bare() {
        assert_eq!(stringify(&json!("abc")), "abc");
        assert_eq!(stringify(&json!(42)), "42");
        assert_eq!(stringify(&json!(1.5)), "1.5");
        assert_eq!(stringify(&json!(true)), "true");
        assert_eq!(stringify(&json!(null)), "null");
        assert_eq!(stringify(&json!({"a": [1, 2]})), r#"{"a":[1,2]}"#);
    }

    #[test]
    fn empty_params_add_no_query_string() {
        let url = append_query("http://api.test/items", &Params::new()).unwrap();
        assert_eq!(url, "http://api.test/items");
    }

    #[test]
    fn query_values_are_stringified_and_escaped() {
        let p = params(json!({"q": "a b", "limit": 10, "exact": false}));
        let url = append_query("http://api.test/search", &p).unwrap();
        assert_eq!(url, "http://api.test/search?q=a+b&limit=10&exact=false");
    }

    #[test]
    fn query_extends_existing_query_string() {
        let p = params(json!({"page": 2}));
        let url = append_query("http://api.test/items?sort=asc", &p).unwrap();
        assert_eq!(url, "http://api.test/items?sort=asc&page=2");
    }

    #[test]
    fn form_body_stringifies_values() {
        let p = params(json!({"name": "Ada", "age": 36, "tags": ["x"]}));
        let body = encode_form(&p).unwrap();
        assert_eq!(
            String::from_utf8(body).unwrap(),
            "name=Ada&age=36&tags=%5B%22x%22%5D"
        );
    }

    #[test]
    fn msgpack_body_decodes_to_same_mapping() {
        let p = params(json!({"id": 7, "name": "widget", "nested": {"ok": true}}));
        let body = encode_msgpack(Some(&p)).unwrap();
        let back: Json = rmp_serde::from_slice(&body).unwrap();
        assert_eq!(back, Json::Object(p));
    }

    #[test]
    fn msgpack_without_params_is_nil() {
        assert_eq!(encode_msgpack(None).unwrap(), vec![0xc0]);
    }

    #[test]
    fn json_body_keeps_key_order() {
        let p = params(json!({"b": 1, "a": 2}));
        assert_eq!(encode_json(&p).unwrap(), br#"{"b":1,"a":2}"#.to_vec());
    }
}
