//! URL composition: base URL, path segments and query parameters
//!
//! Query parameters come from the [`ToQueryParams`] capability. Most parameter
//! records implement it through [`QueryParams::from_serialize`], which follows
//! the resource layer's "omit empty" convention: `null`, `false`, `0`, `""`,
//! `[]` and `{}` never reach the query string. Keys are kept sorted so the same
//! input always yields the same URL.

use crate::error::{ApiError, ApiResult};
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Ordered query parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    /// Create an empty parameter set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a parameter
    pub fn insert(&mut self, key: impl Into<String>, value: impl fmt::Display) {
        self.0.insert(key.into(), value.to_string());
    }

    /// Get a parameter value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whether no parameters are set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of parameters
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Flatten a serializable record into parameters.
    ///
    /// Empty values are omitted, arrays of scalars are joined with `,` (null
    /// items skipped), and nested objects are rejected rather than dropped.
    pub fn from_serialize<T: Serialize + ?Sized>(params: &T) -> ApiResult<Self> {
        let value = serde_json::to_value(params).map_err(ApiError::Encode)?;
        let fields = match value {
            Value::Object(fields) => fields,
            Value::Null => return Ok(Self::new()),
            other => return Err(ApiError::InvalidQueryParams(json_kind(&other).to_string())),
        };

        let mut query = Self::new();
        for (key, value) in fields {
            if let Some(text) = flatten_field(&key, &value)? {
                query.0.insert(key, text);
            }
        }
        Ok(query)
    }
}

/// Anything that can describe itself as query parameters
pub trait ToQueryParams {
    /// Produce the parameters, or fail if they cannot be expressed as a query string
    fn to_query_params(&self) -> ApiResult<QueryParams>;
}

impl ToQueryParams for QueryParams {
    fn to_query_params(&self) -> ApiResult<QueryParams> {
        Ok(self.clone())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Text for a top-level field, `None` when the field holds its empty value
fn flatten_field(key: &str, value: &Value) -> ApiResult<Option<String>> {
    match value {
        Value::Null | Value::Bool(false) => Ok(None),
        Value::Number(n) if n.as_f64() == Some(0.0) => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::Array(items) if items.is_empty() => Ok(None),
        Value::Object(fields) if fields.is_empty() => Ok(None),
        Value::Array(items) => {
            let parts = items
                .iter()
                .filter(|item| !item.is_null())
                .map(|item| scalar_text(item).ok_or_else(|| ApiError::NestedQueryParam(key.to_string())))
                .collect::<ApiResult<Vec<_>>>()?;
            Ok((!parts.is_empty()).then(|| parts.join(",")))
        }
        Value::Object(_) => Err(ApiError::NestedQueryParam(key.to_string())),
        scalar => Ok(scalar_text(scalar)),
    }
}

/// Natural text of a scalar, zero values included
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Join `base_url` with `segments` and append `query`.
///
/// Each segment becomes exactly one path component (a `/` inside a segment is
/// percent-encoded). An empty parameter set adds no `?`. A base URL that
/// already carries a query string is rejected.
pub fn compose<S: AsRef<str>>(
    base_url: &str,
    segments: &[S],
    query: Option<&QueryParams>,
) -> ApiResult<Url> {
    let mut url =
        Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;

    if url.cannot_be_a_base() {
        return Err(ApiError::InvalidUrl(format!(
            "{base_url}: cannot carry path segments"
        )));
    }
    if url.query().is_some() {
        return Err(ApiError::InvalidUrl(format!(
            "{base_url}: base URL must not carry a query string"
        )));
    }
    if let Some(segment) = segments
        .iter()
        .map(AsRef::as_ref)
        .find(|s| matches!(*s, "." | ".."))
    {
        return Err(ApiError::InvalidUrl(format!(
            "path segment `{segment}` is not a resource name"
        )));
    }

    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(format!("{base_url}: cannot carry path segments")))?;
        path.pop_if_empty();
        path.extend(segments.iter().map(AsRef::as_ref));
    }

    if let Some(params) = query.filter(|q| !q.is_empty()) {
        url.query_pairs_mut().extend_pairs(params.iter());
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Serialize;

    #[derive(Default, Serialize)]
    #[serde(rename_all = "camelCase")]
    struct ListParams {
        from: i64,
        to: i64,
        last_id: String,
        worker: Option<String>,
        include_archived: bool,
        state: Vec<u8>,
    }

    #[derive(Serialize)]
    struct WithNested {
        filter: Nested,
    }

    #[derive(Serialize)]
    struct Nested {
        name: String,
    }

    const BASE: &str = "https://api.example.com/api/v2";

    #[test]
    fn test_segments_in_order() {
        let url = compose(BASE, &["tasks", "123"], None).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/api/v2/tasks/123");
    }

    #[test]
    fn test_no_segments_keeps_path() {
        let url = compose(BASE, &[] as &[&str], None).unwrap();
        assert_eq!(url.as_str(), BASE);

        let trailing = compose("https://api.example.com/api/v2/", &["tasks"], None).unwrap();
        assert_eq!(trailing.as_str(), "https://api.example.com/api/v2/tasks");
    }

    #[test]
    fn test_segment_is_single_component() {
        let url = compose(BASE, &["tasks", "a/b c"], None).unwrap();
        assert_eq!(url.path(), "/api/v2/tasks/a%2Fb%20c");
    }

    #[test]
    fn test_dot_segments_rejected() {
        assert!(matches!(
            compose(BASE, &["tasks", ".."], None),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_malformed_base_url() {
        assert!(matches!(
            compose("not a url", &["tasks"], None),
            Err(ApiError::InvalidUrl(_))
        ));
        assert!(matches!(
            compose("mailto:ops@example.com", &["tasks"], None),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_base_url_with_query_rejected() {
        assert!(matches!(
            compose("https://api.example.com/api/v2?region=eu", &["tasks"], None),
            Err(ApiError::InvalidUrl(msg)) if msg.contains("query")
        ));
    }

    #[test]
    fn test_null_array_items_skipped() {
        let params = serde_json::json!({ "ids": [1, null, 3], "gone": [null] });
        let query = QueryParams::from_serialize(&params).unwrap();

        assert_eq!(query.get("ids"), Some("1,3"));
        assert_eq!(query.get("gone"), None);
    }

    #[test]
    fn test_all_empty_params_give_bare_url() {
        let params = QueryParams::from_serialize(&ListParams::default()).unwrap();
        assert!(params.is_empty());

        let url = compose(BASE, &["tasks", "all"], Some(&params)).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/api/v2/tasks/all");
        assert!(url.query().is_none());
    }

    #[test]
    fn test_params_sorted_and_stringified() {
        let params = QueryParams::from_serialize(&ListParams {
            from: 1_455_072_025_000,
            last_id: "tPMO~h03sOIqFbnhqaOXgUsd".into(),
            worker: Some("w1".into()),
            include_archived: true,
            state: vec![0, 1],
            ..Default::default()
        })
        .unwrap();

        let keys: Vec<_> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["from", "includeArchived", "lastId", "state", "worker"]);
        assert_eq!(params.get("from"), Some("1455072025000"));
        assert_eq!(params.get("includeArchived"), Some("true"));
        assert_eq!(params.get("state"), Some("0,1"));

        let url = compose(BASE, &["tasks", "all"], Some(&params)).unwrap();
        assert_eq!(
            url.query(),
            Some("from=1455072025000&includeArchived=true&lastId=tPMO%7Eh03sOIqFbnhqaOXgUsd&state=0%2C1&worker=w1")
        );
    }

    #[test]
    fn test_nested_params_fail_loudly() {
        let nested = WithNested {
            filter: Nested { name: "x".into() },
        };
        assert!(matches!(
            QueryParams::from_serialize(&nested),
            Err(ApiError::NestedQueryParam(key)) if key == "filter"
        ));

        let nested_array = serde_json::json!({ "ids": [["a"], ["b"]] });
        assert!(matches!(
            QueryParams::from_serialize(&nested_array),
            Err(ApiError::NestedQueryParam(_))
        ));
    }

    #[test]
    fn test_non_object_params_rejected() {
        assert!(matches!(
            QueryParams::from_serialize(&vec![1, 2]),
            Err(ApiError::InvalidQueryParams(_))
        ));
        assert!(QueryParams::from_serialize(&()).unwrap().is_empty());
    }

    #[test]
    fn test_manual_params() {
        let params = QueryParams::new().with("phones", "+15551234567").with("limit", 50);
        assert_eq!(params.len(), 2);
        assert_eq!(params.to_query_params().unwrap(), params);
    }

    proptest! {
        #[test]
        fn prop_compose_is_deterministic(segments in prop::collection::vec("[a-zA-Z0-9_-]{1,8}", 0..6)) {
            let first = compose(BASE, &segments, None).unwrap();
            let second = compose(BASE, &segments, None).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_segment_order_matters(
            a in "[a-z0-9]{1,8}",
            b in "[a-z0-9]{1,8}",
            prefix in prop::collection::vec("[a-z0-9]{1,8}", 0..3),
        ) {
            let mut forward = prefix.clone();
            forward.extend([a.clone(), b.clone()]);
            let mut reversed = prefix;
            reversed.extend([b.clone(), a.clone()]);

            let forward = compose(BASE, &forward, None).unwrap();
            let reversed = compose(BASE, &reversed, None).unwrap();
            prop_assert_eq!(forward == reversed, a == b);
        }

        #[test]
        fn prop_segments_round_trip(segments in prop::collection::vec("[a-zA-Z0-9 /%?#]{1,8}", 1..5)) {
            let url = compose(BASE, &segments, None).unwrap();
            let count = url.path_segments().unwrap().count();
            // "api", "v2" plus one component per segment
            prop_assert_eq!(count, 2 + segments.len());
        }
    }
}
