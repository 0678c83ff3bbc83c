use crate::data::{InteractionRequest, InteractionResponse, RequestData, ResponseData};
use serde_json::Value;
use std::fmt::{self, Display};

/// How object bodies are compared: `Exact` rejects actual keys the
/// expectation doesn't name, `Subset` ignores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMatching {
    Exact,
    Subset,
}

impl Default for BodyMatching {
    fn default() -> Self {
        BodyMatching::Exact
    }
}

/// One divergence between an expected and an actual response. The path
/// pinpoints where in the status/headers/body the values differ;
/// `Value::Null` stands in for an absent actual value.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchFailure {
    pub path: String,
    pub expected: Value,
    pub actual: Value,
}

impl MatchFailure {
    fn new<P: Into<String>>(path: P, expected: Value, actual: Value) -> Self {
        Self {
            path: path.into(),
            expected,
            actual,
        }
    }
}

impl Display for MatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "at {}: expected {}, got {}",
            self.path, self.expected, self.actual
        )
    }
}

/// Compares an actual response against an expected one and returns every
/// divergence rather than stopping at the first.
pub fn match_response(
    expected: &InteractionResponse,
    actual: &ResponseData,
    mode: BodyMatching,
) -> Vec<MatchFailure> {
    let mut failures = Vec::new();

    if expected.status != actual.status_code {
        failures.push(MatchFailure::new(
            "$.status",
            Value::from(expected.status),
            Value::from(actual.status_code),
        ));
    }

    // Open header matching: only the expected names are checked, names
    // compare case-insensitively.
    for (name, value) in &expected.headers {
        let found = actual
            .headers
            .iter()
            .find(|(actual_name, _)| actual_name.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str());

        match found {
            Some(actual_value) if actual_value == value => {}
            Some(actual_value) => failures.push(MatchFailure::new(
                format!("$.headers.{}", name),
                Value::from(value.as_str()),
                Value::from(actual_value),
            )),
            None => failures.push(MatchFailure::new(
                format!("$.headers.{}", name),
                Value::from(value.as_str()),
                Value::Null,
            )),
        }
    }

    if let Some(expected_body) = &expected.body {
        match_body("$", expected_body, &actual.body, mode, &mut failures);
    }

    failures
}

/// Whether an incoming request satisfies an interaction's request
/// expectation. Expected headers match openly, the method, path, query
/// and body must match exactly.
pub(crate) fn request_matches(expected: &InteractionRequest, actual: &RequestData) -> bool {
    if !expected.method.to_string().eq_ignore_ascii_case(&actual.method) {
        return false;
    }

    let mut parts = actual.uri.splitn(2, '?');
    let actual_path = parts.next().unwrap_or("");
    let actual_query = parts.next();

    if actual_path != expected.path || actual_query != expected.query.as_deref() {
        return false;
    }

    for (name, value) in &expected.headers {
        let found = actual
            .headers
            .iter()
            .any(|(actual_name, actual_value)| {
                actual_name.eq_ignore_ascii_case(name) && actual_value == value
            });
        if !found {
            return false;
        }
    }

    match &expected.body {
        None => true,
        Some(expected_body) => {
            let mut failures = Vec::new();
            match_body("$", expected_body, &actual.body, BodyMatching::Exact, &mut failures);
            failures.is_empty()
        }
    }
}

fn match_body(
    path: &str,
    expected: &Value,
    actual_raw: &str,
    mode: BodyMatching,
    failures: &mut Vec<MatchFailure>,
) {
    // String expectations compare against the raw wire body, mirroring
    // how string bodies are emitted.
    if let Value::String(expected_str) = expected {
        if expected_str != actual_raw {
            failures.push(MatchFailure::new(
                path,
                expected.clone(),
                Value::from(actual_raw),
            ));
        }
        return;
    }

    match serde_json::from_str::<Value>(actual_raw) {
        Ok(actual) => match_values(path, expected, &actual, mode, failures),
        Err(_) => failures.push(MatchFailure::new(
            path,
            expected.clone(),
            Value::from(actual_raw),
        )),
    }
}

fn match_values(
    path: &str,
    expected: &Value,
    actual: &Value,
    mode: BodyMatching,
    failures: &mut Vec<MatchFailure>,
) {
    match (expected, actual) {
        (Value::Object(expected_map), Value::Object(actual_map)) => {
            for (key, expected_value) in expected_map {
                match actual_map.get(key) {
                    Some(actual_value) => match_values(
                        &format!("{}.{}", path, key),
                        expected_value,
                        actual_value,
                        mode,
                        failures,
                    ),
                    None => failures.push(MatchFailure::new(
                        format!("{}.{}", path, key),
                        expected_value.clone(),
                        Value::Null,
                    )),
                }
            }

            if mode == BodyMatching::Exact
                && actual_map.keys().any(|key| !expected_map.contains_key(key))
            {
                failures.push(MatchFailure::new(path, expected.clone(), actual.clone()));
            }
        }
        (Value::Array(expected_items), Value::Array(actual_items)) => {
            if expected_items.len() != actual_items.len() {
                failures.push(MatchFailure::new(path, expected.clone(), actual.clone()));
                return;
            }

            // Array order is significant.
            for (index, (expected_item, actual_item)) in
                expected_items.iter().zip(actual_items).enumerate()
            {
                match_values(
                    &format!("{}[{}]", path, index),
                    expected_item,
                    actual_item,
                    mode,
                    failures,
                );
            }
        }
        // Scalars and mixed types: strict equality, no coercion.
        (expected, actual) => {
            if expected != actual {
                failures.push(MatchFailure::new(path, expected.clone(), actual.clone()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Method;
    use serde_json::json;
    use std::collections::HashMap;

    fn response_with_body(status: u16, body: &str) -> ResponseData {
        ResponseData {
            status_code: status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    #[test]
    fn status_must_match_exactly() {
        let expected = InteractionResponse::new(200);
        let failures = match_response(
            &expected,
            &response_with_body(404, ""),
            BodyMatching::Exact,
        );

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path, "$.status");
        assert_eq!(failures[0].expected, json!(200));
        assert_eq!(failures[0].actual, json!(404));
    }

    #[test]
    fn header_names_match_case_insensitively() {
        let expected =
            InteractionResponse::new(200).header("Content-Type", "application/json");
        let mut actual = response_with_body(200, "");
        actual
            .headers
            .insert("content-type".into(), "application/json".into());

        assert!(match_response(&expected, &actual, BodyMatching::Exact).is_empty());
    }

    #[test]
    fn missing_header_reports_null_actual() {
        let expected = InteractionResponse::new(200).header("Accept", "application/json");
        let failures =
            match_response(&expected, &response_with_body(200, ""), BodyMatching::Exact);

        assert_eq!(failures[0].path, "$.headers.Accept");
        assert_eq!(failures[0].actual, Value::Null);
    }

    #[test]
    fn extra_actual_headers_are_ignored() {
        let expected = InteractionResponse::new(200);
        let mut actual = response_with_body(200, "");
        actual.headers.insert("X-Extra".into(), "anything".into());

        assert!(match_response(&expected, &actual, BodyMatching::Exact).is_empty());
    }

    #[test]
    fn object_key_order_is_irrelevant() {
        let expected = InteractionResponse::new(200).body(json!({ "a": 1, "b": 2 }));
        let actual = response_with_body(200, r#"{"b":2,"a":1}"#);

        assert!(match_response(&expected, &actual, BodyMatching::Exact).is_empty());
    }

    #[test]
    fn scalar_types_do_not_coerce() {
        let expected = InteractionResponse::new(200).body(json!({ "count": 1 }));
        let actual = response_with_body(200, r#"{"count":"1"}"#);

        let failures = match_response(&expected, &actual, BodyMatching::Exact);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path, "$.count");
        assert_eq!(failures[0].expected, json!(1));
        assert_eq!(failures[0].actual, json!("1"));
    }

    #[test]
    fn array_order_is_significant() {
        let expected = InteractionResponse::new(200).body(json!([1, 2]));
        let actual = response_with_body(200, "[2,1]");

        let failures = match_response(&expected, &actual, BodyMatching::Exact);
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].path, "$[0]");
        assert_eq!(failures[1].path, "$[1]");
    }

    #[test]
    fn exact_mode_rejects_extra_keys_at_the_object_path() {
        let expected = InteractionResponse::new(200).body(json!({ "reply": "hello" }));
        let actual = response_with_body(200, r#"{"reply":"hello","extra":1}"#);

        let failures = match_response(&expected, &actual, BodyMatching::Exact);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path, "$");
        assert_eq!(failures[0].expected, json!({ "reply": "hello" }));
        assert_eq!(failures[0].actual, json!({ "reply": "hello", "extra": 1 }));
    }

    #[test]
    fn subset_mode_ignores_extra_keys() {
        let expected = InteractionResponse::new(200).body(json!({ "reply": "hello" }));
        let actual = response_with_body(200, r#"{"reply":"hello","extra":1}"#);

        assert!(match_response(&expected, &actual, BodyMatching::Subset).is_empty());
    }

    #[test]
    fn nested_failures_carry_the_full_path() {
        let expected =
            InteractionResponse::new(200).body(json!({ "project": { "name": "pact" } }));
        let actual = response_with_body(200, r#"{"project":{"name":"other"}}"#);

        let failures = match_response(&expected, &actual, BodyMatching::Exact);
        assert_eq!(failures[0].path, "$.project.name");
    }

    #[test]
    fn non_json_actual_body_fails_against_structured_expectation() {
        let expected = InteractionResponse::new(200).body(json!({ "reply": "hello" }));
        let failures = match_response(
            &expected,
            &response_with_body(200, "not json"),
            BodyMatching::Exact,
        );

        assert_eq!(failures[0].path, "$");
        assert_eq!(failures[0].actual, json!("not json"));
    }

    #[test]
    fn failures_accumulate_instead_of_short_circuiting() {
        let expected = InteractionResponse::new(201)
            .header("Content-Type", "application/json")
            .body(json!({ "reply": "hello" }));
        let actual = response_with_body(200, r#"{"reply":"goodbye"}"#);

        let failures = match_response(&expected, &actual, BodyMatching::Exact);
        let paths: Vec<_> = failures.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["$.status", "$.headers.Content-Type", "$.reply"]);
    }

    #[test]
    fn request_matching_requires_declared_headers() {
        let expected = InteractionRequest::new(Method::Get, "/projects")
            .header("Accept", "application/json");

        let mut actual = RequestData {
            method: "GET".into(),
            uri: "/projects".into(),
            headers: HashMap::new(),
            body: String::new(),
        };
        assert!(!request_matches(&expected, &actual));

        actual
            .headers
            .insert("accept".into(), "application/json".into());
        assert!(request_matches(&expected, &actual));
    }

    #[test]
    fn request_matching_distinguishes_paths_and_queries() {
        let expected = InteractionRequest::new(Method::Get, "/projects");
        let actual = RequestData {
            method: "GET".into(),
            uri: "/projects2".into(),
            headers: HashMap::new(),
            body: String::new(),
        };
        assert!(!request_matches(&expected, &actual));

        let with_query = RequestData {
            uri: "/projects?since=2016".into(),
            ..actual
        };
        assert!(!request_matches(&expected, &with_query));
        assert!(request_matches(
            &expected.clone().query("since=2016"),
            &with_query
        ));
    }
}
