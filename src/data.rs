use crate::error::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    collections::HashMap,
    fmt::{self, Display},
    str::FromStr,
};

/// The HTTP methods an interaction may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            _ => Err(Error::InvalidMethod(s.into())),
        }
    }
}

/// One expected request/response exchange plus the provider state required
/// to satisfy it. Immutable once registered with a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub description: String,
    pub request: InteractionRequest,
    pub response: InteractionResponse,
}

impl Interaction {
    /// A request and a response are the two mandatory descriptors; the
    /// provider state is attached with [`Interaction::given`].
    pub fn new<S: Into<String>>(
        description: S,
        request: InteractionRequest,
        response: InteractionResponse,
    ) -> Self {
        Self {
            state: None,
            description: description.into(),
            request,
            response,
        }
    }

    /// Declares the provider state this interaction requires.
    pub fn given<S: Into<String>>(mut self, state: S) -> Self {
        self.state = Some(state.into());
        self
    }

    /// The state label, or `None` when the state is absent or empty.
    pub fn required_state(&self) -> Option<&str> {
        self.state.as_deref().filter(|s| !s.is_empty())
    }
}

/// The exact request the mock server should expect and the provider
/// verifier should issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRequest {
    pub method: Method,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl InteractionRequest {
    pub fn new<S: Into<String>>(method: Method, path: S) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn query<S: Into<String>>(mut self, query: S) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn header<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub(crate) fn to_request_data(&self) -> RequestData {
        let uri = match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        };

        RequestData {
            method: self.method.to_string(),
            uri,
            headers: self.headers.clone(),
            body: self.body.as_ref().map(render_body).unwrap_or_default(),
        }
    }
}

/// The response the mock server plays back and the provider is expected
/// to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionResponse {
    pub status: u16,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl InteractionResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn header<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub(crate) fn body_string(&self) -> String {
        self.body.as_ref().map(render_body).unwrap_or_default()
    }
}

// String bodies go over the wire raw, everything else as serialized JSON.
fn render_body(body: &Value) -> String {
    match body {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Plain request representation used by the HTTP plumbing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestData {
    pub uri: String,
    pub method: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

/// Plain response representation used by the HTTP plumbing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseData {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn method_round_trips_through_str() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!(Method::Delete.to_string(), "DELETE");
        assert!("TRACE".parse::<Method>().is_err());
    }

    #[test]
    fn interaction_serializes_without_empty_fields() {
        let interaction = Interaction::new(
            "a request for projects",
            InteractionRequest::new(Method::Get, "/projects"),
            InteractionResponse::new(200),
        );

        let json = serde_json::to_value(&interaction).unwrap();
        assert_eq!(
            json,
            json!({
                "description": "a request for projects",
                "request": { "method": "GET", "path": "/projects" },
                "response": { "status": 200 }
            })
        );
    }

    #[test]
    fn empty_state_counts_as_absent() {
        let interaction = Interaction::new(
            "anything",
            InteractionRequest::new(Method::Get, "/"),
            InteractionResponse::new(200),
        )
        .given("");

        assert_eq!(interaction.required_state(), None);
    }

    #[test]
    fn request_data_includes_query() {
        let data = InteractionRequest::new(Method::Get, "/projects")
            .query("since=2016")
            .to_request_data();

        assert_eq!(data.uri, "/projects?since=2016");
        assert_eq!(data.method, "GET");
    }

    #[test]
    fn string_bodies_render_raw() {
        let response = InteractionResponse::new(200).body(json!("plain text"));
        assert_eq!(response.body_string(), "plain text");

        let response = InteractionResponse::new(200).body(json!({ "reply": "hello" }));
        assert_eq!(response.body_string(), r#"{"reply":"hello"}"#);
    }
}
