//! Normalization of inbound gateway events.
//!
//! API Gateway can deliver a request to us in one of two shapes: the "REST
//! API" (v1) proxy event, which has a flat `httpMethod`, and the "HTTP API"
//! (v2) event, which nests the method and path under `requestContext.http`.
//! Local tooling tends to send something even simpler, with `httpMethod` and
//! `path` at the top level. We model these as a small tagged union and reduce
//! each of them to one canonical [`InboundRequest`].

use lambda_http::Body;
use serde::{de::IgnoredAny, Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// HTTP headers with case-insensitive lookup.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn insert<S: Into<String>>(&mut self, name: &str, value: S) {
        self.0.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for Headers {
    /// If the same header shows up under several spellings, the all-lowercase
    /// one wins.
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut headers = Headers::default();
        let mut lowercase = Vec::new();

        for (name, value) in iter {
            if name.bytes().any(|b| b.is_ascii_uppercase()) {
                headers.insert(&name, value);
            } else {
                lowercase.push((name, value));
            }
        }

        for (name, value) in lowercase {
            headers.0.insert(name, value);
        }

        headers
    }
}

/// The canonical form of a request, whatever event shape it arrived in.
#[derive(Clone, Debug, Default)]
pub struct InboundRequest {
    pub method: String,
    pub path: String,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
    pub is_base64: bool,
}

impl InboundRequest {
    /// The declared content type, or the empty string.
    pub fn content_type(&self) -> &str {
        self.headers.get("content-type").unwrap_or("")
    }

    /// Adapt a request that `lambda_http` has already decoded from a proxy
    /// event. Binary bodies have been base64-decoded by that point.
    pub fn from_http(req: lambda_http::Request) -> Self {
        let method = req.method().as_str().to_owned();
        let path = req.uri().path().to_owned();

        let headers = req
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_owned(), v.to_owned()))
            })
            .collect();

        let body = match req.into_body() {
            Body::Empty => None,
            Body::Text(t) => Some(t.into_bytes()),
            Body::Binary(b) => Some(b),
        };

        InboundRequest {
            method,
            path,
            headers,
            body,
            is_base64: false,
        }
    }
}

/// The fields shared by every event shape.
///
/// These are all decoded leniently: an oddly typed body or header must never
/// stop us from routing the request, so none of them can make an event shape
/// fail to match.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    #[serde(default, deserialize_with = "lenient_headers")]
    headers: Vec<(String, String)>,
    #[serde(default, deserialize_with = "lenient_body")]
    body: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    is_base64_encoded: bool,

    /// v2 events carry a combined `"METHOD /path"` key.
    #[serde(default, deserialize_with = "lenient_scalar")]
    route_key: Option<String>,
}

/// Strings as they are, numbers and booleans as their text.
fn scalar_text(v: Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_scalar<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(scalar_text(Value::deserialize(d)?))
}

/// Direct invocations sometimes pass the body as a JSON document rather than
/// as text. We keep its serialized form.
fn lenient_body<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

fn lenient_flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Bool(b) => b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    })
}

/// Header values that aren't scalars are dropped, as are headers that
/// aren't a map at all.
fn lenient_headers<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<(String, String)>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(k, v)| scalar_text(v).map(|v| (k, v)))
            .collect(),
        _ => Vec::new(),
    })
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum GatewayEvent {
    HttpApi(HttpApiEvent),
    Rest(RestEvent),
    Direct(DirectEvent),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpApiEvent {
    request_context: HttpApiContext,
    #[serde(flatten)]
    payload: EventPayload,
}

#[derive(Debug, Deserialize)]
struct HttpApiContext {
    http: HttpApiDescription,
}

#[derive(Debug, Deserialize)]
struct HttpApiDescription {
    #[serde(default, deserialize_with = "lenient_scalar")]
    method: Option<String>,
    #[serde(default, deserialize_with = "lenient_scalar")]
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestEvent {
    request_context: RestContext,
    #[serde(default, deserialize_with = "lenient_scalar")]
    path: Option<String>,
    #[serde(flatten)]
    payload: EventPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestContext {
    /// Required: it is what tells a v1 context apart from an unknown one.
    #[serde(deserialize_with = "lenient_scalar")]
    http_method: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectEvent {
    /// A context that matched neither known shape. Its presence means we
    /// don't trust the top-level fields either.
    #[serde(default)]
    request_context: Option<IgnoredAny>,
    #[serde(default, deserialize_with = "lenient_scalar")]
    http_method: Option<String>,
    #[serde(default, deserialize_with = "lenient_scalar")]
    path: Option<String>,
    #[serde(flatten)]
    payload: EventPayload,
}

impl GatewayEvent {
    pub fn into_request(self) -> InboundRequest {
        let (method, path, payload) = match self {
            GatewayEvent::HttpApi(e) => {
                let http = e.request_context.http;
                (http.method, http.path, e.payload)
            }

            GatewayEvent::Rest(e) => (e.request_context.http_method, e.path, e.payload),

            GatewayEvent::Direct(e) => {
                if e.request_context.is_some() {
                    (None, None, e.payload)
                } else {
                    (e.http_method, e.path, e.payload)
                }
            }
        };

        let (method, path) = match payload
            .route_key
            .as_deref()
            .and_then(|k| k.split_once(' '))
        {
            Some((m, p)) => (m.to_owned(), p.to_owned()),
            None => (method.unwrap_or_default(), path.unwrap_or_default()),
        };

        InboundRequest {
            method,
            path,
            headers: payload.headers.into_iter().collect(),
            body: payload.body.map(String::into_bytes),
            is_base64: payload.is_base64_encoded,
        }
    }
}
