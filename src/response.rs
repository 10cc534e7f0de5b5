//! The response object handed back to the gateway.
//!
//! Both gateway protocol versions accept the same `{statusCode, headers,
//! body}` structure, so there is only one response type. Bodies are always a
//! JSON envelope, `{"success": true, "result": ...}` or `{"success": false,
//! "error": ...}`, except for CORS preflight responses, which are empty.

use lambda_http::{Body, Error};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::error::ApiError;

const CORS_ALLOW_HEADERS: &str = "Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token";
const CORS_ALLOW_METHODS: &str = "OPTIONS,POST,GET";

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

/// The full CORS header set attached to every routed response.
pub fn cors_headers() -> BTreeMap<String, String> {
    let mut h = minimal_cors_headers();
    h.insert(
        "Access-Control-Allow-Headers".to_owned(),
        CORS_ALLOW_HEADERS.to_owned(),
    );
    h.insert(
        "Access-Control-Allow-Methods".to_owned(),
        CORS_ALLOW_METHODS.to_owned(),
    );
    h
}

/// The reduced set used when we failed before routing could happen.
fn minimal_cors_headers() -> BTreeMap<String, String> {
    let mut h = BTreeMap::new();
    h.insert("Access-Control-Allow-Origin".to_owned(), "*".to_owned());
    h.insert("Content-Type".to_owned(), "application/json".to_owned());
    h
}

impl GatewayResponse {
    pub fn preflight() -> Self {
        GatewayResponse {
            status_code: 200,
            headers: cors_headers(),
            body: String::new(),
        }
    }

    pub fn success(result: Value) -> Self {
        GatewayResponse {
            status_code: 200,
            headers: cors_headers(),
            body: json!({ "success": true, "result": result }).to_string(),
        }
    }

    pub fn failure(err: &ApiError) -> Self {
        GatewayResponse {
            status_code: err.status_code(),
            headers: cors_headers(),
            body: error_envelope(&err.to_string()),
        }
    }

    /// The outermost safety net: something went wrong that no handler
    /// accounted for.
    pub fn server_error(message: &str) -> Self {
        GatewayResponse {
            status_code: 500,
            headers: minimal_cors_headers(),
            body: error_envelope(&format!("Server error: {message}")),
        }
    }

    /// Convert into the form that `lambda_http` wants to send back.
    pub fn into_http(self) -> Result<lambda_http::Response<Body>, Error> {
        let mut builder = lambda_http::Response::builder().status(self.status_code);

        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let body = if self.body.is_empty() {
            Body::Empty
        } else {
            Body::Text(self.body)
        };

        Ok(builder.body(body)?)
    }
}

fn error_envelope(message: &str) -> String {
    json!({ "success": false, "error": message }).to_string()
}
