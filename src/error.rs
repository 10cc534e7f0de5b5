//! Errors that end up in a client-visible failure envelope.

use thiserror::Error;

/// Every fault that a request handler can report to the client.
///
/// The display text is used verbatim as the `error` field of the response
/// envelope, so it should be something a browser client can show.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request was malformed, lacked a required field, or used an
    /// unsupported content type.
    #[error("{0}")]
    BadRequest(String),

    /// Unmatched route, or the upstream service found nothing.
    #[error("{0}")]
    NotFound(String),

    /// A third-party service failed or answered with an unexpected shape.
    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request<S: Into<String>>(msg: S) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::Upstream(_) | ApiError::Internal(_) => 500,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Upstream(e.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(ApiError::bad_request("x").status_code(), 400);
        assert_eq!(ApiError::NotFound("x".into()).status_code(), 404);
        assert_eq!(ApiError::Upstream("x".into()).status_code(), 500);
        assert_eq!(ApiError::Internal("x".into()).status_code(), 500);
    }

    #[test]
    fn display_is_the_bare_message() {
        let e = ApiError::bad_request("Plant name is required");
        assert_eq!(e.to_string(), "Plant name is required");
    }
}
