//! Two-tier error taxonomy.
//!
//! `ClientError` covers everything a user can correct: a malformed request
//! path, a package the registry does not know, a version specifier nothing
//! satisfies, a file that is not in the tarball. Anything else travels as a
//! plain `anyhow::Error` and is treated as a server fault at the service
//! boundary.

use rama::http::StatusCode;

/// A request failure attributable to the caller, carrying the 4xx status
/// the response should use.
#[derive(Debug, thiserror::Error)]
#[error("{status}: {message}")]
pub struct ClientError {
    pub status: StatusCode,
    pub message: String,
}

impl ClientError {
    /// `status` must be in the 4xx range; anything else is a programming
    /// error, not a client fault.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        debug_assert!(status.is_client_error(), "ClientError requires a 4xx status");
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_status_and_message() {
        let err = ClientError::not_found("package left-pad not found");
        assert_eq!(err.to_string(), "404 Not Found: package left-pad not found");
    }

    #[test]
    fn bad_request_uses_400() {
        let err = ClientError::bad_request("too many '@'s");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn downcasts_from_anyhow() {
        let err: anyhow::Error = ClientError::bad_request("nope").into();
        let client = err.downcast_ref::<ClientError>().unwrap();
        assert_eq!(client.status, StatusCode::BAD_REQUEST);
    }
}
