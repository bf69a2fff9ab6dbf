// Error type shared by the resolver, the fetcher and the HTTP client.
// The binary wraps these in `anyhow` for startup failures; the library
// keeps them typed so callers can tell "nothing matched" apart from
// "the request failed".

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("drive api returned {status}: {message}")]
    Api { status: StatusCode, message: String },
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid service account key: {0}")]
    Credentials(String),
    #[error("could not sign token assertion: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("download of {file_id} stopped at {received} of {total} bytes")]
    Truncated {
        file_id: String,
        received: u64,
        total: u64,
    },
    #[error("chunk starts at byte {got}, expected at most {expected}")]
    UnexpectedOffset { expected: u64, got: u64 },
    #[error("download cannot move from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}

impl DriveError {
    /// Turn a non-success response body into an `Api` error. Google wraps
    /// failures as `{"error": {"message": ...}}`; anything else is kept
    /// verbatim.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        #[derive(serde::Deserialize)]
        struct Envelope {
            error: Inner,
        }
        #[derive(serde::Deserialize)]
        struct Inner {
            message: String,
        }

        let message = serde_json::from_str::<Envelope>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.trim().to_string());
        DriveError::Api { status, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_prefers_google_envelope_message() {
        let body = r#"{"error":{"code":404,"message":"File not found: abc.","errors":[]}}"#;
        match DriveError::from_response(StatusCode::NOT_FOUND, body) {
            DriveError::Api { status, message } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(message, "File not found: abc.");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn api_error_falls_back_to_raw_body() {
        let err = DriveError::from_response(StatusCode::BAD_GATEWAY, "  upstream down\n");
        assert_eq!(err.to_string(), "drive api returned 502 Bad Gateway: upstream down");
    }
}
