// Service-account authentication: load the JSON key, sign an RS256
// assertion and trade it for a bearer token at the key's token endpoint.
// The token is fetched once per run and never refreshed.

use crate::config::READONLY_SCOPE;
use crate::error::DriveError;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Fields of a Google service-account key file that authentication needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub token_uri: String,
}

// Keep the private key out of logs.
impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self, DriveError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DriveError::Credentials(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, DriveError> {
        serde_json::from_str(raw).map_err(|e| DriveError::Credentials(e.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Build the signed JWT presented to the token endpoint.
pub fn signed_assertion(key: &ServiceAccountKey, issued_at: i64) -> Result<String, DriveError> {
    let claims = Claims {
        iss: &key.client_email,
        scope: READONLY_SCOPE,
        aud: &key.token_uri,
        iat: issued_at,
        exp: issued_at + ASSERTION_LIFETIME_SECS,
    };
    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();
    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
    Ok(encode(&header, &claims, &signing_key)?)
}

/// Exchange a freshly signed assertion for an access token.
pub fn fetch_access_token(client: &Client, key: &ServiceAccountKey) -> Result<String, DriveError> {
    let assertion = signed_assertion(key, chrono::Utc::now().timestamp())?;
    debug!(token_uri = %key.token_uri, account = %key.client_email, "requesting access token");

    let res = client
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()?;
    if !res.status().is_success() {
        let status = res.status();
        let txt = res.text().unwrap_or_default();
        return Err(DriveError::from_response(status, &txt));
    }
    let token: TokenResponse = serde_json::from_str(&res.text()?)?;
    Ok(token.access_token)
}
