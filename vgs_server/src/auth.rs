//! Bearer credential handling.
//!
//! Access tokens are HS256 JWTs carrying the buyer id and tier. [`JwtClaims`] doubles as an
//! actix extractor, so any handler that takes a `JwtClaims` argument is only reachable with a
//! valid, unexpired token in the `Authorization` header.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use serde::{Deserialize, Serialize};
use vgs_engine::db_types::CallerIdentity;

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The buyer id. Absent for guest tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub tier: String,
    pub exp: i64,
}

impl JwtClaims {
    pub fn identity(&self) -> CallerIdentity {
        CallerIdentity { buyer_id: self.sub.clone(), tier: self.tier.clone().into() }
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_claims(req))
    }
}

fn extract_claims(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    let verifier = req
        .app_data::<web::Data<TokenVerifier>>()
        .ok_or_else(|| ServerError::InitializeError("No token verifier is configured".to_string()))?;
    let header = req.headers().get(header::AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let header = header.to_str().map_err(|_| AuthError::PoorlyFormattedHeader)?;
    let token = header.strip_prefix("Bearer ").ok_or(AuthError::PoorlyFormattedHeader)?;
    let claims = verifier.verify(token)?;
    Ok(claims)
}

pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        // The default validation rejects expired tokens.
        let validation = Validation::new(Algorithm::HS256);
        Self { decoding_key, validation }
    }

    pub fn verify(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            debug!("💻️ Token failed verification. {e}");
            AuthError::InvalidToken(e.to_string())
        })?;
        Ok(data.claims)
    }
}

/// Issues access tokens. Used by operator tooling and tests; the storefront itself only
/// verifies.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { encoding_key: EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes()) }
    }

    pub fn issue_token(
        &self,
        buyer_id: Option<String>,
        tier: &str,
        expiry: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = JwtClaims { sub: buyer_id, tier: tier.to_string(), exp: expiry.timestamp() };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}
