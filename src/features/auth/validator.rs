use super::model::GoogleIdentity;
use crate::core::config::AuthConfig;
use crate::core::error::AppError;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde::Deserialize;
use std::sync::Arc;

use super::jwks::JwksClient;

/// Validates Google-issued ID tokens presented as bearer tokens
pub struct JwtValidator {
    jwks_client: Arc<JwksClient>,
    issuers: Vec<String>,
    audience: String,
    leeway: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<bool>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl JwtValidator {
    pub fn new(jwks_client: Arc<JwksClient>, config: &AuthConfig) -> Self {
        Self {
            jwks_client,
            issuers: config.issuers.clone(),
            audience: config.google_client_id.clone(),
            leeway: config.jwt_leeway.as_secs(),
        }
    }

    pub async fn validate_token(&self, token: &str) -> Result<GoogleIdentity, AppError> {
        let header = decode_header(token).map_err(|e| AppError::Unauthorized(e.to_string()))?;

        if header.alg != Algorithm::RS256 {
            return Err(AppError::Unauthorized(format!(
                "Unsupported algorithm: {:?}. Only RS256 is allowed",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| AppError::Unauthorized("Missing kid in token header".to_string()))?;

        let decoding_key = self
            .jwks_client
            .get_key(&kid)
            .await
            .map_err(|e| AppError::Unauthorized(e.to_string()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(self.issuers.as_slice());
        validation.set_audience(&[&self.audience]);
        validation.leeway = self.leeway;

        let token_data = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|e| AppError::Unauthorized(e.to_string()))?;

        identity_from_claims(token_data.claims)
    }
}

fn identity_from_claims(claims: Claims) -> Result<GoogleIdentity, AppError> {
    let email = claims
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Token does not carry an email".to_string()))?;

    // Google omits the flag for some workspace accounts; only an explicit false is rejected
    if claims.email_verified == Some(false) {
        return Err(AppError::Unauthorized("Email address is not verified".to_string()));
    }

    Ok(GoogleIdentity {
        sub: claims.sub,
        email: email.to_lowercase(),
        name: claims.name,
        given_name: claims.given_name,
        family_name: claims.family_name,
        picture: claims.picture,
    })
}
