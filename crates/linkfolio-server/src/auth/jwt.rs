use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use linkfolio_core::session::{Session, SessionVerifier};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Owner id of the profile this session manages.
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

/// Encode a session token for `owner_id`.
///
/// Returns (token_string, expires_at_rfc3339).
pub fn encode_jwt(secret: &str, owner_id: &str, session_days: u32) -> Result<(String, String)> {
    let now = Utc::now();
    let exp = now + Duration::days(session_days as i64);

    let claims = Claims {
        sub: owner_id.to_string(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| anyhow!("encode_jwt: {}", e))?;

    Ok((token, exp.to_rfc3339()))
}

/// Decode and validate a session token.
pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| anyhow!("decode_jwt: {}", e))?;

    Ok(data.claims)
}

/// HMAC-signed session tokens.
pub struct JwtSessionVerifier {
    secret: String,
}

impl JwtSessionVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn issue(&self, owner_id: &str, session_days: u32) -> Result<(String, String)> {
        encode_jwt(&self.secret, owner_id, session_days)
    }
}

impl SessionVerifier for JwtSessionVerifier {
    fn verify(&self, token: &str) -> Result<Session> {
        let claims = decode_jwt(token, &self.secret)?;
        if claims.sub.trim().is_empty() {
            return Err(anyhow!("session token has no owner"));
        }
        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| anyhow!("session token expiry out of range"))?;
        Ok(Session::new(claims.sub, expires_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies_to_owner_session() {
        let verifier = JwtSessionVerifier::new("test-secret");
        let (token, _) = verifier.issue("owner_1", 7).unwrap();
        let session = verifier.verify(&token).unwrap();
        assert_eq!(session.owner_id, "owner_1");
        assert!(session.is_active(Utc::now()));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let (token, _) = encode_jwt("other-secret", "owner_1", 7).unwrap();
        let verifier = JwtSessionVerifier::new("test-secret");
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        let verifier = JwtSessionVerifier::new("test-secret");
        assert!(verifier.verify("not-a-jwt").is_err());
    }
}
