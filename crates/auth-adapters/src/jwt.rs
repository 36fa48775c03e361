use chrono::Utc;
use domains::{DomainError, IssuedToken, Result, TokenService};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Username.
    sub: String,
    iat: i64,
    exp: i64,
}

/// HS256 bearer tokens carrying the username as subject.
#[derive(Clone)]
pub struct JwtTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl JwtTokenService {
    pub fn new(secret: &[u8], ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs,
        }
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, username: &str) -> Result<IssuedToken> {
        let now = Utc::now().timestamp();
        let claims = Claims { sub: username.to_string(), iat: now, exp: now + self.ttl_secs as i64 };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| DomainError::Internal(format!("failed to sign token: {err}")))?;
        Ok(IssuedToken { token, expires_in_secs: self.ttl_secs })
    }

    fn verify(&self, token: &str) -> Result<String> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims.sub)
            .map_err(|err| {
                tracing::debug!(%err, "bearer token rejected");
                DomainError::Unauthorized("invalid or expired token".into())
            })
    }
}
