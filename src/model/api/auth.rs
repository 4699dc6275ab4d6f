use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use rocket::{
    http::{Cookie, SameSite, Status},
    request::{FromRequest, Outcome},
    time::Duration,
    Request, State,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";
pub const AUTH_TOKEN_HEADER: &str = "X-Admin-Token";

const ADMIN_SUBJECT: &str = "admin";

/// An authentication token granting admin rights. Delegates identify by
/// credential alone and never hold one.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthToken {
    #[serde(rename = "sub")]
    subject: String,
}

impl AuthToken {
    /// Create a new admin token.
    pub fn admin() -> Self {
        Self {
            subject: ADMIN_SUBJECT.to_string(),
        }
    }

    /// Does this token grant admin rights?
    pub fn is_admin(&self) -> bool {
        self.subject == ADMIN_SUBJECT
    }

    #[allow(clippy::missing_panics_doc)]
    /// Encode this token as a signed JWT.
    pub fn encode(self, config: &Config) -> String {
        let claims = Claims {
            token: self,
            expire_at: Utc::now() + config.auth_ttl(),
        };

        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )
        .expect("JWT encoding is infallible with default settings")
    }

    /// Decode and verify a JWT.
    pub fn decode(token: &str, config: &Config) -> Result<Self, Error> {
        let token = jsonwebtoken::decode(
            token,
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims>| claims.claims.token)?;
        Ok(token)
    }

    /// Build the cookie carrying an encoded token.
    pub fn cookie(encoded: String, config: &Config) -> Cookie<'static> {
        Cookie::build(AUTH_TOKEN_COOKIE, encoded)
            .max_age(Duration::seconds(config.auth_ttl().num_seconds()))
            .http_only(true)
            .same_site(SameSite::Strict)
            .path("/")
            .finish()
    }
}

/// Token claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    token: AuthToken,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthToken {
    type Error = Error;

    /// Get an [`AuthToken`] from the header or cookie and verify that it grants admin rights.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // Unwrap is safe as `Config` is always managed.
        let config = req.guard::<&State<Config>>().await.unwrap();

        let raw = match req.headers().get_one(AUTH_TOKEN_HEADER) {
            Some(header) => header.to_string(),
            None => match req.cookies().get(AUTH_TOKEN_COOKIE) {
                Some(cookie) => cookie.value().to_string(),
                None => {
                    return Outcome::Failure((
                        Status::Unauthorized,
                        Error::Unauthorized("no admin token".to_string()),
                    ))
                }
            },
        };

        match Self::decode(&raw, config) {
            Ok(token) if token.is_admin() => Outcome::Success(token),
            Ok(_) => Outcome::Failure((
                Status::Unauthorized,
                Error::Unauthorized("token does not grant admin rights".to_string()),
            )),
            Err(e) => Outcome::Failure((Status::Unauthorized, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode() {
        let config = Config::example();
        let encoded = AuthToken::admin().encode(&config);
        let token = AuthToken::decode(&encoded, &config).unwrap();
        assert!(token.is_admin());

        // Tampered tokens are rejected.
        let mut tampered = encoded.clone();
        tampered.push('x');
        assert!(AuthToken::decode(&tampered, &config).is_err());
    }
}
