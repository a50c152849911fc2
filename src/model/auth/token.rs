use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{errors::Error as JwtError, DecodingKey, TokenData, Validation};
use rocket::{
    http::{Cookie, Status},
    request::{self, FromRequest},
    Request,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::common::election::VoterId;
use crate::Config;

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

/// Proof that the request comes from a specific, already-authenticated voter.
///
/// Tokens are issued by the authentication service; this server only checks
/// the signature and expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    #[serde(rename = "sub")]
    voter_id: VoterId,
}

impl AuthToken {
    /// Get the voter ID.
    pub fn voter_id(&self) -> VoterId {
        self.voter_id
    }

    /// Deserialize a token from a cookie.
    pub fn from_cookie(cookie: &Cookie<'_>, config: &Config) -> Result<Self, JwtError> {
        jsonwebtoken::decode(
            cookie.value(),
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|data: TokenData<Claims>| data.claims.token)
    }
}

/// Cookie claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    token: AuthToken,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No auth token presented")]
    Missing,
    #[error("Invalid auth token: {0}")]
    Invalid(#[from] JwtError),
    #[error("Server configuration unavailable")]
    NoConfig,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthToken {
    type Error = AuthError;

    /// Get an AuthToken from the cookie and verify it.
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let config = match req.rocket().state::<Config>() {
            Some(config) => config,
            None => {
                return request::Outcome::Failure((Status::InternalServerError, AuthError::NoConfig))
            }
        };
        let cookie = match req.cookies().get(AUTH_TOKEN_COOKIE) {
            Some(cookie) => cookie,
            None => return request::Outcome::Failure((Status::Unauthorized, AuthError::Missing)),
        };

        match Self::from_cookie(cookie, config) {
            Ok(token) => request::Outcome::Success(token),
            Err(e) => {
                debug!("Rejected auth token: {e}");
                request::Outcome::Failure((Status::Unauthorized, e.into()))
            }
        }
    }
}
