use std::time::Duration;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{auth::cookie::extract_cookie, config::JwtConfig, error::ApiError, state::AppState};

/// Cookie carrying the session token.
pub const TOKEN_COOKIE: &str = "token";

/// Session token payload: the owning customer and the validity window.
/// Stateless by design, nothing is looked up server-side on verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub session_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
            cookie_expire_days,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            session_ttl: Duration::from_secs((cookie_expire_days as u64) * 24 * 60 * 60),
        }
    }
}

impl JwtKeys {
    pub fn sign_session(&self, customer_id: Uuid) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.session_ttl.as_secs() as i64);
        let claims = Claims {
            sub: customer_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(customer_id = %customer_id, "session token signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(customer_id = %data.claims.sub, "session token verified");
        Ok(data.claims)
    }
}

/// Extracts the acting customer from a verified session token. The token is
/// read from the `Authorization: Bearer` header or, failing that, the `token`
/// cookie set at login. This is the only identity source handlers trust.
pub struct AuthCustomer(pub Uuid);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthCustomer
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);

        let bearer = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|t| t.to_string());

        let token = bearer
            .or_else(|| extract_cookie(&parts.headers, TOKEN_COOKIE))
            .ok_or_else(|| ApiError::Auth("Not authorized to access this route".into()))?;

        match keys.verify(&token) {
            Ok(claims) => Ok(AuthCustomer(claims.sub)),
            Err(_) => {
                warn!("invalid or expired session token");
                Err(ApiError::Auth("Invalid or expired token".into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys() -> JwtKeys {
        let state = AppState::fake();
        JwtKeys::from_ref(&state)
    }

    #[tokio::test]
    async fn sign_and_verify_session_token() {
        let keys = make_keys();
        let customer_id = Uuid::new_v4();
        let token = keys.sign_session(customer_id).expect("sign session");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, customer_id);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
    }

    #[tokio::test]
    async fn expiry_matches_the_configured_day_count() {
        let keys = make_keys();
        let token = keys.sign_session(Uuid::new_v4()).expect("sign session");
        let claims = keys.verify(&token).expect("verify token");
        // fake() configures 30 days
        assert_eq!(claims.exp - claims.iat, 30 * 24 * 60 * 60);
    }

    #[tokio::test]
    async fn missing_token_is_rejected_with_a_json_401() {
        use axum::{body::Body, routing::get, Router};
        use tower::ServiceExt;

        let app = Router::new()
            .route(
                "/protected",
                get(|AuthCustomer(id): AuthCustomer| async move { id.to_string() }),
            )
            .with_state(AppState::fake());

        let res = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/protected")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(res.status(), axum::http::StatusCode::UNAUTHORIZED);
        let content_type = res
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("application/json"));
        let body = axum::body::to_bytes(res.into_body(), 1024).await.expect("body");
        let parsed: serde_json::Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(parsed["message"], "Not authorized to access this route");
    }

    #[tokio::test]
    async fn cookie_token_authenticates_a_request() {
        use axum::{body::Body, routing::get, Router};
        use tower::ServiceExt;

        let state = AppState::fake();
        let customer_id = Uuid::new_v4();
        let token = JwtKeys::from_ref(&state)
            .sign_session(customer_id)
            .expect("sign session");

        let app = Router::new()
            .route(
                "/protected",
                get(|AuthCustomer(id): AuthCustomer| async move { id.to_string() }),
            )
            .with_state(state);

        let res = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/protected")
                    .header(axum::http::header::COOKIE, format!("token={token}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(res.status(), axum::http::StatusCode::OK);
        let body = axum::body::to_bytes(res.into_body(), 1024).await.expect("body");
        assert_eq!(&body[..], customer_id.to_string().as_bytes());
    }

    #[tokio::test]
    async fn verify_rejects_a_tampered_token() {
        let keys = make_keys();
        let mut token = keys.sign_session(Uuid::new_v4()).expect("sign session");
        token.push('x');
        assert!(keys.verify(&token).is_err());
    }

    #[tokio::test]
    async fn verify_rejects_a_foreign_secret() {
        let keys = make_keys();
        let other = JwtKeys {
            encoding: EncodingKey::from_secret(b"other-secret"),
            decoding: DecodingKey::from_secret(b"other-secret"),
            issuer: keys.issuer.clone(),
            audience: keys.audience.clone(),
            session_ttl: keys.session_ttl,
        };
        let token = other.sign_session(Uuid::new_v4()).expect("sign session");
        assert!(keys.verify(&token).is_err());
    }
}
