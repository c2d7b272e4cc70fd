use crate::common::ApiError;
use crate::config::AuthorizeConfig;
use crate::state::AppState;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde_json::{Map, Value};
use thiserror::Error;

/// The verified caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityError {
    #[error("no valid bearer token provided")]
    Unauthenticated,
    #[error("token does not carry a usable email claim")]
    MalformedIdentity,
}

impl IntoResponse for IdentityError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

pub struct TokenVerifier {
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &AuthorizeConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        Self {
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<Identity, IdentityError> {
        let data = decode::<Map<String, Value>>(token, &self.decoding, &self.validation)
            .map_err(|err| {
                tracing::debug!("Rejected bearer token: {}", err);
                IdentityError::Unauthenticated
            })?;
        match data.claims.get("email") {
            Some(Value::String(email)) if !email.is_empty() => Ok(Identity {
                email: email.clone(),
            }),
            _ => Err(IdentityError::MalformedIdentity),
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|it| it.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("Bearer"))
        .map(|(_, token)| token.trim())
        .filter(|it| !it.is_empty())
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = IdentityError;
    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(IdentityError::Unauthenticated)?;
        AppState::from_ref(state).verifier.verify(token)
    }
}

/// Signs a token the way the identity provider would. Test only.
#[cfg(test)]
pub(crate) fn issue(config: &AuthorizeConfig, claims: Value) -> String {
    use jsonwebtoken::{EncodingKey, Header, encode};
    let mut claims = claims;
    if let Value::Object(map) = &mut claims {
        map.entry("iss")
            .or_insert_with(|| Value::String(config.issuer.clone()));
        map.entry("exp")
            .or_insert_with(|| Value::from(chrono::Utc::now().timestamp() + 3600));
    }
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .unwrap()
}
