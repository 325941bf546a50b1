use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64ct::{Base64, Encoding};
use tracing::warn;

use super::{
    dto::{ErrorResponse, PublicUser},
    error::AuthError,
    services,
};
use crate::state::AppState;

pub const BASIC_REALM: &str = "Basic realm=\"agrimon\"";

/// Verifies HTTP Basic credentials (`email:password`) on every request.
pub struct BasicUser(pub PublicUser);

/// Splits an `Authorization: Basic ...` value into email and password.
pub(crate) fn parse_basic(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = Base64::decode_vec(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (email, password) = decoded.split_once(':')?;
    Some((email.to_string(), password.to_string()))
}

fn challenge(message: &str) -> Response {
    let mut res = (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            success: false,
            error: message.to_string(),
        }),
    )
        .into_response();
    let realm = HeaderValue::from_static(BASIC_REALM);
    res.headers_mut().insert(header::WWW_AUTHENTICATE, realm);
    res
}

#[async_trait]
impl FromRequestParts<AppState> for BasicUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| challenge("missing Authorization header"))?;

        let (email, password) = parse_basic(auth).ok_or_else(|| {
            warn!("malformed basic auth header");
            challenge("invalid auth scheme")
        })?;

        let store = state.users.as_ref();
        match services::login(store, &email, &password).await {
            Ok(user) => Ok(BasicUser(user)),
            Err(AuthError::InvalidCredentials) => {
                Err(challenge(super::error::INVALID_CREDENTIALS_MESSAGE))
            }
            Err(e) => Err(e.into_response()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(raw: &str) -> String {
        format!("Basic {}", Base64::encode_string(raw.as_bytes()))
    }

    #[test]
    fn parses_email_and_password() {
        let (email, password) = parse_basic(&encode("a@x.com:Abcdefgh")).unwrap();
        assert_eq!(email, "a@x.com");
        assert_eq!(password, "Abcdefgh");
    }

    #[test]
    fn password_may_contain_colons() {
        let (email, password) = parse_basic(&encode("a@x.com:Ab:cd:ef")).unwrap();
        assert_eq!(email, "a@x.com");
        assert_eq!(password, "Ab:cd:ef");
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let value = encode("a@x.com:pw").replacen("Basic", "basic", 1);
        assert!(parse_basic(&value).is_some());
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        assert!(parse_basic("Bearer abc.def.ghi").is_none());
        assert!(parse_basic("Basic !!!not-base64!!!").is_none());
        assert!(parse_basic(&encode("no-colon-here")).is_none());
        assert!(parse_basic("Basic").is_none());
    }
}
