use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::debug;

use yatube_types::api::Claims;

use crate::error::{ApiError, found};
use crate::state::{AppState, with_db};

pub const LOGIN_URL: &str = "/auth/login/";

const TOKEN_LIFETIME_DAYS: i64 = 30;

/// Characters left as-is in the `next` query value
const NEXT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Login URL that sends the user back to `next` afterwards.
pub fn login_url(next: &str) -> String {
    format!("{LOGIN_URL}?next={}", utf8_percent_encode(next, NEXT_SET))
}

pub fn create_token(secret: &str, user_id: i64, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_LIFETIME_DAYS)).timestamp()
            as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

enum Credentials {
    Missing,
    Invalid,
    Valid(Claims),
}

fn read_credentials(headers: &HeaderMap, secret: &str) -> Credentials {
    let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() else {
        return Credentials::Missing;
    };

    match decode::<Claims>(
        bearer.token(),
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    ) {
        Ok(data) => Credentials::Valid(data.claims),
        Err(e) => {
            debug!("Rejected bearer token: {}", e);
            Credentials::Invalid
        }
    }
}

/// Guards pages that need a logged-in user. Anonymous requests are sent to
/// the login page with a `next` pointer back; a bad token is a 401.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let claims = match read_credentials(req.headers(), &state.jwt_secret) {
        Credentials::Valid(claims) => claims,
        Credentials::Invalid => return ApiError::Unauthorized.into_response(),
        Credentials::Missing => {
            let next_path = req.uri().path_and_query().map_or("/", |pq| pq.as_str());
            return found(&login_url(next_path));
        }
    };

    // Tokens outlive deleted accounts
    let user_id = claims.sub;
    match with_db(&state, move |db| db.get_user_by_id(user_id)).await {
        Ok(Some(_)) => {}
        Ok(None) => return ApiError::Unauthorized.into_response(),
        Err(e) => return e.into_response(),
    }

    req.extensions_mut().insert(claims);
    next.run(req).await
}

/// Attaches claims when a valid token is present; anything else is anonymous.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Credentials::Valid(claims) = read_credentials(req.headers(), &state.jwt_secret) {
        req.extensions_mut().insert(claims);
    }
    next.run(req).await
}
