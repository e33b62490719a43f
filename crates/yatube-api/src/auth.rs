use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;

use yatube_types::api::{AuthResponse, FormErrors, LoginRequest, SignupRequest};

use crate::error::ApiError;
use crate::middleware::create_token;
use crate::state::{AppState, with_db};

const MAX_USERNAME_LEN: usize = 150;
const MIN_PASSWORD_LEN: usize = 8;

/// First path segments owned by the router. A user with one of these names
/// would have an unreachable profile.
const RESERVED_USERNAMES: &[&str] = &[
    "new", "follow", "group", "auth", "admin", "media", "static", "about",
];

pub fn validate_signup(req: &SignupRequest) -> FormErrors {
    let mut errors = FormErrors::default();

    let name = req.username.as_str();
    if name.is_empty() {
        errors.add("username", "This field is required.");
    } else if name.chars().count() > MAX_USERNAME_LEN {
        errors.add("username", "Ensure this value has at most 150 characters.");
    } else if !name
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    } else if RESERVED_USERNAMES.contains(&name.to_lowercase().as_str()) {
        errors.add("username", "This username is reserved.");
    }

    if req.password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            "password",
            "This password is too short. It must contain at least 8 characters.",
        );
    }

    errors
}

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let errors = validate_signup(&req);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();

    let username = req.username.clone();
    let user_id = with_db(&state, move |db| db.create_user(&username, &password_hash))
        .await?
        .ok_or(ApiError::Conflict("username already taken"))?;

    let token = create_token(&state.jwt_secret, user_id, &req.username)?;

    info!("New user {} (id {})", req.username, user_id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user_id,
            username: req.username,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.clone();
    let user = with_db(&state, move |db| db.get_user_by_username(&username))
        .await?
        .ok_or(ApiError::Unauthorized)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| anyhow::anyhow!("stored hash for {} is corrupt: {}", user.username, e))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    let token = create_token(&state.jwt_secret, user.id, &user.username)?;

    Ok(Json(AuthResponse {
        user_id: user.id,
        username: user.username,
        token,
    }))
}
