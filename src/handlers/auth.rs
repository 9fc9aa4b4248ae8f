// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{AuthResponse, CreateUserRequest, LoginRequest, USER_COLUMNS, User},
    utils::{
        hash::{hash_password, verify_password},
        jwt::{ROLE_USER, sign_jwt},
    },
};

const INVALID_CREDENTIALS: &str = "Invalid username or password.";

/// Registers a new user and logs them in.
///
/// Returns 201 Created with a bearer token, or 409 if the username is taken.
pub async fn register(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let existing = find_by_username(&pool, &payload.username).await?;
    if existing.is_some() {
        return Err(AppError::Conflict("User already exists.".to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;

    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (username, password, first_name, last_name, role)
         VALUES (?, ?, ?, ?, ?)
         RETURNING {USER_COLUMNS}"
    ))
    .bind(&payload.username)
    .bind(&hashed_password)
    .bind(payload.first_name.trim())
    .bind(payload.last_name.trim())
    .bind(ROLE_USER)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        // Lost a race against a concurrent registration of the same name.
        if e.as_database_error().is_some_and(|d| d.is_unique_violation()) {
            AppError::Conflict("User already exists.".to_string())
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    tracing::info!(user_id = user.id, "Registered user {}", user.username);

    let token = sign_jwt(
        user.id,
        &user.username,
        &user.role,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok((StatusCode::CREATED, Json(AuthResponse::bearer(token, user))))
}

/// Authenticates a user and returns a JWT token.
///
/// Unknown usernames and wrong passwords are indistinguishable to the client.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = find_by_username(&pool, &payload.username)
        .await?
        .ok_or_else(|| AppError::AuthError(INVALID_CREDENTIALS.to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError(INVALID_CREDENTIALS.to_string()));
    }

    let token = sign_jwt(
        user.id,
        &user.username,
        &user.role,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(AuthResponse::bearer(token, user)))
}

async fn find_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>, AppError> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"))
        .bind(username)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!("User lookup failed: {:?}", e);
            AppError::from(e)
        })
}
