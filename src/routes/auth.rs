use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::middleware::auth::{issue_token, TOKEN_TTL_SECS};
use crate::services::password::verify_password;
use crate::state::AppState;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub expires_in: i64,
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = state.users.find_user_by_email(&payload.email).await?;

    let user = match user {
        Some(user) if verify_password(&payload.password, &user.password_hash) => user,
        _ => {
            tracing::info!(email = %payload.email, "login rejected");
            return Err(AppError::Unauthorized("Invalid email or password".to_string()));
        }
    };

    let access_token = issue_token(&state.jwt_secret, user.id)
        .map_err(|e| AppError::InternalServerError(format!("token encoding failed: {}", e)))?;

    tracing::info!(user_id = %user.id, "login successful");
    Ok(Json(LoginResponse {
        access_token,
        expires_in: TOKEN_TTL_SECS,
    }))
}
