use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use domains::{Actor, User};
use serde::{Deserialize, Serialize};
use services::NewAccount;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

/// Exchanges credentials for a bearer token.
pub async fn issue_token(
    State(state): State<AppState>,
    Json(login): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let issued = state.accounts.login(&login.username, &login.password).await?;
    Ok(Json(TokenResponse {
        access_token: issued.token,
        token_type: "Bearer",
        expires_in: issued.expires_in_secs,
    }))
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_staff: bool,
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    tracing::info!(by = %actor.username, username = %req.username, "creating user");
    let user = state
        .accounts
        .create_user(NewAccount {
            username: req.username,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            is_staff: req.is_staff,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}
