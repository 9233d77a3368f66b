// src/handlers/auth.rs

use axum::{extract::{rejection::JsonRejection, State}, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{AuthResponse, AuthUser, LoginPayload},
};

// POST /api/login
#[utoipa::path(
    post,
    path = "/api/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Token emitido", body = AuthResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 401, description = "Usuário ou senha inválidos")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    payload: Result<Json<LoginPayload>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let username = payload.username.trim();
    let token = app_state.auth_service.login_user(username, &payload.password).await?;

    tracing::info!(username, "Login bem-sucedido");

    Ok(Json(AuthResponse { token, username: username.to_string() }))
}

// GET /api/me
#[utoipa::path(
    get,
    path = "/api/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Usuário do token", body = AuthUser),
        (status = 401, description = "Token ausente ou inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> Json<AuthUser> {
    Json(user)
}
