use axum::{
    Json,
    extract::{Path, Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, MessageResponse, validation};
use crate::services::{AuthSession, CurrentUser, SignupRequest};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct SignupBody {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
    pub password_confirm: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub password: String,
    pub password_confirm: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Authentication middleware that checks:
/// 1. `Authorization: Bearer <token>` header
/// 2. `token` cookie (from login)
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token =
        extract_token(request.headers()).ok_or(crate::services::AuthError::MissingCredential)?;

    let user = state.shared.auth_service.authenticate(&token).await?;

    tracing::Span::current().record("user_id", user.id);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Admin gate; runs behind `require_auth`.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| ApiError::internal("Auth middleware missing"))?;

    if !user.is_admin() {
        return Err(ApiError::forbidden());
    }

    Ok(next.run(request).await)
}

/// Optional authentication for public routes whose response shape depends
/// on the caller's role. A missing or invalid token is not an error.
pub async fn attach_user(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = extract_token(request.headers());
    if let Some(user) = state
        .shared
        .auth_service
        .authenticate_optional(token.as_deref())
        .await
    {
        request.extensions_mut().insert(user);
    }
    next.run(request).await
}

fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    if let Some(cookie_header) = headers.get(header::COOKIE)
        && let Ok(cookie_str) = cookie_header.to_str()
    {
        for pair in cookie_str.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=')
                && name == "token"
                && !value.is_empty()
            {
                return Some(value.to_string());
            }
        }
    }

    None
}

fn session_cookie(token: &str, ttl_days: i64) -> String {
    let mut cookie = format!(
        "token={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        ttl_days * 86_400
    );
    if !cfg!(debug_assertions) {
        cookie.push_str("; Secure");
    }
    cookie
}

fn session_response(session: AuthSession, ttl_days: i64) -> Response {
    let cookie = session_cookie(&session.token, ttl_days);
    (
        [(header::SET_COOKIE, cookie)],
        Json(ApiResponse::success(session)),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/signup
/// Create a customer account and log it in. The role is never taken from
/// the request body.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SignupBody>,
) -> Result<Response, ApiError> {
    validation::validate_required("Name", &payload.name)?;
    validation::validate_email(&payload.email)?;

    let session = state
        .shared
        .auth_service
        .signup(SignupRequest {
            name: payload.name,
            email: payload.email,
            password: payload.password,
            password_confirm: payload.password_confirm,
        })
        .await?;

    tracing::info!(user_id = session.user.id, "New account created");

    Ok(session_response(
        session,
        state.shared.config.auth.session_ttl_days,
    ))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Please provide email and password"));
    }

    let session = state
        .shared
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;

    Ok(session_response(
        session,
        state.shared.config.auth.session_ttl_days,
    ))
}

/// POST /auth/logout
/// Overwrites the session cookie with a short-lived placeholder.
pub async fn logout() -> impl IntoResponse {
    let cookie = "token=loggedout; Path=/; HttpOnly; Max-Age=10".to_string();
    (
        [(header::SET_COOKIE, cookie)],
        Json(ApiResponse::success(MessageResponse::new("Logged out"))),
    )
}

/// POST /auth/forgot-password
/// Always answers with the same message so the endpoint cannot be used to
/// probe which emails have accounts.
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    validation::validate_email(&payload.email)?;

    let reset_url_base = reset_url_base(&state);
    state
        .shared
        .auth_service
        .forgot_password(&payload.email, &reset_url_base)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "If that email has an account, a reset link is on its way",
    ))))
}

/// PATCH /auth/reset-password/{token}
/// Consumes the emailed token and logs the user in with the new password.
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Response, ApiError> {
    let session = state
        .shared
        .auth_service
        .reset_password(&token, &payload.password, &payload.password_confirm)
        .await?;

    Ok(session_response(
        session,
        state.shared.config.auth.session_ttl_days,
    ))
}

/// PATCH /auth/password
/// Authenticated password change; returns a fresh session because the old
/// token is stale the moment the password changes.
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Response, ApiError> {
    let session = state
        .shared
        .auth_service
        .update_password(
            user.id,
            &payload.current_password,
            &payload.password,
            &payload.password_confirm,
        )
        .await?;

    tracing::info!(user_id = user.id, "Password changed");

    Ok(session_response(
        session,
        state.shared.config.auth.session_ttl_days,
    ))
}

fn reset_url_base(state: &AppState) -> String {
    let base = state.shared.config.email.public_base_url.trim_end_matches('/');
    if base.is_empty() {
        format!(
            "http://localhost:{}/api/auth/reset-password",
            state.shared.config.server.port
        )
    } else {
        format!("{base}/api/auth/reset-password")
    }
}
