//! `/auth/*` handlers.

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

use crate::accounts::AuthSession;
use crate::dto::{
    LoginRequest, MessageResponse, RefreshRequest, RegisterRequest, SessionResponse,
    TokenPairResponse, VerifyResponse,
};
use crate::error::AuthError;
use crate::routes::AppState;

fn session_response(message: &str, session: AuthSession) -> SessionResponse {
    SessionResponse {
        message: message.to_string(),
        user: session.user,
        access_token: session.tokens.access_token,
        refresh_token: session.tokens.refresh.token,
    }
}

/// `POST /auth/register`
pub async fn register(
    State(state): State<AppState>,
    body: Option<Json<RegisterRequest>>,
) -> Result<impl IntoResponse, AuthError> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let session = state.accounts.register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(session_response("User registered successfully", session)),
    ))
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<AppState>,
    body: Option<Json<LoginRequest>>,
) -> Result<Json<SessionResponse>, AuthError> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let session = state.accounts.login(request).await?;

    Ok(Json(session_response("Login successful", session)))
}

/// `POST /auth/refresh`
pub async fn refresh(
    State(state): State<AppState>,
    body: Option<Json<RefreshRequest>>,
) -> Result<Json<TokenPairResponse>, AuthError> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let pair = state.accounts.refresh(request).await?;

    Ok(Json(TokenPairResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh.token,
    }))
}

/// `GET /auth/verify`
pub async fn verify(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<VerifyResponse>, AuthError> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let user = state.accounts.verify(authorization)?;

    Ok(Json(VerifyResponse { valid: true, user }))
}

/// `POST /auth/logout`
pub async fn logout(
    State(state): State<AppState>,
    body: Option<Json<RefreshRequest>>,
) -> Result<Json<MessageResponse>, AuthError> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    state.accounts.logout(request).await?;

    Ok(Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    }))
}
