//! `/api/auth`: registration, login, token refresh, current user.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use foodie_core::validation::{validate_email, validate_name, validate_password, validate_username};
use foodie_core::User;

use crate::accounts::NewAccount;
use crate::auth::{AuthUser, TokenPair};
use crate::error::{ApiError, ApiResult};
use crate::state::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/me", get(me))
        .route("/logout", post(logout))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    /// Full name; the first word becomes the first name.
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub password: String,
}

impl RegisterRequest {
    fn into_account(self) -> ApiResult<NewAccount> {
        validate_username(&self.username)?;
        validate_name("name", &self.name)?;
        validate_email(&self.email)?;
        validate_password(&self.password)?;

        let mut parts = self.name.split_whitespace();
        let first_name = parts.next().unwrap_or_default().to_string();
        let last_name = parts.collect::<Vec<_>>().join(" ");

        Ok(NewAccount {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_ascii_lowercase(),
            password: self.password,
            first_name,
            last_name,
            phone: self
                .phone
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: User,
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub message: &'static str,
}

async fn register(
    State(state): State<SharedState>,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let account = body.into_account()?;
    let user = state.accounts.register(account).await?;
    let tokens = state.jwt.issue_pair(&user)?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            user,
            tokens,
            message: "User created successfully",
        }),
    ))
}

async fn login(
    State(state): State<SharedState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let user = state.accounts.login(&body.email, &body.password).await?;
    let tokens = state.jwt.issue_pair(&user)?;

    info!(user_id = %user.id, role = user.role.as_str(), "Login successful");

    Ok(Json(SessionResponse {
        user,
        tokens,
        message: "Login successful",
    }))
}

/// Swaps a refresh token for a new pair. The account must still exist.
async fn refresh(
    State(state): State<SharedState>,
    Json(body): Json<RefreshRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let claims = state.jwt.validate_refresh_token(&body.refresh_token)?;

    let user = state
        .accounts
        .find_user(&claims.sub)
        .await?
        .ok_or_else(|| ApiError::AuthFailed("Account no longer exists".to_string()))?;

    let tokens = state.jwt.issue_pair(&user)?;

    Ok(Json(SessionResponse {
        user,
        tokens,
        message: "Token refreshed",
    }))
}

async fn me(State(state): State<SharedState>, auth: AuthUser) -> ApiResult<Json<Value>> {
    let user = state
        .accounts
        .find_user(&auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    Ok(Json(json!({ "user": user })))
}

/// Tokens are stateless; the client drops them.
async fn logout(auth: AuthUser) -> Json<Value> {
    info!(user_id = %auth.user_id, "Logout");
    Json(json!({ "message": "Logged out" }))
}
