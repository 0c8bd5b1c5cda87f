//! Sign-in and sign-out.
//!
//! - `POST /api/login`: unauthenticated; trades credentials for a token
//! - `POST /api/logout`: revokes the caller's token

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{success, ApiContext, SessionContext, Success};
use crate::identity;
use crate::models::User;
use crate::navigation::{menu_for, MenuEntry, View};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
    pub menu: Vec<MenuEntry>,
    pub vista: View,
}

/// `POST /api/login`
///
/// Password verification runs PBKDF2 on the blocking pool.
pub async fn login(
    State(ctx): State<ApiContext>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Success<LoginResponse>>, ApiError> {
    let Json(request) = payload?;

    let core = ctx.core.clone();
    let user = tokio::task::spawn_blocking(move || -> Result<User, ApiError> {
        let conn = core.open_db()?;
        Ok(identity::authenticate(&conn, &request.login, &request.password)?)
    })
    .await??;

    let menu = menu_for(user.privilegios);
    let token = ctx.core.sign_in(user.clone())?;

    Ok(success(LoginResponse {
        user,
        token,
        menu,
        vista: View::Programacion,
    }))
}

#[derive(Serialize)]
pub struct LogoutResponse {}

/// `POST /api/logout`
pub async fn logout(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Success<LogoutResponse>>, ApiError> {
    ctx.core.sign_out(&session.token)?;
    tracing::info!(login = %session.user.login, "Session closed");
    Ok(success(LogoutResponse {}))
}
