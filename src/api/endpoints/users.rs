//! User administration (Admin only).
//!
//! - `GET /api/usuarios`: every account with its medical profile
//! - `POST /api/usuarios`: register or edit; open sessions see the edit

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{success, ApiContext, SessionContext, Success};
use crate::authorization::{authorize, Permission};
use crate::db::repository;
use crate::identity;
use crate::models::{StaffMember, UserForm};

#[derive(Serialize)]
pub struct UsersResponse {
    pub usuarios: Vec<StaffMember>,
}

/// `GET /api/usuarios`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Success<UsersResponse>>, ApiError> {
    authorize(&session.user, Permission::ManageUsers)?;
    let conn = ctx.core.open_db()?;

    let mut usuarios = Vec::new();
    for user in repository::list_users(&conn)? {
        let medico = repository::get_medical_profile(&conn, user.id_usuario)?;
        usuarios.push(StaffMember { user, medico });
    }
    Ok(success(UsersResponse { usuarios }))
}

#[derive(Serialize)]
pub struct UserResponse {
    pub usuario: StaffMember,
}

/// `POST /api/usuarios`
///
/// Hashing runs on the blocking pool.
pub async fn register(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
    payload: Result<Json<UserForm>, JsonRejection>,
) -> Result<Json<Success<UserResponse>>, ApiError> {
    authorize(&session.user, Permission::ManageUsers)?;
    let Json(form) = payload?;

    let core = ctx.core.clone();
    let usuario = tokio::task::spawn_blocking(move || -> Result<StaffMember, ApiError> {
        let conn = core.open_db()?;
        Ok(identity::register_user(&conn, &form, core.password_iterations)?)
    })
    .await??;

    ctx.core.refresh_user(&usuario.user)?;
    Ok(success(UserResponse { usuario }))
}
