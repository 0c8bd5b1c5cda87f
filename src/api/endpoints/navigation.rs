//! Role-dependent navigation.
//!
//! - `GET /api/navegacion`: menu and home view for the caller's role
//! - `POST /api/navegacion`: check that the caller may open a view

use axum::extract::rejection::JsonRejection;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{success, SessionContext, Success};
use crate::models::Role;
use crate::navigation::{menu_for, MenuEntry, Navigator, View};

#[derive(Serialize)]
pub struct MenuResponse {
    pub role: Role,
    pub menu: Vec<MenuEntry>,
    pub vista: View,
}

/// `GET /api/navegacion`
pub async fn menu(
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Success<MenuResponse>>, ApiError> {
    let role = session.user.privilegios;
    Ok(success(MenuResponse {
        role,
        menu: menu_for(role),
        vista: Navigator::new(role).current(),
    }))
}

#[derive(Deserialize)]
pub struct OpenViewRequest {
    pub vista: View,
}

#[derive(Serialize)]
pub struct OpenViewResponse {
    pub vista: View,
}

/// `POST /api/navegacion`: 403 when the role cannot reach the view.
pub async fn open(
    Extension(session): Extension<SessionContext>,
    payload: Result<Json<OpenViewRequest>, JsonRejection>,
) -> Result<Json<Success<OpenViewResponse>>, ApiError> {
    let Json(request) = payload?;
    let mut navigator = Navigator::new(session.user.privilegios);
    let vista = navigator.navigate(request.vista)?;
    Ok(success(OpenViewResponse { vista }))
}
