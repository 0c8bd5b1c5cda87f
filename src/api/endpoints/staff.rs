//! `GET /api/medicos`: staff option lists for the scheduling form.

use axum::extract::State;
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::types::{success, ApiContext, SessionContext, Success};
use crate::authorization::{authorize, Permission};
use crate::staff::{staff_pools, StaffPools};

pub async fn pools(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Success<StaffPools>>, ApiError> {
    authorize(&session.user, Permission::ClinicalRecords)?;
    let conn = ctx.core.open_db()?;
    Ok(success(staff_pools(&conn)?))
}
