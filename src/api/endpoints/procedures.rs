//! Procedure endpoints.
//!
//! - `GET /api/procedimientos`: schedule listing, or one record with `?id_procedimiento=`
//! - `POST /api/procedimientos`: schedule or replace
//! - `DELETE /api/procedimientos`: delete with its photos
//! - `PUT /api/procedimientos/:id/status`: status patch

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{blank_as_none, success, ApiContext, SessionContext, Success};
use crate::authorization::{authorize, Permission};
use crate::db::repository;
use crate::models::{ProcedureFilter, ProcedureRecord, ProcedureStatus, ProcedureSummary};

#[derive(Deserialize)]
pub struct ProcedureQuery {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub id_procedimiento: Option<i64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub fecha_qx: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub id_paciente: Option<i64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub id_staff: Option<i64>,
}

#[derive(Serialize)]
pub struct ProcedureListResponse {
    pub procedimientos: Vec<ProcedureSummary>,
}

#[derive(Serialize)]
pub struct ProcedureResponse {
    pub procedure: ProcedureRecord,
}

/// `GET /api/procedimientos`
pub async fn list_or_get(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
    query: Result<Query<ProcedureQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    authorize(&session.user, Permission::ClinicalRecords)?;
    let Query(query) = query?;
    let conn = ctx.core.open_db()?;

    if let Some(id) = query.id_procedimiento {
        let procedure = repository::get_procedure(&conn, id)?;
        return Ok(success(ProcedureResponse { procedure }).into_response());
    }

    let filter = ProcedureFilter {
        fecha_qx: query.fecha_qx,
        id_paciente: query.id_paciente,
        id_staff: query.id_staff,
    };
    let procedimientos = repository::list_procedures(&conn, &filter)?;
    Ok(success(ProcedureListResponse { procedimientos }).into_response())
}

#[derive(Serialize)]
pub struct SaveProcedureResponse {
    pub procedure: ProcedureRecord,
    pub message: &'static str,
}

/// `POST /api/procedimientos`
pub async fn upsert(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
    payload: Result<Json<ProcedureRecord>, JsonRejection>,
) -> Result<Json<Success<SaveProcedureResponse>>, ApiError> {
    authorize(&session.user, Permission::ScheduleProcedures)?;
    let Json(record) = payload?;
    let conn = ctx.core.open_db()?;

    let message = if record.id_procedimiento.is_some() {
        "Procedimiento actualizado"
    } else {
        "Procedimiento programado"
    };
    let procedure = repository::upsert_procedure(&conn, &record)?;
    tracing::info!(
        id_procedimiento = ?procedure.id_procedimiento,
        login = %session.user.login,
        "{message}"
    );

    Ok(success(SaveProcedureResponse { procedure, message }))
}

#[derive(Deserialize)]
pub struct DeleteRequest {
    pub id_procedimiento: i64,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub id_procedimiento: i64,
}

/// `DELETE /api/procedimientos`: photo files are removed after the rows.
pub async fn delete(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
    payload: Result<Json<DeleteRequest>, JsonRejection>,
) -> Result<Json<Success<DeleteResponse>>, ApiError> {
    authorize(&session.user, Permission::ScheduleProcedures)?;
    let Json(request) = payload?;
    let conn = ctx.core.open_db()?;

    let files = repository::delete_procedure(&conn, request.id_procedimiento)?;
    ctx.core.photos().discard_files(&files);

    Ok(success(DeleteResponse {
        id_procedimiento: request.id_procedimiento,
    }))
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: ProcedureStatus,
    #[serde(default)]
    pub version: Option<i64>,
}

/// `PUT /api/procedimientos/:id/status`
pub async fn set_status(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<i64>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<Success<ProcedureResponse>>, ApiError> {
    authorize(&session.user, Permission::ClinicalRecords)?;
    let Json(request) = payload?;
    let conn = ctx.core.open_db()?;

    repository::update_status(&conn, id, request.status, request.version)?;
    tracing::info!(id_procedimiento = id, status = %request.status, "Procedure status changed");
    let procedure = repository::get_procedure(&conn, id)?;

    Ok(success(ProcedureResponse { procedure }))
}
