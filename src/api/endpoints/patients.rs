//! Patient registry endpoints.
//!
//! - `GET /api/pacientes?search=&page=`: paged listing; Medico users only
//!   see patients of their own procedures
//! - `POST /api/pacientes`: register or edit; Medico users may only edit
//!   patients of their own procedures

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{blank_as_none, success, ApiContext, SessionContext, Success};
use crate::authorization::{authorize, patient_scope, Permission};
use crate::db::repository::{self, PatientQuery};
use crate::models::{Patient, PatientPage};

#[derive(Deserialize)]
pub struct PatientListQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub page: Option<u32>,
}

/// `GET /api/pacientes`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
    query: Result<Query<PatientListQuery>, QueryRejection>,
) -> Result<Json<Success<PatientPage>>, ApiError> {
    authorize(&session.user, Permission::ViewPatients)?;
    let Query(query) = query?;
    let conn = ctx.core.open_db()?;

    let page = repository::list_patients(
        &conn,
        &PatientQuery {
            search: query.search,
            page: query.page.unwrap_or(1),
            staff_id: patient_scope(&session.user),
        },
    )?;
    Ok(success(page))
}

#[derive(Serialize)]
pub struct PatientResponse {
    pub paciente: Patient,
}

/// `POST /api/pacientes`
pub async fn upsert(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
    payload: Result<Json<Patient>, JsonRejection>,
) -> Result<Json<Success<PatientResponse>>, ApiError> {
    authorize(&session.user, Permission::ManagePatients)?;
    let Json(patient) = payload?;
    let conn = ctx.core.open_db()?;

    if let (Some(id), Some(staff_id)) = (patient.id_paciente, patient_scope(&session.user)) {
        if !repository::patient_in_scope(&conn, id, staff_id)? {
            tracing::warn!(id_paciente = id, login = %session.user.login, "Patient edit outside scope");
            return Err(ApiError::Forbidden(format!("paciente {id} fuera de su agenda")));
        }
    }

    let paciente = repository::upsert_patient(&conn, &patient)?;
    tracing::info!(id_paciente = ?paciente.id_paciente, login = %session.user.login, "Patient saved");
    Ok(success(PatientResponse { paciente }))
}
