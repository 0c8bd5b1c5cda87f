//! Clinical document endpoints.
//!
//! - `GET /api/procedimientos/:id/documentos/:tipo?formato=html|pdf|json`
//! - `POST /api/procedimientos/:id/documentos/:tipo`: save the backing section

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{success, ApiContext, SessionContext, Success};
use crate::authorization::{authorize, Permission};
use crate::documents;
use crate::models::DocumentKind;
use crate::navigation::{Navigator, View};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Html,
    Pdf,
    /// Form prefill: the section as it would print, plus its save state.
    Json,
}

#[derive(Deserialize)]
pub struct RenderQuery {
    #[serde(default)]
    pub formato: Format,
}

fn parse_kind(tipo: &str) -> Result<DocumentKind, ApiError> {
    tipo.parse::<DocumentKind>().map_err(ApiError::from)
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

/// `GET /api/procedimientos/:id/documentos/:tipo`
pub async fn render(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
    Path((id, tipo)): Path<(i64, String)>,
    query: Result<Query<RenderQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    authorize(&session.user, Permission::ClinicalRecords)?;
    let Query(query) = query?;
    let kind = parse_kind(&tipo)?;
    let conn = ctx.core.open_db()?;

    match query.formato {
        Format::Html => {
            let doc = documents::render(&conn, id, kind, today())?;
            Ok((
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                doc.html,
            )
                .into_response())
        }
        Format::Pdf => {
            let bytes = documents::render_pdf(&conn, id, kind, today())?;
            let disposition = format!(
                "inline; filename=\"{}\"",
                documents::file_name(kind, id, "pdf")
            );
            Ok((
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response())
        }
        Format::Json => {
            let documento = documents::form_state(&conn, id, kind, today())?;
            Ok(success(FormResponse { documento }).into_response())
        }
    }
}

#[derive(Serialize)]
pub struct FormResponse {
    pub documento: documents::DocumentForm,
}

#[derive(Deserialize)]
pub struct SaveRequest {
    pub seccion: serde_json::Value,
    #[serde(default)]
    pub version: Option<i64>,
}

#[derive(Serialize)]
pub struct SaveResponse {
    pub version: i64,
    /// View the client moves to after the save.
    pub vista: View,
}

/// `POST /api/procedimientos/:id/documentos/:tipo`
pub async fn save(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
    Path((id, tipo)): Path<(i64, String)>,
    payload: Result<Json<SaveRequest>, JsonRejection>,
) -> Result<Json<Success<SaveResponse>>, ApiError> {
    authorize(&session.user, Permission::ClinicalRecords)?;
    let Json(request) = payload?;
    let kind = parse_kind(&tipo)?;
    let conn = ctx.core.open_db()?;

    let version = documents::save(&conn, id, kind, request.seccion, request.version)?;

    let mut navigator = Navigator::new(session.user.privilegios);
    navigator.navigate(View::Documento {
        procedure_id: id,
        kind,
    })?;
    let vista = navigator.document_saved(true);

    Ok(success(SaveResponse { version, vista }))
}
