//! Photo attachment endpoints.
//!
//! - `POST /api/fotos`: multipart `id_procedimiento`, `description`, `foto`
//! - `GET /api/fotos?id_procedimiento=`: attachments of a procedure
//! - `GET /api/fotos/:id`: image bytes

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{success, ApiContext, SessionContext, Success};
use crate::authorization::{authorize, Permission};
use crate::models::PhotoAttachment;
use crate::photos::MAX_PHOTO_BYTES;

/// Request body cap for uploads: one image plus multipart overhead.
pub const UPLOAD_BODY_LIMIT: usize = MAX_PHOTO_BYTES + 1024 * 1024;

#[derive(Serialize)]
pub struct PhotoResponse {
    pub foto: PhotoAttachment,
}

/// `POST /api/fotos`
pub async fn upload(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Success<PhotoResponse>>, ApiError> {
    authorize(&session.user, Permission::AttachPhotos)?;
    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let mut procedure_id: Option<i64> = None;
    let mut description: Option<String> = None;
    let mut image: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "id_procedimiento" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                let id = text.trim().parse::<i64>().map_err(|_| {
                    ApiError::BadRequest(format!("id_procedimiento inválido: {text}"))
                })?;
                procedure_id = Some(id);
            }
            "description" => {
                description = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.body_text()))?,
                );
            }
            "foto" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                image = Some(bytes.to_vec());
            }
            other => tracing::debug!(field = other, "Ignoring unknown upload field"),
        }
    }

    let procedure_id =
        procedure_id.ok_or_else(|| ApiError::BadRequest("Falta id_procedimiento".into()))?;
    let image = image.unwrap_or_default();

    let conn = ctx.core.open_db()?;
    let foto = ctx
        .core
        .photos()
        .add(&conn, procedure_id, &image, description.as_deref())?;
    tracing::info!(id_foto = foto.id_foto, login = %session.user.login, "Photo uploaded");

    Ok(success(PhotoResponse { foto }))
}

#[derive(Deserialize)]
pub struct PhotoListQuery {
    pub id_procedimiento: i64,
}

#[derive(Serialize)]
pub struct PhotoListResponse {
    pub fotos: Vec<PhotoAttachment>,
}

/// `GET /api/fotos?id_procedimiento=`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
    query: Result<Query<PhotoListQuery>, QueryRejection>,
) -> Result<Json<Success<PhotoListResponse>>, ApiError> {
    authorize(&session.user, Permission::ClinicalRecords)?;
    let Query(query) = query?;
    let conn = ctx.core.open_db()?;
    let fotos = ctx.core.photos().list(&conn, query.id_procedimiento)?;
    Ok(success(PhotoListResponse { fotos }))
}

/// `GET /api/fotos/:id`
pub async fn fetch(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    authorize(&session.user, Permission::ClinicalRecords)?;
    let conn = ctx.core.open_db()?;
    let (_, bytes, mime) = ctx.core.photos().read(&conn, id)?;
    Ok(([(header::CONTENT_TYPE, mime)], bytes).into_response())
}
