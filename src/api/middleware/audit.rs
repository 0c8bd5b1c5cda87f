//! Audit logging middleware.
//!
//! Logs every protected request with the signed-in login, method, path and
//! response status. Runs innermost (after auth has injected SessionContext).

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::SessionContext;

pub async fn log_access(
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let (user_id, login) = req
        .extensions()
        .get::<SessionContext>()
        .map(|s| (s.user.id_usuario, s.user.login.clone()))
        .unwrap_or((0, "-".to_string()));

    let response = next.run(req).await;

    let status = response.status().as_u16();
    if response.status().is_server_error() {
        tracing::error!(user_id, login = %login, %method, %path, status, "API access");
    } else {
        tracing::info!(user_id, login = %login, %method, %path, status, "API access");
    }

    response
}
