//! Clinic API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.
//!
//! Middleware stack (outermost → innermost):
//! 1. CORS + response headers → 2. Auth validator → 3. Audit logger

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue};
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the clinic API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn clinic_api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);
    build_router(ctx)
}

fn build_router(ctx: ApiContext) -> Router {
    // Protected routes: require a session.
    //
    // Layers are applied from bottom (innermost) to top (outermost):
    //   Extension (outermost) → Auth → Audit (innermost) → Handler
    //
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/logout", post(endpoints::auth::logout))
        .route(
            "/navegacion",
            get(endpoints::navigation::menu).post(endpoints::navigation::open),
        )
        .route(
            "/procedimientos",
            get(endpoints::procedures::list_or_get)
                .post(endpoints::procedures::upsert)
                .delete(endpoints::procedures::delete),
        )
        .route(
            "/procedimientos/:id/status",
            put(endpoints::procedures::set_status),
        )
        .route(
            "/procedimientos/:id/documentos/:tipo",
            get(endpoints::documents::render).post(endpoints::documents::save),
        )
        .route(
            "/pacientes",
            get(endpoints::patients::list).post(endpoints::patients::upsert),
        )
        .route(
            "/usuarios",
            get(endpoints::users::list).post(endpoints::users::register),
        )
        .route("/medicos", get(endpoints::staff::pools))
        .route(
            "/fotos",
            get(endpoints::photos::list)
                .post(endpoints::photos::upload)
                .layer(DefaultBodyLimit::max(endpoints::photos::UPLOAD_BODY_LIMIT)),
        )
        .route("/fotos/:id", get(endpoints::photos::fetch))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx.clone()));

    // Unprotected routes
    let unprotected = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/login", post(endpoints::auth::login))
        .with_state(ctx.clone())
        .layer(axum::Extension(ctx));

    Router::new()
        .nest("/api", protected)
        .nest("/api", unprotected)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::db::repository::fixtures::*;
    use crate::db::repository::{get_patient, get_user, upsert_procedure};
    use crate::identity;
    use crate::models::Role;
    use crate::photos::PhotoStore;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3, 4];

    struct TestApp {
        core: Arc<CoreState>,
        team: Team,
        procedure_id: i64,
        admin: String,
        nurse: String,
        surgeon: String,
        _dir: tempfile::TempDir,
    }

    impl TestApp {
        fn router(&self) -> Router {
            clinic_api_router(self.core.clone())
        }
    }

    /// Temp storage with the standard team, one scheduled procedure and
    /// signed-in admin, nurse and surgeon sessions.
    fn test_app() -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let photos = PhotoStore::open(dir.path().join("fotos")).unwrap();
        let core = Arc::new(CoreState::new(dir.path().join("clinica.db"), photos, 1000));

        let conn = core.open_db().unwrap();
        let team = seed_team(&conn);
        let procedure_id = upsert_procedure(&conn, &sample_procedure(&team))
            .unwrap()
            .id_procedimiento
            .unwrap();
        let admin_id = seed_user(&conn, "admin", "Rosa", "León", Role::Admin, None);
        let nurse_id = seed_user(&conn, "enf", "Marta", "Solís", Role::Enfermeria, None);

        let sign_in = |id: i64| core.sign_in(get_user(&conn, id).unwrap().unwrap()).unwrap();
        let admin = sign_in(admin_id);
        let nurse = sign_in(nurse_id);
        let surgeon = sign_in(team.surgeon);

        TestApp {
            core: core.clone(),
            team,
            procedure_id,
            admin,
            nurse,
            surgeon,
            _dir: dir,
        }
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header("Authorization", format!("Bearer {t}"));
        }
        match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &TestApp, req: Request<Body>) -> Response {
        app.router().oneshot(req).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn multipart_upload(token: &str, procedure_id: i64, description: &str, image: &[u8]) -> Request<Body> {
        let boundary = "clinica-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"id_procedimiento\"\r\n\r\n{procedure_id}\r\n\
                 --{boundary}\r\nContent-Disposition: form-data; name=\"description\"\r\n\r\n{description}\r\n\
                 --{boundary}\r\nContent-Disposition: form-data; name=\"foto\"; filename=\"herida.png\"\r\n\
                 Content-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(image);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/fotos")
            .header("Authorization", format!("Bearer {token}"))
            .header("Content-Type", format!("multipart/form-data; boundary={boundary}"))
            .body(Body::from(body))
            .unwrap()
    }

    // ── Auth ──────────────────────────────────────────────

    #[tokio::test]
    async fn health_is_public() {
        let app = test_app();
        let response = send(&app, request("GET", "/api/health", None, None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("X-Content-Type-Options").unwrap(), "nosniff");
        let json = json_body(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["version"], crate::config::APP_VERSION);
    }

    #[tokio::test]
    async fn protected_routes_require_session() {
        let app = test_app();
        let response = send(&app, request("GET", "/api/procedimientos", None, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["code"], "AUTH_REQUIRED");

        let response = send(&app, request("GET", "/api/procedimientos", Some("bogus"), None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn protected_responses_are_not_cached() {
        let app = test_app();
        let response = send(&app, request("GET", "/api/navegacion", Some(&app.admin), None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("Cache-Control").unwrap(), "no-store");
    }

    #[tokio::test]
    async fn login_then_logout() {
        let app = test_app();
        {
            let conn = app.core.open_db().unwrap();
            let mut form = user_form("recepcion", "Laura", "Vega", Role::Administrativo);
            form.password = Some("clave-segura".into());
            identity::register_user(&conn, &form, 1000).unwrap();
        }

        let bad = json!({"login": "recepcion", "password": "otra"});
        let response = send(&app, request("POST", "/api/login", None, Some(bad))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = json_body(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "AUTH_FAILED");

        let good = json!({"login": "recepcion", "password": "clave-segura"});
        let response = send(&app, request("POST", "/api/login", None, Some(good))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["user"]["privilegios"], "Administrativo");
        assert!(json["user"].get("password").is_none());
        let token = json["token"].as_str().unwrap().to_string();

        let response = send(&app, request("GET", "/api/navegacion", Some(&token), None)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&app, request("POST", "/api/logout", Some(&token), None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = send(&app, request("GET", "/api/navegacion", Some(&token), None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_login_body_is_validation_error() {
        let app = test_app();
        let response = send(&app, request("POST", "/api/login", None, Some(json!({"login": "x"})))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "VALIDATION");
    }

    // ── Navigation ───────────────────────────────────────

    #[tokio::test]
    async fn menu_depends_on_role() {
        let app = test_app();
        let json = json_body(send(&app, request("GET", "/api/navegacion", Some(&app.admin), None)).await).await;
        assert_eq!(json["menu"].as_array().unwrap().len(), 3);
        assert_eq!(json["vista"]["view"], "programacion");

        let json = json_body(send(&app, request("GET", "/api/navegacion", Some(&app.nurse), None)).await).await;
        let views: Vec<&str> = json["menu"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["view"].as_str().unwrap())
            .collect();
        assert_eq!(views, vec!["programacion"]);

        let json = json_body(send(&app, request("GET", "/api/navegacion", Some(&app.surgeon), None)).await).await;
        assert_eq!(json["menu"][1]["label"], "Mis Pacientes");
    }

    #[tokio::test]
    async fn unreachable_view_is_forbidden() {
        let app = test_app();
        let body = json!({"vista": {"view": "usuarios"}});
        let response = send(&app, request("POST", "/api/navegacion", Some(&app.nurse), Some(body))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await["code"], "FORBIDDEN");
    }

    // ── Procedures ───────────────────────────────────────

    #[tokio::test]
    async fn schedule_list_and_get() {
        let app = test_app();
        let body = json!({
            "id_paciente": app.team.patient,
            "id_medico": app.team.surgeon,
            "fecha_qx": "2024-04-02",
            "diagnostico": "Hernia inguinal derecha",
            "qx_planeada": "Hernioplastía inguinal",
        });
        let response = send(&app, request("POST", "/api/procedimientos", Some(&app.admin), Some(body))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["message"], "Procedimiento programado");
        let id = json["procedure"]["id_procedimiento"].as_i64().unwrap();
        assert_eq!(json["procedure"]["status"], "Programado");

        let uri = "/api/procedimientos?fecha_qx=2024-04-02&id_paciente=&id_staff=";
        let json = json_body(send(&app, request("GET", uri, Some(&app.nurse), None)).await).await;
        let rows = json["procedimientos"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["cirujano"], "Dr. Carlos Méndez");
        assert_eq!(rows[0]["anestesiologo"], "N/A");

        let uri = format!("/api/procedimientos?id_procedimiento={id}");
        let json = json_body(send(&app, request("GET", &uri, Some(&app.nurse), None)).await).await;
        assert_eq!(json["procedure"]["qx_planeada"], "Hernioplastía inguinal");
    }

    #[tokio::test]
    async fn nurse_cannot_schedule() {
        let app = test_app();
        let body = json!({"id_paciente": app.team.patient, "fecha_qx": "2024-04-02"});
        let response = send(&app, request("POST", "/api/procedimientos", Some(&app.nurse), Some(body))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn ineligible_surgeon_is_rejected() {
        let app = test_app();
        let body = json!({
            "id_paciente": app.team.patient,
            "id_medico": app.team.anesthesiologist,
            "fecha_qx": "2024-04-02",
        });
        let response = send(&app, request("POST", "/api/procedimientos", Some(&app.admin), Some(body))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "VALIDATION");
    }

    #[tokio::test]
    async fn unknown_procedure_is_404() {
        let app = test_app();
        let response = send(
            &app,
            request("GET", "/api/procedimientos?id_procedimiento=999", Some(&app.admin), None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn status_patch_bumps_version() {
        let app = test_app();
        let uri = format!("/api/procedimientos/{}/status", app.procedure_id);
        let body = json!({"status": "Post-op", "version": 1});
        let response = send(&app, request("PUT", &uri, Some(&app.nurse), Some(body))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["procedure"]["status"], "Post-op");
        assert_eq!(json["procedure"]["version"], 2);

        let stale = json!({"status": "Alta", "version": 1});
        let response = send(&app, request("PUT", &uri, Some(&app.nurse), Some(stale))).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn delete_removes_procedure_and_photos() {
        let app = test_app();
        let response = send(&app, multipart_upload(&app.admin, app.procedure_id, "", PNG)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let photo_id = json_body(response).await["foto"]["id_foto"].as_i64().unwrap();

        let body = json!({"id_procedimiento": app.procedure_id});
        let response = send(&app, request("DELETE", "/api/procedimientos", Some(&app.admin), Some(body))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let uri = format!("/api/procedimientos?id_procedimiento={}", app.procedure_id);
        let response = send(&app, request("GET", &uri, Some(&app.admin), None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = send(&app, request("GET", &format!("/api/fotos/{photo_id}"), Some(&app.admin), None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(std::fs::read_dir(app.core.photos().dir()).unwrap().count(), 0);
    }

    // ── Documents ────────────────────────────────────────

    #[tokio::test]
    async fn document_renders_as_html() {
        let app = test_app();
        let uri = format!("/api/procedimientos/{}/documentos/nota_ingreso", app.procedure_id);
        let response = send(&app, request("GET", &uri, Some(&app.nurse), None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "text/html; charset=utf-8"
        );
        let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("<h2>Nota de Ingreso</h2>"));
        assert!(html.contains("Lucía Pérez"));
    }

    #[tokio::test]
    async fn document_exports_pdf() {
        let app = test_app();
        let uri = format!(
            "/api/procedimientos/{}/documentos/nota_de_alta?formato=pdf",
            app.procedure_id
        );
        let response = send(&app, request("GET", &uri, Some(&app.nurse), None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("Content-Type").unwrap(), "application/pdf");
        let bytes = to_bytes(response.into_body(), 4 * 1024 * 1024).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn unknown_document_kind_is_rejected() {
        let app = test_app();
        let uri = format!("/api/procedimientos/{}/documentos/receta", app.procedure_id);
        let response = send(&app, request("GET", &uri, Some(&app.nurse), None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn saving_consent_moves_to_print_view() {
        let app = test_app();
        let uri = format!(
            "/api/procedimientos/{}/documentos/consentimiento_quirurgico",
            app.procedure_id
        );
        let body = json!({
            "seccion": {"riesgos": "Sangrado, infección", "beneficios": "Resolución del cuadro"},
            "version": 1,
        });
        let response = send(&app, request("POST", &uri, Some(&app.surgeon), Some(body))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["version"], 2);
        assert_eq!(json["vista"]["view"], "consentimientoImpreso");
        assert_eq!(json["vista"]["procedureId"], app.procedure_id);

        let form_uri = format!("{uri}?formato=json");
        let json = json_body(send(&app, request("GET", &form_uri, Some(&app.surgeon), None)).await).await;
        assert_eq!(json["documento"]["guardado"], true);
        assert_eq!(json["documento"]["seccion"]["riesgos"], "Sangrado, infección");

        let response = send(&app, request("GET", &uri, Some(&app.surgeon), None)).await;
        let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        assert!(String::from_utf8(bytes.to_vec()).unwrap().contains("Sangrado, infección"));
    }

    #[tokio::test]
    async fn stale_document_save_conflicts() {
        let app = test_app();
        let uri = format!("/api/procedimientos/{}/documentos/nota_postoperatoria", app.procedure_id);
        let body = json!({"seccion": {"tecnica": "Cuatro puertos"}, "version": 1});
        let response = send(&app, request("POST", &uri, Some(&app.surgeon), Some(body.clone()))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["vista"]["view"], "documento");

        let response = send(&app, request("POST", &uri, Some(&app.surgeon), Some(body))).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(response).await["code"], "CONFLICT");
    }

    // ── Patients, users, staff ───────────────────────────

    #[tokio::test]
    async fn medico_sees_only_own_patients() {
        let app = test_app();
        {
            let conn = app.core.open_db().unwrap();
            seed_patient(&conn, "Mario", "Ortiz");
        }

        let json = json_body(send(&app, request("GET", "/api/pacientes", Some(&app.admin), None)).await).await;
        assert_eq!(json["total"], 2);

        let json = json_body(send(&app, request("GET", "/api/pacientes?page=", Some(&app.surgeon), None)).await).await;
        assert_eq!(json["total"], 1);
        assert_eq!(json["pacientes"][0]["nombre"], "Lucía");

        let response = send(&app, request("GET", "/api/pacientes", Some(&app.nurse), None)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn register_patient() {
        let app = test_app();
        let body = json!({
            "nombre": "Elena",
            "apellido": "Cruz",
            "fecha_nacimiento": "1985-07-21",
            "sexo": "F",
        });
        let response = send(&app, request("POST", "/api/pacientes", Some(&app.admin), Some(body))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert!(json["paciente"]["id_paciente"].as_i64().is_some());
        assert_eq!(json["paciente"]["rfc"], "");
    }

    #[tokio::test]
    async fn medico_edits_only_own_patients() {
        let app = test_app();
        let other = {
            let conn = app.core.open_db().unwrap();
            seed_patient(&conn, "Mario", "Ortiz")
        };
        let edit = |id: i64, nombre: &str| {
            json!({
                "id_paciente": id,
                "nombre": nombre,
                "apellido": "Ortiz",
                "fecha_nacimiento": "1990-02-10",
                "sexo": "M",
            })
        };

        let response = send(&app, request("POST", "/api/pacientes", Some(&app.surgeon), Some(edit(other, "Mariano")))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let conn = app.core.open_db().unwrap();
        assert_eq!(get_patient(&conn, other).unwrap().unwrap().nombre, "Mario");

        let response = send(&app, request("POST", "/api/pacientes", Some(&app.surgeon), Some(edit(app.team.patient, "Lucía")))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&app, request("POST", "/api/pacientes", Some(&app.admin), Some(edit(other, "Mariano")))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn user_admin_is_admin_only() {
        let app = test_app();
        let response = send(&app, request("GET", "/api/usuarios", Some(&app.surgeon), None)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let json = json_body(send(&app, request("GET", "/api/usuarios", Some(&app.admin), None)).await).await;
        let usuarios = json["usuarios"].as_array().unwrap();
        assert_eq!(usuarios.len(), 5);
        assert!(usuarios.iter().any(|u| u["medico"]["especialidad"] == "Anestesiología"));
    }

    #[tokio::test]
    async fn editing_a_user_updates_open_sessions() {
        let app = test_app();
        let body = json!({
            "id_usuario": app.team.surgeon,
            "login": "cmendez",
            "nombre": "Carlos Alberto",
            "apellido": "Méndez",
            "privilegios": "Medico",
        });
        let response = send(&app, request("POST", "/api/usuarios", Some(&app.admin), Some(body))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["usuario"]["medico"]["especialidad"], "Cirugía General");

        let user = app.core.resolve_session(&app.surgeon).unwrap().unwrap();
        assert_eq!(user.nombre, "Carlos Alberto");
    }

    #[tokio::test]
    async fn staff_pools_split_by_specialty() {
        let app = test_app();
        let json = json_body(send(&app, request("GET", "/api/medicos", Some(&app.admin), None)).await).await;
        assert_eq!(json["medicos"].as_array().unwrap().len(), 3);
        let cirujanos: Vec<i64> = json["cirujanos"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["id_usuario"].as_i64().unwrap())
            .collect();
        assert!(!cirujanos.contains(&app.team.anesthesiologist));
        assert_eq!(json["anestesiologos"][0]["id_usuario"], app.team.anesthesiologist);
    }

    // ── Photos ───────────────────────────────────────────

    #[tokio::test]
    async fn photo_upload_list_and_fetch() {
        let app = test_app();
        let response = send(&app, multipart_upload(&app.admin, app.procedure_id, "Herida día 3", PNG)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["foto"]["description"], "Herida día 3");
        let url = json["foto"]["url"].as_str().unwrap().to_string();

        let uri = format!("/api/fotos?id_procedimiento={}", app.procedure_id);
        let json = json_body(send(&app, request("GET", &uri, Some(&app.nurse), None)).await).await;
        assert_eq!(json["fotos"].as_array().unwrap().len(), 1);

        let response = send(&app, request("GET", &url, Some(&app.nurse), None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("Content-Type").unwrap(), "image/png");
        let bytes = to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&bytes[..], PNG);
    }

    #[tokio::test]
    async fn photo_upload_rejects_non_images_and_nurses() {
        let app = test_app();
        let response = send(&app, multipart_upload(&app.admin, app.procedure_id, "", b"%PDF-1.4 nope")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&app, multipart_upload(&app.nurse, app.procedure_id, "", PNG)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = send(&app, multipart_upload(&app.admin, 999, "", PNG)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
