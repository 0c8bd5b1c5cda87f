//! HTTP surface of the clinic.
//!
//! Routes are nested under `/api/`; everything except health and login
//! sits behind the session middleware: Auth → Audit → Handler.
//!
//! The router is composable: `clinic_api_router()` returns a `Router`
//! that can be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::clinic_api_router;
pub use server::{start_server_on, ApiServer, ServerError};
pub use types::ApiContext;
