//! API endpoint handlers.
//!
//! One module per resource. Handlers authorize, open a connection and
//! delegate to the domain modules.

pub mod auth;
pub mod documents;
pub mod health;
pub mod navigation;
pub mod patients;
pub mod photos;
pub mod procedures;
pub mod staff;
pub mod users;
