//! Repository layer: entity-scoped database operations.
//!
//! Free functions over a borrowed `Connection`; each sub-module owns one
//! table family. All public functions are re-exported here.

mod patient;
mod photo;
mod procedure;
mod user;

pub use patient::*;
pub use photo::*;
pub use procedure::*;
pub use user::*;
