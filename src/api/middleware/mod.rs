//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Auth validator: bearer token → SessionContext
//! 2. Audit logger: logs after auth, has the user

pub mod audit;
pub mod auth;
