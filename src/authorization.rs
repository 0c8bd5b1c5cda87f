//! Role-based permissions.
//!
//! A fixed table: each `Permission` lists the roles that hold it. Anything
//! not listed is denied. Row-level scoping (a Medico only sees their own
//! patients) is applied by the callers through `patient_scope`.

use thiserror::Error;

use crate::models::{Role, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Create and edit user accounts.
    ManageUsers,
    /// Schedule, replace and delete procedures.
    ScheduleProcedures,
    /// Upload photos to a procedure.
    AttachPhotos,
    /// Register and edit patients.
    ManagePatients,
    /// Browse the patient registry.
    ViewPatients,
    /// Read procedures, render and save clinical documents, change status.
    ClinicalRecords,
}

impl Permission {
    fn allowed_roles(self) -> &'static [Role] {
        use Role::*;
        match self {
            Self::ManageUsers => &[Admin],
            Self::ScheduleProcedures | Self::AttachPhotos => &[Admin, Administrativo],
            Self::ManagePatients | Self::ViewPatients => &[Admin, Medico, Administrativo],
            Self::ClinicalRecords => &[Admin, Medico, Enfermeria, Administrativo],
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("role {role} lacks permission {permission:?}")]
pub struct AuthorizationError {
    pub role: Role,
    pub permission: Permission,
}

pub fn is_allowed(role: Role, permission: Permission) -> bool {
    permission.allowed_roles().contains(&role)
}

pub fn authorize(user: &User, permission: Permission) -> Result<(), AuthorizationError> {
    if is_allowed(user.privilegios, permission) {
        Ok(())
    } else {
        tracing::warn!(user_id = user.id_usuario, role = %user.privilegios, ?permission, "Access denied");
        Err(AuthorizationError {
            role: user.privilegios,
            permission,
        })
    }
}

/// Staff id patient listings and edits must be restricted to, if any.
/// Medico users see only patients of their own procedures.
pub fn patient_scope(user: &User) -> Option<i64> {
    (user.privilegios == Role::Medico).then_some(user.id_usuario)
}
