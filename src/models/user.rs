use serde::{Deserialize, Serialize};

use super::enums::Role;

/// Public projection of a user row. The password hash never leaves the
/// repository layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id_usuario: i64,
    pub login: String,
    pub email: String,
    pub nombre: String,
    pub apellido: String,
    pub telefono: String,
    pub privilegios: Role,
    pub id_hospital: i64,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.nombre, self.apellido).trim().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalProfile {
    pub id_medico: i64,
    pub id_usuario: i64,
    pub cedula: String,
    pub especialidad: String,
}

/// A user together with the medical profile they may carry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaffMember {
    #[serde(flatten)]
    pub user: User,
    pub medico: Option<MedicalProfile>,
}

impl StaffMember {
    pub fn specialty(&self) -> &str {
        self.medico.as_ref().map(|m| m.especialidad.as_str()).unwrap_or("")
    }

    pub fn license(&self) -> &str {
        self.medico.as_ref().map(|m| m.cedula.as_str()).unwrap_or("")
    }
}

/// Registration / profile-edit payload.
#[derive(Debug, Clone, Deserialize)]
pub struct UserForm {
    #[serde(default)]
    pub id_usuario: Option<i64>,
    pub login: String,
    #[serde(default)]
    pub email: String,
    /// Required on create; blank on edit keeps the stored hash.
    #[serde(default)]
    pub password: Option<String>,
    pub nombre: String,
    #[serde(default)]
    pub apellido: String,
    #[serde(default)]
    pub telefono: String,
    pub privilegios: Role,
    #[serde(default = "default_hospital")]
    pub id_hospital: i64,
    #[serde(default)]
    pub cedula: Option<String>,
    #[serde(default)]
    pub especialidad: Option<String>,
}

pub(crate) fn default_hospital() -> i64 {
    1
}
