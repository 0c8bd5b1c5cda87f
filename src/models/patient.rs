use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::Sex;
use super::user::default_hospital;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    #[serde(default)]
    pub id_paciente: Option<i64>,
    #[serde(default = "default_hospital")]
    pub id_hospital: i64,
    pub nombre: String,
    #[serde(default)]
    pub apellido: String,
    pub fecha_nacimiento: NaiveDate,
    pub sexo: Sex,
    #[serde(default)]
    pub rfc: String,
    #[serde(default)]
    pub telefono: String,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.nombre, self.apellido).trim().to_string()
    }

    /// Whole years lived as of `today`; the count increments on the
    /// anniversary itself. A birth date in the future yields 0.
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        today.years_since(self.fecha_nacimiento).unwrap_or(0)
    }
}

/// One page of the patient registry.
#[derive(Debug, Clone, Serialize)]
pub struct PatientPage {
    pub pacientes: Vec<Patient>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}
