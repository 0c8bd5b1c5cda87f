use rusqlite::{params, Connection, OptionalExtension, Row};

use super::user::parse_column;
use crate::db::DatabaseError;
use crate::models::*;

pub const PATIENTS_PER_PAGE: u32 = 10;

const PATIENT_COLUMNS: &str =
    "pa.id_paciente, pa.id_hospital, pa.nombre, pa.apellido, pa.fecha_nacimiento, pa.sexo, pa.rfc, pa.telefono";

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    let sexo: String = row.get(5)?;
    Ok(Patient {
        id_paciente: Some(row.get(0)?),
        id_hospital: row.get(1)?,
        nombre: row.get(2)?,
        apellido: row.get(3)?,
        fecha_nacimiento: row.get(4)?,
        sexo: parse_column(5, &sexo)?,
        rfc: row.get(6)?,
        telefono: row.get(7)?,
    })
}

/// Registry query: optional name search, 1-based page, optional staff scope
/// (only patients of procedures the staff member is bound to).
#[derive(Debug, Clone, Default)]
pub struct PatientQuery {
    pub search: Option<String>,
    pub page: u32,
    pub staff_id: Option<i64>,
}

/// Insert when `id_paciente` is absent, replace otherwise. Returns the stored row.
pub fn upsert_patient(conn: &Connection, patient: &Patient) -> Result<Patient, DatabaseError> {
    if patient.nombre.trim().is_empty() {
        return Err(DatabaseError::ConstraintViolation("nombre del paciente requerido".into()));
    }

    let id = match patient.id_paciente {
        None => {
            conn.execute(
                "INSERT INTO pacientes (id_hospital, nombre, apellido, fecha_nacimiento, sexo, rfc, telefono)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    patient.id_hospital,
                    patient.nombre,
                    patient.apellido,
                    patient.fecha_nacimiento,
                    patient.sexo.as_str(),
                    patient.rfc,
                    patient.telefono,
                ],
            )?;
            conn.last_insert_rowid()
        }
        Some(id) => {
            let rows = conn.execute(
                "UPDATE pacientes SET id_hospital = ?1, nombre = ?2, apellido = ?3, fecha_nacimiento = ?4,
                 sexo = ?5, rfc = ?6, telefono = ?7 WHERE id_paciente = ?8",
                params![
                    patient.id_hospital,
                    patient.nombre,
                    patient.apellido,
                    patient.fecha_nacimiento,
                    patient.sexo.as_str(),
                    patient.rfc,
                    patient.telefono,
                    id,
                ],
            )?;
            if rows == 0 {
                return Err(DatabaseError::not_found("paciente", id));
            }
            id
        }
    };

    get_patient(conn, id)?.ok_or_else(|| DatabaseError::not_found("paciente", id))
}

pub fn get_patient(conn: &Connection, id: i64) -> Result<Option<Patient>, DatabaseError> {
    let sql = format!("SELECT {PATIENT_COLUMNS} FROM pacientes pa WHERE pa.id_paciente = ?1");
    Ok(conn.query_row(&sql, params![id], patient_from_row).optional()?)
}

pub fn patient_exists(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM pacientes WHERE id_paciente = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Whether `patient_id` appears on a procedure `staff_id` is seated on.
pub fn patient_in_scope(conn: &Connection, patient_id: i64, staff_id: i64) -> Result<bool, DatabaseError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM procedimientos p
             WHERE p.id_paciente = ?1
               AND (p.id_medico = ?2 OR p.qx_anestesiologo = ?2 OR p.id_ayudante = ?2)
             LIMIT 1",
            params![patient_id, staff_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// One page of patients ordered by name. Search matches "nombre apellido"
/// ignoring case and accents.
pub fn list_patients(conn: &Connection, query: &PatientQuery) -> Result<PatientPage, DatabaseError> {
    let pattern = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{s}%"));
    let page = query.page.max(1);
    let offset = i64::from((page - 1) * PATIENTS_PER_PAGE);

    let filter = "WHERE (?1 IS NULL OR fold(pa.nombre || ' ' || pa.apellido) LIKE fold(?1))
         AND (?2 IS NULL OR pa.id_paciente IN (
             SELECT p.id_paciente FROM procedimientos p
             WHERE p.id_medico = ?2 OR p.qx_anestesiologo = ?2 OR p.id_ayudante = ?2))";

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM pacientes pa {filter}"),
        params![pattern, query.staff_id],
        |row| row.get(0),
    )?;

    let sql = format!(
        "SELECT {PATIENT_COLUMNS} FROM pacientes pa {filter}
         ORDER BY pa.nombre, pa.apellido, pa.id_paciente LIMIT ?3 OFFSET ?4"
    );
    let mut stmt = conn.prepare(&sql)?;
    let pacientes = stmt
        .query_map(
            params![pattern, query.staff_id, PATIENTS_PER_PAGE, offset],
            patient_from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PatientPage {
        pacientes,
        total,
        page,
        per_page: PATIENTS_PER_PAGE,
    })
}
