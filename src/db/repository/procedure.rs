use std::collections::HashSet;

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;

use super::patient::patient_exists;
use super::photo::{list_photos, photo_files_for_procedure};
use super::user::{get_staff_member, parse_column};
use crate::db::DatabaseError;
use crate::models::*;
use crate::staff;

const ENTITY: &str = "procedimiento";

const PROCEDURE_COLUMNS: &str = "id_procedimiento, id_hospital, id_paciente, id_medico, qx_anestesiologo,
     id_ayudante, fecha_qx, diagnostico, qx_planeada, status, resumen_ingreso, nota_preanestesica,
     consentimiento, nota_postanestesica, nota_postoperatoria, indicaciones_postop, nota_de_alta, version";

fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| {
        serde_json::from_str(&t).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
    })
    .transpose()
}

fn procedure_from_row(row: &Row<'_>) -> rusqlite::Result<ProcedureRecord> {
    let status: String = row.get(9)?;
    Ok(ProcedureRecord {
        id_procedimiento: Some(row.get(0)?),
        id_hospital: row.get(1)?,
        id_paciente: row.get(2)?,
        id_medico: row.get(3)?,
        qx_anestesiologo: row.get(4)?,
        id_ayudante: row.get(5)?,
        fecha_qx: row.get(6)?,
        diagnostico: row.get(7)?,
        qx_planeada: row.get(8)?,
        status: parse_column(9, &status)?,
        resumen_ingreso: json_column(row, 10)?,
        nota_preanestesica: json_column(row, 11)?,
        consentimiento: json_column(row, 12)?,
        nota_postanestesica: json_column(row, 13)?,
        nota_postoperatoria: json_column(row, 14)?,
        indicaciones_postop: json_column(row, 15)?,
        nota_de_alta: json_column(row, 16)?,
        fotos: Vec::new(),
        version: Some(row.get(17)?),
    })
}

/// Serialized section columns, in `SectionKind::ALL` order.
fn section_columns(record: &ProcedureRecord) -> Result<Vec<Option<String>>, DatabaseError> {
    SectionKind::ALL
        .iter()
        .map(|kind| {
            record
                .section(*kind)
                .map(|payload| payload.to_json())
                .transpose()
                .map_err(DatabaseError::from)
        })
        .collect()
}

/// Patient must exist; staff must exist, be eligible for their seat, and
/// occupy at most one seat each.
fn validate_references(conn: &Connection, record: &ProcedureRecord) -> Result<(), DatabaseError> {
    if !patient_exists(conn, record.id_paciente)? {
        return Err(DatabaseError::MissingReference {
            entity_type: "paciente".into(),
            id: record.id_paciente,
        });
    }

    let mut seen = HashSet::new();
    for (role, user_id) in record.staff_bindings() {
        if !seen.insert(user_id) {
            return Err(DatabaseError::ConstraintViolation(format!(
                "el usuario {user_id} ocupa más de un puesto en el procedimiento"
            )));
        }
        let member = get_staff_member(conn, user_id)?.ok_or_else(|| DatabaseError::MissingReference {
            entity_type: "usuario".into(),
            id: user_id,
        })?;
        if !staff::is_eligible(&member, role) {
            return Err(DatabaseError::ConstraintViolation(format!(
                "{} no es elegible como {}",
                staff::display_name(Some(&member.user)),
                role.label().to_lowercase()
            )));
        }
    }
    Ok(())
}

fn stored_version(conn: &Connection, id: i64) -> Result<Option<i64>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT version FROM procedimientos WHERE id_procedimiento = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?)
}

pub fn procedure_exists(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    Ok(stored_version(conn, id)?.is_some())
}

/// Schedule (no id) or fully replace (id present) a procedure.
///
/// A replace that carries `version` must match the stored stamp. Photos in
/// the payload are ignored; they belong to the attachment store.
pub fn upsert_procedure(conn: &Connection, record: &ProcedureRecord) -> Result<ProcedureRecord, DatabaseError> {
    validate_references(conn, record)?;
    let sections = section_columns(record)?;

    let tx = conn.unchecked_transaction()?;
    let id = match record.id_procedimiento {
        None => {
            tx.execute(
                "INSERT INTO procedimientos (id_hospital, id_paciente, id_medico, qx_anestesiologo, id_ayudante,
                 fecha_qx, diagnostico, qx_planeada, status, resumen_ingreso, nota_preanestesica, consentimiento,
                 nota_postanestesica, nota_postoperatoria, indicaciones_postop, nota_de_alta, version)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, 1)",
                params![
                    record.id_hospital,
                    record.id_paciente,
                    record.id_medico,
                    record.qx_anestesiologo,
                    record.id_ayudante,
                    record.fecha_qx,
                    record.diagnostico,
                    record.qx_planeada,
                    record.status.as_str(),
                    sections[0],
                    sections[1],
                    sections[2],
                    sections[3],
                    sections[4],
                    sections[5],
                    sections[6],
                ],
            )?;
            tx.last_insert_rowid()
        }
        Some(id) => {
            let stored = stored_version(&tx, id)?.ok_or_else(|| DatabaseError::not_found(ENTITY, id))?;
            if let Some(expected) = record.version {
                if expected != stored {
                    return Err(DatabaseError::VersionConflict {
                        entity_type: ENTITY.into(),
                        id,
                        expected,
                        actual: stored,
                    });
                }
            }
            tx.execute(
                "UPDATE procedimientos SET id_hospital = ?1, id_paciente = ?2, id_medico = ?3,
                 qx_anestesiologo = ?4, id_ayudante = ?5, fecha_qx = ?6, diagnostico = ?7, qx_planeada = ?8,
                 status = ?9, resumen_ingreso = ?10, nota_preanestesica = ?11, consentimiento = ?12,
                 nota_postanestesica = ?13, nota_postoperatoria = ?14, indicaciones_postop = ?15,
                 nota_de_alta = ?16, version = version + 1
                 WHERE id_procedimiento = ?17",
                params![
                    record.id_hospital,
                    record.id_paciente,
                    record.id_medico,
                    record.qx_anestesiologo,
                    record.id_ayudante,
                    record.fecha_qx,
                    record.diagnostico,
                    record.qx_planeada,
                    record.status.as_str(),
                    sections[0],
                    sections[1],
                    sections[2],
                    sections[3],
                    sections[4],
                    sections[5],
                    sections[6],
                    id,
                ],
            )?;
            id
        }
    };
    tx.commit()?;

    tracing::info!(id_procedimiento = id, "Procedure stored");
    get_procedure(conn, id)
}

/// Full record with its photos, or `NotFound`.
pub fn get_procedure(conn: &Connection, id: i64) -> Result<ProcedureRecord, DatabaseError> {
    let sql = format!("SELECT {PROCEDURE_COLUMNS} FROM procedimientos WHERE id_procedimiento = ?1");
    let mut record = conn
        .query_row(&sql, params![id], procedure_from_row)
        .optional()?
        .ok_or_else(|| DatabaseError::not_found(ENTITY, id))?;
    record.fotos = list_photos(conn, id)?;
    Ok(record)
}

type StaffName = Option<(String, String, String)>;

fn staff_name(row: &Row<'_>, idx: usize) -> rusqlite::Result<StaffName> {
    let nombre: Option<String> = row.get(idx)?;
    Ok(match nombre {
        Some(nombre) => Some((nombre, row.get(idx + 1)?, row.get(idx + 2)?)),
        None => None,
    })
}

fn render_staff_name(name: StaffName) -> String {
    match name {
        Some((nombre, apellido, role)) => {
            let role: Option<Role> = role.parse().ok();
            staff::titled_name(&nombre, &apellido, role)
        }
        None => staff::MISSING_NAME.to_string(),
    }
}

/// Schedule rows matching `filter`, ordered by date then id.
pub fn list_procedures(conn: &Connection, filter: &ProcedureFilter) -> Result<Vec<ProcedureSummary>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT p.id_procedimiento, p.fecha_qx, p.id_paciente, pa.nombre, pa.apellido, p.qx_planeada, p.status,
                c.nombre, c.apellido, c.privilegios,
                a.nombre, a.apellido, a.privilegios,
                y.nombre, y.apellido, y.privilegios
         FROM procedimientos p
         JOIN pacientes pa ON pa.id_paciente = p.id_paciente
         LEFT JOIN usuarios c ON c.id_usuario = p.id_medico
         LEFT JOIN usuarios a ON a.id_usuario = p.qx_anestesiologo
         LEFT JOIN usuarios y ON y.id_usuario = p.id_ayudante
         WHERE (?1 IS NULL OR p.fecha_qx = ?1)
           AND (?2 IS NULL OR p.id_paciente = ?2)
           AND (?3 IS NULL OR p.id_medico = ?3 OR p.qx_anestesiologo = ?3 OR p.id_ayudante = ?3)
         ORDER BY p.fecha_qx, p.id_procedimiento",
    )?;

    let rows = stmt.query_map(
        params![filter.fecha_qx, filter.id_paciente, filter.id_staff],
        |row| {
            let nombre: String = row.get(3)?;
            let apellido: String = row.get(4)?;
            let status: String = row.get(6)?;
            Ok(ProcedureSummary {
                id_procedimiento: row.get(0)?,
                fecha_qx: row.get(1)?,
                id_paciente: row.get(2)?,
                paciente: format!("{nombre} {apellido}").trim().to_string(),
                qx_planeada: row.get(5)?,
                status: parse_column(6, &status)?,
                cirujano: render_staff_name(staff_name(row, 7)?),
                anestesiologo: render_staff_name(staff_name(row, 10)?),
                ayudante: render_staff_name(staff_name(row, 13)?),
            })
        },
    )?;

    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Delete a procedure; its photo rows go with it (ON DELETE CASCADE).
/// Returns the stored photo file names so the caller can discard them.
/// Deleting an absent id is not an error.
pub fn delete_procedure(conn: &Connection, id: i64) -> Result<Vec<String>, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let files = photo_files_for_procedure(&tx, id)?;
    let rows = tx.execute(
        "DELETE FROM procedimientos WHERE id_procedimiento = ?1",
        params![id],
    )?;
    tx.commit()?;
    if rows > 0 {
        tracing::info!(id_procedimiento = id, photos = files.len(), "Procedure deleted");
    }
    Ok(files)
}

/// Replace one section and bump the version, leaving every other column
/// untouched. With `expected_version`, a stale stamp is a conflict.
/// Returns the new version.
pub fn save_section(
    conn: &Connection,
    id: i64,
    payload: &SectionPayload,
    expected_version: Option<i64>,
) -> Result<i64, DatabaseError> {
    let column = payload.kind().as_str();
    let json = payload.to_json()?;
    // Column names come from SectionKind, never from input.
    let sql = format!(
        "UPDATE procedimientos SET {column} = ?1, version = version + 1
         WHERE id_procedimiento = ?2 AND (?3 IS NULL OR version = ?3)"
    );
    let rows = conn.execute(&sql, params![json, id, expected_version])?;
    bump_result(conn, id, rows, expected_version)
}

/// Status-only patch.
pub fn update_status(
    conn: &Connection,
    id: i64,
    status: ProcedureStatus,
    expected_version: Option<i64>,
) -> Result<i64, DatabaseError> {
    let rows = conn.execute(
        "UPDATE procedimientos SET status = ?1, version = version + 1
         WHERE id_procedimiento = ?2 AND (?3 IS NULL OR version = ?3)",
        params![status.as_str(), id, expected_version],
    )?;
    bump_result(conn, id, rows, expected_version)
}

fn bump_result(
    conn: &Connection,
    id: i64,
    rows: usize,
    expected_version: Option<i64>,
) -> Result<i64, DatabaseError> {
    let stored = stored_version(conn, id)?.ok_or_else(|| DatabaseError::not_found(ENTITY, id))?;
    if rows == 0 {
        return Err(DatabaseError::VersionConflict {
            entity_type: ENTITY.into(),
            id,
            expected: expected_version.unwrap_or(stored),
            actual: stored,
        });
    }
    Ok(stored)
}
