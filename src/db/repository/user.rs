use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

const USER_COLUMNS: &str =
    "u.id_usuario, u.login, u.email, u.nombre, u.apellido, u.telefono, u.privilegios, u.id_hospital";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get(6)?;
    Ok(User {
        id_usuario: row.get(0)?,
        login: row.get(1)?,
        email: row.get(2)?,
        nombre: row.get(3)?,
        apellido: row.get(4)?,
        telefono: row.get(5)?,
        privilegios: parse_column(6, &role)?,
        id_hospital: row.get(7)?,
    })
}

/// Parse a `str_enum!` column inside a row mapper.
pub(crate) fn parse_column<T>(idx: usize, value: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = DatabaseError>,
{
    T::from_str(value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Insert a user row with an already-hashed password. Returns the new id.
pub fn insert_user(conn: &Connection, form: &UserForm, password_hash: &str) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO usuarios (login, email, password, nombre, apellido, telefono, privilegios, id_hospital)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            form.login,
            form.email,
            password_hash,
            form.nombre,
            form.apellido,
            form.telefono,
            form.privilegios.as_str(),
            form.id_hospital,
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(f, _) if f.code == rusqlite::ErrorCode::ConstraintViolation => {
            DatabaseError::ConstraintViolation(format!("login '{}' ya existe", form.login))
        }
        other => DatabaseError::Sqlite(other),
    })?;
    Ok(conn.last_insert_rowid())
}

/// Update profile fields. `password_hash = None` keeps the stored hash.
pub fn update_user(
    conn: &Connection,
    id: i64,
    form: &UserForm,
    password_hash: Option<&str>,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE usuarios SET login = ?1, email = ?2, nombre = ?3, apellido = ?4, telefono = ?5,
         privilegios = ?6, id_hospital = ?7, password = COALESCE(?8, password)
         WHERE id_usuario = ?9",
        params![
            form.login,
            form.email,
            form.nombre,
            form.apellido,
            form.telefono,
            form.privilegios.as_str(),
            form.id_hospital,
            password_hash,
            id,
        ],
    )?;
    if rows == 0 {
        return Err(DatabaseError::not_found("usuario", id));
    }
    Ok(())
}

pub fn get_user(conn: &Connection, id: i64) -> Result<Option<User>, DatabaseError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM usuarios u WHERE u.id_usuario = ?1");
    Ok(conn.query_row(&sql, params![id], user_from_row).optional()?)
}

/// Look up a user with the stored password hash, for credential checks only.
pub fn find_credentials(conn: &Connection, login: &str) -> Result<Option<(User, String)>, DatabaseError> {
    let sql = format!("SELECT {USER_COLUMNS}, u.password FROM usuarios u WHERE u.login = ?1");
    Ok(conn
        .query_row(&sql, params![login], |row| {
            let user = user_from_row(row)?;
            let hash: String = row.get(8)?;
            Ok((user, hash))
        })
        .optional()?)
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>, DatabaseError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM usuarios u ORDER BY u.apellido, u.nombre, u.id_usuario");
    let mut stmt = conn.prepare(&sql)?;
    let users = stmt
        .query_map([], user_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

pub fn count_users(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM usuarios", [], |row| row.get(0))?)
}

// ═══════════════════════════════════════════
// Medical profiles (medicos)
// ═══════════════════════════════════════════

pub fn upsert_medical_profile(
    conn: &Connection,
    user_id: i64,
    cedula: &str,
    especialidad: &str,
) -> Result<MedicalProfile, DatabaseError> {
    conn.execute(
        "INSERT INTO medicos (id_usuario, cedula, especialidad) VALUES (?1, ?2, ?3)
         ON CONFLICT(id_usuario) DO UPDATE SET cedula = excluded.cedula, especialidad = excluded.especialidad",
        params![user_id, cedula, especialidad],
    )?;
    get_medical_profile(conn, user_id)?
        .ok_or_else(|| DatabaseError::not_found("medico", user_id))
}

pub fn get_medical_profile(conn: &Connection, user_id: i64) -> Result<Option<MedicalProfile>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT id_medico, id_usuario, cedula, especialidad FROM medicos WHERE id_usuario = ?1",
            params![user_id],
            |row| {
                Ok(MedicalProfile {
                    id_medico: row.get(0)?,
                    id_usuario: row.get(1)?,
                    cedula: row.get(2)?,
                    especialidad: row.get(3)?,
                })
            },
        )
        .optional()?)
}

const STAFF_SELECT: &str = "SELECT u.id_usuario, u.login, u.email, u.nombre, u.apellido, u.telefono,
     u.privilegios, u.id_hospital, m.id_medico, m.cedula, m.especialidad
     FROM usuarios u LEFT JOIN medicos m ON m.id_usuario = u.id_usuario";

fn staff_from_row(row: &Row<'_>) -> rusqlite::Result<StaffMember> {
    let user = user_from_row(row)?;
    let id_medico: Option<i64> = row.get(8)?;
    let medico = match id_medico {
        Some(id_medico) => Some(MedicalProfile {
            id_medico,
            id_usuario: user.id_usuario,
            cedula: row.get(9)?,
            especialidad: row.get(10)?,
        }),
        None => None,
    };
    Ok(StaffMember { user, medico })
}

/// A user joined with their medical profile, whatever their role.
pub fn get_staff_member(conn: &Connection, user_id: i64) -> Result<Option<StaffMember>, DatabaseError> {
    let sql = format!("{STAFF_SELECT} WHERE u.id_usuario = ?1");
    Ok(conn.query_row(&sql, params![user_id], staff_from_row).optional()?)
}

/// All users with the Medico role, with their medical profile when present.
pub fn list_medical_staff(conn: &Connection) -> Result<Vec<StaffMember>, DatabaseError> {
    let sql = format!("{STAFF_SELECT} WHERE u.privilegios = 'Medico' ORDER BY u.apellido, u.nombre, u.id_usuario");
    let mut stmt = conn.prepare(&sql)?;
    let staff = stmt
        .query_map([], staff_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(staff)
}
