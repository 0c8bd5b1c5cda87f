//! Identity store: credential checks, user registration, bearer sessions.

pub mod password;
pub mod session;

pub use password::{hash_password, verify_password, PBKDF2_ITERATIONS};
pub use session::SessionStore;

use rusqlite::Connection;
use thiserror::Error;

use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::{Role, StaffMember, User, UserForm};

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Credenciales inválidas.")]
    InvalidCredentials,
    #[error("Datos incompletos: {0}")]
    MissingField(&'static str),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Check a login/password pair. Unknown login and wrong password are
/// reported identically.
pub fn authenticate(conn: &Connection, login: &str, password: &str) -> Result<User, IdentityError> {
    if login.trim().is_empty() {
        return Err(IdentityError::MissingField("login"));
    }
    if password.is_empty() {
        return Err(IdentityError::MissingField("password"));
    }

    match repository::find_credentials(conn, login.trim())? {
        Some((user, hash)) if verify_password(password, &hash) => {
            tracing::info!(user_id = user.id_usuario, role = %user.privilegios, "Login succeeded");
            Ok(user)
        }
        _ => {
            tracing::warn!(login, "Login rejected");
            Err(IdentityError::InvalidCredentials)
        }
    }
}

/// Create (no id) or edit a user, with their medical profile for Medico
/// users. A password is mandatory on create; a blank one on edit keeps
/// the stored hash.
pub fn register_user(conn: &Connection, form: &UserForm, iterations: u32) -> Result<StaffMember, IdentityError> {
    if form.login.trim().is_empty() {
        return Err(IdentityError::MissingField("login"));
    }
    if form.nombre.trim().is_empty() {
        return Err(IdentityError::MissingField("nombre"));
    }
    let new_hash = form
        .password
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .map(|p| hash_password(p, iterations));

    let tx = conn.unchecked_transaction().map_err(DatabaseError::from)?;
    let id = match form.id_usuario {
        None => {
            let hash = new_hash.ok_or(IdentityError::MissingField("password"))?;
            repository::insert_user(&tx, form, &hash)?
        }
        Some(id) => {
            repository::update_user(&tx, id, form, new_hash.as_deref())?;
            id
        }
    };

    if form.privilegios == Role::Medico && (form.cedula.is_some() || form.especialidad.is_some()) {
        let existing = repository::get_medical_profile(&tx, id)?;
        let cedula = form
            .cedula
            .clone()
            .or_else(|| existing.as_ref().map(|m| m.cedula.clone()))
            .unwrap_or_default();
        let especialidad = form
            .especialidad
            .clone()
            .or_else(|| existing.as_ref().map(|m| m.especialidad.clone()))
            .unwrap_or_default();
        repository::upsert_medical_profile(&tx, id, &cedula, &especialidad)?;
    }
    tx.commit().map_err(DatabaseError::from)?;

    tracing::info!(user_id = id, role = %form.privilegios, "User saved");
    repository::get_staff_member(conn, id)?
        .ok_or_else(|| DatabaseError::not_found("usuario", id).into())
}

/// Seed an Admin account when the user table is empty. Returns whether
/// one was created.
pub fn bootstrap_admin(
    conn: &Connection,
    login: &str,
    password: &str,
    iterations: u32,
) -> Result<bool, IdentityError> {
    if repository::count_users(conn)? > 0 {
        return Ok(false);
    }
    let form = UserForm {
        id_usuario: None,
        login: login.into(),
        email: String::new(),
        password: Some(password.into()),
        nombre: "Administrador".into(),
        apellido: String::new(),
        telefono: String::new(),
        privilegios: Role::Admin,
        id_hospital: 1,
        cedula: None,
        especialidad: None,
    };
    register_user(conn, &form, iterations)?;
    tracing::info!(login, "Bootstrap admin created");
    Ok(true)
}
