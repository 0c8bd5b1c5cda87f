//! Staff role resolution: printable names and seat eligibility.
//!
//! The courtesy title is guessed from the given name ("Dra." for names
//! ending in `a` plus a short exception list). This is known to mis-title
//! some people and is kept as-is until users carry an explicit title.

use rusqlite::Connection;
use serde::Serialize;

use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::{ProcedureRecord, Role, StaffMember, StaffRole, User};

/// Printed where a seat is empty or the user is gone.
pub const MISSING_NAME: &str = "N/A";

/// Given names read as female even though they don't end in `a`.
const FEMALE_NAME_EXCEPTIONS: [&str; 3] = ["isabel", "carmen", "ana"];

pub fn display_name(user: Option<&User>) -> String {
    match user {
        Some(u) => titled_name(&u.nombre, &u.apellido, Some(u.privilegios)),
        None => MISSING_NAME.to_string(),
    }
}

/// "Dr./Dra. Nombre Apellido" for Medico users, plain name for everyone else.
pub fn titled_name(nombre: &str, apellido: &str, role: Option<Role>) -> String {
    let plain = format!("{nombre} {apellido}").trim().to_string();
    if role != Some(Role::Medico) {
        return plain;
    }
    let given = nombre.trim().to_lowercase();
    let title = if given.ends_with('a') || FEMALE_NAME_EXCEPTIONS.contains(&given.as_str()) {
        "Dra."
    } else {
        "Dr."
    };
    format!("{title} {plain}")
}

// ═══════════════════════════════════════════════════════════
// Specialty classification
// ═══════════════════════════════════════════════════════════

/// Lowercase and strip Spanish accents so "Anestesiología" == "anestesiologia".
pub fn fold(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' => 'a',
            'é' | 'è' | 'ë' => 'e',
            'í' | 'ì' | 'ï' => 'i',
            'ó' | 'ò' | 'ö' => 'o',
            'ú' | 'ù' | 'ü' => 'u',
            other => other,
        })
        .collect()
}

pub fn is_anesthesiology(specialty: &str) -> bool {
    let s = fold(specialty);
    s.contains("anestesi") || s.contains("anesthesi")
}

pub fn is_general_medicine(specialty: &str) -> bool {
    let s = fold(specialty);
    s.contains("medic") && s.contains("general")
}

/// Whether `member` may fill `seat` on a procedure.
///
/// Any Medico may assist. Anesthesiologists need an anesthesiology
/// specialty. Surgeons may be any Medico except anesthesiology and
/// general medicine.
pub fn is_eligible(member: &StaffMember, seat: StaffRole) -> bool {
    if member.user.privilegios != Role::Medico {
        return false;
    }
    let specialty = member.specialty();
    match seat {
        StaffRole::Ayudante => true,
        StaffRole::Anestesiologo => is_anesthesiology(specialty),
        StaffRole::Cirujano => !is_anesthesiology(specialty) && !is_general_medicine(specialty),
    }
}

/// Option lists for the scheduling form.
#[derive(Debug, Clone, Serialize)]
pub struct StaffPools {
    pub medicos: Vec<StaffMember>,
    pub cirujanos: Vec<StaffMember>,
    pub anestesiologos: Vec<StaffMember>,
    pub ayudantes: Vec<StaffMember>,
}

pub fn staff_pools(conn: &Connection) -> Result<StaffPools, DatabaseError> {
    let medicos = repository::list_medical_staff(conn)?;
    let pool = |seat: StaffRole| -> Vec<StaffMember> {
        medicos.iter().filter(|m| is_eligible(m, seat)).cloned().collect()
    };
    Ok(StaffPools {
        cirujanos: pool(StaffRole::Cirujano),
        anestesiologos: pool(StaffRole::Anestesiologo),
        ayudantes: pool(StaffRole::Ayudante),
        medicos,
    })
}

// ═══════════════════════════════════════════════════════════
// Team resolution
// ═══════════════════════════════════════════════════════════

/// The three staff seats of a procedure, resolved to users.
#[derive(Debug, Clone, Default)]
pub struct ResolvedTeam {
    pub cirujano: Option<StaffMember>,
    pub anestesiologo: Option<StaffMember>,
    pub ayudante: Option<StaffMember>,
}

impl ResolvedTeam {
    pub fn name_of(&self, seat: StaffRole) -> String {
        let member = match seat {
            StaffRole::Cirujano => &self.cirujano,
            StaffRole::Anestesiologo => &self.anestesiologo,
            StaffRole::Ayudante => &self.ayudante,
        };
        display_name(member.as_ref().map(|m| &m.user))
    }
}

pub fn resolve_team(conn: &Connection, record: &ProcedureRecord) -> Result<ResolvedTeam, DatabaseError> {
    let load = |id: Option<i64>| -> Result<Option<StaffMember>, DatabaseError> {
        match id {
            Some(id) => repository::get_staff_member(conn, id),
            None => Ok(None),
        }
    };
    Ok(ResolvedTeam {
        cirujano: load(record.id_medico)?,
        anestesiologo: load(record.qx_anestesiologo)?,
        ayudante: load(record.id_ayudante)?,
    })
}
