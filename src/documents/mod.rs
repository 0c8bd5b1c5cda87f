//! Clinical document generation.
//!
//! Every document renders against a [`Snapshot`] of one procedure: the
//! record itself, its patient and the resolved staff team. A section that
//! has never been saved renders default-shaped, with a few fields derived
//! from the procedure (see [`Snapshot::post_op`] and
//! [`Snapshot::discharge`]). Saving goes through the repository's
//! section-scoped write, so a document never touches sibling sections.

pub mod html;
pub mod layout;
pub mod pdf;
mod templates;

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;
use thiserror::Error;

use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::*;
use crate::staff::{resolve_team, ResolvedTeam};

pub use layout::PrintableDocument;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: DocumentKind,
        source: serde_json::Error,
    },

    #[error("PDF export failed: {0}")]
    Pdf(String),
}

/// Everything a document reads.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub procedure: ProcedureRecord,
    pub patient: Patient,
    pub team: ResolvedTeam,
}

pub fn load_snapshot(conn: &Connection, procedure_id: i64) -> Result<Snapshot, DocumentError> {
    let procedure = repository::get_procedure(conn, procedure_id)?;
    let patient = repository::get_patient(conn, procedure.id_paciente)?
        .ok_or_else(|| DatabaseError::not_found("patient", procedure.id_paciente))?;
    let team = resolve_team(conn, &procedure)?;
    Ok(Snapshot {
        procedure,
        patient,
        team,
    })
}

impl Snapshot {
    pub fn admission(&self) -> AdmissionNote {
        self.procedure.resumen_ingreso.clone().unwrap_or_default()
    }

    pub fn pre_anesthesia(&self) -> PreAnesthesiaNote {
        self.procedure.nota_preanestesica.clone().unwrap_or_default()
    }

    pub fn consent(&self) -> ConsentText {
        self.procedure.consentimiento.clone().unwrap_or_default()
    }

    pub fn post_anesthesia(&self) -> PostAnesthesiaNote {
        self.procedure.nota_postanestesica.clone().unwrap_or_default()
    }

    /// Stored note, or one prefilled from the planned procedure.
    pub fn post_op(&self) -> PostOpNote {
        match &self.procedure.nota_postoperatoria {
            Some(note) => note.clone(),
            None => PostOpNote {
                diagnostico_postqx: self.procedure.diagnostico.clone(),
                cirugia_realizada: self.procedure.qx_planeada.clone(),
                incidentes: "Ninguno".into(),
                ..PostOpNote::default()
            },
        }
    }

    pub fn post_op_orders(&self) -> PostOpOrders {
        self.procedure.indicaciones_postop.clone().unwrap_or_default()
    }

    /// Stored note, or one dated `today` whose diagnosis is the
    /// post-operative one when recorded, else the admission diagnosis.
    pub fn discharge(&self, today: NaiveDate) -> DischargeNote {
        if let Some(note) = &self.procedure.nota_de_alta {
            return note.clone();
        }
        let dx_egreso = self
            .procedure
            .nota_postoperatoria
            .as_ref()
            .map(|n| n.diagnostico_postqx.clone())
            .filter(|dx| !dx.trim().is_empty())
            .unwrap_or_else(|| self.procedure.diagnostico.clone());
        DischargeNote {
            fecha_egreso: today.format("%Y-%m-%d").to_string(),
            dx_egreso,
            motivo_egreso: DischargeReason::Mejoria,
            ..DischargeNote::default()
        }
    }

    /// The section `kind` edits, as its form should be prefilled.
    pub fn effective_section(&self, kind: DocumentKind, today: NaiveDate) -> SectionPayload {
        match kind.section() {
            SectionKind::ResumenIngreso => SectionPayload::ResumenIngreso(self.admission()),
            SectionKind::NotaPreanestesica => SectionPayload::NotaPreanestesica(self.pre_anesthesia()),
            SectionKind::Consentimiento => SectionPayload::Consentimiento(self.consent()),
            SectionKind::NotaPostanestesica => SectionPayload::NotaPostanestesica(self.post_anesthesia()),
            SectionKind::NotaPostoperatoria => SectionPayload::NotaPostoperatoria(self.post_op()),
            SectionKind::IndicacionesPostop => SectionPayload::IndicacionesPostop(self.post_op_orders()),
            SectionKind::NotaDeAlta => SectionPayload::NotaDeAlta(self.discharge(today)),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Rendering
// ═══════════════════════════════════════════════════════════

pub fn compose(snapshot: &Snapshot, kind: DocumentKind, today: NaiveDate) -> PrintableDocument {
    templates::compose(snapshot, kind, today)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub kind: DocumentKind,
    pub file_name: String,
    pub html: String,
}

/// Print-ready HTML for one document. Same data and date give the same bytes.
pub fn render(
    conn: &Connection,
    procedure_id: i64,
    kind: DocumentKind,
    today: NaiveDate,
) -> Result<RenderedDocument, DocumentError> {
    let snapshot = load_snapshot(conn, procedure_id)?;
    let document = compose(&snapshot, kind, today);
    Ok(RenderedDocument {
        kind,
        file_name: file_name(kind, procedure_id, "html"),
        html: html::to_html(&document),
    })
}

pub fn render_pdf(
    conn: &Connection,
    procedure_id: i64,
    kind: DocumentKind,
    today: NaiveDate,
) -> Result<Vec<u8>, DocumentError> {
    let snapshot = load_snapshot(conn, procedure_id)?;
    pdf::to_pdf(&compose(&snapshot, kind, today))
}

pub fn file_name(kind: DocumentKind, procedure_id: i64, extension: &str) -> String {
    format!("{}_{procedure_id}.{extension}", kind.as_str())
}

/// Prefill state for a document form.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentForm {
    pub tipo: DocumentKind,
    pub titulo: &'static str,
    pub seccion: serde_json::Value,
    /// Whether the section has been saved before.
    pub guardado: bool,
    pub version: Option<i64>,
}

pub fn form_state(
    conn: &Connection,
    procedure_id: i64,
    kind: DocumentKind,
    today: NaiveDate,
) -> Result<DocumentForm, DocumentError> {
    let snapshot = load_snapshot(conn, procedure_id)?;
    let payload = snapshot.effective_section(kind, today);
    let seccion = serde_json::from_str(&payload.to_json().map_err(DatabaseError::from)?)
        .map_err(DatabaseError::from)?;
    Ok(DocumentForm {
        tipo: kind,
        titulo: kind.title(),
        seccion,
        guardado: snapshot.procedure.section(kind.section()).is_some(),
        version: snapshot.procedure.version,
    })
}

// ═══════════════════════════════════════════════════════════
// Saving
// ═══════════════════════════════════════════════════════════

/// Replace the section behind `kind` with `payload`. Returns the new
/// procedure version.
pub fn save(
    conn: &Connection,
    procedure_id: i64,
    kind: DocumentKind,
    payload: serde_json::Value,
    expected_version: Option<i64>,
) -> Result<i64, DocumentError> {
    let section = SectionPayload::from_value(kind.section(), payload)
        .map_err(|source| DocumentError::InvalidPayload { kind, source })?;
    let version = repository::save_section(conn, procedure_id, &section, expected_version)?;
    tracing::info!(procedure_id, document = %kind, version, "Document section saved");
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::repository::{get_procedure, upsert_procedure};
    use crate::db::sqlite::open_memory_database;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn scheduled(conn: &Connection) -> (Team, i64) {
        let team = seed_team(conn);
        let stored = upsert_procedure(conn, &sample_procedure(&team)).unwrap();
        (team, stored.id_procedimiento.unwrap())
    }

    #[test]
    fn admission_note_carries_header_and_surgeon() {
        let conn = open_memory_database().unwrap();
        let (_, id) = scheduled(&conn);

        let doc = render(&conn, id, DocumentKind::NotaIngreso, today()).unwrap();
        let html = doc.html;
        assert!(html.contains("<h2>Nota de Ingreso</h2>"));
        assert!(html.contains("<strong>Paciente:</strong> Lucía Pérez"));
        assert!(html.contains("<strong>Edad:</strong> 34 años"));
        assert!(html.contains("<strong>Fecha:</strong> viernes, 15 de marzo de 2024"));
        assert!(html.contains("Colecistectomía laparoscópica"));
        assert!(html.contains("<p>Dr. Carlos Méndez</p><p>Cirujano</p>"));
        assert_eq!(doc.file_name, format!("nota_ingreso_{id}.html"));
    }

    #[test]
    fn rendering_is_idempotent() {
        let conn = open_memory_database().unwrap();
        let (_, id) = scheduled(&conn);
        for kind in DocumentKind::ALL {
            let a = render(&conn, id, kind, today()).unwrap();
            let b = render(&conn, id, kind, today()).unwrap();
            assert_eq!(a, b, "{kind} rendered differently");
        }
    }

    #[test]
    fn post_op_defaults_come_from_plan() {
        let conn = open_memory_database().unwrap();
        let (_, id) = scheduled(&conn);
        let snapshot = load_snapshot(&conn, id).unwrap();

        let note = snapshot.post_op();
        assert_eq!(note.diagnostico_postqx, "Colecistitis crónica litiásica");
        assert_eq!(note.cirugia_realizada, "Colecistectomía laparoscópica");
        assert_eq!(note.incidentes, "Ninguno");
        assert_eq!(note.tecnica, "");

        let html = render(&conn, id, DocumentKind::NotaPostoperatoria, today()).unwrap().html;
        assert!(html.contains("<strong>Fecha Cirugía:</strong> 15 de marzo de 2024"));
        assert!(html.contains("<strong>Incidentes:</strong> Ninguno"));
        assert!(html.contains("<p>Dra. Ana Garza</p><p>Anestesiólogo</p>"));
        assert!(html.contains("<p>Dr. Jorge Ruiz</p><p>Ayudante</p>"));
    }

    #[test]
    fn discharge_defaults_follow_post_op_diagnosis() {
        let conn = open_memory_database().unwrap();
        let (_, id) = scheduled(&conn);
        let now = NaiveDate::from_ymd_opt(2024, 3, 18).unwrap();

        let note = load_snapshot(&conn, id).unwrap().discharge(now);
        assert_eq!(note.fecha_egreso, "2024-03-18");
        assert_eq!(note.dx_egreso, "Colecistitis crónica litiásica");
        assert_eq!(note.motivo_egreso, DischargeReason::Mejoria);

        save(
            &conn,
            id,
            DocumentKind::NotaPostoperatoria,
            json!({"diagnostico_postqx": "Colecistitis aguda"}),
            None,
        )
        .unwrap();
        let note = load_snapshot(&conn, id).unwrap().discharge(now);
        assert_eq!(note.dx_egreso, "Colecistitis aguda");

        let html = render(&conn, id, DocumentKind::NotaDeAlta, now).unwrap().html;
        assert!(html.contains("<strong>Fecha de Egreso:</strong> 18 de marzo de 2024"));
        assert!(html.contains("<strong>Motivo de Egreso:</strong> Mejoría Clínica"));
        assert!(html.contains("<p>C.P. CP-00001</p>"));
    }

    #[test]
    fn surgical_consent_text_and_fallbacks() {
        let conn = open_memory_database().unwrap();
        let (_, id) = scheduled(&conn);

        let html = render(&conn, id, DocumentKind::ConsentimientoQuirurgico, today()).unwrap().html;
        assert!(html.contains("NOM-004-SSA3-2012"));
        assert!(html.contains("NOM 006-SSA3-2011"));
        assert!(html.contains("<strong>Riesgos:</strong> No especificados."));
        assert!(html.contains("<strong>Procedimiento Proyectado:</strong> Colecistectomía laparoscópica"));
        assert!(html.contains("<p>Paciente, Familiar o Representante Legal</p>"));

        save(
            &conn,
            id,
            DocumentKind::ConsentimientoQuirurgico,
            json!({"riesgos": "Sangrado, infección", "beneficios": "Resolución del cuadro"}),
            None,
        )
        .unwrap();
        let html = render(&conn, id, DocumentKind::ConsentimientoQuirurgico, today()).unwrap().html;
        assert!(html.contains("<strong>Riesgos:</strong> Sangrado, infección"));
        assert!(html.contains("<strong>Beneficios:</strong> Resolución del cuadro"));
    }

    #[test]
    fn anesthesia_consent_is_witnessed() {
        let conn = open_memory_database().unwrap();
        let (_, id) = scheduled(&conn);
        let html = render(&conn, id, DocumentKind::ConsentimientoAnestesico, today()).unwrap().html;
        assert_eq!(html.matches("<p>Testigo</p>").count(), 2);
        assert!(html.contains("<p>Dra. Ana Garza</p>"));
        assert!(html.contains("paro cardiorrespiratorio y muerte."));
    }

    #[test]
    fn save_replaces_only_its_section() {
        let conn = open_memory_database().unwrap();
        let (_, id) = scheduled(&conn);
        save(&conn, id, DocumentKind::NotaIngreso, json!({"interrogatorio": "Dolor"}), None).unwrap();

        let before = get_procedure(&conn, id).unwrap();
        let version = save(
            &conn,
            id,
            DocumentKind::IndicacionesPostoperatorias,
            json!({"medicamentos": "Paracetamol 1 g c/8h"}),
            before.version,
        )
        .unwrap();

        let after = get_procedure(&conn, id).unwrap();
        assert_eq!(after.version, Some(version));
        assert_eq!(after.resumen_ingreso, before.resumen_ingreso);
        let orders = after.indicaciones_postop.unwrap();
        assert_eq!(orders.medicamentos, "Paracetamol 1 g c/8h");
        assert_eq!(orders.examenes, "");
    }

    #[test]
    fn stale_save_is_a_conflict() {
        let conn = open_memory_database().unwrap();
        let (_, id) = scheduled(&conn);
        save(&conn, id, DocumentKind::NotaIngreso, json!({}), Some(1)).unwrap();
        let err = save(&conn, id, DocumentKind::NotaDeAlta, json!({}), Some(1)).unwrap_err();
        assert!(matches!(err, DocumentError::Database(DatabaseError::VersionConflict { .. })));
    }

    #[test]
    fn malformed_payload_is_rejected() {
        let conn = open_memory_database().unwrap();
        let (_, id) = scheduled(&conn);
        let err = save(&conn, id, DocumentKind::NotaDeAlta, json!({"motivo_egreso": "fuga"}), None).unwrap_err();
        assert!(matches!(err, DocumentError::InvalidPayload { kind: DocumentKind::NotaDeAlta, .. }));
        assert!(get_procedure(&conn, id).unwrap().nota_de_alta.is_none());
    }

    #[test]
    fn unknown_procedure_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err = render(&conn, 99, DocumentKind::NotaIngreso, today()).unwrap_err();
        assert!(matches!(err, DocumentError::Database(DatabaseError::NotFound { .. })));
        let err = save(&conn, 99, DocumentKind::NotaIngreso, json!({}), None).unwrap_err();
        assert!(matches!(err, DocumentError::Database(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn empty_seats_print_placeholder() {
        let conn = open_memory_database().unwrap();
        let team = seed_team(&conn);
        let mut record = sample_procedure(&team);
        record.id_ayudante = None;
        let id = upsert_procedure(&conn, &record).unwrap().id_procedimiento.unwrap();

        let html = render(&conn, id, DocumentKind::NotaPostoperatoria, today()).unwrap().html;
        assert!(html.contains("<p>N/A</p><p>Ayudante</p>"));
    }

    #[test]
    fn clinical_text_is_escaped() {
        let conn = open_memory_database().unwrap();
        let (_, id) = scheduled(&conn);
        save(
            &conn,
            id,
            DocumentKind::NotaIngreso,
            json!({"planTratamiento": "<script>alert(1)</script>"}),
            None,
        )
        .unwrap();
        let html = render(&conn, id, DocumentKind::NotaIngreso, today()).unwrap().html;
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert_eq!(html.matches("<script>").count(), 1);
    }

    #[test]
    fn form_state_reports_prefill() {
        let conn = open_memory_database().unwrap();
        let (_, id) = scheduled(&conn);
        let form = form_state(&conn, id, DocumentKind::NotaPostoperatoria, today()).unwrap();
        assert!(!form.guardado);
        assert_eq!(form.seccion["incidentes"], "Ninguno");
        assert_eq!(form.titulo, "Nota Postoperatoria");
        assert_eq!(form.version, Some(1));
    }

    #[test]
    fn pdf_export_renders() {
        let conn = open_memory_database().unwrap();
        let (_, id) = scheduled(&conn);
        let bytes = render_pdf(&conn, id, DocumentKind::ConsentimientoQuirurgico, today()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
