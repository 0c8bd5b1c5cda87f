use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::{ProcedureStatus, SectionKind};
use super::photo::PhotoAttachment;
use super::sections::*;
use super::user::default_hospital;

/// Full procedure record as exchanged with clients.
///
/// `id_procedimiento` absent means "schedule a new procedure". `version` is
/// assigned by the store; sending it back on a full-record save turns on
/// the stale-write check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureRecord {
    #[serde(default)]
    pub id_procedimiento: Option<i64>,
    #[serde(default = "default_hospital")]
    pub id_hospital: i64,
    pub id_paciente: i64,
    #[serde(default)]
    pub id_medico: Option<i64>,
    #[serde(default)]
    pub qx_anestesiologo: Option<i64>,
    #[serde(default)]
    pub id_ayudante: Option<i64>,
    pub fecha_qx: NaiveDate,
    #[serde(default)]
    pub diagnostico: String,
    #[serde(default)]
    pub qx_planeada: String,
    #[serde(default)]
    pub status: ProcedureStatus,
    #[serde(default, deserialize_with = "nullable_section")]
    pub resumen_ingreso: Option<AdmissionNote>,
    #[serde(default, deserialize_with = "nullable_section")]
    pub nota_preanestesica: Option<PreAnesthesiaNote>,
    #[serde(default, deserialize_with = "nullable_section")]
    pub consentimiento: Option<ConsentText>,
    #[serde(default, deserialize_with = "nullable_section")]
    pub nota_postanestesica: Option<PostAnesthesiaNote>,
    #[serde(default, deserialize_with = "nullable_section")]
    pub nota_postoperatoria: Option<PostOpNote>,
    #[serde(default, deserialize_with = "nullable_section")]
    pub indicaciones_postop: Option<PostOpOrders>,
    #[serde(default, deserialize_with = "nullable_section")]
    pub nota_de_alta: Option<DischargeNote>,
    /// Read-only here; photos are added through the attachment store.
    #[serde(default)]
    pub fotos: Vec<PhotoAttachment>,
    #[serde(default)]
    pub version: Option<i64>,
}

impl ProcedureRecord {
    /// The stored payload for `kind`, if it has ever been saved.
    pub fn section(&self, kind: SectionKind) -> Option<SectionPayload> {
        match kind {
            SectionKind::ResumenIngreso => self.resumen_ingreso.clone().map(SectionPayload::ResumenIngreso),
            SectionKind::NotaPreanestesica => self.nota_preanestesica.clone().map(SectionPayload::NotaPreanestesica),
            SectionKind::Consentimiento => self.consentimiento.clone().map(SectionPayload::Consentimiento),
            SectionKind::NotaPostanestesica => self.nota_postanestesica.clone().map(SectionPayload::NotaPostanestesica),
            SectionKind::NotaPostoperatoria => self.nota_postoperatoria.clone().map(SectionPayload::NotaPostoperatoria),
            SectionKind::IndicacionesPostop => self.indicaciones_postop.clone().map(SectionPayload::IndicacionesPostop),
            SectionKind::NotaDeAlta => self.nota_de_alta.clone().map(SectionPayload::NotaDeAlta),
        }
    }

    pub fn set_section(&mut self, payload: SectionPayload) {
        match payload {
            SectionPayload::ResumenIngreso(s) => self.resumen_ingreso = Some(s),
            SectionPayload::NotaPreanestesica(s) => self.nota_preanestesica = Some(s),
            SectionPayload::Consentimiento(s) => self.consentimiento = Some(s),
            SectionPayload::NotaPostanestesica(s) => self.nota_postanestesica = Some(s),
            SectionPayload::NotaPostoperatoria(s) => self.nota_postoperatoria = Some(s),
            SectionPayload::IndicacionesPostop(s) => self.indicaciones_postop = Some(s),
            SectionPayload::NotaDeAlta(s) => self.nota_de_alta = Some(s),
        }
    }

    /// Staff bindings that are set, tagged with the role they fill.
    pub fn staff_bindings(&self) -> Vec<(StaffRole, i64)> {
        [
            (StaffRole::Cirujano, self.id_medico),
            (StaffRole::Anestesiologo, self.qx_anestesiologo),
            (StaffRole::Ayudante, self.id_ayudante),
        ]
        .into_iter()
        .filter_map(|(role, id)| id.map(|id| (role, id)))
        .collect()
    }
}

/// Seat a staff member occupies on a procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Cirujano,
    Anestesiologo,
    Ayudante,
}

impl StaffRole {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cirujano => "Cirujano",
            Self::Anestesiologo => "Anestesiólogo",
            Self::Ayudante => "Ayudante",
        }
    }
}

/// Row of the daily schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcedureSummary {
    pub id_procedimiento: i64,
    pub fecha_qx: NaiveDate,
    pub id_paciente: i64,
    pub paciente: String,
    pub qx_planeada: String,
    pub cirujano: String,
    pub anestesiologo: String,
    pub ayudante: String,
    pub status: ProcedureStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProcedureFilter {
    pub fecha_qx: Option<NaiveDate>,
    pub id_paciente: Option<i64>,
    /// Matches surgeon, anesthesiologist or assistant.
    pub id_staff: Option<i64>,
}
