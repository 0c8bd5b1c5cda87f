//! Structured document sections stored on a procedure.
//!
//! Every struct derives `Default` and is `#[serde(default)]`, so a saved
//! section always carries all of its sub-fields: anything the client
//! omits, or sends as `null`, comes back as an empty string.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::enums::{DischargeReason, SectionKind};

/// Drop `null` members at every depth so `#[serde(default)]` fills them.
fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

fn decode<T: DeserializeOwned>(mut value: Value) -> Result<T, serde_json::Error> {
    if value.is_null() {
        value = Value::Object(Default::default());
    }
    strip_nulls(&mut value);
    serde_json::from_value(value)
}

/// `deserialize_with` for the optional sections of a procedure record:
/// `null` is an unsaved section, `null` sub-fields take their defaults.
pub fn nullable_section<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        None => Ok(None),
        Some(value) => decode(value).map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalSigns {
    #[serde(rename = "TA")]
    pub ta: String,
    #[serde(rename = "FC")]
    pub fc: String,
    #[serde(rename = "FR")]
    pub fr: String,
    #[serde(rename = "Temp")]
    pub temp: String,
    #[serde(rename = "SatO2")]
    pub sat_o2: String,
}

impl VitalSigns {
    pub fn summary(&self) -> String {
        format!(
            "TA: {} | FC: {} | FR: {} | Temp: {} | SatO2: {}",
            self.ta, self.fc, self.fr, self.temp, self.sat_o2
        )
    }
}

// ── Admission ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionNote {
    #[serde(rename = "signosVitales")]
    pub signos_vitales: VitalSigns,
    pub interrogatorio: String,
    #[serde(rename = "exploracionFisica")]
    pub exploracion_fisica: String,
    #[serde(rename = "planTratamiento")]
    pub plan_tratamiento: String,
}

// ── Pre-anesthesia ────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnesthesiaHistory {
    pub tabaquismo: String,
    pub alcoholismo: String,
    pub toxicomanias: String,
    pub ejercicio: String,
    pub asma: String,
    pub alergias: String,
    pub cardiovascular: String,
    pub pulmonar: String,
    pub endocrinologico: String,
    pub antecedentes_anestesicos: String,
    pub antecedentes_quirurgicos: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreAnesthesiaExam {
    pub peso: String,
    pub talla: String,
    #[serde(rename = "TA")]
    pub ta: String,
    #[serde(rename = "FC")]
    pub fc: String,
    #[serde(rename = "FR")]
    pub fr: String,
    #[serde(rename = "Temp")]
    pub temp: String,
    #[serde(rename = "SatO2")]
    pub sat_o2: String,
    pub tegumentos: String,
    pub cabeza: String,
    pub traquea: String,
    #[serde(rename = "CP")]
    pub cp: String,
    pub cardio: String,
    pub extremidades: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AirwayAssessment {
    pub mallampati: String,
    pub aldreti: String,
    #[serde(rename = "bellhouseDore")]
    pub bellhouse_dore: String,
    pub interincisiva: String,
    #[serde(rename = "outras")]
    pub otras: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabPanel {
    pub hb: String,
    pub hct: String,
    pub leucos: String,
    pub plaquetas: String,
    pub glucosa: String,
    pub creatinina: String,
    pub bun: String,
    pub urea: String,
    pub tp: String,
    pub ttp: String,
    pub inr: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnesthesiaPlan {
    pub valoraciones: String,
    pub plan: String,
    pub indicaciones: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreAnesthesiaNote {
    pub antecedentes: AnesthesiaHistory,
    pub exploracion: PreAnesthesiaExam,
    #[serde(rename = "viaAerea")]
    pub via_aerea: AirwayAssessment,
    pub laboratorio: LabPanel,
    pub ekg: String,
    #[serde(rename = "planAnestesico")]
    pub plan_anestesico: AnesthesiaPlan,
}

// ── Consent ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsentText {
    pub riesgos: String,
    pub beneficios: String,
}

// ── Post-anesthesia ───────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostAnesthesiaNote {
    pub tecnica_anestesica: String,
    pub liquidos: String,
    pub inicio_anestesia: String,
    pub termino_anestesia: String,
    pub inicio_cirugia: String,
    pub termino_cirugia: String,
    #[serde(rename = "signosVitalesIngresoUCPA")]
    pub signos_vitales_ingreso_ucpa: VitalSigns,
    #[serde(rename = "signosVitalesAltaUCPA")]
    pub signos_vitales_alta_ucpa: VitalSigns,
    #[serde(rename = "signosVitalesAltaAnestesio")]
    pub signos_vitales_alta_anestesio: VitalSigns,
    #[serde(rename = "indicaciones_altaAnestesio")]
    pub indicaciones_alta_anestesio: String,
}

// ── Post-op ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostOpNote {
    pub diagnostico_postqx: String,
    pub cirugia_realizada: String,
    pub tecnica: String,
    pub hallazgos: String,
    pub sangrado: String,
    pub incidentes: String,
    pub complicaciones: String,
    pub cuenta_material: String,
    pub pronostico: String,
    pub recomendaciones_postop: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostOpOrders {
    pub soluciones_dieta: String,
    pub medicamentos: String,
    pub examenes: String,
    pub actividades_enfermeria: String,
}

// ── Discharge ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DischargeNote {
    /// ISO date; empty until the note is first filled in.
    pub fecha_egreso: String,
    pub dx_egreso: String,
    pub motivo_egreso: DischargeReason,
    pub resumen_egreso: String,
    pub indicaciones_egreso: String,
}

// ═══════════════════════════════════════════════════════════
// SectionPayload: one section, tagged by kind
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum SectionPayload {
    ResumenIngreso(AdmissionNote),
    NotaPreanestesica(PreAnesthesiaNote),
    Consentimiento(ConsentText),
    NotaPostanestesica(PostAnesthesiaNote),
    NotaPostoperatoria(PostOpNote),
    IndicacionesPostop(PostOpOrders),
    NotaDeAlta(DischargeNote),
}

impl SectionPayload {
    pub fn kind(&self) -> SectionKind {
        match self {
            Self::ResumenIngreso(_) => SectionKind::ResumenIngreso,
            Self::NotaPreanestesica(_) => SectionKind::NotaPreanestesica,
            Self::Consentimiento(_) => SectionKind::Consentimiento,
            Self::NotaPostanestesica(_) => SectionKind::NotaPostanestesica,
            Self::NotaPostoperatoria(_) => SectionKind::NotaPostoperatoria,
            Self::IndicacionesPostop(_) => SectionKind::IndicacionesPostop,
            Self::NotaDeAlta(_) => SectionKind::NotaDeAlta,
        }
    }

    /// Decode a client-supplied JSON object as the section `kind` expects.
    pub fn from_value(kind: SectionKind, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            SectionKind::ResumenIngreso => Self::ResumenIngreso(decode(value)?),
            SectionKind::NotaPreanestesica => Self::NotaPreanestesica(decode(value)?),
            SectionKind::Consentimiento => Self::Consentimiento(decode(value)?),
            SectionKind::NotaPostanestesica => Self::NotaPostanestesica(decode(value)?),
            SectionKind::NotaPostoperatoria => Self::NotaPostoperatoria(decode(value)?),
            SectionKind::IndicacionesPostop => Self::IndicacionesPostop(decode(value)?),
            SectionKind::NotaDeAlta => Self::NotaDeAlta(decode(value)?),
        })
    }

    /// Serialized column text.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        match self {
            Self::ResumenIngreso(s) => serde_json::to_string(s),
            Self::NotaPreanestesica(s) => serde_json::to_string(s),
            Self::Consentimiento(s) => serde_json::to_string(s),
            Self::NotaPostanestesica(s) => serde_json::to_string(s),
            Self::NotaPostoperatoria(s) => serde_json::to_string(s),
            Self::IndicacionesPostop(s) => serde_json::to_string(s),
            Self::NotaDeAlta(s) => serde_json::to_string(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_fields_become_empty_strings() {
        let note: AdmissionNote =
            serde_json::from_value(json!({"interrogatorio": "Dolor abdominal"})).unwrap();
        assert_eq!(note.interrogatorio, "Dolor abdominal");
        assert_eq!(note.plan_tratamiento, "");
        assert_eq!(note.signos_vitales.sat_o2, "");

        let out = serde_json::to_value(&note).unwrap();
        assert_eq!(out["signosVitales"]["SatO2"], "");
        assert_eq!(out["exploracionFisica"], "");
    }

    #[test]
    fn pre_anesthesia_keeps_nested_shape() {
        let value = json!({
            "antecedentes": {"asma": "Negado"},
            "viaAerea": {"mallampati": "II", "bellhouseDore": "I"},
            "ekg": "Ritmo sinusal"
        });
        let note: PreAnesthesiaNote = serde_json::from_value(value).unwrap();
        assert_eq!(note.antecedentes.asma, "Negado");
        assert_eq!(note.antecedentes.alergias, "");
        assert_eq!(note.via_aerea.bellhouse_dore, "I");
        assert_eq!(note.laboratorio.inr, "");
        assert_eq!(note.plan_anestesico, AnesthesiaPlan::default());
    }

    #[test]
    fn null_fields_become_empty_strings() {
        let payload = SectionPayload::from_value(
            SectionKind::ResumenIngreso,
            json!({
                "interrogatorio": null,
                "signosVitales": {"TA": null, "FC": "72"},
                "planTratamiento": "Reposo"
            }),
        )
        .unwrap();
        let SectionPayload::ResumenIngreso(note) = payload else {
            panic!("wrong section");
        };
        assert_eq!(note.interrogatorio, "");
        assert_eq!(note.signos_vitales.ta, "");
        assert_eq!(note.signos_vitales.fc, "72");
        assert_eq!(note.plan_tratamiento, "Reposo");

        let payload =
            SectionPayload::from_value(SectionKind::NotaDeAlta, json!({"motivo_egreso": null})).unwrap();
        assert_eq!(payload, SectionPayload::NotaDeAlta(DischargeNote::default()));
        assert!(SectionPayload::from_value(SectionKind::Consentimiento, Value::Null).is_ok());
    }

    #[test]
    fn record_sections_accept_null_sub_fields() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(default, deserialize_with = "nullable_section")]
            consentimiento: Option<ConsentText>,
        }

        let held: Holder = serde_json::from_value(json!({"consentimiento": {"riesgos": null}})).unwrap();
        assert_eq!(held.consentimiento, Some(ConsentText::default()));
        let held: Holder = serde_json::from_value(json!({"consentimiento": null})).unwrap();
        assert_eq!(held.consentimiento, None);
        let held: Holder = serde_json::from_value(json!({})).unwrap();
        assert_eq!(held.consentimiento, None);
    }

    #[test]
    fn discharge_reason_defaults_when_absent() {
        let note: DischargeNote = serde_json::from_value(json!({})).unwrap();
        assert_eq!(note.motivo_egreso, DischargeReason::Mejoria);
        let note: DischargeNote =
            serde_json::from_value(json!({"motivo_egreso": "defuncion"})).unwrap();
        assert_eq!(note.motivo_egreso, DischargeReason::Defuncion);
    }

    #[test]
    fn unknown_discharge_reason_is_rejected() {
        let err = SectionPayload::from_value(
            SectionKind::NotaDeAlta,
            json!({"motivo_egreso": "fuga"}),
        );
        assert!(err.is_err());
    }

    #[test]
    fn payload_kind_matches_decoder() {
        for kind in SectionKind::ALL {
            let payload = SectionPayload::from_value(kind, json!({})).unwrap();
            assert_eq!(payload.kind(), kind);
            assert!(payload.to_json().unwrap().starts_with('{'));
        }
    }

    #[test]
    fn post_anesthesia_vital_snapshots_are_independent() {
        let note: PostAnesthesiaNote = serde_json::from_value(json!({
            "signosVitalesIngresoUCPA": {"TA": "120/80"},
            "indicaciones_altaAnestesio": "Ayuno 6h"
        }))
        .unwrap();
        assert_eq!(note.signos_vitales_ingreso_ucpa.ta, "120/80");
        assert_eq!(note.signos_vitales_alta_ucpa.ta, "");
        assert_eq!(note.indicaciones_alta_anestesio, "Ayuno 6h");
    }
}
