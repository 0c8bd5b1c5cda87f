//! Page content of the eight clinical documents.

use chrono::NaiveDate;

use super::layout::*;
use super::Snapshot;
use crate::models::{DocumentKind, StaffRole, VitalSigns};
use crate::staff::MISSING_NAME;

const LEGAL_BASIS: &str = "Fundamentos: Reglamento de la Ley General de Salud en materia de \
prestación de servicios de atención médica; artículo 80, 81, 82 y 83; Norma Oficial Mexicana, \
NOM-004-SSA3-2012, del expediente clínico, numerales 4.2, 10.1, 10.1.2, 10.1.3, 10.1.2.3 y \
NOM 006-SSA3-2011.";

const CONSENTING_PARTY: &str =
    "Yo como paciente ( ), Familiar ( ), Tutor ( ) o Representante Legal ( )";

const NAME_BLANK: &str = "_________________________________________________________________";

const PATIENT_SIGNATURE: &str = "Paciente, Familiar o Representante Legal";

const WITNESS: &str = "Testigo";

const UNSPECIFIED: &str = "No especificados.";

pub fn compose(snapshot: &Snapshot, kind: DocumentKind, today: NaiveDate) -> PrintableDocument {
    let (header, blocks, signatures) = match kind {
        DocumentKind::NotaIngreso => admission(snapshot, today),
        DocumentKind::ConsentimientoQuirurgico => surgical_consent(snapshot, today),
        DocumentKind::ConsentimientoAnestesico => anesthesia_consent(snapshot, today),
        DocumentKind::NotaPreanestesica => pre_anesthesia(snapshot, today),
        DocumentKind::NotaPostanestesica => post_anesthesia(snapshot, today),
        DocumentKind::NotaPostoperatoria => post_op(snapshot),
        DocumentKind::IndicacionesPostoperatorias => post_op_orders(snapshot, today),
        DocumentKind::NotaDeAlta => discharge(snapshot, today),
    };
    PrintableDocument {
        title: kind.title(),
        header,
        blocks,
        signatures,
    }
}

type Parts = (Vec<HeaderLine>, Vec<Block>, Vec<Vec<Signature>>);

fn standard_header(snapshot: &Snapshot, today: NaiveDate) -> Vec<HeaderLine> {
    vec![
        HeaderLine::new("Paciente", snapshot.patient.full_name()),
        HeaderLine::new("Edad", format!("{} años", snapshot.patient.age_on(today))),
        HeaderLine::new("Fecha", long_date_with_weekday(today)),
    ]
}

fn planned(snapshot: &Snapshot) -> Vec<Block> {
    vec![
        Block::field("Diagnóstico", &snapshot.procedure.diagnostico),
        Block::field("Procedimiento Planeado", &snapshot.procedure.qx_planeada),
    ]
}

fn vitals_row(vitals: &VitalSigns) -> Vec<(&'static str, String)> {
    vec![
        ("TA", vitals.ta.clone()),
        ("FC", vitals.fc.clone()),
        ("FR", vitals.fr.clone()),
        ("Temp", vitals.temp.clone()),
        ("SatO2", vitals.sat_o2.clone()),
    ]
}

/// Surgeon signature with license number underneath.
fn surgeon_with_license(snapshot: &Snapshot) -> Vec<Vec<Signature>> {
    let cedula = snapshot
        .team
        .cirujano
        .as_ref()
        .map(|m| m.license())
        .filter(|c| !c.is_empty())
        .unwrap_or(MISSING_NAME);
    vec![vec![Signature::captioned(
        snapshot.team.name_of(StaffRole::Cirujano),
        format!("C.P. {cedula}"),
    )]]
}

fn seat_signature(snapshot: &Snapshot, seat: StaffRole) -> Signature {
    Signature::captioned(snapshot.team.name_of(seat), seat.label())
}

fn admission(snapshot: &Snapshot, today: NaiveDate) -> Parts {
    let note = snapshot.admission();
    let v = &note.signos_vitales;
    let mut blocks = planned(snapshot);
    blocks.extend([
        Block::section(
            "Signos Vitales",
            format!(
                "TA: {} mmHg | FC: {} lpm | FR: {} rpm | Temp: {} °C | SatO2: {} %",
                v.ta, v.fc, v.fr, v.temp, v.sat_o2
            ),
        ),
        Block::section("Resumen del Interrogatorio", note.interrogatorio),
        Block::section("Exploración Física", note.exploracion_fisica),
        Block::section("Plan de Tratamiento", note.plan_tratamiento),
    ]);
    (
        standard_header(snapshot, today),
        blocks,
        vec![vec![seat_signature(snapshot, StaffRole::Cirujano)]],
    )
}

fn consent_preamble() -> Vec<Block> {
    vec![
        Block::Notice(LEGAL_BASIS.into()),
        Block::Statement(CONSENTING_PARTY.into()),
        Block::field("Nombre", NAME_BLANK),
    ]
}

fn consent_footer(snapshot: &Snapshot) -> [Block; 2] {
    [
        Block::field("Diagnóstico", &snapshot.procedure.diagnostico),
        Block::field("Procedimiento Proyectado", &snapshot.procedure.qx_planeada),
    ]
}

fn or_unspecified(text: &str) -> String {
    if text.trim().is_empty() {
        UNSPECIFIED.to_string()
    } else {
        text.to_string()
    }
}

fn surgical_consent(snapshot: &Snapshot, today: NaiveDate) -> Parts {
    let consent = snapshot.consent();
    let mut blocks = consent_preamble();
    blocks.extend([
        Block::Paragraph(
            "Manifiesto mi libre voluntad para autorizar los procedimientos diagnósticos, \
terapéuticos y quirúrgicos que se me indiquen después de haber recibido y entendido la información \
suficiente, clara, oportuna y veraz sobre mi enfermedad y estado actual; además de los beneficios, \
riesgos y posibles complicaciones y secuelas inherentes."
                .into(),
        ),
        Block::Paragraph(
            "Se me han comunicado las alternativas existentes y disponibles, el derecho a cambio de \
mi decisión en cualquier momento antes del procedimiento o intervención. Me comprometo a \
proporcionar información completa y veraz, así como seguir las indicaciones médicas con el \
propósito de que mi atención sea adecuada. Otorgo mi autorización al personal de salud para la \
atención de contingencias y urgencias derivadas del acto médico-quirúrgico señalado, atendiendo al \
principio de libertad prescriptiva."
                .into(),
        ),
        Block::Paragraph(
            "Se me han explicado a detalle todos los beneficios y posibles riesgos relacionados con \
su realización que a continuación se mencionan:"
                .into(),
        ),
        Block::field("Riesgos", or_unspecified(&consent.riesgos)),
        Block::field("Beneficios", or_unspecified(&consent.beneficios)),
        Block::Paragraph(
            "Otorgo mi consentimiento para que se me administre el tipo de anestesia que por mi \
particular estado de salud y tipo de cirugía a la que seré sometido, se me practiquen de ser \
necesarios, los procedimientos de monitoreo invasivos intraoperatorios pertinentes (colocación de \
sondas, catéter venoso central, canalización de línea arterial)."
                .into(),
        ),
    ]);
    blocks.extend(consent_footer(snapshot));
    (
        standard_header(snapshot, today),
        blocks,
        vec![vec![
            Signature::new(PATIENT_SIGNATURE),
            Signature::new(snapshot.team.name_of(StaffRole::Cirujano)),
        ]],
    )
}

fn anesthesia_consent(snapshot: &Snapshot, today: NaiveDate) -> Parts {
    let mut blocks = consent_preamble();
    blocks.extend([
        Block::Paragraph(
            "Expreso mi libre voluntad para autorizar se me realice el procedimiento anestésico \
y/o analgésico requerido."
                .into(),
        ),
        Block::Paragraph(
            "Se me ha explicado de forma clara y con lenguaje sencillo todo lo que a continuación \
se detalla en lenguaje técnico. He comprendido satisfactoriamente la naturaleza y propósito de la \
técnica de anestesia a la que me debo someter a efectos de ser intervenido quirúrgicamente, así \
como la probabilidad de cambio de técnica durante el mismo procedimiento quirúrgico si fuese \
necesario. Se me ha dado la oportunidad de discutir, preguntar y aclarar todas mis dudas sobre \
riesgos, beneficios y alternativas relacionadas con la anestesia y su técnica requerida, y aclaro \
que todas ellas han sido abordadas de manera satisfactoria."
                .into(),
        ),
        Block::field(
            "Riesgos",
            "Se me han explicado los posibles riesgos, incluyendo pero no limitado a: lesiones en \
la vía aérea, efectos adversos a medicamentos, cefalea, lesiones nerviosas, paro \
cardiorrespiratorio y muerte.",
        ),
    ]);
    blocks.extend(consent_footer(snapshot));
    (
        standard_header(snapshot, today),
        blocks,
        vec![
            vec![Signature::new(PATIENT_SIGNATURE), Signature::new(WITNESS)],
            vec![
                Signature::new(snapshot.team.name_of(StaffRole::Anestesiologo)),
                Signature::new(WITNESS),
            ],
        ],
    )
}

fn pre_anesthesia(snapshot: &Snapshot, today: NaiveDate) -> Parts {
    let note = snapshot.pre_anesthesia();
    let a = &note.antecedentes;
    let e = &note.exploracion;
    let via = &note.via_aerea;
    let lab = &note.laboratorio;
    let plan = &note.plan_anestesico;

    let mut blocks = planned(snapshot);
    blocks.extend([
        Block::Heading("Antecedentes"),
        Block::FieldRow(vec![
            ("Tabaquismo", a.tabaquismo.clone()),
            ("Alcoholismo", a.alcoholismo.clone()),
            ("Toxicomanías", a.toxicomanias.clone()),
            ("Ejercicio", a.ejercicio.clone()),
        ]),
        Block::FieldRow(vec![
            ("Asma", a.asma.clone()),
            ("Pulmonar", a.pulmonar.clone()),
            ("Endocrinológico", a.endocrinologico.clone()),
        ]),
        Block::field("Alergias", &a.alergias),
        Block::field("Cardiovascular", &a.cardiovascular),
        Block::field("Anestésicos Previos", &a.antecedentes_anestesicos),
        Block::field("Quirúrgicos Previos", &a.antecedentes_quirurgicos),
        Block::Heading("Exploración Física"),
        Block::FieldRow(vec![
            ("Peso", format!("{} kg", e.peso)),
            ("Talla", format!("{} cm", e.talla)),
        ]),
        Block::FieldRow(vitals_row(&VitalSigns {
            ta: e.ta.clone(),
            fc: e.fc.clone(),
            fr: e.fr.clone(),
            temp: e.temp.clone(),
            sat_o2: e.sat_o2.clone(),
        })),
        Block::FieldRow(vec![
            ("Tegumentos", e.tegumentos.clone()),
            ("Cabeza", e.cabeza.clone()),
            ("Tráquea", e.traquea.clone()),
        ]),
        Block::FieldRow(vec![
            ("CP", e.cp.clone()),
            ("Cardio", e.cardio.clone()),
            ("Extremidades", e.extremidades.clone()),
        ]),
        Block::Heading("Vía Aérea"),
        Block::FieldRow(vec![
            ("Mallampati", via.mallampati.clone()),
            ("Aldreti", via.aldreti.clone()),
            ("Bellhouse-Dore", via.bellhouse_dore.clone()),
            ("Interincisiva", format!("{} cm", via.interincisiva)),
        ]),
        Block::field("Otras", &via.otras),
        Block::Heading("Laboratorio y Gabinete"),
        Block::FieldRow(vec![
            ("Hb", lab.hb.clone()),
            ("Hct", lab.hct.clone()),
            ("Leucos", lab.leucos.clone()),
            ("Plaquetas", lab.plaquetas.clone()),
        ]),
        Block::FieldRow(vec![
            ("Glucosa", lab.glucosa.clone()),
            ("Creatinina", lab.creatinina.clone()),
            ("BUN", lab.bun.clone()),
            ("Urea", lab.urea.clone()),
        ]),
        Block::FieldRow(vec![
            ("TP", lab.tp.clone()),
            ("TTP", lab.ttp.clone()),
            ("INR", lab.inr.clone()),
        ]),
        Block::field("EKG", &note.ekg),
        Block::Heading("Plan Anestésico"),
        Block::field("Valoraciones", &plan.valoraciones),
        Block::field("Plan", &plan.plan),
        Block::field("Indicaciones", &plan.indicaciones),
    ]);
    (
        standard_header(snapshot, today),
        blocks,
        vec![vec![seat_signature(snapshot, StaffRole::Anestesiologo)]],
    )
}

fn post_anesthesia(snapshot: &Snapshot, today: NaiveDate) -> Parts {
    let note = snapshot.post_anesthesia();
    let blocks = vec![
        Block::field("Diagnóstico", &snapshot.procedure.diagnostico),
        Block::field("Procedimiento Realizado", &snapshot.procedure.qx_planeada),
        Block::field("Fecha del Procedimiento", long_date(snapshot.procedure.fecha_qx)),
        Block::section("Técnica Anestésica", note.tecnica_anestesica),
        Block::section("Líquidos Administrados", note.liquidos),
        Block::Heading("Tiempos"),
        Block::FieldRow(vec![
            ("Inicio Anestesia", note.inicio_anestesia),
            ("Término Anestesia", note.termino_anestesia),
        ]),
        Block::FieldRow(vec![
            ("Inicio Cirugía", note.inicio_cirugia),
            ("Término Cirugía", note.termino_cirugia),
        ]),
        Block::Heading("Signos Vitales"),
        Block::field("Ingreso UCPA", note.signos_vitales_ingreso_ucpa.summary()),
        Block::field("Alta UCPA", note.signos_vitales_alta_ucpa.summary()),
        Block::field("Alta Anestesiología", note.signos_vitales_alta_anestesio.summary()),
        Block::section("Indicaciones", note.indicaciones_alta_anestesio),
    ];
    (
        standard_header(snapshot, today),
        blocks,
        vec![vec![seat_signature(snapshot, StaffRole::Anestesiologo)]],
    )
}

fn post_op(snapshot: &Snapshot) -> Parts {
    let note = snapshot.post_op();
    let procedure = &snapshot.procedure;
    let header = vec![
        HeaderLine::new("Paciente", snapshot.patient.full_name()),
        HeaderLine::new("Edad", format!("{} años", snapshot.patient.age_on(procedure.fecha_qx))),
        HeaderLine::new("Fecha Cirugía", long_date(procedure.fecha_qx)),
    ];
    let blocks = vec![
        Block::field("Diagnóstico Preoperatorio", &procedure.diagnostico),
        Block::field("Diagnóstico Postoperatorio", note.diagnostico_postqx),
        Block::field("Operación Planeada", &procedure.qx_planeada),
        Block::field("Operación Realizada", note.cirugia_realizada),
        Block::section("Descripción de la Técnica Quirúrgica", note.tecnica),
        Block::section("Hallazgos", note.hallazgos),
        Block::field("Sangrado Estimado", format!("{} ml", note.sangrado)),
        Block::field("Incidentes", note.incidentes),
        Block::field("Complicaciones", note.complicaciones),
        Block::field("Cuenta de Material", note.cuenta_material),
        Block::field("Pronóstico", note.pronostico),
        Block::section("Recomendaciones", note.recomendaciones_postop),
    ];
    let signatures = vec![vec![
        seat_signature(snapshot, StaffRole::Cirujano),
        seat_signature(snapshot, StaffRole::Ayudante),
        seat_signature(snapshot, StaffRole::Anestesiologo),
    ]];
    (header, blocks, signatures)
}

fn post_op_orders(snapshot: &Snapshot, today: NaiveDate) -> Parts {
    let orders = snapshot.post_op_orders();
    let header = vec![
        HeaderLine::new("Paciente", snapshot.patient.full_name()),
        HeaderLine::new("Fecha", long_date_with_weekday(today)),
    ];
    let blocks = vec![
        Block::section("Soluciones / Dieta", orders.soluciones_dieta),
        Block::section("Medicamentos", orders.medicamentos),
        Block::section("Exámenes de Laboratorio / Gabinete", orders.examenes),
        Block::section("Actividades de Enfermería", orders.actividades_enfermeria),
    ];
    (header, blocks, surgeon_with_license(snapshot))
}

fn discharge(snapshot: &Snapshot, today: NaiveDate) -> Parts {
    let note = snapshot.discharge(today);
    let procedure = &snapshot.procedure;
    let header = vec![
        HeaderLine::new("Paciente", snapshot.patient.full_name()),
        HeaderLine::new("Fecha de Ingreso", long_date(procedure.fecha_qx)),
        HeaderLine::new("Fecha de Egreso", long_date_from_iso(&note.fecha_egreso)),
    ];
    let blocks = vec![
        Block::field("Diagnóstico de Ingreso", &procedure.diagnostico),
        Block::field("Diagnóstico de Egreso", note.dx_egreso),
        Block::field("Motivo de Egreso", note.motivo_egreso.label()),
        Block::section("Resumen Clínico", note.resumen_egreso),
        Block::section("Indicaciones", note.indicaciones_egreso),
    ];
    (header, blocks, surgeon_with_license(snapshot))
}
