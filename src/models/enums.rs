use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The string form doubles as the serde representation.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(Role {
    Admin => "Admin",
    Medico => "Medico",
    Enfermeria => "Enfermeria",
    Administrativo => "Administrativo",
});

str_enum!(Sex {
    Male => "M",
    Female => "F",
});

str_enum!(ProcedureStatus {
    Programado => "Programado",
    PostOp => "Post-op",
    Alta => "Alta",
});

impl Default for ProcedureStatus {
    fn default() -> Self {
        Self::Programado
    }
}

str_enum!(DischargeReason {
    Mejoria => "mejoria",
    AltaVoluntaria => "alta_voluntaria",
    Traslado => "traslado",
    MotivosAdministrativos => "motivos_administrativos",
    AltaContraConsejoMedico => "alta_contra_consejo_medico",
    Defuncion => "defuncion",
});

impl DischargeReason {
    /// Label printed on the discharge note.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mejoria => "Mejoría Clínica",
            Self::AltaVoluntaria => "Alta Voluntaria",
            Self::Traslado => "Traslado a otro centro",
            Self::MotivosAdministrativos => "Motivos Administrativos",
            Self::AltaContraConsejoMedico => "Alta contra consejo médico",
            Self::Defuncion => "Defunción",
        }
    }
}

impl Default for DischargeReason {
    fn default() -> Self {
        Self::Mejoria
    }
}

// Each variant names the procedimientos column that stores the section.
str_enum!(SectionKind {
    ResumenIngreso => "resumen_ingreso",
    NotaPreanestesica => "nota_preanestesica",
    Consentimiento => "consentimiento",
    NotaPostanestesica => "nota_postanestesica",
    NotaPostoperatoria => "nota_postoperatoria",
    IndicacionesPostop => "indicaciones_postop",
    NotaDeAlta => "nota_de_alta",
});

impl SectionKind {
    pub const ALL: [SectionKind; 7] = [
        Self::ResumenIngreso,
        Self::NotaPreanestesica,
        Self::Consentimiento,
        Self::NotaPostanestesica,
        Self::NotaPostoperatoria,
        Self::IndicacionesPostop,
        Self::NotaDeAlta,
    ];
}

str_enum!(DocumentKind {
    NotaIngreso => "nota_ingreso",
    ConsentimientoQuirurgico => "consentimiento_quirurgico",
    ConsentimientoAnestesico => "consentimiento_anestesico",
    NotaPreanestesica => "nota_preanestesica",
    NotaPostanestesica => "nota_postanestesica",
    NotaPostoperatoria => "nota_postoperatoria",
    IndicacionesPostoperatorias => "indicaciones_postoperatorias",
    NotaDeAlta => "nota_de_alta",
});

impl DocumentKind {
    pub const ALL: [DocumentKind; 8] = [
        Self::NotaIngreso,
        Self::ConsentimientoQuirurgico,
        Self::ConsentimientoAnestesico,
        Self::NotaPreanestesica,
        Self::NotaPostanestesica,
        Self::NotaPostoperatoria,
        Self::IndicacionesPostoperatorias,
        Self::NotaDeAlta,
    ];

    /// Procedure section this document reads and writes.
    pub fn section(&self) -> SectionKind {
        match self {
            Self::NotaIngreso => SectionKind::ResumenIngreso,
            Self::ConsentimientoQuirurgico | Self::ConsentimientoAnestesico => {
                SectionKind::Consentimiento
            }
            Self::NotaPreanestesica => SectionKind::NotaPreanestesica,
            Self::NotaPostanestesica => SectionKind::NotaPostanestesica,
            Self::NotaPostoperatoria => SectionKind::NotaPostoperatoria,
            Self::IndicacionesPostoperatorias => SectionKind::IndicacionesPostop,
            Self::NotaDeAlta => SectionKind::NotaDeAlta,
        }
    }

    /// Heading printed on the rendered document.
    pub fn title(&self) -> &'static str {
        match self {
            Self::NotaIngreso => "Nota de Ingreso",
            Self::ConsentimientoQuirurgico => "Consentimiento Informado Quirúrgico",
            Self::ConsentimientoAnestesico => "Consentimiento Informado para Anestesia",
            Self::NotaPreanestesica => "Nota de Valoración Pre-Anestésica",
            Self::NotaPostanestesica => "Nota Post-Anestésica",
            Self::NotaPostoperatoria => "Nota Postoperatoria",
            Self::IndicacionesPostoperatorias => "Indicaciones Postoperatorias",
            Self::NotaDeAlta => "Nota de Alta",
        }
    }
}
