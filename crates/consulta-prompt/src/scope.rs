//! Assistant domain scopes offered by the platform's chat widgets.

use serde::Serialize;
use tracing::debug;

/// Subject area an assistant is allowed to answer about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssistantScope {
    pub key: String,
    pub label: String,
    pub description: String,
}

struct BuiltinScope {
    key: &'static str,
    label: &'static str,
    description: &'static str,
    aliases: &'static [&'static str],
}

const GENERAL_KEY: &str = "general";

const BUILTIN_SCOPES: &[BuiltinScope] = &[
    BuiltinScope {
        key: "fiscal",
        label: "fiscal",
        description: "impuestos (IRPF, IVA, Sociedades), deducciones, modelos y plazos de la Agencia Tributaria",
        aliases: &["hacienda", "impuestos", "tributario"],
    },
    BuiltinScope {
        key: "laboral",
        label: "laboral",
        description: "contratos, nóminas, SMI, cotizaciones a la Seguridad Social, despidos y prestaciones",
        aliases: &["trabajo", "empleo", "seguridad social"],
    },
    BuiltinScope {
        key: "trafico",
        label: "tráfico",
        description: "permisos de conducir, normas de circulación, sanciones y puntos de la DGT",
        aliases: &["dgt", "conducir", "autoescuela"],
    },
    BuiltinScope {
        key: "oposiciones",
        label: "oposiciones",
        description: "temarios, convocatorias, requisitos y plazos de oposiciones y exámenes oficiales",
        aliases: &["examenes", "convocatorias"],
    },
    BuiltinScope {
        key: GENERAL_KEY,
        label: "general",
        description: "preparación de exámenes y contenidos de los cursos de la plataforma",
        aliases: &[],
    },
];

impl AssistantScope {
    /// Resolve an `assistantType` sent by a chat widget.
    ///
    /// Matching ignores case, surrounding whitespace and Spanish accents.
    /// Unknown types fall back to the general assistant.
    pub fn resolve(assistant_type: &str) -> Self {
        let wanted = normalize(assistant_type);
        let found = BUILTIN_SCOPES
            .iter()
            .find(|s| s.key == wanted || s.aliases.contains(&wanted.as_str()));

        match found {
            Some(scope) => Self::from_builtin(scope),
            None => {
                debug!("Unknown assistant type '{}', using general scope", assistant_type);
                Self::general()
            }
        }
    }

    pub fn general() -> Self {
        BUILTIN_SCOPES
            .iter()
            .find(|s| s.key == GENERAL_KEY)
            .map(Self::from_builtin)
            .unwrap_or_else(|| Self::custom(GENERAL_KEY))
    }

    /// Ad-hoc scope for callers outside the built-in catalog.
    pub fn custom(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            key: "custom".into(),
            description: label.clone(),
            label,
        }
    }

    /// All built-in scopes, in display order.
    pub fn catalog() -> Vec<Self> {
        BUILTIN_SCOPES.iter().map(Self::from_builtin).collect()
    }

    fn from_builtin(scope: &BuiltinScope) -> Self {
        Self {
            key: scope.key.into(),
            label: scope.label.into(),
            description: scope.description.into(),
        }
    }
}

fn normalize(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' | 'ü' => 'u',
            other => other,
        })
        .collect()
}
