//! Literal markers shared by the instruction block and the validator.

use consulta_temporal::TemporalContext;

/// Opening words of the mandatory dated summary line.
pub const DATED_SUMMARY_MARKER: &str = "Datos a";

/// Section names a well-formed answer uses.
pub const SECTION_TOKENS: [&str; 4] = ["Resumen", "Detalle", "Fuentes", "Aviso"];

/// Any of these phrases counts as the legal disclaimer.
pub const DISCLAIMER_MARKERS: [&str; 2] = ["orientación general", "asesoramiento"];

pub const DISCLAIMER_TEXT: &str =
    "Esta información es orientación general, no asesoramiento individual.";

/// Marker for claims the model could not verify.
pub const UNVERIFIED_MARKER: &str = "Verificar fuente";

/// `Datos a dd/mm/yyyy (<timezone>)`
pub fn dated_summary_prefix(context: &TemporalContext) -> String {
    format!(
        "{} {} ({})",
        DATED_SUMMARY_MARKER,
        context.formatted_target(),
        context.timezone()
    )
}
