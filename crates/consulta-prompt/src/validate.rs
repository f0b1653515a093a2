//! Checks a model answer against the response contract.

use consulta_temporal::{find_formatted_dates, format_date, TemporalContext};
use serde::Serialize;

use crate::contract::{
    dated_summary_prefix, DATED_SUMMARY_MARKER, DISCLAIMER_MARKERS, DISCLAIMER_TEXT,
    SECTION_TOKENS,
};

/// Outcome of validating one answer. `suggestions[i]` addresses `issues[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
}

impl ValidationResult {
    fn push(&mut self, issue: String, suggestion: String) {
        self.issues.push(issue);
        self.suggestions.push(suggestion);
    }
}

/// Validate `response` against the contract built for `context`.
///
/// Every check runs; failures accumulate in check order.
pub fn validate_response(response: &str, context: &TemporalContext) -> ValidationResult {
    let mut result = ValidationResult::default();

    check_dated_summary(response, context, &mut result);
    check_structure(response, &mut result);
    check_disclaimer(response, &mut result);
    if !context.is_current_data() {
        check_target_date_mentioned(response, context, &mut result);
    }

    result.is_valid = result.issues.is_empty();
    result
}

fn check_dated_summary(response: &str, context: &TemporalContext, result: &mut ValidationResult) {
    if response.contains(DATED_SUMMARY_MARKER) && response.contains(context.timezone()) {
        return;
    }
    result.push(
        format!(
            "Falta el resumen con fecha (\"{} dd/mm/aaaa ({})\")",
            DATED_SUMMARY_MARKER,
            context.timezone()
        ),
        format!(
            "Empieza la respuesta con: \"{}: ...\"",
            dated_summary_prefix(context)
        ),
    );
}

fn check_structure(response: &str, result: &mut ValidationResult) {
    let has_section = SECTION_TOKENS
        .iter()
        .any(|token| response.contains(token) || response.contains(&token.to_lowercase()));
    if has_section {
        return;
    }
    result.push(
        "La respuesta no sigue la estructura de secciones".to_string(),
        format!("Organiza la respuesta en secciones: {}", SECTION_TOKENS.join(", ")),
    );
}

fn check_disclaimer(response: &str, result: &mut ValidationResult) {
    if DISCLAIMER_MARKERS.iter().any(|m| response.contains(m)) {
        return;
    }
    result.push(
        "Falta el aviso legal".to_string(),
        format!("Añade al final: \"{}\"", DISCLAIMER_TEXT),
    );
}

fn check_target_date_mentioned(
    response: &str,
    context: &TemporalContext,
    result: &mut ValidationResult,
) {
    let target = context.formatted_target();
    if response.contains(&target) {
        return;
    }

    let mentioned: Vec<String> = find_formatted_dates(response)
        .into_iter()
        .map(format_date)
        .collect();
    let suggestion = if mentioned.is_empty() {
        format!("Menciona explícitamente la fecha consultada: {}", target)
    } else {
        format!(
            "Menciona explícitamente la fecha consultada: {} (la respuesta cita {})",
            target,
            mentioned.join(", ")
        )
    };

    result.push(
        format!("No se menciona la fecha consultada ({})", target),
        suggestion,
    );
}
