//! Instruction block that encodes the temporal context and response contract.

use consulta_core::Clock;
use consulta_temporal::{extract_temporal_context, TemporalContext};
use serde::Serialize;

use crate::contract::{dated_summary_prefix, DISCLAIMER_TEXT, UNVERIFIED_MARKER};
use crate::scope::AssistantScope;

/// Dominant classification used for branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemporalClass {
    Historical,
    Future,
    Current,
}

impl TemporalClass {
    /// Historical wins over future; anything else is current.
    pub fn of(context: &TemporalContext) -> Self {
        if context.is_historical() {
            TemporalClass::Historical
        } else if context.is_future() {
            TemporalClass::Future
        } else {
            TemporalClass::Current
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TemporalClass::Historical => "DATOS HISTÓRICOS",
            TemporalClass::Future => "DATOS FUTUROS",
            TemporalClass::Current => "DATOS ACTUALES",
        }
    }

    fn focus(&self) -> &'static str {
        match self {
            TemporalClass::Historical => {
                "La consulta se refiere a un periodo pasado: responde con los valores vigentes en esa fecha."
            }
            TemporalClass::Future => {
                "La consulta se refiere a una fecha futura: no hay datos definitivos, usa la referencia oficial más reciente."
            }
            TemporalClass::Current => {
                "La consulta se refiere a la situación actual: responde con los valores vigentes hoy."
            }
        }
    }
}

/// Instruction block plus the context it was built from.
#[derive(Debug, Clone, Serialize)]
pub struct ContextualizedPrompt {
    pub prompt: String,
    pub context: TemporalContext,
}

/// Render the instruction block for `query`.
pub fn build_contextual_prompt(
    query: &str,
    context: &TemporalContext,
    scope: &AssistantScope,
) -> String {
    let class = TemporalClass::of(context);
    let target = context.formatted_target();
    let current = context.formatted_current();
    let timezone = context.timezone();
    let summary = dated_summary_prefix(context);

    format!(
        "Eres el asistente {label} de la plataforma. Ámbito: {description}.\n\
         \n\
         CONTEXTO TEMPORAL: {class_label}\n\
         - Fecha consultada: {target}\n\
         - Fecha actual: {current}\n\
         - Zona horaria: {timezone}\n\
         {focus}\n\
         \n\
         INSTRUCCIONES TEMPORALES\n\
         - Para datos que cambian con el tiempo (cuantías, normativa, umbrales, plazos) usa el valor vigente a {target}.\n\
         - Si la fecha consultada es pasada, da el valor vigente en ese periodo y, si ayuda, indica el valor actual para comparar.\n\
         - Si la fecha consultada es futura, indica que no existen datos definitivos y ofrece la referencia oficial más reciente.\n\
         \n\
         FORMATO OBLIGATORIO DE RESPUESTA\n\
         1. Resumen: una sola línea que empiece por \"{summary}:\".\n\
         2. Detalle: explicación paso a paso.\n\
         3. Tabla o desglose cuando el tema incluya cifras que desglosar.\n\
         4. Depende de...: condiciones o excepciones que cambian la respuesta.\n\
         5. Fuentes: entre 1 y 3 referencias cuando la respuesta dependa de la fecha o se haya consultado.\n\
         6. Aviso: \"{disclaimer}\"\n\
         \n\
         REGLAS\n\
         - No rechaces ninguna pregunta dentro del ámbito {label}.\n\
         - Indica siempre la fecha exacta utilizada ({target}).\n\
         - Distingue la normativa aprobada y vigente de proyectos, borradores o propuestas pendientes.\n\
         - No inventes citas, cifras ni referencias; marca cualquier dato no verificable como \"{unverified}\".\n\
         \n\
         CONSULTA DEL USUARIO:\n\
         {query}",
        label = scope.label,
        description = scope.description,
        class_label = class.label(),
        focus = class.focus(),
        disclaimer = DISCLAIMER_TEXT,
        unverified = UNVERIFIED_MARKER,
    )
}

/// Build the instruction block and hand back the context used.
pub fn contextualize(
    query: &str,
    context: TemporalContext,
    scope: &AssistantScope,
) -> ContextualizedPrompt {
    let prompt = build_contextual_prompt(query, &context, scope);
    ContextualizedPrompt { prompt, context }
}

/// Extract the temporal context of `query` and contextualize it in one step.
pub fn contextualize_query(
    query: &str,
    clock: &dyn Clock,
    timezone: &str,
    scope: &AssistantScope,
) -> ContextualizedPrompt {
    let context = extract_temporal_context(query, clock, timezone);
    contextualize(query, context, scope)
}
