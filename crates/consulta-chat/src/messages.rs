//! Message array sent to the completion endpoint.

use crate::types::ChatMessage;

/// Build the message array: one system message (widget context followed by
/// the instruction block), prior user/assistant turns, then the new message.
///
/// System messages in `history` are dropped so a client cannot override the
/// instruction block.
pub fn build_messages(
    instruction_block: &str,
    context_prompt: Option<&str>,
    history: &[ChatMessage],
    user_message: &str,
) -> Vec<ChatMessage> {
    let system_prompt = match context_prompt.map(str::trim).filter(|c| !c.is_empty()) {
        Some(context) => format!("{}\n\n{}", context, instruction_block),
        None => instruction_block.to_string(),
    };

    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(
        history
            .iter()
            .filter(|m| m.role == "user" || m.role == "assistant")
            .cloned(),
    );
    messages.push(ChatMessage::user(user_message));
    messages
}
