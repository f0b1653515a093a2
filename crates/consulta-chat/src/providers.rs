//! OpenAI-compatible completion streaming.
//!
//! Tokens arrive as SSE `data:` lines; `[DONE]` ends the stream.

use std::pin::Pin;

use consulta_core::{Error, Result};
use futures::Stream;
use reqwest::Client;
use serde_json::json;
use tokio_stream::StreamExt;
use tracing::{debug, error};

use crate::config::ResolvedModel;
use crate::types::ChatMessage;

/// Boxed stream type for returning the token stream.
pub type BoxedStream = Pin<Box<dyn Stream<Item = StreamChunk> + Send>>;

/// A single streamed token or error.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    Token(String),
    Done { tokens_used: usize },
    Error(String),
}

/// Full text collected from a stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub tokens_used: usize,
}

/// Meaning of one SSE line.
#[derive(Debug, PartialEq)]
enum SseLine {
    Token(String),
    Done,
    Skip,
}

fn parse_sse_line(line: &str) -> SseLine {
    let line = line.trim();
    if line.is_empty() || line.starts_with(':') {
        return SseLine::Skip;
    }
    let Some(data) = line.strip_prefix("data:") else {
        return SseLine::Skip;
    };
    let data = data.trim();
    if data == "[DONE]" {
        return SseLine::Done;
    }
    match serde_json::from_str::<serde_json::Value>(data) {
        Ok(parsed) => match parsed["choices"][0]["delta"]["content"].as_str() {
            Some(content) if !content.is_empty() => SseLine::Token(content.to_string()),
            _ => SseLine::Skip,
        },
        Err(_) => SseLine::Skip,
    }
}

/// Reassembles SSE lines from raw body chunks.
///
/// Bytes are kept undecoded until a full line arrives, so a multi-byte
/// character split across two chunks is decoded intact.
#[derive(Debug, Default)]
struct SseLineBuffer {
    buffer: Vec<u8>,
}

impl SseLineBuffer {
    /// Append a chunk and return every line it completes.
    fn push(&mut self, bytes: &[u8]) -> Vec<SseLine> {
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(line_end) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=line_end).collect();
            lines.push(parse_sse_line(&String::from_utf8_lossy(&line)));
        }
        lines
    }

    /// Parse whatever is left once the body ends without a final newline.
    fn finish(&mut self) -> SseLine {
        let rest = std::mem::take(&mut self.buffer);
        parse_sse_line(&String::from_utf8_lossy(&rest))
    }
}

/// Stream tokens from `{base_url}/chat/completions`.
pub fn stream_chat_completion(
    client: &Client,
    target: &ResolvedModel,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: usize,
) -> BoxedStream {
    let client = client.clone();
    let url = target.completions_url();
    let model = target.model.clone();
    let api_key = target.api_key.clone();

    Box::pin(async_stream::stream! {
        let body = json!({
            "model": model,
            "messages": messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
            "stream": true,
        });

        debug!("Streaming from {} with model {}", url, model);

        let response = match client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                error!("Completion request failed: {}", e);
                yield StreamChunk::Error(format!("Request failed: {}", e));
                return;
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Completion API error {}", status);
            yield StreamChunk::Error(format!("API error {}: {}", status, body));
            return;
        }

        let mut stream = response.bytes_stream();
        let mut lines = SseLineBuffer::default();
        let mut token_count = 0usize;

        while let Some(chunk) = stream.next().await {
            let bytes = match chunk {
                Ok(b) => b,
                Err(e) => {
                    yield StreamChunk::Error(format!("Stream read error: {}", e));
                    return;
                }
            };

            for line in lines.push(&bytes) {
                match line {
                    SseLine::Token(content) => {
                        token_count += 1;
                        yield StreamChunk::Token(content);
                    }
                    SseLine::Done => {
                        yield StreamChunk::Done { tokens_used: token_count };
                        return;
                    }
                    SseLine::Skip => {}
                }
            }
        }

        if let SseLine::Token(content) = lines.finish() {
            token_count += 1;
            yield StreamChunk::Token(content);
        }
        yield StreamChunk::Done { tokens_used: token_count };
    })
}

/// Drain a token stream into the full answer.
pub async fn collect_completion(mut stream: BoxedStream) -> Result<Completion> {
    let mut text = String::new();
    let mut tokens_used = 0;

    while let Some(chunk) = stream.next().await {
        match chunk {
            StreamChunk::Token(t) => text.push_str(&t),
            StreamChunk::Done { tokens_used: t } => {
                tokens_used = t;
                break;
            }
            StreamChunk::Error(e) => return Err(Error::Llm(e)),
        }
    }

    Ok(Completion { text, tokens_used })
}

/// Non-streaming completion.
pub async fn complete(
    client: &Client,
    target: &ResolvedModel,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: usize,
) -> Result<Completion> {
    collect_completion(stream_chat_completion(
        client,
        target,
        messages,
        temperature,
        max_tokens,
    ))
    .await
}

/// Test an API key against `{base_url}/models`.
pub async fn test_api_key(base_url: &str, api_key: &str) -> std::result::Result<(), String> {
    let client = Client::new();
    let url = format!("{}/models", base_url.trim_end_matches('/'));

    let resp = client
        .get(&url)
        .header("Authorization", format!("Bearer {}", api_key))
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if resp.status().is_success() {
        Ok(())
    } else {
        Err(format!("API returned status {}", resp.status()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_line() {
        let line = r#"data: {"choices":[{"delta":{"content":"Datos"}}]}"#;
        assert_eq!(parse_sse_line(line), SseLine::Token("Datos".into()));
    }

    #[test]
    fn test_parse_done_and_noise() {
        assert_eq!(parse_sse_line("data: [DONE]\n"), SseLine::Done);
        assert_eq!(parse_sse_line(": keep-alive"), SseLine::Skip);
        assert_eq!(parse_sse_line(""), SseLine::Skip);
        assert_eq!(parse_sse_line("event: ping"), SseLine::Skip);
        assert_eq!(parse_sse_line("data: {not json"), SseLine::Skip);
        assert_eq!(
            parse_sse_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#),
            SseLine::Skip
        );
    }

    #[test]
    fn test_line_buffer_joins_split_multibyte_char() {
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"orientación\"}}]}\n".as_bytes();
        // Split between the two bytes of 'ó' (0xC3 0xB3)
        let split = line.iter().position(|&b| b == 0xC3).unwrap() + 1;

        let mut lines = SseLineBuffer::default();
        assert!(lines.push(&line[..split]).is_empty());
        assert_eq!(
            lines.push(&line[split..]),
            vec![SseLine::Token("orientación".into())]
        );
    }

    #[test]
    fn test_line_buffer_yields_lines_in_order() {
        let mut lines = SseLineBuffer::default();
        let body = concat!(
            ": keep-alive\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Datos\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\" a\"}}]}\n",
            "data: [DONE]\n",
        );
        let parsed: Vec<SseLine> = lines
            .push(body.as_bytes())
            .into_iter()
            .filter(|l| *l != SseLine::Skip)
            .collect();
        assert_eq!(
            parsed,
            vec![
                SseLine::Token("Datos".into()),
                SseLine::Token(" a".into()),
                SseLine::Done,
            ]
        );
    }

    #[test]
    fn test_line_buffer_flushes_unterminated_last_line() {
        let mut lines = SseLineBuffer::default();
        let tail = r#"data: {"choices":[{"delta":{"content":"Aviso"}}]}"#;
        assert!(lines.push(tail.as_bytes()).is_empty());
        assert_eq!(lines.finish(), SseLine::Token("Aviso".into()));
        assert_eq!(lines.finish(), SseLine::Skip);
    }

    #[tokio::test]
    async fn test_collect_completion_joins_tokens() {
        let stream: BoxedStream = Box::pin(tokio_stream::iter(vec![
            StreamChunk::Token("Datos a ".into()),
            StreamChunk::Token("01/01/2023".into()),
            StreamChunk::Done { tokens_used: 2 },
        ]));
        let completion = collect_completion(stream).await.unwrap();
        assert_eq!(completion.text, "Datos a 01/01/2023");
        assert_eq!(completion.tokens_used, 2);
    }

    #[tokio::test]
    async fn test_collect_completion_surfaces_errors() {
        let stream: BoxedStream = Box::pin(tokio_stream::iter(vec![
            StreamChunk::Token("Datos".into()),
            StreamChunk::Error("API error 401".into()),
        ]));
        let err = collect_completion(stream).await.unwrap_err();
        assert!(matches!(err, Error::Llm(msg) if msg.contains("401")));
    }
}
