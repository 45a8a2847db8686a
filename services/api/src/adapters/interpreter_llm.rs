//! services/api/src/adapters/interpreter_llm.rs
//!
//! This module contains the adapter for the dream-interpreting LLM.
//! It implements the `DreamInterpreter` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use serde::Deserialize;

use dream_journal_core::error::{CoreError, CoreResult};
use dream_journal_core::ports::{DreamInterpreter, InterpretationOutcome};

const SYSTEM_PROMPT: &str = "You are a reflective dream-interpretation assistant for a \
personal journaling app. Offer gentle, curious readings of dreams; never give medical or \
psychological diagnoses and never claim certainty about what a dream means. Respond with a \
single JSON object and nothing else, using exactly these fields: \"summary\" (2-3 sentences \
capturing the emotional heart of the dream), \"symbols\" (an array of 3 to 6 short strings, \
each a notable image or motif from the dream), \"reflection\" (one open-ended question the \
dreamer could sit with). No markdown, no commentary outside the JSON.";

pub struct OpenAiInterpreterAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiInterpreterAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

/// The shape the model is instructed to reply with.
#[derive(Deserialize)]
struct InterpretationPayload {
    summary: String,
    #[serde(default)]
    symbols: Vec<String>,
    reflection: String,
}

/// Models occasionally wrap the JSON in a code fence despite instructions.
fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_matches('`').trim()
}

fn parse_payload(raw: &str) -> CoreResult<InterpretationPayload> {
    serde_json::from_str(strip_fences(raw))
        .map_err(|e| CoreError::Store(format!("interpretation response was not valid JSON: {e}")))
}

#[async_trait]
impl DreamInterpreter for OpenAiInterpreterAdapter {
    async fn interpret(
        &self,
        title: &str,
        description: &str,
        tags: &[String],
        lucid: bool,
    ) -> CoreResult<InterpretationOutcome> {
        let mut prompt = format!("Title: {title}\n\nDream:\n{description}\n");
        if !tags.is_empty() {
            prompt.push_str(&format!("\nTags: {}\n", tags.join(", ")));
        }
        if lucid {
            prompt.push_str("\nThe dreamer was lucid during this dream.\n");
        }

        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(SYSTEM_PROMPT)
                    .build()
                    .map_err(|e| CoreError::Store(e.to_string()))?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()
                    .map_err(|e| CoreError::Store(e.to_string()))?,
            ),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .max_tokens(600u32)
            .temperature(0.7)
            .build()
            .map_err(|e| CoreError::Store(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| CoreError::Store(format!("interpretation request failed: {e}")))?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| CoreError::Store("no interpretation generated".to_string()))?;

        let payload = parse_payload(&content)?;
        Ok(InterpretationOutcome {
            summary: payload.summary,
            symbols: payload.symbols,
            reflection: payload.reflection,
            model: self.model.clone(),
        })
    }
}
