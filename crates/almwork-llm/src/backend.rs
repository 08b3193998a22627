use std::time::Duration;

use almwork_config::LlmConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{LlmError, Result};
use crate::types::WorkInstructionExtraction;

const SYSTEM_PROMPT: &str = "You are a helpful assistant that extracts structured data from text. \
Always respond with valid JSON only, no additional text or explanation.";

fn extraction_prompt(email_body: &str) -> String {
    format!(
        "Extract work instruction information from this email:\n\n\
{email_body}\n\n\
Return JSON with these fields (include only fields that are present in the email):\n\
- status: current status (must be one of: draft, active, completed)\n\
- comment: any comments or updates from the sender\n\
- time_spent: hours worked (as a number, e.g., 2.5)\n\
- next_steps: planned next actions or tasks\n\n\
Return only valid JSON, no other text. Example format:\n\
{{\"status\": \"active\", \"comment\": \"Made progress on the task\", \"time_spent\": 2.5, \"next_steps\": \"Will continue tomorrow\"}}\n\n\
If a field is not mentioned in the email, omit it from the response."
    )
}

/// Extraction capability the rest of the core depends on. Narrow by
/// design: the original's multi-purpose `LlmService` (meeting-knowledge
/// extraction, chat, health checks) is out of scope — only the one
/// operation `almwork-email`'s structured-then-LLM fallback needs.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn extract_work_instruction(&self, email_body: &str) -> Result<Option<WorkInstructionExtraction>>;
}

/// Calls an LM-Studio-compatible (OpenAI `/chat/completions`-shaped) HTTP
/// endpoint.
pub struct HttpLlmBackend {
    client: reqwest::Client,
    config: LlmConfig,
}

impl HttpLlmBackend {
    #[must_use]
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn call(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.config.model_name.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt.to_string(),
                },
            ],
            temperature: 0.1,
            max_tokens: 2000,
        };

        let url = format!("{}/chat/completions", self.config.studio_url.trim_end_matches('/'));
        let response = self
            .client
            .post(url)
            .json(&request)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.config.timeout_secs)
                } else {
                    LlmError::Request(e)
                }
            })?;

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| LlmError::InvalidJson("response has no choices/content".into()))?;
        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl LlmBackend for HttpLlmBackend {
    async fn extract_work_instruction(&self, email_body: &str) -> Result<Option<WorkInstructionExtraction>> {
        if !self.config.enabled {
            return Err(LlmError::Disabled);
        }
        if email_body.trim().is_empty() {
            return Err(LlmError::EmptyBody);
        }

        let content = self.call(&extraction_prompt(email_body)).await?;
        let raw: Value = extract_json_object(&content)
            .ok_or_else(|| LlmError::InvalidJson(content.chars().take(200).collect()))?;
        Ok(WorkInstructionExtraction::from_raw_json(&raw))
    }
}

/// Finds the first balanced `{...}` span in `text` and parses it as JSON,
/// tolerating a model that wraps its answer in prose despite being asked
/// not to.
fn extract_json_object(text: &str) -> Option<Value> {
    let bytes = text.as_bytes();
    let start = text.find('{')?;
    let mut depth = 0i32;
    for (offset, &b) in bytes[start..].iter().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + 1;
                    return serde_json::from_str(&text[start..end]).ok();
                }
            }
            _ => {}
        }
    }
    None
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_balanced_json_from_surrounding_prose() {
        let text = "Sure, here you go:\n{\"status\": \"active\", \"time_spent\": 1.5}\nhope that helps";
        let value = extract_json_object(text).unwrap();
        assert_eq!(value["status"], "active");
    }

    #[test]
    fn returns_none_without_braces() {
        assert!(extract_json_object("no json here").is_none());
    }
}
