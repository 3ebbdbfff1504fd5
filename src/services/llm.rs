//! Ollama client: a fast intent classification pass and a slower
//! conversational pass, both over `/api/generate`.

use crate::models::settings::LlmSettings;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Debug)]
pub enum LlmError {
    Timeout,
    Connection,
    Other(String),
}

/// Output of the classification pass.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IntentVerdict {
    pub intent: String,
    pub task: Option<String>,
    pub confidence: f32,
}

impl Default for IntentVerdict {
    fn default() -> Self {
        Self {
            intent: "CHAT".to_string(),
            task: None,
            confidence: 0.0,
        }
    }
}

pub struct LlmClient {
    settings: LlmSettings,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

impl LlmClient {
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            settings,
            client: reqwest::Client::new(),
        }
    }

    async fn generate(
        &self,
        prompt: String,
        options: Value,
        timeout: Duration,
    ) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.settings.base_url);
        let body = json!({
            "model": self.settings.model,
            "prompt": prompt,
            "stream": false,
            "options": options,
        });
        let response = self
            .client
            .post(&url)
            .json(&body)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify_error)?
            .error_for_status()
            .map_err(classify_error)?;
        let parsed: GenerateResponse = response.json().await.map_err(classify_error)?;
        Ok(parsed.response.trim().to_string())
    }

    /// Cheap, deterministic classification. Any failure collapses to CHAT
    /// with zero confidence so the caller just falls through to chat.
    pub async fn classify_intent(&self, command: &str) -> IntentVerdict {
        let prompt = format!(
            "Classify intent. Respond ONLY in JSON.\n\n\
             INTENTS:\nRUN_TASK, CHAT, STATUS, CAPABILITIES, UNKNOWN\n\n\
             JSON:\n{{\"intent\":\"\",\"task\":null,\"confidence\":0.0}}\n\n\
             User: {}\n",
            command
        );
        let options = json!({"temperature": 0.0, "num_ctx": 1024});
        let timeout = Duration::from_secs(self.settings.classify_timeout_secs);

        match self.generate(prompt, options, timeout).await {
            Ok(raw) if !raw.is_empty() => {
                serde_json::from_str(extract_json(&raw)).unwrap_or_default()
            }
            _ => IntentVerdict::default(),
        }
    }

    /// Conversational reply with optional memory context prepended.
    pub async fn chat(&self, command: &str, context: &str) -> Result<String, LlmError> {
        let context_block = if context.is_empty() {
            String::new()
        } else {
            format!("\nWhat you know about the user:\n{}\n", context)
        };
        let prompt = format!(
            "You are DeskPilot, a friendly desktop assistant.\n\n\
             Rules:\n\
             - Be natural and polite\n\
             - Keep answers SHORT unless the user asks for detail\n\
             - If greeting, reply briefly\n\
             - Avoid long lectures\n\
             {}\nUser: {}\nDeskPilot:\n",
            context_block, command
        );
        let options = json!({
            "temperature": self.settings.temperature,
            "num_ctx": self.settings.num_ctx,
            "top_p": self.settings.top_p,
        });
        let timeout = Duration::from_secs(self.settings.chat_timeout_secs);
        self.generate(prompt, options, timeout).await
    }
}

fn classify_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else if e.is_connect() {
        LlmError::Connection
    } else {
        LlmError::Other(e.to_string())
    }
}

/// Models wrap JSON in prose or code fences often enough that we slice from
/// the first `{` to the last `}` before parsing.
fn extract_json(raw: &str) -> &str {
    match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if end > start => &raw[start..=end],
        _ => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_parses_with_missing_fields() {
        let verdict: IntentVerdict = serde_json::from_str(r#"{"intent":"RUN_TASK"}"#).unwrap();
        assert_eq!(verdict.intent, "RUN_TASK");
        assert_eq!(verdict.confidence, 0.0);
        assert!(verdict.task.is_none());
    }

    #[test]
    fn json_is_extracted_from_fences() {
        let raw = "```json\n{\"intent\":\"CHAT\",\"task\":null,\"confidence\":0.9}\n```";
        let verdict: IntentVerdict = serde_json::from_str(extract_json(raw)).unwrap();
        assert_eq!(verdict.intent, "CHAT");
    }

    #[tokio::test]
    async fn unreachable_server_collapses_to_chat() {
        let mut settings = LlmSettings::default();
        settings.base_url = "http://127.0.0.1:1".to_string();
        settings.classify_timeout_secs = 2;
        let client = LlmClient::new(settings);
        let verdict = client.classify_intent("hello").await;
        assert_eq!(verdict.intent, "CHAT");
        assert_eq!(verdict.confidence, 0.0);
    }
}
