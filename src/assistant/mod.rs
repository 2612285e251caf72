use crate::recognition::transport_error;
use crate::utils::{AssistantConfig, GeoAssistError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tiktoken_rs::cl100k_base;

const SYSTEM_PROMPT: &str = "Ты — профессиональный помощник для маркшейдеров и специалистов по землеустройству \
в организациях добычи газа, конденсата и нефти.\n\
Отвечай строго по делу, кратко и структурировано.\n\
Если не хватает данных — задай уточняющие вопросы.\n\
Если спрашивают про обход требований — предлагай ТОЛЬКО законные варианты \
(альтернативы, согласования, допустимые исключения).\n";

pub struct AssistantClient {
    client: Client,
    config: AssistantConfig,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: usize,
    system: String,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

impl AssistantClient {
    pub fn new(config: AssistantConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    /// One question, one answer. No retries: a failed call is reported and the
    /// user decides whether to resend.
    pub async fn ask(&self, question: &str, mode_hint: Option<&str>) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(GeoAssistError::ValidationError(
                "empty question".to_string(),
            ));
        }
        let estimated = estimate_tokens(question);
        if estimated > self.config.max_prompt_tokens {
            return Err(GeoAssistError::ValidationError(format!(
                "question too long: ~{} tokens over the {} limit",
                estimated, self.config.max_prompt_tokens
            )));
        }

        let mut system = SYSTEM_PROMPT.to_string();
        if let Some(hint) = mode_hint {
            system.push('\n');
            system.push_str(hint);
        }

        let request = ChatRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            system,
            messages: vec![Message {
                role: "user".to_string(),
                content: question.to_string(),
            }],
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_server_error() {
            return Err(GeoAssistError::ServiceUnavailable(format!(
                "assistant API returned {}",
                status
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeoAssistError::ApiError(format!(
                "assistant API returned {}: {}",
                status, body
            )));
        }

        let api_response: ChatResponse = response.json().await?;
        let answer = api_response
            .content
            .into_iter()
            .filter_map(|block| {
                if block.content_type == "text" {
                    block.text
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("\n");

        if answer.trim().is_empty() {
            return Err(GeoAssistError::ApiError(
                "no text content in response".to_string(),
            ));
        }
        Ok(answer.trim().to_string())
    }
}

pub fn estimate_tokens(text: &str) -> usize {
    match cl100k_base() {
        Ok(bpe) => bpe.encode_with_special_tokens(text).len(),
        Err(_) => text.len() / 4,
    }
}
