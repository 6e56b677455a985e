use serde::{Deserialize, Serialize};

use super::ai_service::{classify_http_error, VisionModel};
use crate::config::AnalyzerConfig;
use crate::error::{AnalysisError, MalformedReason};
use crate::models::EncodedImage;

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ContentPart {
    Text {
        #[serde(rename = "type")]
        content_type: String,
        text: String,
    },
    ImageUrl {
        #[serde(rename = "type")]
        content_type: String,
        image_url: ImageData,
    },
}

#[derive(Debug, Serialize)]
struct ImageData {
    url: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    /// OpenRouter may report failures in the body with HTTP 200
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    /// Usually an HTTP status number, occasionally a string
    code: Option<serde_json::Value>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    content: Option<String>,
}

/// OpenRouter (OpenAI-compatible chat completions) client.
pub struct OpenRouterService {
    api_key: String,
    model: String,
    endpoint: String,
    timeout: std::time::Duration,
    client: reqwest::Client,
}

impl OpenRouterService {
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(config: &AnalyzerConfig, client: reqwest::Client) -> Self {
        Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            timeout: config.timeout,
            client,
        }
    }

    fn build_request(&self, prompt: &str, image: &EncodedImage) -> ChatRequest {
        let data_url = image.data_url();
        log::debug!(
            "🖼️ Image data URL created: {}... (first 100 chars)",
            &data_url[..100.min(data_url.len())]
        );

        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ContentPart::Text {
                        content_type: "text".to_string(),
                        text: prompt.to_string(),
                    },
                    ContentPart::ImageUrl {
                        content_type: "image_url".to_string(),
                        image_url: ImageData { url: data_url },
                    },
                ],
            }],
            max_tokens: 800,
        }
    }
}

fn first_message(response: ChatResponse) -> Result<String, AnalysisError> {
    if let Some(error) = response.error {
        let status = error
            .code
            .and_then(|code| code.as_u64())
            .and_then(|code| u16::try_from(code).ok())
            .and_then(|code| reqwest::StatusCode::from_u16(code).ok())
            .unwrap_or(reqwest::StatusCode::BAD_GATEWAY);
        log::error!("❌ OpenRouter error in response body: {}", error.message);
        return Err(classify_http_error(status, &error.message));
    }

    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(AnalysisError::MalformedResponse(
            MalformedReason::NoJsonPattern,
        ))
}

#[async_trait::async_trait]
impl VisionModel for OpenRouterService {
    async fn generate(&self, prompt: &str, image: &EncodedImage) -> Result<String, AnalysisError> {
        let request = self.build_request(prompt, image);

        log::info!("🤖 Sending request to OpenRouter with model: {}", self.model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .timeout(self.timeout)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("X-Title", "Food Lens")
            .json(&request)
            .send()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;

        let status = response.status();
        log::debug!("📥 OpenRouter response status: {}", status);

        let body = response
            .text()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;

        if !status.is_success() {
            log::error!("❌ OpenRouter API error response: {}", body);
            return Err(classify_http_error(status, &body));
        }

        log::debug!("📄 Raw OpenRouter response size: {} bytes", body.len());

        let chat_response: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            AnalysisError::Transport(format!("unexpected OpenRouter envelope: {}", e))
        })?;

        first_message(chat_response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
