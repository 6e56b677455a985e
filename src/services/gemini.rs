use serde::{Deserialize, Serialize};

use super::ai_service::{classify_http_error, VisionModel};
use crate::config::AnalyzerConfig;
use crate::error::{AnalysisError, MalformedReason};
use crate::models::EncodedImage;

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Google Gemini `generateContent` client.
pub struct GeminiService {
    api_key: String,
    model: String,
    endpoint: String,
    timeout: std::time::Duration,
    client: reqwest::Client,
}

impl GeminiService {
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

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }
}

fn build_request(prompt: &str, image: &EncodedImage) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![
                Part::Text {
                    text: prompt.to_string(),
                },
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: image.mime_type.to_string(),
                        data: image.data.clone(),
                    },
                },
            ],
        }],
    }
}

fn extract_text(response: GenerateContentResponse) -> Result<String, AnalysisError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AnalysisError::MalformedResponse(
            MalformedReason::NoJsonPattern,
        ));
    }
    Ok(text)
}

#[async_trait::async_trait]
impl VisionModel for GeminiService {
    async fn generate(&self, prompt: &str, image: &EncodedImage) -> Result<String, AnalysisError> {
        let request = build_request(prompt, image);

        log::info!("🤖 Sending request to Gemini with model: {}", self.model);

        let response = self
            .client
            .post(self.url())
            .timeout(self.timeout)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;

        let status = response.status();
        log::debug!("📥 Gemini response status: {}", status);

        let body = response
            .text()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;

        if !status.is_success() {
            log::error!("❌ Gemini API error response: {}", body);
            return Err(classify_http_error(status, &body));
        }

        log::debug!("📄 Raw Gemini response size: {} bytes", body.len());

        let envelope: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| AnalysisError::Transport(format!("unexpected Gemini envelope: {}", e)))?;

        extract_text(envelope)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
