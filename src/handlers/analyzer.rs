use std::path::Path;
use std::sync::Arc;

use crate::config::{AnalyzerConfig, Provider};
use crate::error::{AnalysisError, Retryable};
use crate::models::{AnalysisResult, EncodedImage};
use crate::services::{
    analysis_prompt, encode_bytes, load_image, validate_response, GeminiService,
    OpenRouterService, VisionModel,
};

/// Attempt bookkeeping for a single request.
#[derive(Debug, Default)]
struct RetryState {
    attempt: u32,
    last_error: Option<AnalysisError>,
}

/// Runs the load → prompt → invoke → validate pipeline for food photos.
///
/// One analyzer can serve many concurrent requests; it holds only
/// immutable configuration and the model client.
pub struct FoodAnalyzer {
    config: AnalyzerConfig,
    model: Arc<dyn VisionModel>,
}

impl FoodAnalyzer {
    /// Build an analyzer with the provider named in `config`.
    pub fn new(config: AnalyzerConfig) -> Self {
        let model: Arc<dyn VisionModel> = match config.provider {
            Provider::Gemini => Arc::new(GeminiService::new(&config)),
            Provider::OpenRouter => Arc::new(OpenRouterService::new(&config)),
        };
        Self::with_model(config, model)
    }

    pub fn with_model(config: AnalyzerConfig, model: Arc<dyn VisionModel>) -> Self {
        Self { config, model }
    }

    /// Analyze a food photo stored on disk.
    ///
    /// The file is read once, before any remote call; a missing or
    /// unreadable file fails immediately without touching the model.
    pub async fn analyze_image(&self, path: &Path) -> Result<AnalysisResult, AnalysisError> {
        log::debug!("📸 Starting image analysis for: {}", path.display());
        let image = load_image(path).await?;
        self.analyze_encoded(&image).await
    }

    /// Analyze image bytes already held in memory.
    pub async fn analyze_bytes(&self, bytes: &[u8]) -> Result<AnalysisResult, AnalysisError> {
        let image = encode_bytes(bytes)?;
        self.analyze_encoded(&image).await
    }

    /// Invoke the model with bounded retry. Each attempt includes validation,
    /// so a malformed answer is retried like a failed request.
    pub async fn analyze_encoded(
        &self,
        image: &EncodedImage,
    ) -> Result<AnalysisResult, AnalysisError> {
        let prompt = analysis_prompt();
        let total = self.config.total_attempts();
        let mut state = RetryState::default();

        while state.attempt < total {
            state.attempt += 1;
            log::info!(
                "🔁 Analysis attempt {}/{} with model {} ({} byte image)",
                state.attempt,
                total,
                self.model.model_name(),
                image.byte_len
            );

            match self.attempt(prompt, image).await {
                Ok(result) => {
                    log::info!("✅ Food identified: {}", result.food);
                    return Ok(result);
                }
                Err(e) => {
                    log::warn!("⚠️ Attempt {}/{} failed: {}", state.attempt, total, e);
                    let give_up = !self.should_retry(&e);
                    state.last_error = Some(e);
                    if give_up {
                        break;
                    }
                }
            }

            if state.attempt < total {
                log::debug!("⏳ Retrying in {} ms", self.config.retry_delay.as_millis());
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }

        let err = state.last_error.unwrap_or_else(|| {
            AnalysisError::Transport("no analysis attempt was made".to_string())
        });
        log::error!(
            "❌ Food analysis failed after {} attempt(s): {}",
            state.attempt,
            err
        );
        Err(err)
    }

    async fn attempt(
        &self,
        prompt: &str,
        image: &EncodedImage,
    ) -> Result<AnalysisResult, AnalysisError> {
        let text = self.model.generate(prompt, image).await?;
        log::debug!("💬 Model response: {}", text);

        let mut result = validate_response(&text)?;
        if self.config.debug {
            result.raw_response = Some(text);
        }
        Ok(result)
    }

    fn should_retry(&self, err: &AnalysisError) -> bool {
        err.is_retryable() && (self.config.retry_malformed || !err.is_structural())
    }
}
