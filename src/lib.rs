//! # food-lens
//!
//! Nutrition analysis of food photos using a remote multimodal model.
//!
//! The pipeline reads the photo once, sends it with a fixed JSON-schema
//! prompt to Gemini or OpenRouter, and validates the model's answer into an
//! [`AnalysisResult`]. Failed attempts are retried with a fixed delay; the
//! caller gets either a complete result or a single [`AnalysisError`].
//!
//! ```rust,no_run
//! use food_lens::{AnalyzerConfig, FoodAnalyzer};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let analyzer = FoodAnalyzer::new(AnalyzerConfig::from_env()?);
//!     let result = analyzer.analyze_image(Path::new("lunch.jpg")).await?;
//!     println!("{} ({})", result.food, result.nutrition_info.calories);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

pub use config::{AnalyzerConfig, Provider};
pub use error::{AnalysisError, MalformedReason, Retryable};
pub use handlers::FoodAnalyzer;
pub use models::{AnalysisResult, Confidence, DietFriendly, EncodedImage, NutritionInfo};
pub use services::{analysis_prompt, validate_response, VisionModel};
