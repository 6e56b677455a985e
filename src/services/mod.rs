pub mod ai_service;
pub mod gemini; // Google Gemini generateContent
pub mod image;
pub mod openrouter; // OpenRouter chat completions
pub mod prompt;
pub mod validator;

pub use ai_service::VisionModel;
pub use gemini::GeminiService;
pub use image::{encode_bytes, load_image};
pub use openrouter::OpenRouterService;
pub use prompt::analysis_prompt;
pub use validator::validate_response;
