//! Plan synthesis through a text generation service
//!
//! [`TextGenerator`] is the seam to the model; [`gateway::PlanGateway`] builds
//! the prompt from the planning context and turns raw model text into a
//! validated [`crate::models::LayoverPlan`].

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;

pub mod gateway;
pub mod gemini;

pub use gateway::{PlanGateway, PlanValidator, build_prompt, strip_code_fences};
pub use gemini::GeminiClient;

/// Produces raw text for a prompt, constrained by a JSON schema
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, schema: &Value) -> Result<String>;
}
