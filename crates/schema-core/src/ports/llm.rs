//! LLM provider contract (§6). The wire protocol for any specific provider
//! is out of scope (§1); this trait is the seam the adjudication pipeline
//! programs against.

use async_trait::async_trait;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate_response(
        &self,
        prompt: &str,
        system: &str,
        temperature: f32,
        enable_thinking: bool,
    ) -> Result<LlmResponse>;

    async fn create_embedding(&self, text: &str, model: &str) -> Result<Vec<f32>>;
    async fn create_embeddings(&self, texts: &[String], model: &str) -> Result<Vec<Vec<f32>>>;

    fn get_model(&self) -> &str;
    fn get_endpoint(&self) -> &str;
}
