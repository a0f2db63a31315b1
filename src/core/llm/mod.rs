pub mod providers;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderType {
    Google,
}

#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn provider_type(&self) -> ProviderType;

    // Dynamically fetch available models from the provider's API
    async fn fetch_models(&self) -> Result<Vec<ModelInfo>>;

    // Execute a single prompt, optionally under a system instruction
    async fn generate(
        &self,
        model_id: &str,
        prompt: &str,
        system_instruction: Option<&str>,
    ) -> Result<String>;
}

pub struct LlmManager {
    providers: Vec<Box<dyn LlmProvider>>,
    selected_provider: Option<ProviderType>,
    selected_model: Option<String>,
}

impl LlmManager {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            selected_provider: None,
            selected_model: None,
        }
    }

    pub fn register_provider(&mut self, provider: Box<dyn LlmProvider>) {
        info!("Registered LLM Provider: {:?}", provider.provider_type());
        self.providers.push(provider);
    }

    pub fn set_active(&mut self, provider: ProviderType, model_id: String) {
        info!("Setting active LLM: {:?} ({})", provider, model_id);
        self.selected_provider = Some(provider);
        self.selected_model = Some(model_id);
    }

    pub fn get_provider(&self, pt: ProviderType) -> Option<&dyn LlmProvider> {
        self.providers
            .iter()
            .find(|p| p.provider_type() == pt)
            .map(|p| p.as_ref())
    }

    pub fn get_active_info(&self) -> (Option<&ProviderType>, Option<&String>) {
        (
            self.selected_provider.as_ref(),
            self.selected_model.as_ref(),
        )
    }

    /// Route a prompt to a specific model on whichever provider carries it.
    /// With a single registered provider this is a straight dispatch.
    pub async fn generate(
        &self,
        model_id: &str,
        prompt: &str,
        system_instruction: Option<&str>,
    ) -> Result<String> {
        let provider = self
            .providers
            .first()
            .ok_or_else(|| anyhow!("No LLM Provider registered"))?;
        provider.generate(model_id, prompt, system_instruction).await
    }

    pub async fn generate_with_selected(
        &self,
        prompt: &str,
        system_instruction: Option<&str>,
    ) -> Result<String> {
        let provider_type = self
            .selected_provider
            .as_ref()
            .ok_or_else(|| anyhow!("No LLM Provider selected"))?;

        let model_id = self
            .selected_model
            .as_ref()
            .ok_or_else(|| anyhow!("No LLM Model selected"))?;

        let provider = self
            .get_provider(provider_type.clone())
            .ok_or_else(|| anyhow!("Selected provider not found in registry"))?;

        provider
            .generate(model_id, prompt, system_instruction)
            .await
    }
}

impl Default for LlmManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Models often wrap JSON answers in markdown fences despite being told
/// not to. Strip one fence pair if present; leave anything else alone.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

/// Parse a model reply as JSON after fence stripping.
pub fn parse_json_response(raw: &str) -> Result<Value> {
    let cleaned = strip_code_fences(raw);
    serde_json::from_str(cleaned)
        .map_err(|e| anyhow!("AI returned invalid JSON: {e}"))
}
