use crate::config::Config;
use crate::providers::OpenAiChat;
use crate::traits::ChatSession;
use anyhow::{Result, anyhow};

const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

pub fn create_chat(config: &Config) -> Result<Box<dyn ChatSession>> {
    let provider_name = config.provider.as_deref().unwrap_or("openai");

    let (api_key, default_base_url) = match provider_name.to_lowercase().as_str() {
        "openai" => (
            Some(resolve_api_key_with_fallback(
                &["OPENAI_API_KEY", "MCPHOST_API_KEY"],
                &config.api_key,
            )?),
            None,
        ),
        "openrouter" => (
            Some(resolve_api_key_with_fallback(
                &["OPENROUTER_API_KEY", "MCPHOST_API_KEY"],
                &config.api_key,
            )?),
            Some(OPENROUTER_BASE_URL),
        ),
        "ollama" => (None, Some(OLLAMA_BASE_URL)),
        _ => {
            return Err(anyhow!(
                "Unknown provider: {}. Available: openai, openrouter, ollama",
                provider_name
            ));
        }
    };

    let mut chat = OpenAiChat::new(api_key)
        .with_model(config.model.clone())
        .with_temperature(config.temperature);
    if let Some(base_url) = config.base_url.as_deref().or(default_base_url) {
        chat = chat.with_base_url(base_url);
    }
    Ok(Box::new(chat))
}

fn resolve_api_key_with_fallback(env_vars: &[&str], config_key: &str) -> Result<String> {
    for var_name in env_vars {
        if let Ok(key) = std::env::var(var_name)
            && !key.is_empty()
        {
            return Ok(key);
        }
    }
    if !config_key.is_empty() {
        Ok(config_key.to_string())
    } else {
        Err(anyhow!(
            "No API key found (set {} or run `mcphost onboard`)",
            env_vars.join(" / ")
        ))
    }
}
