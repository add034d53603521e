use std::sync::Arc;

use tracing::warn;

use crate::config::{API_KEY_ENV, AppConfig};
use crate::error::{AppError, AppResult};
use crate::infra::llm::GeminiClient;
use crate::services::LanguageModelService;

/// Whether the model can be called at all, decided once at startup.
#[derive(Clone)]
pub enum ModelCapability {
    Available(Arc<dyn LanguageModelService>),
    Unavailable { reason: String },
}

impl ModelCapability {
    pub fn from_config(config: &AppConfig) -> Self {
        match &config.gemini_api_key {
            Some(api_key) => ModelCapability::Available(Arc::new(GeminiClient::new(
                api_key.clone(),
                config.gemini_model.clone(),
                config.gemini_base_url.clone(),
            ))),
            None => {
                warn!("{API_KEY_ENV} not configured; every draft request will fail");
                ModelCapability::Unavailable {
                    reason: format!("{API_KEY_ENV} is not set"),
                }
            }
        }
    }

    pub fn service(&self) -> AppResult<&dyn LanguageModelService> {
        match self {
            ModelCapability::Available(service) => Ok(service.as_ref()),
            ModelCapability::Unavailable { reason } => {
                Err(AppError::Configuration(reason.clone()))
            }
        }
    }
}

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub language_model: ModelCapability,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Self {
        let language_model = ModelCapability::from_config(&config);
        Self::with_capability(config, language_model)
    }

    pub fn with_capability(config: AppConfig, language_model: ModelCapability) -> Self {
        Self {
            config,
            language_model,
        }
    }
}
