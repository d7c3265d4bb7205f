use std::sync::Arc;

use chatline_llm::{
    ApiError, ApiReply, ApiResult, BoxFuture, ChatApi, DEFAULT_OPENAI_MODEL, DEFAULT_PROVIDER_ID,
    ProviderConfig, create_chat_api,
};
use chatline_session::ProviderSettings;

const UNCONFIGURED_PROVIDER_ID: &str = "unconfigured";

/// Chooses the chat endpoint for this run.
///
/// Saved provider settings win; otherwise the conventional `OPENAI_*` variables are
/// consulted. Without any key the session still starts, and every send fails with a
/// retryable error explaining what to configure.
pub fn build_chat_api(settings: &ProviderSettings) -> Arc<dyn ChatApi> {
    let config = settings
        .to_provider_config()
        .or_else(|| provider_from_env(|name| std::env::var(name).ok()));

    let Some(config) = config else {
        tracing::warn!("no API key configured; replies will fail until one is set");
        return Arc::new(UnconfiguredApi);
    };

    match create_chat_api(config) {
        Ok(api) => {
            tracing::info!(provider = api.id(), "chat provider ready");
            api
        }
        Err(error) => {
            tracing::warn!(error = %error, "failed to create chat provider");
            Arc::new(UnconfiguredApi)
        }
    }
}

fn provider_from_env(lookup: impl Fn(&str) -> Option<String>) -> Option<ProviderConfig> {
    let api_key = lookup("OPENAI_API_KEY").filter(|key| !key.trim().is_empty())?;
    let endpoint = lookup("OPENAI_BASE_URL").unwrap_or_default();
    let model = lookup("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());

    Some(ProviderConfig::new(
        DEFAULT_PROVIDER_ID,
        &api_key,
        &endpoint,
        &model,
    ))
}

/// Stand-in endpoint used when no provider could be built.
pub struct UnconfiguredApi;

impl ChatApi for UnconfiguredApi {
    fn id(&self) -> &str {
        UNCONFIGURED_PROVIDER_ID
    }

    fn send_message<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, ApiResult<ApiReply>> {
        Box::pin(async {
            Err(ApiError::rejected(
                "unconfigured-provider",
                "set provider.api_key in settings.json or OPENAI_API_KEY",
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn env_fallback_requires_a_key() {
        assert!(provider_from_env(lookup(&[])).is_none());
        assert!(provider_from_env(lookup(&[("OPENAI_API_KEY", "  ")])).is_none());
    }

    #[test]
    fn env_fallback_reads_model_and_endpoint() {
        let config = provider_from_env(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-4o"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1"),
        ]))
        .expect("config from env");

        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.endpoint, "http://localhost:8080/v1");
    }

    #[tokio::test]
    async fn unconfigured_api_rejects_every_message() {
        let error = UnconfiguredApi
            .send_message("hello")
            .await
            .expect_err("no provider configured");

        assert!(matches!(error, ApiError::Rejected { .. }));
    }
}
