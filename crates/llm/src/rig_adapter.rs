use futures::StreamExt;
use rig::completion::{CompletionModel, Message as RigMessage};
use rig::prelude::CompletionClient;
use rig::providers::openai;
use rig::streaming::StreamedAssistantContent;
use snafu::{ResultExt, ensure};

use super::provider::{
    ApiReply, ApiResult, BoxFuture, ChatApi, CompletionsFailedSnafu, EmptyResponseSnafu,
    HttpClientSnafu, MissingApiKeySnafu, ProviderConfig,
};

pub const RIG_OPENAI_PROVIDER_ID: &str = "openai";

/// Chat API backed by an OpenAI-compatible completion endpoint through rig.
pub struct RigChatApi {
    config: ProviderConfig,
}

impl RigChatApi {
    pub fn new(config: ProviderConfig) -> ApiResult<Self> {
        ensure!(
            !config.api_key.is_empty(),
            MissingApiKeySnafu {
                stage: "rig-chat-api-new",
                provider_id: config.provider_id.clone(),
            }
        );

        Ok(Self { config })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn build_client(config: &ProviderConfig) -> ApiResult<openai::Client> {
        let mut builder = openai::Client::builder().api_key(config.api_key.as_str());
        if !config.endpoint.is_empty() {
            builder = builder.base_url(config.endpoint.as_str());
        }
        builder.build().context(HttpClientSnafu {
            stage: "build-client",
        })
    }

    async fn complete(&self, text: &str) -> ApiResult<ApiReply> {
        let client = Self::build_client(&self.config)?;
        let model = client.completion_model(self.config.model.clone());

        let mut builder = model.completion_request(RigMessage::user(text.to_string()));
        if let Some(preamble) = &self.config.preamble {
            builder = builder.preamble(preamble.clone());
        }

        let mut stream = builder.stream().await.context(CompletionsFailedSnafu {
            stage: "open-stream",
        })?;

        // The session shows a single placeholder, so deltas are folded into one reply.
        let mut response = String::new();
        while let Some(item) = stream.next().await {
            let item = item.context(CompletionsFailedSnafu {
                stage: "stream-chunk",
            })?;
            if let StreamedAssistantContent::Text(delta) = item {
                response.push_str(&delta.text);
            }
        }

        ensure!(
            !response.trim().is_empty(),
            EmptyResponseSnafu {
                stage: "collect-stream",
                provider_id: self.config.provider_id.clone(),
            }
        );

        tracing::debug!(
            provider_id = %self.config.provider_id,
            model_id = %self.config.model,
            response_chars = response.chars().count(),
            "chat completion finished"
        );
        Ok(ApiReply::new(response))
    }
}

impl ChatApi for RigChatApi {
    fn id(&self) -> &str {
        &self.config.provider_id
    }

    fn send_message<'a>(&'a self, text: &'a str) -> BoxFuture<'a, ApiResult<ApiReply>> {
        Box::pin(async move {
            let result = self.complete(text).await;
            if let Err(error) = &result {
                tracing::warn!(
                    provider_id = %self.config.provider_id,
                    model_id = %self.config.model,
                    error = %error,
                    "chat completion failed"
                );
            }
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ApiError;

    #[test]
    fn empty_api_key_is_rejected() {
        let config = ProviderConfig::new("openai", "   ", "", "");
        let error = RigChatApi::new(config).err().unwrap();
        assert!(matches!(error, ApiError::MissingApiKey { .. }));
    }

    #[test]
    fn adapter_keeps_normalized_config() {
        let config = ProviderConfig::new(" openai ", " sk-test ", " ", " ").with_preamble("Be brief.");
        let api = RigChatApi::new(config).unwrap();

        assert_eq!(api.id(), "openai");
        assert_eq!(api.config().api_key, "sk-test");
        assert_eq!(api.config().model, crate::DEFAULT_OPENAI_MODEL);
        assert_eq!(api.config().preamble.as_deref(), Some("Be brief."));
    }
}
