use std::sync::Arc;

mod provider;
mod rig_adapter;

pub use provider::{
    ApiError, ApiReply, ApiResult, BoxFuture, ChatApi, DEFAULT_OPENAI_MODEL, DEFAULT_PROVIDER_ID,
    ProviderConfig,
};
pub use rig_adapter::{RIG_OPENAI_PROVIDER_ID, RigChatApi};

pub fn create_chat_api(mut config: ProviderConfig) -> ApiResult<Arc<dyn ChatApi>> {
    if config.provider_id.trim().is_empty() {
        config.provider_id = RIG_OPENAI_PROVIDER_ID.to_string();
    }

    match config.provider_id.as_str() {
        "openai" | "rig-openai" => {
            config.provider_id = RIG_OPENAI_PROVIDER_ID.to_string();
            Ok(Arc::new(RigChatApi::new(config)?))
        }
        _ => Err(ApiError::UnsupportedProvider {
            stage: "create-chat-api",
            provider_id: config.provider_id,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_provider_defaults_to_openai() {
        let api = create_chat_api(ProviderConfig::new("", "sk-test", "", "gpt-4o")).unwrap();
        assert_eq!(api.id(), RIG_OPENAI_PROVIDER_ID);
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let error = create_chat_api(ProviderConfig::new("carrier-pigeon", "sk-test", "", ""))
            .err()
            .unwrap();
        assert!(matches!(error, ApiError::UnsupportedProvider { .. }));
    }

    #[tokio::test]
    async fn rejected_error_reports_stage_and_message() {
        let failing: BoxFuture<'static, ApiResult<ApiReply>> =
            Box::pin(async { Err(ApiError::rejected("fixture", "upstream returned 502")) });

        let error = failing.await.unwrap_err();
        assert_eq!(
            error.to_string(),
            "chat request failed on `fixture`: upstream returned 502"
        );
    }
}
