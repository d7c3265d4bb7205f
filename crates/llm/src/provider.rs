use std::future::Future;
use std::pin::Pin;

use snafu::Snafu;

pub const DEFAULT_PROVIDER_ID: &str = "openai";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub provider_id: String,
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    pub preamble: Option<String>,
}

impl ProviderConfig {
    pub fn new(
        provider_id: impl Into<String>,
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let model = model.into().trim().to_string();
        Self {
            provider_id: provider_id.into().trim().to_string(),
            api_key: api_key.into().trim().to_string(),
            endpoint: endpoint.into().trim().to_string(),
            model: if model.is_empty() {
                DEFAULT_OPENAI_MODEL.to_string()
            } else {
                model
            },
            preamble: None,
        }
    }

    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        let preamble = preamble.into();
        self.preamble = if preamble.trim().is_empty() {
            None
        } else {
            Some(preamble)
        };
        self
    }
}

/// Reply body of one chat API round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiReply {
    pub response: String,
}

impl ApiReply {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ApiError {
    #[snafu(display("missing API key for provider '{provider_id}'"))]
    MissingApiKey {
        stage: &'static str,
        provider_id: String,
    },
    #[snafu(display("provider '{provider_id}' is not supported"))]
    UnsupportedProvider {
        stage: &'static str,
        provider_id: String,
    },
    #[snafu(display("http client failed on `{stage}`, {source}"))]
    HttpClient {
        stage: &'static str,
        source: rig::http_client::Error,
    },
    #[snafu(display("completions failed on `{stage}`, {source}"))]
    CompletionsFailed {
        stage: &'static str,
        source: rig::completion::CompletionError,
    },
    #[snafu(display("provider '{provider_id}' returned an empty response"))]
    EmptyResponse {
        stage: &'static str,
        provider_id: String,
    },
    #[snafu(display("chat request failed on `{stage}`: {message}"))]
    Rejected {
        stage: &'static str,
        message: String,
    },
}

impl ApiError {
    /// Builds a transport-agnostic failure, used by adapters that do not wrap a typed source.
    pub fn rejected(stage: &'static str, message: impl Into<String>) -> Self {
        Self::Rejected {
            stage,
            message: message.into(),
        }
    }
}

/// Remote chat endpoint: one user text in, one reply out.
///
/// Implementations do not apply a timeout; callers bound the returned future.
pub trait ChatApi: Send + Sync {
    fn id(&self) -> &str;
    fn send_message<'a>(&'a self, text: &'a str) -> BoxFuture<'a, ApiResult<ApiReply>>;
}
