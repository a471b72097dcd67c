//! Mistral HTTP backend

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use mistral_config::{MistralConfig, RetryConfig};
use reqwest::Client;
use reqwest_middleware::ClientWithMiddleware;
use secrecy::ExposeSecret;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::{ByteStream, CompletionBackend};
use crate::error::ChatError;
use crate::protocol::{ChatResponse, CompletionRequest, error_message};
use crate::retry::with_retries;

/// Talks to the Mistral chat completions endpoint
#[derive(Debug, Clone)]
pub struct MistralProvider {
    client: ClientWithMiddleware,
    base_url: Url,
}

impl MistralProvider {
    /// Create from endpoint and retry configuration
    ///
    /// Only connecting and each individual read are bounded in time, so a
    /// long generation may keep streaming as long as bytes keep arriving.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Internal` if the retry policy is invalid or the
    /// HTTP client cannot be built
    pub fn new(config: &MistralConfig, retry: &RetryConfig) -> Result<Self, ChatError> {
        retry
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid retry configuration: {e}"))?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))?;

        Ok(Self {
            client: with_retries(client, retry),
            base_url: config.base_url.clone(),
        })
    }

    fn completions_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/chat/completions")
    }

    /// Send the request, retrying transient failures
    ///
    /// Only the send is retried; the success body is left unread.
    async fn send(
        &self,
        request: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<reqwest::Response, ChatError> {
        if cancel.is_cancelled() {
            return Err(ChatError::Cancelled);
        }

        let send = self
            .client
            .post(self.completions_url())
            .bearer_auth(request.credential.expose_secret())
            .json(request)
            .send();

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ChatError::Cancelled),
            response = send => response.map_err(|e| {
                tracing::error!(error = %e, "request to Mistral failed");
                ChatError::Connection(e.to_string())
            })?,
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = ChatError::Upstream {
            status: status.as_u16(),
            message: error_message(&body),
        };
        if error.is_retryable() {
            tracing::error!(status = %status, "Mistral returned error, retries exhausted");
        } else {
            tracing::warn!(status = %status, "Mistral returned error");
        }
        Err(error)
    }
}

#[async_trait]
impl CompletionBackend for MistralProvider {
    async fn complete(
        &self,
        request: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<ChatResponse, ChatError> {
        let response = self.send(request, cancel).await?;

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(ChatError::Cancelled),
            body = response.json::<ChatResponse>() => {
                body.map_err(|e| ChatError::InvalidResponse(format!("failed to parse response: {e}")))
            }
        }
    }

    async fn open_stream(
        &self,
        request: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<ByteStream, ChatError> {
        let response = self.send(request, cancel).await?;

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| ChatError::Streaming(e.to_string())));

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use futures_util::TryStreamExt;
    use secrecy::SecretString;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::protocol::{WireMessage, WireRole};

    fn provider(server: &MockServer, max_attempts: u32) -> MistralProvider {
        let config = MistralConfig {
            base_url: Url::parse(&format!("{}/v1", server.uri())).unwrap(),
            ..MistralConfig::default()
        };
        let retry = RetryConfig {
            max_attempts,
            base_delay_ms: 1,
            max_delay_ms: 5,
            backoff_multiplier: 2,
            jitter: false,
        };
        MistralProvider::new(&config, &retry).unwrap()
    }

    fn request(stream: bool) -> CompletionRequest {
        CompletionRequest {
            model: "mistral-small-latest".to_owned(),
            messages: vec![WireMessage {
                role: WireRole::User,
                content: "hello".to_owned(),
                tool_calls: None,
            }],
            temperature: 0.7,
            max_tokens: 64,
            top_p: 1.0,
            stream,
            safe_prompt: false,
            random_seed: None,
            credential: SecretString::from("sk-test"),
        }
    }

    #[tokio::test]
    async fn complete_sends_bearer_and_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({"model": "mistral-small-latest", "stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "cmpl-1",
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hi"}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 2, "completion_tokens": 1, "total_tokens": 3}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = provider(&server, 1)
            .complete(&request(false), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(response.choices.len(), 1);
        assert_eq!(response.usage.unwrap().total_tokens, 3);
    }

    #[tokio::test]
    async fn error_status_surfaces_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(serde_json::json!({"object": "error", "message": "Unauthorized"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = provider(&server, 3)
            .complete(&request(false), &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            ChatError::Upstream { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Unauthorized");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn retries_server_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "recovered"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = provider(&server, 3)
            .complete(&request(false), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(response.choices.len(), 1);
    }

    #[tokio::test]
    async fn bad_request_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({"detail": "bad model"})))
            .expect(1)
            .mount(&server)
            .await;

        let err = provider(&server, 3)
            .complete(&request(false), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Upstream { status: 400, .. }));
    }

    #[tokio::test]
    async fn exhausted_retries_return_last_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({"message": "slow down"})))
            .expect(2)
            .mount(&server)
            .await;

        let err = provider(&server, 2)
            .complete(&request(false), &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            ChatError::Upstream { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "slow down");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn cancellation_interrupts_backoff() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let config = MistralConfig {
            base_url: Url::parse(&format!("{}/v1", server.uri())).unwrap(),
            ..MistralConfig::default()
        };
        let retry = RetryConfig {
            max_attempts: 3,
            base_delay_ms: 60_000,
            max_delay_ms: 60_000,
            backoff_multiplier: 2,
            jitter: false,
        };
        let provider = MistralProvider::new(&config, &retry).unwrap();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            provider.complete(&request(false), &cancel),
        )
        .await
        .unwrap();
        assert!(matches!(result, Err(ChatError::Cancelled)));
    }

    #[test]
    fn invalid_retry_config_rejected() {
        let retry = RetryConfig {
            backoff_multiplier: 0,
            ..RetryConfig::default()
        };
        assert!(matches!(
            MistralProvider::new(&MistralConfig::default(), &retry),
            Err(ChatError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn open_stream_returns_raw_body() {
        let server = MockServer::start().await;
        let body = "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hi\"}}]}\n\ndata: [DONE]\n\n";

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(serde_json::json!({"stream": true})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let stream = provider(&server, 1)
            .open_stream(&request(true), &CancellationToken::new())
            .await
            .unwrap();
        let chunks: Vec<_> = stream.try_collect().await.unwrap();
        let received: Vec<u8> = chunks.iter().flat_map(|c| c.iter().copied()).collect();

        assert_eq!(received, body.as_bytes());
    }

    #[tokio::test]
    async fn cancelled_before_send() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = provider(&server, 1).open_stream(&request(true), &cancel).await;
        assert!(matches!(result, Err(ChatError::Cancelled)));
    }

    #[tokio::test]
    async fn connection_failure_is_retryable_error() {
        let config = MistralConfig {
            base_url: Url::parse("http://127.0.0.1:1/v1").unwrap(),
            ..MistralConfig::default()
        };
        let retry = RetryConfig {
            max_attempts: 1,
            ..RetryConfig::default()
        };
        let provider = MistralProvider::new(&config, &retry).unwrap();

        let err = provider
            .complete(&request(false), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Connection(_)));
    }
}
