//! The Mistral chat node

use std::sync::Arc;

use futures_util::StreamExt;
use mistral_cache::{ResponseCache, compute_cache_key};
use mistral_config::{Config, NodeConfig};
use mistral_core::{InvocationContext, NodeOutput};
use secrecy::SecretString;
use tracing::Instrument;

use crate::accumulate::{StreamAccumulator, complete_from_response};
use crate::builder::{NodeInputs, PreparedRequest, RequestBuilder};
use crate::decode::SseDecoder;
use crate::error::ChatError;
use crate::ports::{self, PortDefinition};
use crate::provider::{CompletionBackend, MistralProvider};

/// Runs chat completions against a backend on behalf of the host graph
pub struct MistralNode {
    config: NodeConfig,
    credential: Option<SecretString>,
    backend: Arc<dyn CompletionBackend>,
    cache: Option<ResponseCache>,
}

impl MistralNode {
    pub fn new(config: NodeConfig, credential: Option<SecretString>, backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            config,
            credential,
            backend,
            cache: None,
        }
    }

    /// Build a node talking to Mistral over HTTP
    ///
    /// A missing credential is reported when the node is invoked, not here.
    pub fn from_config(config: &Config) -> Result<Self, ChatError> {
        let provider = MistralProvider::new(&config.mistral, &config.retry)?;
        Ok(Self::new(
            config.node.clone(),
            config.mistral.resolve_api_key(),
            Arc::new(provider),
        ))
    }

    /// Share a response cache with this node
    ///
    /// Consulted only when the node config enables caching.
    #[must_use]
    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub const fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn input_ports(&self) -> Vec<PortDefinition> {
        ports::input_ports(&self.config)
    }

    pub fn output_ports(&self) -> Vec<PortDefinition> {
        ports::output_ports()
    }

    /// Run one completion
    ///
    /// Streams when the node is configured to, emitting a partial output
    /// through the context after every content-bearing chunk.
    pub async fn invoke(&self, inputs: &NodeInputs, ctx: &InvocationContext) -> Result<NodeOutput, ChatError> {
        let span = tracing::info_span!("mistral_invoke", invocation_id = %ctx.invocation_id);
        async {
            let result = self.run(inputs, ctx).await;
            if let Err(e) = &result {
                tracing::debug!(error = %e, "invocation failed");
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(&self, inputs: &NodeInputs, ctx: &InvocationContext) -> Result<NodeOutput, ChatError> {
        if ctx.is_cancelled() {
            return Err(ChatError::Cancelled);
        }

        let prepared = RequestBuilder::new(&self.config, self.credential.as_ref()).build(inputs)?;
        tracing::info!(model = %prepared.request.model, stream = prepared.request.stream, "sending completion request");

        let cache = self.cache.as_ref().filter(|_| self.config.cache);
        let cache_key = match cache {
            Some(_) => Some(compute_cache_key(&prepared.request).map_err(|e| anyhow::anyhow!(e))?),
            None => None,
        };

        if let (Some(cache), Some(key)) = (cache, &cache_key)
            && let Some(output) = cache.get(key)
        {
            tracing::info!("returning cached output");
            return Ok(output);
        }

        let output = if prepared.request.stream {
            self.run_stream(prepared, ctx).await?
        } else {
            self.run_complete(&prepared, ctx).await?
        };

        if let Some(usage) = &output.usage {
            tracing::info!(
                prompt_tokens = usage.usage().prompt_tokens,
                completion_tokens = usage.usage().completion_tokens,
                cost_cents = usage.cost().cents,
                estimated = usage.is_estimate(),
                "completion finished"
            );
        }

        if let (Some(cache), Some(key)) = (cache, &cache_key) {
            cache.put(key, output.clone());
        }

        Ok(output)
    }

    async fn run_complete(&self, prepared: &PreparedRequest, ctx: &InvocationContext) -> Result<NodeOutput, ChatError> {
        let response = self.backend.complete(&prepared.request, ctx.cancellation()).await?;
        complete_from_response(&prepared.request.model, self.config.currency, &prepared.messages, response)
    }

    async fn run_stream(&self, prepared: PreparedRequest, ctx: &InvocationContext) -> Result<NodeOutput, ChatError> {
        let mut body = self.backend.open_stream(&prepared.request, ctx.cancellation()).await?;

        let mut decoder = SseDecoder::new();
        let mut accumulator =
            StreamAccumulator::new(prepared.request.model, self.config.currency, prepared.messages);
        let surface_partials = self.config.partial_output && ctx.has_partial_sink();

        loop {
            let next = tokio::select! {
                biased;
                () = ctx.cancellation().cancelled() => None,
                next = body.next() => Some(next),
            };
            let Some(next) = next else {
                tracing::debug!(received = accumulator.response().len(), "stream cancelled");
                return Err(ChatError::Cancelled);
            };
            let Some(bytes) = next else {
                break;
            };

            for chunk in decoder.feed(&bytes?) {
                if ctx.is_cancelled() {
                    return Err(ChatError::Cancelled);
                }
                if let Some(snapshot) = accumulator.fold(chunk)
                    && surface_partials
                {
                    ctx.emit_partial(&snapshot);
                }
            }
        }

        if !decoder.is_done() {
            tracing::debug!("stream ended without a done marker");
        }
        decoder.finish();

        accumulator.finish()
    }
}

impl std::fmt::Debug for MistralNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MistralNode")
            .field("model", &self.config.model)
            .field("stream", &self.config.stream)
            .field("has_credential", &self.credential.is_some())
            .field("cache", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}
