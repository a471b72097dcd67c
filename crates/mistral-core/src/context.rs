use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::output::NodeOutput;

/// Receives partial outputs while an invocation is still running
pub trait PartialOutputSink: Send + Sync {
    /// Called once per content-bearing chunk, in stream order
    fn emit(&self, output: &NodeOutput);
}

impl<F> PartialOutputSink for F
where
    F: Fn(&NodeOutput) + Send + Sync,
{
    fn emit(&self, output: &NodeOutput) {
        self(output);
    }
}

/// Runtime context for one node execution
///
/// Supplied by the graph executor; carries the abort signal and, when the
/// node surfaces partial output to its container graph, the sink for it.
#[derive(Clone)]
pub struct InvocationContext {
    /// Identifier used to correlate log lines for this execution
    pub invocation_id: Uuid,
    cancellation: CancellationToken,
    partial_sink: Option<Arc<dyn PartialOutputSink>>,
}

impl InvocationContext {
    /// Create a context with a fresh cancellation token and no sink
    pub fn new() -> Self {
        Self {
            invocation_id: Uuid::new_v4(),
            cancellation: CancellationToken::new(),
            partial_sink: None,
        }
    }

    /// Use the executor's cancellation token
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Route partial outputs to `sink`
    #[must_use]
    pub fn with_partial_sink(mut self, sink: Arc<dyn PartialOutputSink>) -> Self {
        self.partial_sink = Some(sink);
        self
    }

    /// The cancellation token for this execution
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Whether the executor has aborted this execution
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Whether anyone is listening for partial outputs
    pub const fn has_partial_sink(&self) -> bool {
        self.partial_sink.is_some()
    }

    /// Forward a partial output to the sink, if any
    pub fn emit_partial(&self, output: &NodeOutput) {
        if let Some(sink) = &self.partial_sink {
            sink.emit(output);
        }
    }
}

impl Default for InvocationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InvocationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvocationContext")
            .field("invocation_id", &self.invocation_id)
            .field("cancelled", &self.is_cancelled())
            .field("partial_sink", &self.partial_sink.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::message::ChatMessage;

    fn output(text: &str) -> NodeOutput {
        NodeOutput {
            response: text.to_owned(),
            message: ChatMessage::assistant(text),
            all_messages: vec![ChatMessage::assistant(text)],
            usage: None,
            finish_reason: None,
        }
    }

    #[test]
    fn emits_to_closure_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let ctx = InvocationContext::new().with_partial_sink(Arc::new(move |out: &NodeOutput| {
            seen_clone.lock().unwrap().push(out.response.clone());
        }));

        ctx.emit_partial(&output("a"));
        ctx.emit_partial(&output("ab"));

        assert_eq!(*seen.lock().unwrap(), vec!["a".to_owned(), "ab".to_owned()]);
    }

    #[test]
    fn emit_without_sink_is_noop() {
        let ctx = InvocationContext::new();
        assert!(!ctx.has_partial_sink());
        ctx.emit_partial(&output("ignored"));
    }

    #[test]
    fn shares_executor_token() {
        let token = CancellationToken::new();
        let ctx = InvocationContext::new().with_cancellation(token.clone());
        assert!(!ctx.is_cancelled());
        token.cancel();
        assert!(ctx.is_cancelled());
    }
}
