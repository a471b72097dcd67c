/// Broad class of a failed node execution
///
/// Lets the host tell "the user aborted" apart from "the system failed" and
/// decide what to show without matching on crate-specific error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Node is misconfigured (e.g. no credential)
    Configuration,
    /// An input port carried a missing or unusable value
    Input,
    /// The endpoint could not be reached or answered with an error status
    Transport,
    /// The endpoint answered but produced no content
    EmptyResponse,
    /// The executor aborted the execution
    Cancelled,
    /// Anything else
    Internal,
}

impl ErrorCategory {
    /// Stable lowercase name for logs and machine-readable output
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration_error",
            Self::Input => "input_error",
            Self::Transport => "transport_error",
            Self::EmptyResponse => "empty_response_error",
            Self::Cancelled => "cancelled",
            Self::Internal => "internal_error",
        }
    }
}

/// Trait for node errors surfaced to the host
///
/// Implemented by each feature crate's error type. The host integration
/// turns these into whatever its UI shows.
pub trait NodeError: std::error::Error {
    /// Category of the failure
    fn category(&self) -> ErrorCategory;

    /// Message safe to show to the person configuring the node
    fn user_message(&self) -> String;
}
