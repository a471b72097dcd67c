use std::path::PathBuf;

use clap::Parser;

/// Run one Mistral chat completion the way the graph host would
#[derive(Debug, Parser)]
#[command(name = "mistral-node", about = "Run a Mistral chat completion node from the command line")]
pub struct Args {
    /// Path to configuration file; `mistral-node.toml` is used when present
    #[arg(short, long, env = "MISTRAL_NODE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Prompt text
    #[arg(
        short,
        long,
        required_unless_present_any = ["messages", "list_models"],
        conflicts_with = "messages"
    )]
    pub prompt: Option<String>,

    /// JSON file holding a chat message list, sent instead of a prompt
    #[arg(long)]
    pub messages: Option<PathBuf>,

    /// System prompt prepended to the prompt
    #[arg(short, long)]
    pub system_prompt: Option<String>,

    /// Model identifier
    #[arg(short, long)]
    pub model: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Maximum tokens to generate
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Nucleus sampling threshold
    #[arg(long)]
    pub top_p: Option<f64>,

    /// Wait for the whole response instead of streaming it
    #[arg(long)]
    pub no_stream: bool,

    /// Print the model catalog as JSON and exit
    #[arg(
        long,
        conflicts_with_all = [
            "prompt",
            "messages",
            "system_prompt",
            "model",
            "temperature",
            "max_tokens",
            "top_p",
            "no_stream",
        ]
    )]
    pub list_models: bool,

    /// Override the configured log filter
    #[arg(long, env = "MISTRAL_NODE_LOG")]
    pub log_filter: Option<String>,
}
