#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Context;
use args::Args;
use clap::Parser;
use mistral_cache::ResponseCache;
use mistral_chat::{MistralNode, NodeInputs};
use mistral_config::Config;
use mistral_core::{ErrorCategory, InputValue, InvocationContext, NodeError, NodeOutput};
use tokio_util::sync::CancellationToken;

const DEFAULT_CONFIG_PATH: &str = "mistral-node.toml";

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    if args.list_models {
        println!("{}", serde_json::to_string_pretty(mistral_pricing::MODELS)?);
        return Ok(ExitCode::SUCCESS);
    }

    let (mut config, config_path) = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, &args);

    mistral_telemetry::init(&config.telemetry, args.log_filter.as_deref())?;

    tracing::info!(
        config_path = %config_path.as_ref().map_or_else(|| "<defaults>".to_owned(), |p| p.display().to_string()),
        model = %config.node.model,
        "starting mistral-node"
    );

    let inputs = build_inputs(&args)?;
    let node = MistralNode::from_config(&config)?.with_cache(ResponseCache::from_config(&config.cache));

    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_clone.cancel();
    });

    let ctx = InvocationContext::new()
        .with_cancellation(shutdown)
        .with_partial_sink(Arc::new(partial_printer()));

    match node.invoke(&inputs, &ctx).await {
        Ok(output) => {
            eprintln!();
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!();
            eprintln!("{}", e.user_message());
            Ok(exit_code(e.category()))
        }
    }
}

/// Load the explicit config, else the default file when present, else defaults
fn load_config(explicit: Option<&Path>) -> anyhow::Result<(Config, Option<PathBuf>)> {
    if let Some(path) = explicit {
        return Ok((Config::load(path)?, Some(path.to_path_buf())));
    }

    let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        let config = Config::load(&default_path)?;
        return Ok((config, Some(default_path)));
    }

    Ok((Config::default(), None))
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if args.no_stream {
        config.node.stream = false;
    }
    if args.messages.is_some() {
        config.node.use_messages_input = true;
    }
}

fn build_inputs(args: &Args) -> anyhow::Result<NodeInputs> {
    let messages = match &args.messages {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read messages file {}", path.display()))?;
            let value: serde_json::Value =
                serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))?;
            Some(InputValue::Object(value))
        }
        None => None,
    };

    Ok(NodeInputs {
        model: args.model.clone().map(InputValue::from),
        temperature: args.temperature.map(InputValue::from),
        max_tokens: args.max_tokens.map(|n| InputValue::from(f64::from(n))),
        top_p: args.top_p.map(InputValue::from),
        system_prompt: args.system_prompt.clone().map(InputValue::from),
        prompt: args.prompt.clone().map(InputValue::from),
        messages,
    })
}

/// Print the newly received part of each partial output to stderr
fn partial_printer() -> impl Fn(&NodeOutput) + Send + Sync {
    let printed = AtomicUsize::new(0);
    move |output: &NodeOutput| {
        let from = printed.swap(output.response.len(), Ordering::SeqCst);
        if let Some(delta) = output.response.get(from..) {
            let mut stderr = std::io::stderr().lock();
            let _ = stderr.write_all(delta.as_bytes());
            let _ = stderr.flush();
        }
    }
}

fn exit_code(category: ErrorCategory) -> ExitCode {
    match category {
        ErrorCategory::Configuration => ExitCode::from(2),
        ErrorCategory::Input => ExitCode::from(3),
        ErrorCategory::Transport => ExitCode::from(4),
        ErrorCategory::EmptyResponse => ExitCode::from(5),
        ErrorCategory::Cancelled => ExitCode::from(130),
        ErrorCategory::Internal => ExitCode::FAILURE,
    }
}

/// Wait for a shutdown signal (`SIGINT` or `SIGTERM`)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received, cancelling invocation");
}
