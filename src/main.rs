//! readsync - Entry Point
//!
//! Replays a JSONL script of conversation events against a simulated server
//! and prints what the presentation layer would render.

use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use readsync::config::{self, ResolvedConfig};
use readsync::integration::{process_lines, ScriptRunner};
use readsync::model::{AppError, Narrow};
use readsync::remote::{Session, SimulatedServer};
use readsync::source::InputSource;
use readsync::state::ConversationView;

/// readsync - replay conversation events through the unread/read-receipt engine
#[derive(Parser, Debug)]
#[command(name = "readsync")]
#[command(version)]
#[command(about = "Replay a JSONL conversation script through the read-receipt sync engine")]
pub struct Args {
    /// Path to JSONL script (reads from stdin if not provided)
    pub script: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Debounce window for coalescing read receipts, in milliseconds
    #[arg(long)]
    pub debounce_ms: Option<u64>,

    /// Path to log file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Make every N-th mark-as-read call on the simulated server fail
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub fail_every: Option<u32>,

    /// How long to wait for undelivered read receipts before exiting
    #[arg(long, default_value = "10000")]
    pub drain_timeout_ms: u64,
}

fn resolve_config(args: &Args) -> Result<ResolvedConfig, AppError> {
    // Defaults → Config File → Env Vars → CLI Args
    let config_file = config::load_config_with_precedence(args.config.clone())?;
    let merged = config::merge_config(config_file);
    let with_env = config::apply_env_overrides(merged)?;
    let resolved = config::apply_cli_overrides(with_env, args.debounce_ms, args.log_file.clone());
    resolved.validate()?;
    Ok(resolved)
}

async fn run(args: Args) -> Result<(), AppError> {
    let config = resolve_config(&args)?;
    readsync::logging::init(&config.log_file_path)?;

    info!(config = ?config, "Configuration loaded and resolved");

    let lines = InputSource::detect(args.script.clone()).read_lines()?;
    let (events, errors) = process_lines(lines, 1);
    for error in &errors {
        warn!(line = error.line(), error = %error, "skipping script line");
    }

    let server = Arc::new(SimulatedServer::failing_every(args.fail_every));
    let session = Session::new("https://chat.invalid", "reader@chat.invalid", "simulated");
    let view = ConversationView::open(
        Narrow::All,
        session,
        server.clone(),
        server.clone(),
        &config.view_settings(),
    );

    let mut runner = ScriptRunner::new(view);
    let mut stdout = std::io::stdout();
    for (line, event) in events {
        if let Some(summary) = runner.apply(event).await {
            let json = serde_json::to_string(&summary).map_err(std::io::Error::from)?;
            writeln!(stdout, "{json}")?;
            tracing::debug!(line, "render summary written");
        }
    }

    let drained = runner
        .finish(Duration::from_millis(args.drain_timeout_ms))
        .await;
    info!(drained, parse_errors = errors.len(), "script finished");

    let deliveries = serde_json::json!({ "deliveries": server.deliveries() });
    writeln!(stdout, "{deliveries}")?;
    stdout.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("readsync: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_help_does_not_error() {
        let result = Args::try_parse_from(["readsync", "--help"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_does_not_error() {
        let result = Args::try_parse_from(["readsync", "--version"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_no_args_defaults() {
        let args = Args::parse_from(["readsync"]);
        assert_eq!(args.script, None);
        assert_eq!(args.config, None);
        assert_eq!(args.debounce_ms, None);
        assert_eq!(args.log_file, None);
        assert_eq!(args.fail_every, None);
        assert_eq!(args.drain_timeout_ms, 10_000);
    }

    #[test]
    fn test_script_path_populates_script_field() {
        let args = Args::parse_from(["readsync", "events.jsonl"]);
        assert_eq!(args.script, Some(PathBuf::from("events.jsonl")));
    }

    #[test]
    fn test_overrides_parse() {
        let args = Args::parse_from([
            "readsync",
            "--debounce-ms",
            "40",
            "--log-file",
            "/tmp/r.log",
            "--fail-every",
            "3",
        ]);
        assert_eq!(args.debounce_ms, Some(40));
        assert_eq!(args.log_file, Some(PathBuf::from("/tmp/r.log")));
        assert_eq!(args.fail_every, Some(3));
    }

    #[test]
    fn test_fail_every_rejects_zero() {
        let result = Args::try_parse_from(["readsync", "--fail-every", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_flag() {
        let args = Args::parse_from(["readsync", "--config", "/etc/readsync.toml"]);
        assert_eq!(args.config, Some(PathBuf::from("/etc/readsync.toml")));
    }
}
