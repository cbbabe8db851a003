mod auth;
mod cli;
mod config;
mod editor;
mod execution;
mod handlers;
mod language;
mod printer;
mod session;
mod tui;
mod utils;

use anyhow::Result;
use config::Config;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    // Load config
    let cfg = Config::load();
    let _guard = init_logging(&cfg, args.verbose);

    // Resolve language: CLI overrides config; fall back to the default language
    let language = language::resolve(args.language, cfg.get("DEFAULT_LANGUAGE").as_deref());

    if args.list_languages {
        printer::MarkdownPrinter::default().print(&printer::languages_table());
        return Ok(());
    }
    if let Some(provider) = args.login {
        return handlers::auth::login(
            &cfg,
            provider.into(),
            args.credential.as_deref(),
            args.callback_url.as_deref(),
        )
        .await;
    }
    if args.logout {
        return handlers::auth::logout(&cfg);
    }
    if args.whoami {
        return handlers::auth::whoami(&cfg);
    }

    // Route to handler
    match args.run.as_deref() {
        Some(file) => handlers::run::run(&cfg, file, args.language).await,
        None => handlers::editor::run(&cfg, language).await,
    }
}

/// Logs go to a file: stdout/stderr belong to the editor.
fn init_logging(cfg: &Config, verbose: bool) -> Option<WorkerGuard> {
    let log_path = cfg.log_path();
    let dir = match log_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    let file_name = log_path.file_name()?.to_owned();
    std::fs::create_dir_all(&dir).ok()?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("codepad={}", level))),
        )
        .try_init()
        .ok()?;

    Some(guard)
}
