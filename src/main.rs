use as3lsp::{create_service, discover_settings};
use tower_lsp::Server;
use tracing_subscriber::EnvFilter;

/// `AS3LSP_LOG` wins over the `[log]` table of the settings file.
fn log_filter() -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_env("AS3LSP_LOG") {
        return filter;
    }
    let level = std::env::current_dir()
        .ok()
        .and_then(|dir| discover_settings(&dir).0.log_level().map(str::to_owned));
    level
        .and_then(|level| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() {
    // stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = create_service();
    Server::new(stdin, stdout, socket).serve(service).await;
}
