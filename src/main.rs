//! idea-engine - continuous business-idea generator

use idea_engine::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Rustls 0.23 needs a process-wide crypto provider
    let _ = rustls::crypto::ring::default_provider().install_default();

    // INFO by default so cycle outcomes are visible; override with RUST_LOG
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    cli::run().await
}
