use clap::Parser;

use screenprint_pricing::{app, cli::Cli, config::load_config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    // RUST_LOG wins over the configured level.
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::debug!("Using configuration from {}", cli.config.display());
    app::run(cli, config).await
}
