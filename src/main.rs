use clap::Parser;
use reuse::cli::{self, Cli};
use reuse::config::{init_default_dir, Settings};
use reuse::{db, Marketplace};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Settings folder defaults to HOME/.reuse, seeded from the template
    let settings_dir = init_default_dir(cli.dirsettings.clone())?;
    let settings = Settings::load(&settings_dir)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.reuse.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let pool = db::connect(&settings.database).await?;
    let market = Marketplace::from_pool(pool, settings.reuse.clone());

    if let Err(e) = cli::run(&cli, &market).await {
        let failure = e.to_failure();
        println!("{}", serde_json::to_string_pretty(&failure)?);
        std::process::exit(1);
    }

    Ok(())
}
