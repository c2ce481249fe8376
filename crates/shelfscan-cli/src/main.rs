mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use shelfscan_scraper::{RetryPolicy, SearchClient};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "shelfscan")]
#[command(about = "Search the marketplace once and save the results as an HTML page")]
struct Cli {
    /// Search keyword, e.g. "fone de ouvido".
    keyword: String,

    /// Where to write the results page.
    #[arg(short, long, default_value = "results.html")]
    output: PathBuf,

    /// Overrides SHELFSCAN_SCRAPER_MAX_ATTEMPTS for this run.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_attempts: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = shelfscan_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let mut client = SearchClient::from_config(&config)?;
    if let Some(max_attempts) = cli.max_attempts {
        let jitter = client.retry_policy().jitter;
        client = client.with_retry_policy(RetryPolicy::new(max_attempts, jitter));
    }

    tracing::info!(keyword = %cli.keyword, "starting search");
    let listings = match client.search_with_retries(&cli.keyword).await {
        Ok(listings) => listings,
        Err(e) => {
            tracing::error!(error = %e, code = e.code(), "search failed");
            eprintln!("Erro ao realizar scraping: {e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    let page = render::results_page(
        cli.keyword.trim(),
        client.site().as_str(),
        &listings,
        chrono::Local::now(),
    );
    std::fs::write(&cli.output, page)?;

    let saved_at = std::path::absolute(&cli.output).unwrap_or(cli.output);
    println!("\nResultados salvos em: {}", saved_at.display());
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests;
