use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use account_merge::{AccountStatusClient, ClientConfig, MergeOptions, MergePipeline};

/// Merges an account export with the status of every account
#[derive(Debug, Parser)]
#[clap(version)]
struct Args {
    /// The path to the account export CSV file
    input: std::path::PathBuf,
    /// The path the merged CSV file is written to
    output: std::path::PathBuf,
    /// Fail instead of replacing an existing output file
    #[clap(long)]
    no_clobber: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::from_env();
    tracing::debug!(base_url = config.base_url(), "status endpoint configured");
    let client = AccountStatusClient::new(config).context("failed to set up the http client")?;

    let options = MergeOptions { no_clobber: args.no_clobber };
    let pipeline = MergePipeline::with_options(&args.input, &args.output, client, options)?;
    pipeline.merge()?;

    Ok(())
}
