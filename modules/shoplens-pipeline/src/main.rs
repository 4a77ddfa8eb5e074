use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use shoplens_common::Config;
use shoplens_pipeline::pipeline::Pipeline;

/// Collect product listings for a keyword, capture screenshots of the top
/// results, enrich them with extracted details, and export a PDF report.
#[derive(Parser)]
#[command(name = "shoplens")]
struct Args {
    /// Search keyword.
    keyword: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("shoplens=info".parse()?))
        .init();

    let args = Args::parse();
    info!("ShopLens starting...");

    // Fatal configuration errors surface here, before any network call.
    let config = Config::from_env()?;
    config.log_redacted();

    let pipeline = Pipeline::from_config(&config);
    match pipeline.run(&args.keyword).await {
        Ok(summary) => {
            info!("Pipeline run complete. {summary}");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Pipeline run failed");
            Err(e)
        }
    }
}
