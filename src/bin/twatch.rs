// src/bin/twatch.rs

use tbuild::{cli, logging, run_watch};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("twatch error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse_watch();
    logging::init_logging(args.log_level)?;
    run_watch(args).await
}
