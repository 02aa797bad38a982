// src/main.rs

use phaserun::{cli, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(status) if status.is_success() => {}
        Ok(_) => std::process::exit(1),
        Err(err) => {
            eprintln!("phaserun error: {err:?}");
            std::process::exit(1);
        }
    }
}

async fn run_main() -> anyhow::Result<phaserun::types::RunStatus> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
