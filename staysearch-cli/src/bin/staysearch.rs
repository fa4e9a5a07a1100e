use clap::Parser;
use staysearch_cli::{Cli, init_tracing, run};
use std::process::ExitCode;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "staysearch failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
