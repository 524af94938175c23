use clap::Parser;
use netlease_cli::cli::Cli;
use netlease_cli::{commands, logging};
use tracing::error;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	if let Err(err) = commands::dispatch(cli).await {
		error!(target = "netlease", error = %err, "command failed");
		std::process::exit(1);
	}
}
