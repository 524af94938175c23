//! Command dispatch: load configuration, run the command, print the envelope.

mod policy;
mod simulate;

use std::path::Path;
use std::time::Instant;

use netlease::{NetleaseConfig, PolicyKind};
use serde::Serialize;
use tracing::debug;

use crate::cli::{Cli, Commands};
use crate::error::{CliError, Result};
use crate::output::{Diagnostic, DiagnosticLevel, ResultBuilder, print_result};

pub use policy::{CheckReport, PreferReport};
pub use simulate::{CallerOutcome, SimulationReport};

pub async fn dispatch(cli: Cli) -> Result<()> {
	let start = Instant::now();
	let command = cli.command.name();
	let mut notes = Vec::new();

	let outcome = match load_config(cli.config.as_deref(), cli.policy, &mut notes) {
		Ok(config) => execute(&config, cli.command).await,
		Err(err) => Err(err),
	};

	let mut builder = ResultBuilder::new(command).started_at(start);
	for note in notes {
		builder = builder.diagnostic(note.level, note.message);
	}

	match outcome {
		Ok(data) => {
			print_result(&builder.data(data).build(), cli.format);
			Ok(())
		}
		Err(err) => {
			print_result(&builder.error(err.code(), err.to_string()).build(), cli.format);
			Err(err)
		}
	}
}

fn load_config(path: Option<&Path>, policy: Option<PolicyKind>, notes: &mut Vec<Diagnostic>) -> Result<NetleaseConfig> {
	let mut config = match path {
		Some(path) => {
			debug!(target = "netlease", path = %path.display(), "loading config");
			NetleaseConfig::load(path)?
		}
		None => NetleaseConfig::default(),
	};

	if let Some(policy) = policy {
		if path.is_some() && policy != config.policy {
			notes.push(Diagnostic {
				level: DiagnosticLevel::Info,
				message: format!("--policy {policy} overrides configured policy {}", config.policy),
			});
		}
		config.policy = policy;
	}
	Ok(config)
}

async fn execute(config: &NetleaseConfig, command: Commands) -> Result<serde_json::Value> {
	match command {
		Commands::Check { purpose, network } => to_value(policy::check(config, purpose, network)),
		Commands::Prefer { purpose, networks } => to_value(policy::prefer(config, purpose, &networks)?),
		Commands::Simulate(args) => to_value(simulate::run(config, &args).await?),
	}
}

fn to_value<T: Serialize>(data: T) -> Result<serde_json::Value> {
	serde_json::to_value(data).map_err(|err| CliError::Core(err.into()))
}
