use std::path::PathBuf;

use clap::{Parser, Subcommand};
use netlease::{NetworkKind, PolicyKind, RequestPurpose};

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "netlease")]
#[command(about = "Inspect network policies and simulate high-bandwidth lease sharing")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format
	#[arg(short, long, global = true, value_enum, default_value = "json")]
	pub format: OutputFormat,

	/// Load configuration from a JSON file
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Override the configured policy
	#[arg(long, global = true)]
	pub policy: Option<PolicyKind>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Check whether a purpose may run on a network kind
	Check {
		#[arg(short, long)]
		purpose: RequestPurpose,
		#[arg(short, long)]
		network: NetworkKind,
	},

	/// Show which network a purpose prefers among the listed ones
	Prefer {
		#[arg(short, long)]
		purpose: RequestPurpose,
		/// Available networks; the first one is the active network
		#[arg(short, long, value_delimiter = ',', required = true)]
		networks: Vec<NetworkKind>,
	},

	/// Run concurrent lease requests against a simulated platform
	#[command(alias = "sim")]
	Simulate(SimulateArgs),
}

impl Commands {
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Check { .. } => "check",
			Commands::Prefer { .. } => "prefer",
			Commands::Simulate(_) => "simulate",
		}
	}
}

#[derive(clap::Args, Debug, Clone)]
pub struct SimulateArgs {
	#[arg(short, long, default_value = "media-stream")]
	pub purpose: RequestPurpose,

	/// Number of concurrent callers
	#[arg(short = 'n', long, default_value_t = 3)]
	pub requests: usize,

	/// Delay before the platform grants the network (ms)
	#[arg(long, default_value_t = 0, conflicts_with = "never_grant")]
	pub grant_after_ms: u64,

	/// The platform never grants
	#[arg(long)]
	pub never_grant: bool,

	/// Per-caller grant timeout (ms); defaults to the configured awaitTimeoutMs
	#[arg(long)]
	pub timeout_ms: Option<u64>,

	/// How long each caller keeps its lease after waiting (ms)
	#[arg(long, default_value_t = 100)]
	pub hold_ms: u64,

	/// Delay between successive callers (ms)
	#[arg(long, default_value_t = 0)]
	pub stagger_ms: u64,

	/// Kind of network the platform grants
	#[arg(long, default_value = "wifi")]
	pub network: NetworkKind,
}
