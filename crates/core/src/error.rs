use netlease_protocol::{NetworkKind, RequestPurpose};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[error("{purpose} not allowed on {network}: {reason}")]
	NotAllowed {
		purpose: RequestPurpose,
		network: NetworkKind,
		reason: String,
	},

	#[error("no suitable network for {purpose}")]
	NoSuitableNetwork { purpose: RequestPurpose },

	#[error("invalid configuration: {0}")]
	Config(String),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
