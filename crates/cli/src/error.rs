use thiserror::Error;

use crate::output::ErrorCode;

#[derive(Debug, Error)]
pub enum CliError {
	#[error(transparent)]
	Core(#[from] netlease::Error),

	#[error("invalid input: {0}")]
	InvalidInput(String),

	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl CliError {
	pub fn code(&self) -> ErrorCode {
		match self {
			CliError::Core(netlease::Error::NotAllowed { .. }) => ErrorCode::NotAllowed,
			CliError::Core(netlease::Error::NoSuitableNetwork { .. }) => ErrorCode::NoSuitableNetwork,
			CliError::Core(netlease::Error::Config(_) | netlease::Error::Json(_)) => ErrorCode::ConfigError,
			CliError::Core(netlease::Error::Io(_)) => ErrorCode::IoError,
			CliError::InvalidInput(_) => ErrorCode::InvalidInput,
			CliError::Other(_) => ErrorCode::InternalError,
		}
	}
}

pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
	use netlease::{NetworkKind, RequestPurpose};

	use super::*;

	#[test]
	fn core_errors_map_to_stable_codes() {
		let rejected = CliError::from(netlease::Error::NotAllowed {
			purpose: RequestPurpose::MediaDownload,
			network: NetworkKind::Cellular,
			reason: "downloads only possible over Wi-Fi".into(),
		});
		assert_eq!(rejected.code(), ErrorCode::NotAllowed);

		let bad_config = CliError::from(netlease::Error::Config("awaitTimeoutMs must be greater than zero".into()));
		assert_eq!(bad_config.code(), ErrorCode::ConfigError);

		let missing = CliError::from(netlease::Error::Io(std::io::Error::from(std::io::ErrorKind::NotFound)));
		assert_eq!(missing.code(), ErrorCode::IoError);

		assert_eq!(CliError::InvalidInput("no networks".into()).code(), ErrorCode::InvalidInput);
	}
}
