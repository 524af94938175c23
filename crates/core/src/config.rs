//! Construction-time configuration.
//!
//! The grace delay and policy variant are the only tunables; both are read
//! once when the broker and rules engine are built.

use std::fs;
use std::path::Path;
use std::time::Duration;

use netlease_runtime::BrokerConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::policy::PolicyKind;

const DEFAULT_GRACE_DELAY_MS: u64 = 3_000;
const DEFAULT_AWAIT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NetleaseConfig {
	#[serde(default)]
	pub policy: PolicyKind,
	/// How long an idle network lease is kept before release.
	#[serde(default = "default_grace_delay_ms")]
	pub grace_delay_ms: u64,
	/// How long the selector waits for a high-bandwidth grant.
	#[serde(default = "default_await_timeout_ms")]
	pub await_timeout_ms: u64,
}

fn default_grace_delay_ms() -> u64 {
	DEFAULT_GRACE_DELAY_MS
}

fn default_await_timeout_ms() -> u64 {
	DEFAULT_AWAIT_TIMEOUT_MS
}

impl Default for NetleaseConfig {
	fn default() -> Self {
		Self {
			policy: PolicyKind::default(),
			grace_delay_ms: DEFAULT_GRACE_DELAY_MS,
			await_timeout_ms: DEFAULT_AWAIT_TIMEOUT_MS,
		}
	}
}

impl NetleaseConfig {
	pub fn load(path: &Path) -> Result<Self> {
		let content = fs::read_to_string(path)?;
		Self::from_json(&content)
	}

	pub fn from_json(json: &str) -> Result<Self> {
		let config: Self = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<()> {
		if self.await_timeout_ms == 0 {
			return Err(Error::Config("awaitTimeoutMs must be greater than zero".to_string()));
		}
		Ok(())
	}

	pub fn grace_delay(&self) -> Duration {
		Duration::from_millis(self.grace_delay_ms)
	}

	pub fn await_timeout(&self) -> Duration {
		Duration::from_millis(self.await_timeout_ms)
	}

	pub fn broker_config(&self) -> BrokerConfig {
		BrokerConfig::with_grace_delay(self.grace_delay())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_object_uses_defaults() {
		let config = NetleaseConfig::from_json("{}").unwrap();
		assert_eq!(config, NetleaseConfig::default());
		assert_eq!(config.broker_config().grace_delay, Duration::from_secs(3));
		assert_eq!(config.policy, PolicyKind::Conservative);
	}

	#[test]
	fn reads_camel_case_fields() {
		let config = NetleaseConfig::from_json(r#"{"policy":"lenient","graceDelayMs":250,"awaitTimeoutMs":900}"#).unwrap();
		assert_eq!(config.policy, PolicyKind::Lenient);
		assert_eq!(config.grace_delay(), Duration::from_millis(250));
		assert_eq!(config.await_timeout(), Duration::from_millis(900));
	}

	#[test]
	fn rejects_zero_await_timeout() {
		let err = NetleaseConfig::from_json(r#"{"awaitTimeoutMs":0}"#).unwrap_err();
		assert!(matches!(err, Error::Config(_)));
	}

	#[test]
	fn rejects_unknown_fields_and_policies() {
		assert!(matches!(NetleaseConfig::from_json(r#"{"graceDelay":1}"#), Err(Error::Json(_))));
		assert!(matches!(NetleaseConfig::from_json(r#"{"policy":"strict"}"#), Err(Error::Json(_))));
	}
}
