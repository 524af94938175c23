//! Broker tunables.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How long an idle lease is kept before it is actually released.
pub const DEFAULT_GRACE_DELAY: Duration = Duration::from_secs(3);

/// Construction-time settings for [`LeaseBroker`](crate::LeaseBroker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerConfig {
	/// Wait between the last close for a class and closing its underlying lease.
	pub grace_delay: Duration,
}

impl BrokerConfig {
	pub fn with_grace_delay(grace_delay: Duration) -> Self {
		Self { grace_delay }
	}
}

impl Default for BrokerConfig {
	fn default() -> Self {
		Self {
			grace_delay: DEFAULT_GRACE_DELAY,
		}
	}
}
