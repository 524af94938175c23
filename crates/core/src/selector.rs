//! Caller-side flow: escalate, wait for the grant, pick and validate a network.

use std::sync::Arc;
use std::time::Duration;

use netlease_protocol::{NetworkRef, RequestPurpose};
use netlease_runtime::{ConnectionLease, LeaseBroker, NetworkAcquirer};
use tracing::{debug, warn};

use crate::catalog::NetworkCatalog;
use crate::config::NetleaseConfig;
use crate::error::{Error, Result};
use crate::rules::RulesEngine;

/// A network chosen for one unit of work.
///
/// Holds the high-bandwidth lease (if one was needed) for as long as the
/// selection lives; drop it or call [`release`](Self::release) when the work
/// is done.
#[derive(Debug)]
pub struct Selection {
	pub network: NetworkRef,
	/// Whether the high-bandwidth grant arrived before the timeout. Always
	/// `false` when no lease was requested.
	pub granted: bool,
	lease: Option<ConnectionLease>,
}

impl Selection {
	pub fn lease(&self) -> Option<&ConnectionLease> {
		self.lease.as_ref()
	}

	pub fn release(self) {
		if let Some(lease) = &self.lease {
			lease.close();
		}
	}
}

/// Routes each request through the rules engine and, when needed, the broker.
#[derive(Debug, Clone)]
pub struct NetworkSelector {
	rules: RulesEngine,
	broker: LeaseBroker,
	await_timeout: Duration,
}

impl NetworkSelector {
	pub fn new(rules: RulesEngine, broker: LeaseBroker, await_timeout: Duration) -> Self {
		Self { rules, broker, await_timeout }
	}

	/// Wires a policy, broker, and rules engine from `config`.
	///
	/// # Panics
	///
	/// Panics when called outside a tokio runtime.
	pub fn from_config(config: &NetleaseConfig, catalog: Arc<dyn NetworkCatalog>, acquirer: Arc<dyn NetworkAcquirer>) -> Self {
		let rules = RulesEngine::new(catalog, config.policy.build());
		let broker = LeaseBroker::new(acquirer, config.broker_config());
		Self::new(rules, broker, config.await_timeout())
	}

	pub fn rules(&self) -> &RulesEngine {
		&self.rules
	}

	pub fn broker(&self) -> &LeaseBroker {
		&self.broker
	}

	/// Chooses a network for `purpose`.
	///
	/// High-bandwidth purposes first open a lease and wait up to the configured
	/// timeout for the grant; a missed grant is not an error, selection falls
	/// back to whatever the catalog offers. Fails when the policy accepts no
	/// network or rejects the preferred one.
	pub async fn select(&self, purpose: RequestPurpose) -> Result<Selection> {
		let mut granted = false;
		let lease = match self.rules.high_bandwidth_request(purpose) {
			Some(request) => {
				let lease = self.broker.request_high_bandwidth_network(request);
				granted = lease.await_granted(self.await_timeout).await;
				if !granted {
					warn!(
						target = "netlease.selector",
						%purpose,
						class = %request.class,
						timeout_ms = self.await_timeout.as_millis() as u64,
						"high-bandwidth network not granted in time"
					);
				}
				Some(lease)
			}
			None => None,
		};

		let Some(network) = self.rules.preferred_network(purpose) else {
			return Err(Error::NoSuitableNetwork { purpose });
		};

		if let Some(reason) = self.rules.check_network(purpose, &network).reason() {
			return Err(Error::NotAllowed {
				purpose,
				network: network.kind,
				reason: reason.to_string(),
			});
		}

		debug!(target = "netlease.selector", %purpose, %network, granted, "network selected");
		Ok(Selection { network, granted, lease })
	}
}
