//! Binds a policy to the live catalog.

use std::fmt;
use std::sync::Arc;

use netlease_protocol::{HighBandwidthRequest, NetworkKind, NetworkRef, PolicyDecision, RequestPurpose};
use tracing::debug;

use crate::catalog::NetworkCatalog;
use crate::policy::NetworkingPolicy;

/// Answers policy questions against the catalog's current state.
///
/// Holds no mutable state: every call reads a fresh snapshot and delegates to
/// the configured policy.
#[derive(Clone)]
pub struct RulesEngine {
	catalog: Arc<dyn NetworkCatalog>,
	policy: Arc<dyn NetworkingPolicy>,
}

impl RulesEngine {
	pub fn new(catalog: Arc<dyn NetworkCatalog>, policy: Arc<dyn NetworkingPolicy>) -> Self {
		Self { catalog, policy }
	}

	pub fn policy(&self) -> &Arc<dyn NetworkingPolicy> {
		&self.policy
	}

	pub fn is_high_bandwidth_request(&self, purpose: RequestPurpose) -> bool {
		self.policy.is_high_bandwidth_request(purpose)
	}

	/// The broker request for `purpose`, or `None` when it does not need one.
	pub fn high_bandwidth_request(&self, purpose: RequestPurpose) -> Option<HighBandwidthRequest> {
		if !self.policy.is_high_bandwidth_request(purpose) {
			return None;
		}
		Some(HighBandwidthRequest::new(self.policy.request_class(purpose), purpose))
	}

	/// Validates `purpose` against the active network. No active network
	/// counts as [`NetworkKind::Unknown`].
	pub fn check_valid_request(&self, purpose: RequestPurpose) -> PolicyDecision {
		let current = self
			.catalog
			.snapshot()
			.active_network()
			.map_or(NetworkKind::Unknown, |entry| entry.network.kind);
		self.decide(purpose, current)
	}

	pub fn check_network(&self, purpose: RequestPurpose, network: &NetworkRef) -> PolicyDecision {
		self.decide(purpose, network.kind)
	}

	pub fn preferred_network(&self, purpose: RequestPurpose) -> Option<NetworkRef> {
		let preferred = self.policy.preferred_network(&self.catalog.snapshot(), purpose);
		debug!(
			target = "netlease.policy",
			policy = self.policy.name(),
			%purpose,
			preferred = ?preferred.as_ref().map(|network| network.kind),
			"preferred network"
		);
		preferred
	}

	fn decide(&self, purpose: RequestPurpose, current: NetworkKind) -> PolicyDecision {
		let decision = self.policy.check_valid_request(purpose, current);
		if let PolicyDecision::Fail { reason } = &decision {
			debug!(target = "netlease.policy", policy = self.policy.name(), %purpose, network = %current, %reason, "request rejected");
		}
		decision
	}
}

impl fmt::Debug for RulesEngine {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RulesEngine").field("policy", &self.policy).finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use netlease_protocol::{CatalogSnapshot, NetworkId, RequestClass};

	use super::*;
	use crate::catalog::WatchCatalog;
	use crate::policy::{Conservative, Lenient};

	fn engine(catalog: Arc<WatchCatalog>) -> RulesEngine {
		RulesEngine::new(catalog, Arc::new(Conservative))
	}

	fn cell_then_wifi() -> CatalogSnapshot {
		CatalogSnapshot::from_available([NetworkRef::new(1, NetworkKind::Cellular, "lte"), NetworkRef::new(2, NetworkKind::Wifi, "home")])
	}

	#[test]
	fn validates_against_active_network() {
		let catalog = Arc::new(WatchCatalog::new(cell_then_wifi()));
		let rules = engine(Arc::clone(&catalog));
		assert!(!rules.check_valid_request(RequestPurpose::MediaDownload).is_allowed());

		let mut snapshot = cell_then_wifi();
		snapshot.active = Some(NetworkId(2));
		catalog.publish(snapshot);
		assert!(rules.check_valid_request(RequestPurpose::MediaDownload).is_allowed());
	}

	#[test]
	fn missing_active_network_is_unknown() {
		let rules = RulesEngine::new(Arc::new(CatalogSnapshot::default()), Arc::new(Conservative));
		assert!(!rules.check_valid_request(RequestPurpose::MediaDownload).is_allowed());
		assert!(rules.check_valid_request(RequestPurpose::MediaStream).is_allowed());
	}

	#[test]
	fn high_bandwidth_request_uses_policy_class() {
		let rules = engine(Arc::new(WatchCatalog::default()));
		assert_eq!(
			rules.high_bandwidth_request(RequestPurpose::MediaDownload),
			Some(HighBandwidthRequest::new(RequestClass::WifiOnly, RequestPurpose::MediaDownload))
		);
		assert_eq!(rules.high_bandwidth_request(RequestPurpose::Image), None);

		let lenient = RulesEngine::new(Arc::new(CatalogSnapshot::default()), Arc::new(Lenient));
		assert_eq!(
			lenient.high_bandwidth_request(RequestPurpose::MediaDownload).map(|request| request.class),
			Some(RequestClass::All)
		);
	}

	#[test]
	fn preference_tracks_catalog_changes() {
		let catalog = Arc::new(WatchCatalog::new(CatalogSnapshot::from_available([NetworkRef::new(1, NetworkKind::Cellular, "lte")])));
		let rules = engine(Arc::clone(&catalog));
		assert!(rules.preferred_network(RequestPurpose::MediaStream).is_none());

		catalog.publish(cell_then_wifi());
		assert_eq!(rules.preferred_network(RequestPurpose::MediaStream).map(|n| n.id), Some(NetworkId(2)));
	}
}
