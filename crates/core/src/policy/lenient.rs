use netlease_protocol::{CatalogSnapshot, NetworkKind, NetworkRef, PolicyDecision, RequestPurpose};

use super::NetworkingPolicy;

/// Allows everything; prefers Wi-Fi, otherwise whatever is up first.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lenient;

impl NetworkingPolicy for Lenient {
	fn name(&self) -> &'static str {
		"lenient"
	}

	fn is_high_bandwidth_request(&self, purpose: RequestPurpose) -> bool {
		purpose.is_media()
	}

	fn check_valid_request(&self, _purpose: RequestPurpose, _current: NetworkKind) -> PolicyDecision {
		PolicyDecision::Allow
	}

	fn preferred_network(&self, catalog: &CatalogSnapshot, _purpose: RequestPurpose) -> Option<NetworkRef> {
		catalog.first_usable_of(NetworkKind::Wifi).or_else(|| catalog.first_usable()).cloned()
	}
}
