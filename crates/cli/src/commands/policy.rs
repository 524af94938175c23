use std::sync::Arc;

use netlease::{CatalogSnapshot, NetleaseConfig, NetworkKind, NetworkRef, PolicyDecision, PolicyKind, RequestClass, RequestPurpose, RulesEngine};
use serde::Serialize;

use crate::error::{CliError, Result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
	pub policy: PolicyKind,
	pub purpose: RequestPurpose,
	pub network: NetworkKind,
	pub high_bandwidth: bool,
	pub decision: PolicyDecision,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferReport {
	pub policy: PolicyKind,
	pub purpose: RequestPurpose,
	pub high_bandwidth: bool,
	/// Class the broker would be asked for; absent for low-bandwidth purposes.
	pub request_class: Option<RequestClass>,
	pub active: NetworkKind,
	pub preferred: Option<NetworkRef>,
	pub decision: Option<PolicyDecision>,
}

/// One synthetic network per listed kind, numbered from 1.
fn catalog_of(kinds: &[NetworkKind]) -> CatalogSnapshot {
	CatalogSnapshot::from_available(
		kinds
			.iter()
			.enumerate()
			.map(|(idx, kind)| NetworkRef::new(idx as u64 + 1, *kind, format!("{}-{}", kind.as_str(), idx + 1))),
	)
}

pub fn check(config: &NetleaseConfig, purpose: RequestPurpose, network: NetworkKind) -> CheckReport {
	let rules = RulesEngine::new(Arc::new(catalog_of(&[network])), config.policy.build());

	CheckReport {
		policy: config.policy,
		purpose,
		network,
		high_bandwidth: rules.is_high_bandwidth_request(purpose),
		decision: rules.check_valid_request(purpose),
	}
}

pub fn prefer(config: &NetleaseConfig, purpose: RequestPurpose, networks: &[NetworkKind]) -> Result<PreferReport> {
	let Some(active) = networks.first().copied() else {
		return Err(CliError::InvalidInput("at least one network is required".to_string()));
	};

	let rules = RulesEngine::new(Arc::new(catalog_of(networks)), config.policy.build());
	let preferred = rules.preferred_network(purpose);
	let decision = preferred.as_ref().map(|network| rules.check_network(purpose, network));

	Ok(PreferReport {
		policy: config.policy,
		purpose,
		high_bandwidth: rules.is_high_bandwidth_request(purpose),
		request_class: rules.high_bandwidth_request(purpose).map(|request| request.class),
		active,
		preferred,
		decision,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn config(policy: PolicyKind) -> NetleaseConfig {
		NetleaseConfig {
			policy,
			..NetleaseConfig::default()
		}
	}

	#[test]
	fn check_uses_the_given_network_as_active() {
		let report = check(&config(PolicyKind::Conservative), RequestPurpose::MediaDownload, NetworkKind::Cellular);
		assert!(report.high_bandwidth);
		assert_eq!(report.decision.reason(), Some("downloads only possible over Wi-Fi"));

		let report = check(&config(PolicyKind::Lenient), RequestPurpose::MediaDownload, NetworkKind::Cellular);
		assert!(report.decision.is_allowed());
	}

	#[test]
	fn prefer_reports_class_and_choice() {
		let report = prefer(
			&config(PolicyKind::Conservative),
			RequestPurpose::MediaDownload,
			&[NetworkKind::Cellular, NetworkKind::Wifi],
		)
		.unwrap();
		assert_eq!(report.active, NetworkKind::Cellular);
		assert_eq!(report.request_class, Some(RequestClass::WifiOnly));
		assert_eq!(report.preferred.map(|network| network.kind), Some(NetworkKind::Wifi));
		assert_eq!(report.decision, Some(PolicyDecision::Allow));
	}

	#[test]
	fn prefer_without_acceptable_network_is_empty() {
		let report = prefer(&config(PolicyKind::Conservative), RequestPurpose::MediaDownload, &[NetworkKind::Cellular]).unwrap();
		assert!(report.preferred.is_none());
		assert!(report.decision.is_none());
	}

	#[test]
	fn prefer_rejects_empty_network_list() {
		let err = prefer(&config(PolicyKind::Lenient), RequestPurpose::Image, &[]).unwrap_err();
		assert!(matches!(err, CliError::InvalidInput(_)));
	}
}
