use netlease_protocol::{CatalogSnapshot, NetworkKind, NetworkRef, PolicyDecision, RequestClass, RequestPurpose};

use super::NetworkingPolicy;

/// Keeps expensive media traffic off cellular.
///
/// Downloads wait for Wi-Fi. Streams may use Wi-Fi or the phone's Bluetooth
/// link but not cellular. Other purposes are allowed anywhere and prefer
/// Wi-Fi, then Bluetooth, then cellular.
#[derive(Debug, Clone, Copy, Default)]
pub struct Conservative;

impl NetworkingPolicy for Conservative {
	fn name(&self) -> &'static str {
		"conservative"
	}

	fn is_high_bandwidth_request(&self, purpose: RequestPurpose) -> bool {
		purpose.is_media()
	}

	fn check_valid_request(&self, purpose: RequestPurpose, current: NetworkKind) -> PolicyDecision {
		match purpose {
			RequestPurpose::MediaDownload if current != NetworkKind::Wifi => PolicyDecision::fail("downloads only possible over Wi-Fi"),
			RequestPurpose::MediaStream if current == NetworkKind::Cellular => PolicyDecision::fail("streaming only possible over Wi-Fi or Bluetooth"),
			_ => PolicyDecision::Allow,
		}
	}

	fn preferred_network(&self, catalog: &CatalogSnapshot, purpose: RequestPurpose) -> Option<NetworkRef> {
		if let Some(wifi) = catalog.first_usable_of(NetworkKind::Wifi) {
			return Some(wifi.clone());
		}

		let fallback = match purpose {
			RequestPurpose::MediaDownload => None,
			RequestPurpose::MediaStream => catalog.first_usable_of(NetworkKind::Bluetooth),
			_ => catalog
				.first_usable_of(NetworkKind::Bluetooth)
				.or_else(|| catalog.first_usable_of(NetworkKind::Cellular)),
		};
		fallback.cloned()
	}

	fn request_class(&self, purpose: RequestPurpose) -> RequestClass {
		match purpose {
			RequestPurpose::MediaDownload => RequestClass::WifiOnly,
			_ => RequestClass::All,
		}
	}
}
