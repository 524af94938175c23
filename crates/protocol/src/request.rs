//! Request descriptors: why a caller wants a network and which kinds satisfy it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::network::NetworkKind;

/// Partition of high-bandwidth demand. Each class is reference counted independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestClass {
	/// Any high-bandwidth network.
	All,
	CellularOnly,
	WifiOnly,
}

impl RequestClass {
	/// Every class, in slot order.
	pub const ALL: [RequestClass; 3] = [RequestClass::All, RequestClass::CellularOnly, RequestClass::WifiOnly];

	/// Stable index of this class into per-class tables.
	pub const fn index(self) -> usize {
		match self {
			RequestClass::All => 0,
			RequestClass::CellularOnly => 1,
			RequestClass::WifiOnly => 2,
		}
	}

	/// Whether a network of `kind` satisfies this class.
	pub fn admits(self, kind: NetworkKind) -> bool {
		match self {
			RequestClass::All => matches!(kind, NetworkKind::Wifi | NetworkKind::Cellular),
			RequestClass::CellularOnly => kind == NetworkKind::Cellular,
			RequestClass::WifiOnly => kind == NetworkKind::Wifi,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			RequestClass::All => "all",
			RequestClass::CellularOnly => "cellularOnly",
			RequestClass::WifiOnly => "wifiOnly",
		}
	}
}

impl fmt::Display for RequestClass {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Caller-declared intent for a network request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestPurpose {
	Image,
	MediaStream,
	MediaDownload,
	Telemetry,
	Generic,
}

impl RequestPurpose {
	pub fn is_media(self) -> bool {
		matches!(self, RequestPurpose::MediaStream | RequestPurpose::MediaDownload)
	}

	pub fn as_str(self) -> &'static str {
		match self {
			RequestPurpose::Image => "image",
			RequestPurpose::MediaStream => "media-stream",
			RequestPurpose::MediaDownload => "media-download",
			RequestPurpose::Telemetry => "telemetry",
			RequestPurpose::Generic => "generic",
		}
	}
}

impl FromStr for RequestPurpose {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().replace('_', "-").as_str() {
			"image" => Ok(RequestPurpose::Image),
			"media-stream" | "stream" => Ok(RequestPurpose::MediaStream),
			"media-download" | "download" => Ok(RequestPurpose::MediaDownload),
			"telemetry" | "logs" => Ok(RequestPurpose::Telemetry),
			"generic" | "api" => Ok(RequestPurpose::Generic),
			_ => Err(format!("unknown request purpose: {s}")),
		}
	}
}

impl fmt::Display for RequestPurpose {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Descriptor handed to the platform when bringing up a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HighBandwidthRequest {
	pub class: RequestClass,
	pub purpose: RequestPurpose,
}

impl HighBandwidthRequest {
	pub fn new(class: RequestClass, purpose: RequestPurpose) -> Self {
		Self { class, purpose }
	}

	pub fn for_purpose(purpose: RequestPurpose) -> Self {
		Self::new(RequestClass::All, purpose)
	}

	pub fn wifi_only(purpose: RequestPurpose) -> Self {
		Self::new(RequestClass::WifiOnly, purpose)
	}

	pub fn cellular_only(purpose: RequestPurpose) -> Self {
		Self::new(RequestClass::CellularOnly, purpose)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn class_indices_are_dense() {
		let indices: Vec<usize> = RequestClass::ALL.iter().map(|class| class.index()).collect();
		assert_eq!(indices, vec![0, 1, 2]);
	}

	#[test]
	fn classes_admit_matching_kinds() {
		assert!(RequestClass::All.admits(NetworkKind::Wifi));
		assert!(RequestClass::All.admits(NetworkKind::Cellular));
		assert!(!RequestClass::All.admits(NetworkKind::Bluetooth));
		assert!(RequestClass::WifiOnly.admits(NetworkKind::Wifi));
		assert!(!RequestClass::WifiOnly.admits(NetworkKind::Cellular));
		assert!(RequestClass::CellularOnly.admits(NetworkKind::Cellular));
	}

	#[test]
	fn purpose_parses_cli_spellings() {
		assert_eq!("media_download".parse::<RequestPurpose>().unwrap(), RequestPurpose::MediaDownload);
		assert_eq!("stream".parse::<RequestPurpose>().unwrap(), RequestPurpose::MediaStream);
		assert!("video".parse::<RequestPurpose>().is_err());
		assert!(RequestPurpose::MediaStream.is_media());
		assert!(!RequestPurpose::Image.is_media());
	}

	#[test]
	fn purpose_serializes_kebab_case() {
		let json = serde_json::to_string(&HighBandwidthRequest::wifi_only(RequestPurpose::MediaDownload)).unwrap();
		assert_eq!(json, r#"{"class":"wifiOnly","purpose":"media-download"}"#);
	}
}
