//! Networks as reported by the platform catalog.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque platform identifier for a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkId(pub u64);

impl fmt::Display for NetworkId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "net#{}", self.0)
	}
}

/// Transport behind a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkKind {
	Wifi,
	Cellular,
	/// Bluetooth link tethered through the paired phone.
	Bluetooth,
	Unknown,
}

impl NetworkKind {
	pub fn as_str(self) -> &'static str {
		match self {
			NetworkKind::Wifi => "wifi",
			NetworkKind::Cellular => "cellular",
			NetworkKind::Bluetooth => "bluetooth",
			NetworkKind::Unknown => "unknown",
		}
	}
}

impl FromStr for NetworkKind {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"wifi" | "wi-fi" => Ok(NetworkKind::Wifi),
			"cellular" | "cell" => Ok(NetworkKind::Cellular),
			"bluetooth" | "bt" => Ok(NetworkKind::Bluetooth),
			"unknown" => Ok(NetworkKind::Unknown),
			_ => Err(format!("unknown network kind: {s}")),
		}
	}
}

impl fmt::Display for NetworkKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Live status of a network in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkStatus {
	Available,
	/// The platform expects to drop this network soon.
	Losing,
	Lost,
	#[default]
	Unknown,
}

impl NetworkStatus {
	/// Whether a network in this state may still be selected.
	pub fn is_usable(self) -> bool {
		!matches!(self, NetworkStatus::Lost)
	}
}

/// Reference to one platform network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkRef {
	pub id: NetworkId,
	pub kind: NetworkKind,
	#[serde(default)]
	pub name: String,
}

impl NetworkRef {
	pub fn new(id: u64, kind: NetworkKind, name: impl Into<String>) -> Self {
		Self {
			id: NetworkId(id),
			kind,
			name: name.into(),
		}
	}
}

impl fmt::Display for NetworkRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.name.is_empty() {
			write!(f, "{} ({})", self.kind, self.id)
		} else {
			write!(f, "{} ({}, {})", self.name, self.kind, self.id)
		}
	}
}

/// A catalog row: a network and its live status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkEntry {
	pub network: NetworkRef,
	#[serde(default)]
	pub status: NetworkStatus,
}

impl NetworkEntry {
	pub fn available(network: NetworkRef) -> Self {
		Self {
			network,
			status: NetworkStatus::Available,
		}
	}
}

/// Point-in-time view of every network the platform knows about.
///
/// Entries keep the platform's ordering; "first" in policy rules means first
/// in this list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
	#[serde(default)]
	pub active: Option<NetworkId>,
	#[serde(default)]
	pub networks: Vec<NetworkEntry>,
}

impl CatalogSnapshot {
	pub fn new(active: Option<NetworkId>, networks: Vec<NetworkEntry>) -> Self {
		Self { active, networks }
	}

	/// Builds a snapshot where every network is available and the first one is active.
	pub fn from_available(networks: impl IntoIterator<Item = NetworkRef>) -> Self {
		let networks: Vec<NetworkEntry> = networks.into_iter().map(NetworkEntry::available).collect();
		let active = networks.first().map(|entry| entry.network.id);
		Self { active, networks }
	}

	/// The entry the platform currently routes default traffic through.
	pub fn active_network(&self) -> Option<&NetworkEntry> {
		let active = self.active?;
		self.networks.iter().find(|entry| entry.network.id == active)
	}

	/// Networks that have not been lost, in catalog order.
	pub fn usable(&self) -> impl Iterator<Item = &NetworkRef> {
		self.networks.iter().filter(|entry| entry.status.is_usable()).map(|entry| &entry.network)
	}

	pub fn first_usable(&self) -> Option<&NetworkRef> {
		self.usable().next()
	}

	pub fn first_usable_of(&self, kind: NetworkKind) -> Option<&NetworkRef> {
		self.usable().find(|network| network.kind == kind)
	}
}
