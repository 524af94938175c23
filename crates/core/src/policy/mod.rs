//! Pure, side-effect-free network policies.
//!
//! A [`NetworkingPolicy`] answers three questions about a request purpose:
//! does it need a high-bandwidth network, is a given network acceptable for
//! it, and which network in the catalog should it prefer. Policies hold no
//! state and perform no I/O, so one instance is shared freely across threads.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use netlease_protocol::{CatalogSnapshot, NetworkKind, NetworkRef, PolicyDecision, RequestClass, RequestPurpose};
use serde::{Deserialize, Serialize};

mod conservative;
mod lenient;

pub use conservative::Conservative;
pub use lenient::Lenient;

pub trait NetworkingPolicy: Send + Sync + fmt::Debug {
	fn name(&self) -> &'static str;

	/// Whether requests for `purpose` should be escalated to the lease broker.
	fn is_high_bandwidth_request(&self, purpose: RequestPurpose) -> bool;

	/// Whether `purpose` may proceed on a network of kind `current`.
	fn check_valid_request(&self, purpose: RequestPurpose, current: NetworkKind) -> PolicyDecision;

	/// The network `purpose` should bind to, if any is acceptable.
	fn preferred_network(&self, catalog: &CatalogSnapshot, purpose: RequestPurpose) -> Option<NetworkRef>;

	/// Request class used when escalating `purpose` to the broker.
	fn request_class(&self, _purpose: RequestPurpose) -> RequestClass {
		RequestClass::All
	}
}

/// Built-in policy variants, selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
	Lenient,
	#[default]
	Conservative,
}

impl PolicyKind {
	pub fn build(self) -> Arc<dyn NetworkingPolicy> {
		match self {
			PolicyKind::Lenient => Arc::new(Lenient),
			PolicyKind::Conservative => Arc::new(Conservative),
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			PolicyKind::Lenient => "lenient",
			PolicyKind::Conservative => "conservative",
		}
	}
}

impl FromStr for PolicyKind {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"lenient" => Ok(PolicyKind::Lenient),
			"conservative" => Ok(PolicyKind::Conservative),
			_ => Err(format!("unknown policy: {s}")),
		}
	}
}

impl fmt::Display for PolicyKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
