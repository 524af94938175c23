//! Outcome of validating a request against a network.

use serde::{Deserialize, Serialize};

/// Result of a policy check. `Fail` is an ordinary value, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum PolicyDecision {
	Allow,
	Fail { reason: String },
}

impl PolicyDecision {
	pub fn fail(reason: impl Into<String>) -> Self {
		PolicyDecision::Fail { reason: reason.into() }
	}

	pub fn is_allowed(&self) -> bool {
		matches!(self, PolicyDecision::Allow)
	}

	pub fn reason(&self) -> Option<&str> {
		match self {
			PolicyDecision::Allow => None,
			PolicyDecision::Fail { reason } => Some(reason),
		}
	}
}
