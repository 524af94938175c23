//! Network selection for devices with scarce, revocable radios.
//!
//! Two halves work together:
//! - the [policy engine](policy) decides, per [`RequestPurpose`], whether a
//!   request needs a high-bandwidth network, which network it should prefer,
//!   and whether a given network is acceptable;
//! - the [`LeaseBroker`] (from `netlease-runtime`) shares and keeps alive the
//!   underlying network acquisitions.
//!
//! [`RulesEngine`] binds a policy to a live [`NetworkCatalog`], and
//! [`NetworkSelector`] strings everything into the usual caller flow:
//! escalate if needed, wait for the grant, pick a network, validate it.

pub mod catalog;
pub mod config;
pub mod error;
pub mod policy;
pub mod rules;
pub mod selector;

pub use catalog::{NetworkCatalog, WatchCatalog};
pub use config::NetleaseConfig;
pub use error::{Error, Result};
pub use netlease_protocol::{
	CatalogSnapshot, HighBandwidthRequest, NetworkEntry, NetworkId, NetworkKind, NetworkRef, NetworkStatus, PolicyDecision, RequestClass, RequestPurpose,
};
pub use netlease_runtime::{BrokerConfig, ConnectionLease, LeaseBroker, LeaseHandle, NetworkAcquirer, PlatformLease};
pub use policy::{Conservative, Lenient, NetworkingPolicy, PolicyKind};
pub use rules::RulesEngine;
pub use selector::{NetworkSelector, Selection};
