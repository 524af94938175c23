//! High-bandwidth network lease broker.
//!
//! Many independent callers (image loads, media streaming, downloads,
//! telemetry) intermittently need a non-default radio connection that the
//! platform may grant, delay, or revoke at any time. [`LeaseBroker`]
//! coalesces concurrent requests of the same [`RequestClass`] into one
//! underlying acquisition, keeps it alive for a grace period after the last
//! caller lets go, and hands out [`ConnectionLease`]s that callers await and
//! close.
//!
//! The platform side is reached through two seams: [`NetworkAcquirer`]
//! issues requests, and each returned [`LeaseHandle`] reports the grant and
//! relinquishes the request when closed.
//!
//! [`RequestClass`]: netlease_protocol::RequestClass

pub mod acquirer;
pub mod broker;
pub mod config;
pub mod fake;
pub mod lease;
pub mod state;

pub use acquirer::{LeaseHandle, NetworkAcquirer, PlatformLease};
pub use broker::{BrokerSnapshot, ClassSnapshot, LeaseBroker};
pub use config::{BrokerConfig, DEFAULT_GRACE_DELAY};
pub use lease::ConnectionLease;
