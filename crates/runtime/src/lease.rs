//! Caller-facing lease handles.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use netlease_protocol::{HighBandwidthRequest, NetworkRef, RequestClass};
use tokio::time::Instant;
use tracing::trace;

use crate::broker::BrokerInner;
use crate::state::SharedLease;

/// One caller's share of an underlying network lease.
///
/// Minted by [`LeaseBroker::request_high_bandwidth_network`]. Closing it
/// (explicitly or by dropping it) releases this caller's reference; the
/// underlying lease outlives it while other callers hold theirs, and for a
/// grace period afterwards.
///
/// [`LeaseBroker::request_high_bandwidth_network`]: crate::LeaseBroker::request_high_bandwidth_network
pub struct ConnectionLease {
	request: HighBandwidthRequest,
	lease: SharedLease,
	broker: Arc<BrokerInner>,
	closed: AtomicBool,
}

impl ConnectionLease {
	pub(crate) fn new(request: HighBandwidthRequest, lease: SharedLease, broker: Arc<BrokerInner>) -> Self {
		Self {
			request,
			lease,
			broker,
			closed: AtomicBool::new(false),
		}
	}

	pub fn class(&self) -> RequestClass {
		self.request.class
	}

	pub fn request(&self) -> HighBandwidthRequest {
		self.request
	}

	/// When the shared underlying lease was acquired.
	pub fn acquired_at(&self) -> Instant {
		self.lease.acquired_at()
	}

	/// Waits until the platform grants a network, up to `timeout` measured
	/// from when the underlying lease was acquired, not from this call.
	///
	/// A caller joining a lease that has been pending for a while gets a
	/// correspondingly shorter wait; past the deadline this returns `false`
	/// without waiting. A `true` result only reports that a grant happened;
	/// the platform may revoke it afterwards.
	pub async fn await_granted(&self, timeout: Duration) -> bool {
		let mut granted = self.lease.granted();
		let grant = granted.wait_for(|network| network.is_some());

		// A timeout too large to express as a deadline waits without one.
		let outcome = match self.lease.acquired_at().checked_add(timeout) {
			Some(deadline) => {
				if Instant::now() >= deadline {
					trace!(target = "netlease.broker", class = %self.request.class, "grant deadline already passed");
					return false;
				}
				match tokio::time::timeout_at(deadline, grant).await {
					Ok(result) => result.map(drop),
					Err(_) => return false,
				}
			}
			None => grant.await.map(drop),
		};

		// Err: grant channel dropped by the platform, so the request will never be granted.
		outcome.is_ok()
	}

	/// Network currently granted to the underlying lease, if any.
	pub fn granted_network(&self) -> Option<NetworkRef> {
		self.lease.granted().borrow().clone()
	}

	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::Acquire)
	}

	/// Releases this caller's reference. Later calls are no-ops.
	pub fn close(&self) {
		if self.closed.swap(true, Ordering::AcqRel) {
			return;
		}
		self.broker.release(self.request.class);
	}
}

impl Drop for ConnectionLease {
	fn drop(&mut self) {
		self.close();
	}
}

impl fmt::Debug for ConnectionLease {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ConnectionLease")
			.field("request", &self.request)
			.field("granted", &self.granted_network())
			.field("closed", &self.is_closed())
			.finish()
	}
}
