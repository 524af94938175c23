//! In-memory [`NetworkAcquirer`] for tests and simulation.
//!
//! Stands in for the platform connectivity service: every acquisition
//! produces a [`PlatformLease`] whose grant follows the configured
//! [`GrantBehavior`], and the acquirer counts acquisitions and closes so
//! tests can assert on coalescing and teardown.
//!
//! # Example
//!
//! ```ignore
//! let acquirer = FakeAcquirer::new(GrantBehavior::After(Duration::from_millis(200), wifi));
//! let broker = LeaseBroker::new(Arc::new(acquirer.clone()), BrokerConfig::default());
//!
//! let lease = broker.request_high_bandwidth_network(request);
//! assert!(lease.await_granted(Duration::from_secs(1)).await);
//! assert_eq!(acquirer.acquisitions(), 1);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use netlease_protocol::{HighBandwidthRequest, NetworkRef};
use parking_lot::Mutex;
use tracing::debug;

use crate::acquirer::{LeaseHandle, NetworkAcquirer, PlatformLease};

/// How the fake platform answers an acquisition.
#[derive(Debug, Clone)]
pub enum GrantBehavior {
	Immediately(NetworkRef),
	After(Duration, NetworkRef),
	/// The platform never grants (refused or unavailable).
	Never,
}

/// Cloneable fake acquirer; clones share counters and issued leases.
#[derive(Clone)]
pub struct FakeAcquirer {
	inner: Arc<FakeInner>,
}

struct FakeInner {
	behavior: GrantBehavior,
	acquisitions: AtomicUsize,
	closes: Arc<AtomicUsize>,
	issued: Mutex<Vec<(HighBandwidthRequest, Arc<PlatformLease>)>>,
}

impl FakeAcquirer {
	pub fn new(behavior: GrantBehavior) -> Self {
		Self {
			inner: Arc::new(FakeInner {
				behavior,
				acquisitions: AtomicUsize::new(0),
				closes: Arc::new(AtomicUsize::new(0)),
				issued: Mutex::new(Vec::new()),
			}),
		}
	}

	pub fn acquisitions(&self) -> usize {
		self.inner.acquisitions.load(Ordering::SeqCst)
	}

	/// Number of underlying leases closed so far.
	pub fn closes(&self) -> usize {
		self.inner.closes.load(Ordering::SeqCst)
	}

	/// Every lease issued so far, in acquisition order.
	pub fn issued(&self) -> Vec<(HighBandwidthRequest, Arc<PlatformLease>)> {
		self.inner.issued.lock().clone()
	}

	pub fn last_lease(&self) -> Option<Arc<PlatformLease>> {
		self.inner.issued.lock().last().map(|(_, lease)| Arc::clone(lease))
	}

	/// Grants `network` to every open lease.
	pub fn grant_all(&self, network: NetworkRef) {
		for (_, lease) in self.inner.issued.lock().iter() {
			if !lease.is_closed() {
				lease.grant(network.clone());
			}
		}
	}

	/// Revokes the grant on every lease.
	pub fn revoke_all(&self) {
		for (_, lease) in self.inner.issued.lock().iter() {
			lease.revoke();
		}
	}
}

impl NetworkAcquirer for FakeAcquirer {
	fn acquire(&self, request: &HighBandwidthRequest) -> Arc<dyn LeaseHandle> {
		self.inner.acquisitions.fetch_add(1, Ordering::SeqCst);

		let closes = Arc::clone(&self.inner.closes);
		let lease = Arc::new(PlatformLease::new(move || {
			closes.fetch_add(1, Ordering::SeqCst);
		}));

		match self.inner.behavior.clone() {
			// The platform only grants networks the request class allows.
			GrantBehavior::Immediately(network) | GrantBehavior::After(_, network) if !request.class.admits(network.kind) => {
				debug!(target = "netlease.broker", class = %request.class, network = %network, "fake platform refuses mismatched network");
			}
			GrantBehavior::Immediately(network) => lease.grant(network),
			GrantBehavior::After(delay, network) => {
				let pending = Arc::downgrade(&lease);
				tokio::spawn(async move {
					tokio::time::sleep(delay).await;
					if let Some(lease) = pending.upgrade() {
						if !lease.is_closed() {
							lease.grant(network);
						}
					}
				});
			}
			GrantBehavior::Never => {}
		}

		self.inner.issued.lock().push((*request, Arc::clone(&lease)));
		lease
	}
}
