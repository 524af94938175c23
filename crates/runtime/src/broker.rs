//! The lease broker: coalescing, hysteresis, and teardown scheduling.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use netlease_protocol::{HighBandwidthRequest, NetworkKind, RequestClass};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, trace};

use crate::acquirer::NetworkAcquirer;
use crate::config::BrokerConfig;
use crate::lease::ConnectionLease;
use crate::state::{BrokerState, PendingTeardown, Released, SharedLease};

/// Shares expensive network acquisitions between concurrent callers.
///
/// Requests of the same [`RequestClass`] share one underlying
/// [`LeaseHandle`](crate::LeaseHandle) for as long as any
/// [`ConnectionLease`] for that class is open. When the last one closes, the
/// handle is kept for [`BrokerConfig::grace_delay`] so a quick follow-up
/// request reuses it instead of toggling the radio.
///
/// Cloning is cheap; clones share state.
#[derive(Clone)]
pub struct LeaseBroker {
	inner: Arc<BrokerInner>,
}

pub(crate) struct BrokerInner {
	acquirer: Arc<dyn NetworkAcquirer>,
	config: BrokerConfig,
	state: Mutex<BrokerState>,
	runtime: Handle,
	next_teardown: AtomicU64,
	pinned: watch::Sender<BTreeSet<NetworkKind>>,
}

/// Point-in-time view of one class, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSnapshot {
	pub class: RequestClass,
	pub count: usize,
	pub held: bool,
	pub teardown_pending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokerSnapshot {
	pub classes: Vec<ClassSnapshot>,
}

impl BrokerSnapshot {
	pub fn class(&self, class: RequestClass) -> ClassSnapshot {
		self.classes[class.index()]
	}
}

impl LeaseBroker {
	/// Creates a broker that schedules teardowns on the current tokio runtime.
	///
	/// # Panics
	///
	/// Panics when called outside a tokio runtime.
	pub fn new(acquirer: Arc<dyn NetworkAcquirer>, config: BrokerConfig) -> Self {
		Self::with_runtime(acquirer, config, Handle::current())
	}

	pub fn with_runtime(acquirer: Arc<dyn NetworkAcquirer>, config: BrokerConfig, runtime: Handle) -> Self {
		let (pinned, _) = watch::channel(BTreeSet::new());
		Self {
			inner: Arc::new(BrokerInner {
				acquirer,
				config,
				state: Mutex::new(BrokerState::new()),
				runtime,
				next_teardown: AtomicU64::new(1),
				pinned,
			}),
		}
	}

	pub fn config(&self) -> &BrokerConfig {
		&self.inner.config
	}

	/// Opens a lease on a network satisfying `request.class`.
	///
	/// Issues a platform acquisition only when no lease is held for the class;
	/// otherwise joins the existing one, cancelling a pending teardown if the
	/// class was idle. Never blocks on the platform.
	pub fn request_high_bandwidth_network(&self, request: HighBandwidthRequest) -> ConnectionLease {
		let lease = self.inner.acquire(request);
		ConnectionLease::new(request, lease, Arc::clone(&self.inner))
	}

	/// Kinds of network currently granted to any held lease.
	pub fn pinned_networks(&self) -> watch::Receiver<BTreeSet<NetworkKind>> {
		self.inner.pinned.subscribe()
	}

	pub fn snapshot(&self) -> BrokerSnapshot {
		let state = self.inner.state.lock();
		BrokerSnapshot {
			classes: RequestClass::ALL
				.into_iter()
				.map(|class| {
					let slot = state.slot(class);
					ClassSnapshot {
						class,
						count: slot.count(),
						held: slot.lease().is_some(),
						teardown_pending: slot.teardown_pending(),
					}
				})
				.collect(),
		}
	}
}

impl fmt::Debug for LeaseBroker {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LeaseBroker")
			.field("config", &self.inner.config)
			.field("snapshot", &self.snapshot())
			.finish()
	}
}

impl BrokerInner {
	fn acquire(self: &Arc<Self>, request: HighBandwidthRequest) -> SharedLease {
		let class = request.class;
		let mut state = self.state.lock();
		let acquired = state.acquire(class, || self.acquirer.acquire(&request));

		if acquired.fresh {
			info!(target = "netlease.broker", %class, purpose = %request.purpose, "acquiring network");
			let watcher = self.runtime.spawn(watch_grants(Arc::downgrade(self), Arc::clone(&acquired.lease)));
			state.set_watcher(class, watcher.abort_handle());
		} else {
			debug!(
				target = "netlease.broker",
				%class,
				purpose = %request.purpose,
				count = acquired.count,
				revived = acquired.revived,
				"joining held network lease"
			);
		}

		acquired.lease
	}

	pub(crate) fn release(self: &Arc<Self>, class: RequestClass) {
		let mut state = self.state.lock();
		match state.release(class) {
			Released::Held { remaining } => {
				debug!(target = "netlease.broker", %class, remaining, "lease closed");
			}
			Released::Idle => {
				let id = self.next_teardown.fetch_add(1, Ordering::Relaxed);
				let delay = self.config.grace_delay;
				let broker = Arc::downgrade(self);
				// Spawned under the lock so the task cannot observe the slot before it is armed.
				let task = self.runtime.spawn(async move {
					tokio::time::sleep(delay).await;
					if let Some(broker) = broker.upgrade() {
						broker.fire_teardown(class, id);
					}
				});
				state.arm_teardown(class, PendingTeardown::new(id, Some(task.abort_handle())));
				debug!(
					target = "netlease.broker",
					%class,
					teardown = id,
					grace_ms = delay.as_millis() as u64,
					"last lease closed; scheduling release"
				);
			}
		}
	}

	fn fire_teardown(&self, class: RequestClass, id: u64) {
		let lease = {
			let mut state = self.state.lock();
			let Some(lease) = state.complete_teardown(class, id) else {
				trace!(target = "netlease.broker", %class, teardown = id, "stale teardown ignored");
				return;
			};
			self.publish_pinned(&state);
			lease
		};

		lease.close();
		info!(target = "netlease.broker", %class, teardown = id, "network released");
	}

	fn refresh_pinned(&self) {
		let state = self.state.lock();
		self.publish_pinned(&state);
	}

	fn publish_pinned(&self, state: &BrokerState) {
		let pinned: BTreeSet<NetworkKind> = state
			.held()
			.filter_map(|(_, lease)| lease.granted().borrow().as_ref().map(|network| network.kind))
			.collect();

		self.pinned.send_if_modified(|current| {
			if *current == pinned {
				false
			} else {
				*current = pinned;
				true
			}
		});
	}
}

impl Drop for BrokerInner {
	fn drop(&mut self) {
		let leases = self.state.get_mut().drain();
		for lease in leases {
			lease.close();
		}
	}
}

/// Mirrors one lease's grant transitions into the pinned set until the
/// platform drops the grant channel or the lease is torn down.
async fn watch_grants(broker: Weak<BrokerInner>, lease: SharedLease) {
	let mut granted = lease.granted();
	drop(lease);

	loop {
		let Some(inner) = broker.upgrade() else {
			return;
		};
		inner.refresh_pinned();
		drop(inner);

		if granted.changed().await.is_err() {
			return;
		}
	}
}
