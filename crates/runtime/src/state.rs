//! Per-class reference counts and the transitions that mutate them.
//!
//! Everything here is synchronous and lock-free by itself; [`LeaseBroker`]
//! owns one [`BrokerState`] behind a mutex and runs each transition as a
//! single critical section. Keeping the transitions pure makes the
//! invariants testable without a runtime.
//!
//! Invariants, per class:
//! * `count > 0` implies a lease is held and no teardown is pending
//! * a held lease with `count == 0` implies exactly one pending teardown
//! * no lease implies `count == 0` and no pending teardown
//!
//! [`LeaseBroker`]: crate::LeaseBroker

use std::sync::Arc;

use netlease_protocol::RequestClass;
use tokio::task::AbortHandle;

use crate::acquirer::LeaseHandle;

pub type SharedLease = Arc<dyn LeaseHandle>;

/// A scheduled, cancellable release of an idle lease.
pub struct PendingTeardown {
	id: u64,
	task: Option<AbortHandle>,
}

impl PendingTeardown {
	pub fn new(id: u64, task: Option<AbortHandle>) -> Self {
		Self { id, task }
	}

	pub fn id(&self) -> u64 {
		self.id
	}

	fn cancel(self) {
		if let Some(task) = self.task {
			task.abort();
		}
	}
}

/// Mutable bookkeeping for one [`RequestClass`].
#[derive(Default)]
pub struct CountAndLease {
	count: usize,
	lease: Option<SharedLease>,
	teardown: Option<PendingTeardown>,
	watcher: Option<AbortHandle>,
}

impl CountAndLease {
	pub fn count(&self) -> usize {
		self.count
	}

	pub fn lease(&self) -> Option<&SharedLease> {
		self.lease.as_ref()
	}

	pub fn teardown_pending(&self) -> bool {
		self.teardown.is_some()
	}

	fn stop_watcher(&mut self) {
		if let Some(watcher) = self.watcher.take() {
			watcher.abort();
		}
	}
}

/// Result of an acquire transition.
pub struct Acquired {
	pub lease: SharedLease,
	/// The acquirer was called; no lease was held for the class.
	pub fresh: bool,
	/// A pending teardown was cancelled to reuse the lease.
	pub revived: bool,
	pub count: usize,
}

/// Result of a release transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Released {
	Held { remaining: usize },
	/// Count reached zero; the caller must arm a teardown.
	Idle,
}

pub struct BrokerState {
	slots: [CountAndLease; 3],
}

impl Default for BrokerState {
	fn default() -> Self {
		Self::new()
	}
}

impl BrokerState {
	pub fn new() -> Self {
		Self {
			slots: Default::default(),
		}
	}

	pub fn slot(&self, class: RequestClass) -> &CountAndLease {
		&self.slots[class.index()]
	}

	fn slot_mut(&mut self, class: RequestClass) -> &mut CountAndLease {
		&mut self.slots[class.index()]
	}

	/// Cancels any pending teardown, reuses or creates the lease, and bumps the count.
	pub fn acquire(&mut self, class: RequestClass, acquire: impl FnOnce() -> SharedLease) -> Acquired {
		let slot = self.slot_mut(class);

		let revived = match slot.teardown.take() {
			Some(pending) => {
				pending.cancel();
				true
			}
			None => false,
		};

		let (lease, fresh) = match &slot.lease {
			Some(lease) => (Arc::clone(lease), false),
			None => {
				debug_assert_eq!(slot.count, 0, "{class}: count without a lease");
				let lease = acquire();
				slot.lease = Some(Arc::clone(&lease));
				(lease, true)
			}
		};

		slot.count += 1;
		let count = slot.count;
		self.debug_check();

		Acquired { lease, fresh, revived, count }
	}

	/// Drops one reference. Panics if the class has no outstanding references.
	pub fn release(&mut self, class: RequestClass) -> Released {
		let slot = self.slot_mut(class);
		assert!(slot.count > 0, "{class}: release without a matching acquire");
		assert!(slot.lease.is_some(), "{class}: release with no underlying lease");

		slot.count -= 1;
		let released = if slot.count == 0 {
			Released::Idle
		} else {
			Released::Held { remaining: slot.count }
		};
		// An idle slot is briefly without its teardown until the caller arms it.
		if released != Released::Idle {
			self.debug_check();
		}
		released
	}

	/// Records the teardown scheduled for an idle class.
	pub fn arm_teardown(&mut self, class: RequestClass, teardown: PendingTeardown) {
		let slot = self.slot_mut(class);
		assert_eq!(slot.count, 0, "{class}: teardown armed while references remain");
		assert!(slot.lease.is_some(), "{class}: teardown armed with no underlying lease");
		if let Some(previous) = slot.teardown.replace(teardown) {
			previous.cancel();
		}
		self.debug_check();
	}

	/// Runs a fired teardown. Returns the lease to close, or `None` when the
	/// teardown was cancelled or superseded before it got the lock.
	pub fn complete_teardown(&mut self, class: RequestClass, id: u64) -> Option<SharedLease> {
		let slot = self.slot_mut(class);
		if slot.teardown.as_ref().map(PendingTeardown::id) != Some(id) {
			return None;
		}
		slot.teardown = None;

		assert_eq!(slot.count, 0, "{class}: teardown fired while references remain");
		let Some(lease) = slot.lease.take() else {
			panic!("{class}: teardown fired with no underlying lease");
		};
		slot.stop_watcher();
		self.debug_check();

		Some(lease)
	}

	/// Attaches the task mirroring a lease's grant into the pinned set.
	pub fn set_watcher(&mut self, class: RequestClass, watcher: AbortHandle) {
		let slot = self.slot_mut(class);
		if let Some(previous) = slot.watcher.replace(watcher) {
			previous.abort();
		}
	}

	/// Held leases, whether counted or in their grace period.
	pub fn held(&self) -> impl Iterator<Item = (RequestClass, &SharedLease)> {
		RequestClass::ALL
			.into_iter()
			.filter_map(|class| self.slot(class).lease.as_ref().map(|lease| (class, lease)))
	}

	/// Empties every slot, cancelling timers, and returns the leases to close.
	pub fn drain(&mut self) -> Vec<SharedLease> {
		self.slots
			.iter_mut()
			.filter_map(|slot| {
				if let Some(pending) = slot.teardown.take() {
					pending.cancel();
				}
				slot.stop_watcher();
				slot.count = 0;
				slot.lease.take()
			})
			.collect()
	}

	pub fn check_invariants(&self) -> Result<(), String> {
		for class in RequestClass::ALL {
			let slot = self.slot(class);
			match (slot.count, slot.lease.is_some(), slot.teardown.is_some()) {
				(0, false, false) => {}
				(0, true, true) => {}
				(n, true, false) if n > 0 => {}
				(count, held, pending) => {
					return Err(format!("{class}: count={count} held={held} teardown_pending={pending}"));
				}
			}
		}
		Ok(())
	}

	fn debug_check(&self) {
		if cfg!(debug_assertions) {
			if let Err(violation) = self.check_invariants() {
				panic!("broker state invariant violated: {violation}");
			}
		}
	}
}
