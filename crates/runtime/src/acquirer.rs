//! Platform seams: acquiring a network and observing its grant.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use netlease_protocol::{HighBandwidthRequest, NetworkRef};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::Instant;

/// Brings up a specific kind of network on request.
///
/// Implementations must not block: `acquire` only issues the platform request
/// and returns immediately. Grant (or refusal) is reported later through the
/// handle's [`LeaseHandle::granted`] observable. A refused request is a handle
/// that is never granted.
pub trait NetworkAcquirer: Send + Sync {
	fn acquire(&self, request: &HighBandwidthRequest) -> Arc<dyn LeaseHandle>;
}

/// One outstanding platform request for a network.
pub trait LeaseHandle: Send + Sync {
	/// Observable grant state. Starts at `None`; becomes `Some` once the
	/// platform grants a network, and may return to `None` if it is revoked.
	fn granted(&self) -> watch::Receiver<Option<NetworkRef>>;

	/// When the acquisition was issued. Grant deadlines are anchored here.
	fn acquired_at(&self) -> Instant;

	/// Relinquishes the platform request.
	fn close(&self);
}

type CloseHook = Box<dyn FnOnce() + Send>;

/// [`LeaseHandle`] backed by a watch channel, for acquirer implementations.
///
/// The platform layer calls [`grant`](Self::grant) and [`revoke`](Self::revoke)
/// from its callbacks; `on_close` runs at most once, on the first
/// [`close`](LeaseHandle::close).
pub struct PlatformLease {
	granted: watch::Sender<Option<NetworkRef>>,
	acquired_at: Instant,
	closed: AtomicBool,
	on_close: Mutex<Option<CloseHook>>,
}

impl PlatformLease {
	pub fn new(on_close: impl FnOnce() + Send + 'static) -> Self {
		Self::with_acquired_at(Instant::now(), on_close)
	}

	pub fn with_acquired_at(acquired_at: Instant, on_close: impl FnOnce() + Send + 'static) -> Self {
		let (granted, _) = watch::channel(None);
		Self {
			granted,
			acquired_at,
			closed: AtomicBool::new(false),
			on_close: Mutex::new(Some(Box::new(on_close))),
		}
	}

	pub fn grant(&self, network: NetworkRef) {
		self.granted.send_replace(Some(network));
	}

	pub fn revoke(&self) {
		self.granted.send_replace(None);
	}

	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::Acquire)
	}

	pub fn current(&self) -> Option<NetworkRef> {
		self.granted.borrow().clone()
	}
}

impl LeaseHandle for PlatformLease {
	fn granted(&self) -> watch::Receiver<Option<NetworkRef>> {
		self.granted.subscribe()
	}

	fn acquired_at(&self) -> Instant {
		self.acquired_at
	}

	fn close(&self) {
		if self.closed.swap(true, Ordering::AcqRel) {
			return;
		}
		if let Some(hook) = self.on_close.lock().take() {
			hook();
		}
	}
}

impl fmt::Debug for PlatformLease {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PlatformLease")
			.field("granted", &*self.granted.borrow())
			.field("acquired_at", &self.acquired_at)
			.field("closed", &self.is_closed())
			.finish()
	}
}
