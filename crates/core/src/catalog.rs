//! Live view of the platform's networks.

use netlease_protocol::CatalogSnapshot;
use tokio::sync::watch;

/// Read-only source of the current network catalog.
///
/// Implementations are owned by the platform layer and must be safe to read
/// from any thread.
pub trait NetworkCatalog: Send + Sync {
	fn snapshot(&self) -> CatalogSnapshot;
}

/// A fixed snapshot is a catalog that never changes.
impl NetworkCatalog for CatalogSnapshot {
	fn snapshot(&self) -> CatalogSnapshot {
		self.clone()
	}
}

/// Observable catalog fed by platform callbacks.
#[derive(Debug)]
pub struct WatchCatalog {
	tx: watch::Sender<CatalogSnapshot>,
}

impl WatchCatalog {
	pub fn new(initial: CatalogSnapshot) -> Self {
		let (tx, _) = watch::channel(initial);
		Self { tx }
	}

	/// Replaces the catalog and notifies subscribers.
	pub fn publish(&self, snapshot: CatalogSnapshot) {
		self.tx.send_replace(snapshot);
	}

	/// Edits the catalog in place; subscribers are notified only when it changed.
	pub fn update(&self, edit: impl FnOnce(&mut CatalogSnapshot)) {
		self.tx.send_if_modified(|snapshot| {
			let before = snapshot.clone();
			edit(snapshot);
			*snapshot != before
		});
	}

	pub fn subscribe(&self) -> watch::Receiver<CatalogSnapshot> {
		self.tx.subscribe()
	}
}

impl Default for WatchCatalog {
	fn default() -> Self {
		Self::new(CatalogSnapshot::default())
	}
}

impl NetworkCatalog for WatchCatalog {
	fn snapshot(&self) -> CatalogSnapshot {
		self.tx.borrow().clone()
	}
}
