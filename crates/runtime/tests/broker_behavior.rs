use std::sync::Arc;
use std::time::Duration;

use netlease_protocol::{HighBandwidthRequest, NetworkKind, NetworkRef, RequestClass, RequestPurpose};
use netlease_runtime::fake::{FakeAcquirer, GrantBehavior};
use netlease_runtime::{BrokerConfig, LeaseBroker};
use tokio::time::Instant;

const GRACE: Duration = Duration::from_millis(3000);

fn wifi() -> NetworkRef {
	NetworkRef::new(10, NetworkKind::Wifi, "home")
}

fn broker_with(behavior: GrantBehavior) -> (LeaseBroker, FakeAcquirer) {
	let acquirer = FakeAcquirer::new(behavior);
	let broker = LeaseBroker::new(Arc::new(acquirer.clone()), BrokerConfig::with_grace_delay(GRACE));
	(broker, acquirer)
}

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().with_max_level(tracing::Level::DEBUG).try_init();
}

fn stream() -> HighBandwidthRequest {
	HighBandwidthRequest::for_purpose(RequestPurpose::MediaStream)
}

#[tokio::test(start_paused = true)]
async fn concurrent_requests_share_one_acquisition() {
	let (broker, acquirer) = broker_with(GrantBehavior::Never);
	let first = broker.request_high_bandwidth_network(stream());

	let mut tasks = Vec::new();
	for _ in 0..16 {
		let broker = broker.clone();
		tasks.push(tokio::spawn(async move { broker.request_high_bandwidth_network(stream()) }));
	}
	let mut leases = Vec::new();
	for task in tasks {
		leases.push(task.await.unwrap());
	}

	assert_eq!(acquirer.acquisitions(), 1);
	assert_eq!(broker.snapshot().class(RequestClass::All).count, 17);
	assert!(leases.iter().all(|lease| lease.acquired_at() == first.acquired_at()));
}

#[tokio::test(start_paused = true)]
async fn different_classes_acquire_separately() {
	let (broker, acquirer) = broker_with(GrantBehavior::Never);

	let _all = broker.request_high_bandwidth_network(stream());
	let _wifi = broker.request_high_bandwidth_network(HighBandwidthRequest::wifi_only(RequestPurpose::MediaDownload));
	let _cell = broker.request_high_bandwidth_network(HighBandwidthRequest::cellular_only(RequestPurpose::Telemetry));

	assert_eq!(acquirer.acquisitions(), 3);
	let classes: Vec<RequestClass> = acquirer.issued().iter().map(|(request, _)| request.class).collect();
	assert_eq!(classes, vec![RequestClass::All, RequestClass::WifiOnly, RequestClass::CellularOnly]);
}

#[tokio::test(start_paused = true)]
async fn request_within_grace_reuses_lease() {
	let (broker, acquirer) = broker_with(GrantBehavior::Immediately(wifi()));

	broker.request_high_bandwidth_network(stream()).close();
	tokio::time::sleep(GRACE / 2).await;

	let lease = broker.request_high_bandwidth_network(stream());
	tokio::time::sleep(GRACE * 4).await;

	assert_eq!(acquirer.acquisitions(), 1);
	assert_eq!(acquirer.closes(), 0);
	assert_eq!(lease.granted_network(), Some(wifi()));
}

#[tokio::test(start_paused = true)]
async fn idle_lease_closes_once_after_grace() {
	init_tracing();
	let (broker, acquirer) = broker_with(GrantBehavior::Never);

	let lease = broker.request_high_bandwidth_network(stream());
	lease.close();

	tokio::time::sleep(GRACE - Duration::from_millis(1)).await;
	assert_eq!(acquirer.closes(), 0);

	tokio::time::sleep(Duration::from_millis(2)).await;
	assert_eq!(acquirer.closes(), 1);
	assert!(acquirer.last_lease().unwrap().is_closed());

	tokio::time::sleep(GRACE * 2).await;
	assert_eq!(acquirer.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn request_after_teardown_acquires_again() {
	let (broker, acquirer) = broker_with(GrantBehavior::Never);

	broker.request_high_bandwidth_network(stream()).close();
	tokio::time::sleep(GRACE + Duration::from_millis(1)).await;
	let _lease = broker.request_high_bandwidth_network(stream());

	assert_eq!(acquirer.acquisitions(), 2);
	assert_eq!(acquirer.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn close_is_idempotent() {
	let (broker, acquirer) = broker_with(GrantBehavior::Never);

	let keep = broker.request_high_bandwidth_network(stream());
	let lease = broker.request_high_bandwidth_network(stream());
	lease.close();
	lease.close();
	drop(lease);

	assert_eq!(broker.snapshot().class(RequestClass::All).count, 1);
	assert!(!keep.is_closed());

	tokio::time::sleep(GRACE * 2).await;
	assert_eq!(acquirer.closes(), 0);
}

#[tokio::test(start_paused = true)]
async fn await_granted_returns_on_grant() {
	let delay = Duration::from_millis(200);
	let (broker, _acquirer) = broker_with(GrantBehavior::After(delay, wifi()));

	let start = Instant::now();
	let lease = broker.request_high_bandwidth_network(stream());
	assert!(lease.await_granted(Duration::from_secs(5)).await);
	assert_eq!(start.elapsed(), delay);
}

#[tokio::test(start_paused = true)]
async fn await_deadline_is_anchored_to_acquisition() {
	let (broker, _acquirer) = broker_with(GrantBehavior::Never);
	let timeout = Duration::from_millis(1000);

	let lease = broker.request_high_bandwidth_network(stream());
	let acquired_at = lease.acquired_at();

	tokio::time::sleep(Duration::from_millis(300)).await;
	assert!(!lease.await_granted(timeout).await);
	assert_eq!(Instant::now() - acquired_at, timeout);
}

#[tokio::test(start_paused = true)]
async fn late_joiner_shares_the_original_deadline() {
	let (broker, _acquirer) = broker_with(GrantBehavior::Never);
	let timeout = Duration::from_millis(1000);

	let first = broker.request_high_bandwidth_network(stream());
	tokio::time::sleep(Duration::from_millis(600)).await;
	let joiner = broker.request_high_bandwidth_network(stream());

	let start = Instant::now();
	assert!(!joiner.await_granted(timeout).await);
	assert_eq!(start.elapsed(), Duration::from_millis(400));
	assert_eq!(Instant::now() - first.acquired_at(), timeout);
}

#[tokio::test(start_paused = true)]
async fn expired_deadline_returns_immediately() {
	let (broker, acquirer) = broker_with(GrantBehavior::Never);
	let timeout = Duration::from_millis(500);

	let lease = broker.request_high_bandwidth_network(stream());
	tokio::time::sleep(timeout).await;
	acquirer.grant_all(wifi());

	let start = Instant::now();
	assert!(!lease.await_granted(timeout).await);
	assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn already_granted_lease_reports_immediately() {
	let (broker, _acquirer) = broker_with(GrantBehavior::Immediately(wifi()));

	let _first = broker.request_high_bandwidth_network(stream());
	tokio::time::sleep(Duration::from_millis(100)).await;
	let joiner = broker.request_high_bandwidth_network(stream());

	let start = Instant::now();
	assert!(joiner.await_granted(Duration::from_millis(200)).await);
	assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn unbounded_timeout_waits_for_the_grant() {
	let (broker, _acquirer) = broker_with(GrantBehavior::Immediately(wifi()));
	let granted = broker.request_high_bandwidth_network(stream());
	assert!(granted.await_granted(Duration::MAX).await);

	let delay = Duration::from_secs(30);
	let (broker, _acquirer) = broker_with(GrantBehavior::After(delay, wifi()));
	let pending = broker.request_high_bandwidth_network(stream());
	let start = Instant::now();
	assert!(pending.await_granted(Duration::MAX).await);
	assert_eq!(start.elapsed(), delay);
}

#[tokio::test(start_paused = true)]
async fn revoked_grant_is_visible_on_the_lease() {
	let (broker, acquirer) = broker_with(GrantBehavior::Immediately(wifi()));

	let lease = broker.request_high_bandwidth_network(stream());
	assert!(lease.await_granted(Duration::from_secs(1)).await);

	acquirer.revoke_all();
	assert_eq!(lease.granted_network(), None);
}

#[tokio::test(start_paused = true)]
async fn refused_acquisition_degrades_to_timeout() {
	let (broker, acquirer) = broker_with(GrantBehavior::Never);

	let lease = broker.request_high_bandwidth_network(HighBandwidthRequest::wifi_only(RequestPurpose::MediaDownload));
	assert!(!lease.await_granted(Duration::from_millis(250)).await);
	lease.close();

	tokio::time::sleep(GRACE + Duration::from_millis(1)).await;
	assert_eq!(acquirer.closes(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn churn_across_threads_leaves_no_leaked_leases() {
	init_tracing();
	let acquirer = FakeAcquirer::new(GrantBehavior::Immediately(wifi()));
	let broker = LeaseBroker::new(Arc::new(acquirer.clone()), BrokerConfig::with_grace_delay(Duration::from_millis(5)));

	let mut tasks = Vec::new();
	for worker in 0..32usize {
		let broker = broker.clone();
		tasks.push(tokio::spawn(async move {
			for round in 0..50usize {
				let request = match (worker + round) % 3 {
					0 => HighBandwidthRequest::for_purpose(RequestPurpose::Image),
					1 => HighBandwidthRequest::wifi_only(RequestPurpose::MediaDownload),
					_ => HighBandwidthRequest::cellular_only(RequestPurpose::Telemetry),
				};
				let lease = broker.request_high_bandwidth_network(request);
				if round % 7 == 0 {
					tokio::time::sleep(Duration::from_millis(6)).await;
				} else {
					tokio::task::yield_now().await;
				}
				lease.close();
			}
		}));
	}
	for task in tasks {
		task.await.unwrap();
	}

	tokio::time::sleep(Duration::from_millis(100)).await;
	let snapshot = broker.snapshot();
	assert!(snapshot.classes.iter().all(|class| class.count == 0 && !class.held && !class.teardown_pending));
	assert_eq!(acquirer.acquisitions(), acquirer.closes());
}
