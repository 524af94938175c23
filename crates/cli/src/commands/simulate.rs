//! Drives a [`LeaseBroker`] with concurrent callers against the fake platform.

use std::sync::Arc;
use std::time::Duration;

use netlease::{HighBandwidthRequest, LeaseBroker, NetleaseConfig, NetworkRef, PolicyKind, RequestClass, RequestPurpose};
use netlease_runtime::ClassSnapshot;
use netlease_runtime::fake::{FakeAcquirer, GrantBehavior};
use serde::Serialize;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::info;

use crate::cli::SimulateArgs;
use crate::error::{CliError, Result};

/// Extra wait past the grace delay so the teardown has run before the final snapshot.
const SETTLE: Duration = Duration::from_millis(50);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerOutcome {
	pub caller: usize,
	pub granted: bool,
	pub network: Option<NetworkRef>,
	pub waited_ms: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
	pub policy: PolicyKind,
	pub purpose: RequestPurpose,
	pub high_bandwidth: bool,
	pub request_class: RequestClass,
	pub grace_delay_ms: u64,
	pub acquisitions: usize,
	pub closes: usize,
	pub callers: Vec<CallerOutcome>,
	/// Class state right after every caller closed its lease.
	pub after_release: ClassSnapshot,
	pub after_grace: ClassSnapshot,
}

pub async fn run(config: &NetleaseConfig, args: &SimulateArgs) -> Result<SimulationReport> {
	if args.requests == 0 {
		return Err(CliError::InvalidInput("--requests must be at least 1".to_string()));
	}

	let policy = config.policy.build();
	let high_bandwidth = policy.is_high_bandwidth_request(args.purpose);
	let request = HighBandwidthRequest::new(policy.request_class(args.purpose), args.purpose);

	let network = NetworkRef::new(1, args.network, args.network.as_str());
	let behavior = if args.never_grant {
		GrantBehavior::Never
	} else if args.grant_after_ms == 0 {
		GrantBehavior::Immediately(network)
	} else {
		GrantBehavior::After(Duration::from_millis(args.grant_after_ms), network)
	};

	let acquirer = FakeAcquirer::new(behavior);
	let broker = LeaseBroker::new(Arc::new(acquirer.clone()), config.broker_config());
	let timeout = args.timeout_ms.map(Duration::from_millis).unwrap_or_else(|| config.await_timeout());
	let hold = Duration::from_millis(args.hold_ms);
	let stagger = Duration::from_millis(args.stagger_ms);

	let offsets = (0..args.requests)
		.map(|caller| u32::try_from(caller).ok().and_then(|n| stagger.checked_mul(n)))
		.collect::<Option<Vec<_>>>()
		.ok_or_else(|| CliError::InvalidInput("--stagger-ms is too large for --requests".to_string()))?;

	let mut tasks = JoinSet::new();
	for (caller, offset) in offsets.into_iter().enumerate() {
		let broker = broker.clone();
		tasks.spawn(async move {
			tokio::time::sleep(offset).await;
			let lease = broker.request_high_bandwidth_network(request);
			let started = Instant::now();
			let granted = lease.await_granted(timeout).await;
			let waited = started.elapsed();
			let network = lease.granted_network();
			tokio::time::sleep(hold).await;
			lease.close();
			CallerOutcome {
				caller,
				granted,
				network,
				waited_ms: waited.as_millis() as u64,
			}
		});
	}

	let mut callers = Vec::with_capacity(args.requests);
	while let Some(joined) = tasks.join_next().await {
		callers.push(joined.map_err(anyhow::Error::from)?);
	}
	callers.sort_by_key(|outcome| outcome.caller);

	let after_release = broker.snapshot().class(request.class);
	tokio::time::sleep(config.grace_delay() + SETTLE).await;
	let after_grace = broker.snapshot().class(request.class);

	info!(
		target = "netlease",
		purpose = %args.purpose,
		class = %request.class,
		callers = callers.len(),
		acquisitions = acquirer.acquisitions(),
		closes = acquirer.closes(),
		"simulation finished"
	);

	Ok(SimulationReport {
		policy: config.policy,
		purpose: args.purpose,
		high_bandwidth,
		request_class: request.class,
		grace_delay_ms: config.grace_delay_ms,
		acquisitions: acquirer.acquisitions(),
		closes: acquirer.closes(),
		callers,
		after_release,
		after_grace,
	})
}
