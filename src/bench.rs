use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::adapter::NetworkAdapter;
use crate::config::{BenchmarkConfig, PROBE_GRACE_MS};
use crate::error::{Error, OsError, Result};
use crate::events::{EventSink, OpState};
use crate::providers::Provider;
use crate::stats::{rank_results, ProbeResult, ScoredProvider};

/// Outcome of a benchmark run that produced at least one score
#[derive(Debug, Clone)]
pub struct BenchmarkReport {
	/// Best first
	pub ranked: Vec<ScoredProvider>,
	pub unreachable: Vec<ProbeResult>,
}

impl BenchmarkReport {
	/// Name of the lowest-scoring provider.
	pub fn winner(&self) -> &str {
		&self.ranked[0].name
	}
}

/// Await a probe, bounding it by `deadline` and converting to milliseconds.
async fn measure<F>(deadline: Duration, probe: F) -> std::result::Result<f64, OsError>
where
	F: Future<Output = std::result::Result<Duration, OsError>>,
{
	let latency = tokio::time::timeout(deadline, probe).await??;
	Ok(latency.as_secs_f64() * 1000.0)
}

/// Probe one provider's primary address: reachability and resolution together.
async fn probe_provider(
	adapter: &dyn NetworkAdapter,
	provider: &Provider,
	config: &BenchmarkConfig,
	events: &EventSink,
) -> ProbeResult {
	let deadline = config.timeout + Duration::from_millis(PROBE_GRACE_MS);
	let (ping, resolve) = tokio::join!(
		measure(deadline, adapter.probe_reachability(provider.primary, config.timeout)),
		measure(deadline, adapter.resolve_hostname(&config.hostname, provider.primary, config.timeout)),
	);

	if let Err(e) = &ping {
		tracing::debug!(provider = %provider.name, error = %e, "ping probe failed");
	}
	if let Err(e) = &resolve {
		tracing::debug!(provider = %provider.name, error = %e, "resolve probe failed");
	}

	let result = ProbeResult::new(&provider.name, ping.ok(), resolve.ok(), config.weights);
	match (result.ping_ms, result.resolve_ms) {
		(Some(p), Some(r)) => events.info(format!(
			"{} ({}) -> Ping: {:.0} ms | Resolve: {:.0} ms",
			provider.name, provider.primary, p, r,
		)),
		_ => events.warn(format!("{} ({}) unreachable", provider.name, provider.primary)),
	}
	result
}

/// Probe every provider concurrently and rank the ones that answered both probes.
///
/// Waits for every probe before ranking. Individual failures only drop that
/// provider from the ranking; if none can be scored the run fails with
/// `AllUnreachable`.
pub async fn run_benchmark(
	adapter: Arc<dyn NetworkAdapter>,
	catalog: &[Provider],
	config: &BenchmarkConfig,
	events: &EventSink,
) -> Result<BenchmarkReport> {
	events.state(OpState::Testing);
	events.info(format!("Starting DNS speed test ({} providers)", catalog.len()));

	let semaphore = Arc::new(Semaphore::new(config.max_inflight.max(1)));
	let mut handles = Vec::new();

	for provider in catalog {
		let sem = semaphore.clone();
		let adapter = adapter.clone();
		let provider = provider.clone();
		let config = config.clone();
		let events = events.clone();

		handles.push(tokio::spawn(async move {
			let _permit = sem.acquire_owned().await;
			events.info(format!("Testing {} ({})", provider.name, provider.primary));
			probe_provider(adapter.as_ref(), &provider, &config, &events).await
		}));
	}

	let mut results = Vec::new();
	for handle in handles {
		match handle.await {
			Ok(result) => results.push(result),
			Err(e) => {
				tracing::warn!(error = %e, "probe task failed");
				events.warn(format!("A probe task failed: {}", e));
			}
		}
	}

	let (ranked, unreachable) = rank_results(results);
	if ranked.is_empty() {
		events.error("No DNS responded");
		events.state(OpState::Error);
		return Err(Error::AllUnreachable);
	}

	let report = BenchmarkReport { ranked, unreachable };
	events.info(format!("Fastest DNS detected: {}", report.winner()));
	events.state(OpState::Done);
	Ok(report)
}
