use std::time::Duration;

use anyhow::{anyhow, Result};

/// Timeout applied to each reachability and resolution probe
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 700;

/// Slack on top of the probe timeout before the engine abandons a probe
pub const PROBE_GRACE_MS: u64 = 300;

/// Weight of ping latency in the composite score
pub const PING_WEIGHT: f64 = 0.6;

/// Weight of resolution latency in the composite score
pub const RESOLVE_WEIGHT: f64 = 0.4;

/// Hostname resolved through each provider during a benchmark
pub const DEFAULT_PROBE_HOSTNAME: &str = "example.com";

/// Upper bound on concurrently running provider probes
pub const DEFAULT_MAX_INFLIGHT: usize = 10;

/// Interface name prefixes treated as wired adapters
pub const WIRED_PREFIXES: &[&str] = &["Ethernet"];

/// Interface name prefixes treated as wireless adapters
pub const WIRELESS_PREFIXES: &[&str] = &["Wi-Fi", "WiFi", "Wireless", "WLAN"];

/// Weights for combining ping and resolution latency into one score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
	pub ping: f64,
	pub resolve: f64,
}

impl Default for ScoreWeights {
	fn default() -> Self {
		Self {
			ping: PING_WEIGHT,
			resolve: RESOLVE_WEIGHT,
		}
	}
}

impl ScoreWeights {
	/// Build weights from the ping share; resolution gets the remainder.
	pub fn from_ping_weight(ping: f64) -> Result<Self> {
		if !(0.0..=1.0).contains(&ping) {
			return Err(anyhow!("ping weight must be between 0 and 1, got {}", ping));
		}
		Ok(Self {
			ping,
			resolve: 1.0 - ping,
		})
	}
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
	pub timeout: Duration,
	pub hostname: String,
	pub weights: ScoreWeights,
	pub max_inflight: usize,
}

impl Default for BenchmarkConfig {
	fn default() -> Self {
		Self {
			timeout: Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
			hostname: DEFAULT_PROBE_HOSTNAME.to_string(),
			weights: ScoreWeights::default(),
			max_inflight: DEFAULT_MAX_INFLIGHT,
		}
	}
}
