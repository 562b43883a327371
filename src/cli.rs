use std::net::Ipv4Addr;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::{
	BenchmarkConfig, ScoreWeights, DEFAULT_MAX_INFLIGHT, DEFAULT_PROBE_HOSTNAME,
	DEFAULT_PROBE_TIMEOUT_MS, PING_WEIGHT,
};

/// Switch the active interface's DNS servers, with undo and provider benchmarking
#[derive(Parser, Debug)]
#[command(name = "dns-switch")]
#[command(about = "Switch DNS providers on the active network interface")]
pub struct Cli {
	#[command(subcommand)]
	pub command: Option<Command>,

	/// Operate on this interface instead of detecting the active one
	#[arg(short = 'i', long = "interface", global = true)]
	pub interface: Option<String>,

	/// Probe timeout in milliseconds
	#[arg(short = 't', long = "timeout", default_value_t = DEFAULT_PROBE_TIMEOUT_MS, global = true)]
	pub timeout: u64,

	/// Hostname resolved through each provider when benchmarking
	#[arg(long = "hostname", default_value = DEFAULT_PROBE_HOSTNAME, global = true)]
	pub hostname: String,

	/// Weight of ping latency in the score (resolve latency gets the rest)
	#[arg(long = "ping-weight", default_value_t = PING_WEIGHT, global = true)]
	pub ping_weight: f64,

	/// Maximum concurrent provider probes
	#[arg(short = 'c', long = "concurrency", default_value_t = DEFAULT_MAX_INFLIGHT, global = true)]
	pub concurrency: usize,

	/// Increase diagnostic logging (-v info, -vv debug, -vvv trace)
	#[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
	pub verbose: u8,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
	/// List the built-in DNS providers
	Providers,
	/// Show the active interface's current DNS configuration
	Show,
	/// Apply a provider from the catalog as static DNS
	Apply {
		/// Provider name (case-insensitive)
		provider: String,
	},
	/// Apply arbitrary static DNS servers
	Set {
		primary: Ipv4Addr,
		secondary: Option<Ipv4Addr>,
	},
	/// Switch back to automatic (DHCP) DNS
	Reset,
	/// Rank the providers by measured latency
	Bench {
		/// Apply the fastest provider when the run finishes
		#[arg(long = "apply-fastest")]
		apply_fastest: bool,

		/// Output CSV file path
		#[arg(short = 'o', long = "output")]
		output: Option<String>,
	},
	/// Interactive session with undo (default)
	Shell,
}

impl Cli {
	pub fn benchmark_config(&self) -> Result<BenchmarkConfig> {
		Ok(BenchmarkConfig {
			timeout: Duration::from_millis(self.timeout),
			hostname: self.hostname.clone(),
			weights: ScoreWeights::from_ping_weight(self.ping_weight)?,
			max_inflight: self.concurrency,
		})
	}
}
