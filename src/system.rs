use std::net::{Ipv4Addr, SocketAddr};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;

use crate::adapter::{ConnectionState, DnsQuery, InterfaceInfo, MediaType, NetworkAdapter};
use crate::config::{WIRED_PREFIXES, WIRELESS_PREFIXES};
use crate::dns::timed_lookup;
use crate::error::OsError;

fn ipv4_pattern() -> &'static Regex {
	static PATTERN: OnceLock<Regex> = OnceLock::new();
	PATTERN.get_or_init(|| {
		Regex::new(r"\b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}\b").expect("static regex is valid")
	})
}

/// Guess the medium from the adapter's name, as Windows names them.
pub fn media_from_name(name: &str) -> MediaType {
	let starts_with_any = |prefixes: &[&str]| {
		prefixes.iter().any(|p| name.get(..p.len()).is_some_and(|head| head.eq_ignore_ascii_case(p)))
	};
	if starts_with_any(WIRED_PREFIXES) {
		MediaType::Wired
	} else if starts_with_any(WIRELESS_PREFIXES) {
		MediaType::Wireless
	} else {
		MediaType::Other
	}
}

/// Parse the table printed by `netsh interface show interface`.
///
/// Columns are Admin State, State, Type, Interface Name; the name is the
/// remainder of the row and may contain spaces.
pub fn parse_interface_table(output: &str) -> Vec<InterfaceInfo> {
	let mut interfaces = Vec::new();
	let mut in_body = false;
	for line in output.lines() {
		let trimmed = line.trim();
		if trimmed.starts_with("---") {
			in_body = true;
			continue;
		}
		if !in_body || trimmed.is_empty() {
			continue;
		}

		let parts: Vec<&str> = trimmed.split_whitespace().collect();
		if parts.len() < 4 {
			continue;
		}
		let state = match parts[1] {
			s if s.eq_ignore_ascii_case("Connected") => ConnectionState::Connected,
			s if s.eq_ignore_ascii_case("Disconnected") => ConnectionState::Disconnected,
			_ => ConnectionState::Unknown,
		};
		let name = parts[3..].join(" ");
		interfaces.push(InterfaceInfo {
			media: media_from_name(&name),
			name,
			admin_enabled: parts[0].eq_ignore_ascii_case("Enabled"),
			state,
		});
	}
	interfaces
}

/// Parse `netsh interface ip show dns` output.
///
/// Addresses are returned in the order printed, which is priority order.
pub fn parse_dns_output(output: &str) -> DnsQuery {
	let lower = output.to_ascii_lowercase();
	let is_dhcp = lower.contains("configured through dhcp") || lower.contains("dhcp enabled");
	let addresses = ipv4_pattern()
		.find_iter(output)
		.filter_map(|m| m.as_str().parse::<Ipv4Addr>().ok())
		.collect();
	DnsQuery { is_dhcp, addresses }
}

/// Arguments for a single echo request with a reply deadline.
pub fn ping_args(address: Ipv4Addr, timeout: Duration) -> Vec<String> {
	if cfg!(windows) {
		vec![
			"-n".to_string(), "1".to_string(),
			"-w".to_string(), timeout.as_millis().to_string(),
			address.to_string(),
		]
	} else {
		// -W takes whole seconds on Linux
		let secs = timeout.as_secs_f64().ceil().max(1.0) as u64;
		vec![
			"-c".to_string(), "1".to_string(),
			"-W".to_string(), secs.to_string(),
			address.to_string(),
		]
	}
}

fn command(program: &str) -> Command {
	let mut cmd = Command::new(program);
	cmd.stdin(std::process::Stdio::null()).kill_on_drop(true);
	#[cfg(windows)]
	{
		const CREATE_NO_WINDOW: u32 = 0x08000000;
		cmd.creation_flags(CREATE_NO_WINDOW);
	}
	cmd
}

/// Run `netsh` with `args`, returning stdout on success.
async fn run_netsh(args: &[String]) -> Result<String, OsError> {
	let out = command("netsh").args(args).output().await?;
	let stdout = String::from_utf8_lossy(&out.stdout).to_string();
	let stderr = String::from_utf8_lossy(&out.stderr).to_string();

	let ec = out.status.code();
	let succ = out.status.success();
	tracing::debug!(?args, ?ec, ?succ, ?stdout, ?stderr, "run netsh");

	if !succ {
		let detail = format!("{} {}", stdout.trim(), stderr.trim());
		return Err(OsError::Command(detail.trim().to_string()));
	}
	Ok(stdout)
}

fn netsh_args(parts: &[&str], interface: &str, tail: &[String]) -> Vec<String> {
	let mut args: Vec<String> = parts.iter().map(|s| s.to_string()).collect();
	args.push(format!("name={}", interface));
	args.extend(tail.iter().cloned());
	args
}

/// `NetworkAdapter` over `netsh`, the platform `ping` and a raw UDP query
#[derive(Debug, Default)]
pub struct SystemAdapter;

impl SystemAdapter {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl NetworkAdapter for SystemAdapter {
	async fn list_interfaces(&self) -> Result<Vec<InterfaceInfo>, OsError> {
		let args: Vec<String> = ["interface", "show", "interface"]
			.iter().map(|s| s.to_string()).collect();
		let out = run_netsh(&args).await?;
		Ok(parse_interface_table(&out))
	}

	async fn query_dns(&self, interface: &str) -> Result<DnsQuery, OsError> {
		let args = netsh_args(&["interface", "ip", "show", "dns"], interface, &[]);
		let out = run_netsh(&args).await?;
		Ok(parse_dns_output(&out))
	}

	async fn set_static_dns(&self, interface: &str, address: Ipv4Addr) -> Result<(), OsError> {
		let args = netsh_args(
			&["interface", "ip", "set", "dns"], interface,
			&["static".to_string(), address.to_string()],
		);
		run_netsh(&args).await.map(|_| ())
	}

	async fn add_dns(
		&self,
		interface: &str,
		address: Ipv4Addr,
		index: usize,
	) -> Result<(), OsError> {
		let args = netsh_args(
			&["interface", "ip", "add", "dns"], interface,
			&[format!("addr={}", address), format!("index={}", index)],
		);
		run_netsh(&args).await.map(|_| ())
	}

	async fn set_dhcp(&self, interface: &str) -> Result<(), OsError> {
		let args = netsh_args(
			&["interface", "ip", "set", "dns"], interface,
			&["source=dhcp".to_string()],
		);
		run_netsh(&args).await.map(|_| ())
	}

	async fn probe_reachability(
		&self,
		address: Ipv4Addr,
		timeout: Duration,
	) -> Result<Duration, OsError> {
		let start = Instant::now();
		let status = tokio::time::timeout(
			timeout,
			command("ping")
				.args(ping_args(address, timeout))
				.stdout(std::process::Stdio::null())
				.stderr(std::process::Stdio::null())
				.status(),
		).await??;
		let elapsed = start.elapsed();
		tracing::debug!(%address, ?status, ?elapsed, "ping finished");

		if !status.success() {
			return Err(OsError::Command(format!("{} did not answer ping", address)));
		}
		Ok(elapsed)
	}

	async fn resolve_hostname(
		&self,
		hostname: &str,
		server: Ipv4Addr,
		timeout: Duration,
	) -> Result<Duration, OsError> {
		timed_lookup(SocketAddr::new(server.into(), 53), hostname, timeout).await
	}
}
