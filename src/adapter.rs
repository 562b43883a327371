use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::OsError;

/// Connection state reported for a network interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
	Connected,
	Disconnected,
	Unknown,
}

/// Physical medium of a network interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
	Wired,
	Wireless,
	Other,
}

/// One row of the OS interface listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
	pub name: String,
	pub admin_enabled: bool,
	pub state: ConnectionState,
	pub media: MediaType,
}

/// DNS configuration as reported by the OS for one interface
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DnsQuery {
	pub is_dhcp: bool,
	pub addresses: Vec<Ipv4Addr>,
}

/// Narrow view of the host's networking primitives.
///
/// Implementations may shell out to OS utilities; callers only see typed
/// results or an `OsError` carrying the diagnostic text.
#[async_trait]
pub trait NetworkAdapter: Send + Sync {
	async fn list_interfaces(&self) -> Result<Vec<InterfaceInfo>, OsError>;

	async fn query_dns(&self, interface: &str) -> Result<DnsQuery, OsError>;

	/// Replace any static configuration with a single primary address.
	async fn set_static_dns(&self, interface: &str, address: Ipv4Addr) -> Result<(), OsError>;

	/// Add an address at a 1-based priority slot (2 = secondary).
	async fn add_dns(
		&self,
		interface: &str,
		address: Ipv4Addr,
		index: usize,
	) -> Result<(), OsError>;

	async fn set_dhcp(&self, interface: &str) -> Result<(), OsError>;

	/// One echo probe; returns the round-trip wall-clock time.
	async fn probe_reachability(
		&self,
		address: Ipv4Addr,
		timeout: Duration,
	) -> Result<Duration, OsError>;

	/// One lookup of `hostname` sent directly to `server`; returns wall-clock time.
	async fn resolve_hostname(
		&self,
		hostname: &str,
		server: Ipv4Addr,
		timeout: Duration,
	) -> Result<Duration, OsError>;
}
