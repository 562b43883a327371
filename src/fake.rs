use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::adapter::{ConnectionState, DnsQuery, InterfaceInfo, MediaType, NetworkAdapter};
use crate::error::OsError;

/// Scripted behavior of one provider address during a benchmark
#[derive(Debug, Clone, Copy)]
pub enum ProbeScript {
	/// Respond after the given latencies (ms)
	Respond { ping_ms: u64, resolve_ms: u64 },
	/// Ping answers but resolution fails
	NoResolve { ping_ms: u64 },
	/// Both probes fail immediately
	Down,
	/// Both probes never complete
	Hang,
}

#[derive(Debug, Default)]
pub struct FakeState {
	pub interfaces: Vec<InterfaceInfo>,
	pub is_dhcp: bool,
	pub static_addresses: Vec<Ipv4Addr>,
	/// Addresses the DHCP server hands out, reported while in DHCP mode
	pub dhcp_addresses: Vec<Ipv4Addr>,
	pub fail_list: bool,
	pub fail_query: bool,
	pub fail_set_static: bool,
	pub fail_set_dhcp: bool,
	/// Fail `add_dns` calls for this index
	pub fail_add_index: Option<usize>,
	pub mutation_calls: usize,
	pub probes: HashMap<Ipv4Addr, ProbeScript>,
}

/// In-memory adapter for tests
#[derive(Debug, Default)]
pub struct FakeAdapter {
	pub state: Mutex<FakeState>,
}

impl FakeAdapter {
	/// One connected Ethernet interface, currently on DHCP.
	pub fn with_ethernet() -> Self {
		let adapter = Self::default();
		{
			let mut s = adapter.state.lock().unwrap();
			s.interfaces.push(interface("Ethernet", ConnectionState::Connected, MediaType::Wired));
			s.is_dhcp = true;
			s.dhcp_addresses = vec![Ipv4Addr::new(192, 168, 1, 1)];
		}
		adapter
	}

	pub fn with<F: FnOnce(&mut FakeState)>(self, f: F) -> Self {
		f(&mut self.state.lock().unwrap());
		self
	}

	pub fn mutation_calls(&self) -> usize {
		self.state.lock().unwrap().mutation_calls
	}

	pub fn configure<F: FnOnce(&mut FakeState)>(&self, f: F) {
		f(&mut self.state.lock().unwrap());
	}
}

pub fn interface(name: &str, state: ConnectionState, media: MediaType) -> InterfaceInfo {
	InterfaceInfo {
		name: name.to_string(),
		admin_enabled: true,
		state,
		media,
	}
}

fn latency(script: Option<ProbeScript>, resolve: bool) -> Option<u64> {
	match script? {
		ProbeScript::Respond { ping_ms, resolve_ms } => {
			Some(if resolve { resolve_ms } else { ping_ms })
		}
		ProbeScript::NoResolve { ping_ms } => (!resolve).then_some(ping_ms),
		ProbeScript::Down | ProbeScript::Hang => None,
	}
}

impl FakeAdapter {
	async fn probe(&self, address: Ipv4Addr, resolve: bool) -> Result<Duration, OsError> {
		let script = self.state.lock().unwrap().probes.get(&address).copied();
		if matches!(script, Some(ProbeScript::Hang)) {
			std::future::pending::<()>().await;
		}
		match latency(script, resolve) {
			Some(ms) => Ok(Duration::from_millis(ms)),
			None => Err(OsError::Command(format!("{} did not answer", address))),
		}
	}
}

#[async_trait]
impl NetworkAdapter for FakeAdapter {
	async fn list_interfaces(&self) -> Result<Vec<InterfaceInfo>, OsError> {
		let s = self.state.lock().unwrap();
		if s.fail_list {
			return Err(OsError::Command("listing failed".to_string()));
		}
		Ok(s.interfaces.clone())
	}

	async fn query_dns(&self, _interface: &str) -> Result<DnsQuery, OsError> {
		let s = self.state.lock().unwrap();
		if s.fail_query {
			return Err(OsError::Command("query failed".to_string()));
		}
		if s.is_dhcp {
			return Ok(DnsQuery {
				is_dhcp: true,
				addresses: s.dhcp_addresses.clone(),
			});
		}
		Ok(DnsQuery {
			is_dhcp: false,
			addresses: s.static_addresses.clone(),
		})
	}

	async fn set_static_dns(&self, _interface: &str, address: Ipv4Addr) -> Result<(), OsError> {
		let mut s = self.state.lock().unwrap();
		s.mutation_calls += 1;
		if s.fail_set_static {
			return Err(OsError::Command("access denied".to_string()));
		}
		s.is_dhcp = false;
		s.static_addresses = vec![address];
		Ok(())
	}

	async fn add_dns(
		&self,
		_interface: &str,
		address: Ipv4Addr,
		index: usize,
	) -> Result<(), OsError> {
		let mut s = self.state.lock().unwrap();
		s.mutation_calls += 1;
		if s.fail_add_index == Some(index) {
			return Err(OsError::Command("access denied".to_string()));
		}
		let slot = index.saturating_sub(1).min(s.static_addresses.len());
		s.static_addresses.insert(slot, address);
		Ok(())
	}

	async fn set_dhcp(&self, _interface: &str) -> Result<(), OsError> {
		let mut s = self.state.lock().unwrap();
		s.mutation_calls += 1;
		if s.fail_set_dhcp {
			return Err(OsError::Command("access denied".to_string()));
		}
		s.is_dhcp = true;
		s.static_addresses.clear();
		Ok(())
	}

	async fn probe_reachability(
		&self,
		address: Ipv4Addr,
		_timeout: Duration,
	) -> Result<Duration, OsError> {
		self.probe(address, false).await
	}

	async fn resolve_hostname(
		&self,
		_hostname: &str,
		server: Ipv4Addr,
		_timeout: Duration,
	) -> Result<Duration, OsError> {
		self.probe(server, true).await
	}
}
