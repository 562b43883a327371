use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::adapter::NetworkAdapter;
use crate::error::{Error, OsError, Result};
use crate::events::{EventSink, OpState};
use crate::interface::InterfaceHandle;
use crate::providers::Provider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsMode {
	Automatic,
	Static,
}

/// DNS mode and addresses of an interface at one instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsSnapshot {
	pub mode: DnsMode,
	pub addresses: Vec<Ipv4Addr>,
}

impl DnsSnapshot {
	pub fn automatic() -> Self {
		Self {
			mode: DnsMode::Automatic,
			addresses: Vec::new(),
		}
	}

	pub fn static_dns(addresses: Vec<Ipv4Addr>) -> Self {
		Self {
			mode: DnsMode::Static,
			addresses,
		}
	}
}

impl fmt::Display for DnsSnapshot {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.mode {
			DnsMode::Automatic => f.write_str("automatic (DHCP)"),
			DnsMode::Static => {
				let list: Vec<String> = self.addresses.iter().map(|a| a.to_string()).collect();
				write!(f, "static [{}]", list.join(", "))
			}
		}
	}
}

fn apply_error(step: &str, e: OsError) -> Error {
	Error::Apply {
		step: step.to_string(),
		detail: e.to_string(),
	}
}

/// DNS configuration of the active interface with one level of undo.
///
/// Each mutation holds the history lock for its whole duration, so the slot
/// always holds the configuration from just before the last mutation.
pub struct DnsStore {
	adapter: Arc<dyn NetworkAdapter>,
	interface: Option<InterfaceHandle>,
	history: Mutex<Option<DnsSnapshot>>,
	events: EventSink,
}

impl DnsStore {
	/// `interface` is `None` when resolution failed; every operation then
	/// fails with `InterfaceNotFound` without touching the adapter.
	pub fn new(
		adapter: Arc<dyn NetworkAdapter>,
		interface: Option<InterfaceHandle>,
		events: EventSink,
	) -> Self {
		Self {
			adapter,
			interface,
			history: Mutex::new(None),
			events,
		}
	}

	pub fn interface(&self) -> Option<&InterfaceHandle> {
		self.interface.as_ref()
	}

	/// Snapshot held for the next undo, if any.
	pub async fn history(&self) -> Option<DnsSnapshot> {
		self.history.lock().await.clone()
	}

	fn target(&self) -> Result<&InterfaceHandle> {
		self.interface.as_ref().ok_or(Error::InterfaceNotFound)
	}

	/// Read the interface's current DNS configuration.
	pub async fn read_current(&self) -> Result<DnsSnapshot> {
		let iface = self.target()?;
		self.snapshot(iface).await
	}

	async fn snapshot(&self, iface: &InterfaceHandle) -> Result<DnsSnapshot> {
		let reply = self.adapter.query_dns(iface.name()).await
			.map_err(|e| Error::Query(e.to_string()))?;
		let snapshot = if reply.is_dhcp {
			DnsSnapshot::automatic()
		} else {
			DnsSnapshot::static_dns(reply.addresses)
		};
		tracing::debug!(interface = %iface, %snapshot, "read DNS snapshot");
		Ok(snapshot)
	}

	/// Apply a catalog entry as static DNS.
	pub async fn apply_provider(&self, provider: &Provider) -> Result<()> {
		self.events.info(format!("Selected provider: {}", provider.name));
		self.apply_static(provider.primary, Some(provider.secondary)).await
	}

	/// Set `primary` as the only static server, then `secondary` at slot 2.
	///
	/// A failure after the primary is set leaves the interface partially
	/// configured; that is logged as a warning and not rolled back.
	pub async fn apply_static(&self, primary: Ipv4Addr, secondary: Option<Ipv4Addr>) -> Result<()> {
		let mut history = self.history.lock().await;
		self.events.state(OpState::Applying);
		let result = self.apply_static_locked(&mut history, primary, secondary).await;
		self.finish("applying DNS", &result, "DNS applied successfully");
		result
	}

	async fn apply_static_locked(
		&self,
		history: &mut Option<DnsSnapshot>,
		primary: Ipv4Addr,
		secondary: Option<Ipv4Addr>,
	) -> Result<()> {
		let iface = self.target()?;
		match secondary {
			Some(s) => self.events.info(format!("Preparing to apply DNS: {}, {}", primary, s)),
			None => self.events.info(format!("Preparing to apply DNS: {}", primary)),
		}

		*history = Some(self.snapshot(iface).await?);

		let mut addresses = vec![primary];
		addresses.extend(secondary);
		self.write_static(iface, &addresses, "Primary DNS set to", "Secondary DNS set to").await
	}

	/// Switch the interface back to DHCP-provided DNS.
	pub async fn reset_to_automatic(&self) -> Result<()> {
		let mut history = self.history.lock().await;
		self.events.state(OpState::Resetting);
		let result = self.reset_locked(&mut history).await;
		self.finish("resetting DNS", &result, "DNS reset to automatic (DHCP)");
		result
	}

	async fn reset_locked(&self, history: &mut Option<DnsSnapshot>) -> Result<()> {
		let iface = self.target()?;
		self.events.info("Resetting DNS to DHCP");
		*history = Some(self.snapshot(iface).await?);
		self.write_dhcp(iface).await
	}

	/// Restore the snapshot taken before the last mutation.
	///
	/// The configuration being replaced becomes the new history, so two
	/// undos in a row swap back and forth between the same two states.
	pub async fn undo_last(&self) -> Result<()> {
		let mut history = self.history.lock().await;
		self.events.state(OpState::Undoing);
		let result = self.undo_locked(&mut history).await;
		self.finish("undoing DNS", &result, "Previous DNS restored");
		result
	}

	async fn undo_locked(&self, history: &mut Option<DnsSnapshot>) -> Result<()> {
		let iface = self.target()?;
		self.events.info("Attempting to restore previous DNS");

		let previous = history.clone().ok_or(Error::NothingToUndo)?;
		if previous.mode == DnsMode::Static && previous.addresses.is_empty() {
			return Err(Error::Apply {
				step: "restore static DNS".to_string(),
				detail: "recorded configuration has no addresses".to_string(),
			});
		}

		*history = Some(self.snapshot(iface).await?);

		match previous.mode {
			DnsMode::Automatic => self.write_dhcp(iface).await,
			DnsMode::Static => {
				self.write_static(
					iface, &previous.addresses,
					"Restored primary DNS:", "Restored secondary DNS:",
				).await
			}
		}
	}

	async fn write_dhcp(&self, iface: &InterfaceHandle) -> Result<()> {
		self.adapter.set_dhcp(iface.name()).await
			.map_err(|e| apply_error("switch DNS to DHCP", e))?;
		self.events.info("DNS reset to automatic (DHCP)");
		Ok(())
	}

	/// Set `addresses[0]` as primary, then add the rest at slots 2, 3, ...
	async fn write_static(
		&self,
		iface: &InterfaceHandle,
		addresses: &[Ipv4Addr],
		primary_msg: &str,
		secondary_msg: &str,
	) -> Result<()> {
		let Some((&primary, rest)) = addresses.split_first() else {
			return Ok(());
		};

		self.adapter.set_static_dns(iface.name(), primary).await
			.map_err(|e| apply_error("set primary DNS", e))?;
		self.events.info(format!("{} {}", primary_msg, primary));

		for (i, &address) in rest.iter().enumerate() {
			let index = i + 2;
			if let Err(e) = self.adapter.add_dns(iface.name(), address, index).await {
				let applied: Vec<String> = addresses[..index - 1].iter()
					.map(|a| a.to_string())
					.collect();
				self.events.warn(format!(
					"Interface {} is partially configured: only {} applied",
					iface, applied.join(", "),
				));
				let step = if index == 2 {
					"add secondary DNS".to_string()
				} else {
					format!("add DNS #{}", index)
				};
				return Err(apply_error(&step, e));
			}
			self.events.info(format!("{} {}", secondary_msg, address));
		}
		Ok(())
	}

	/// Emit the single terminal status of an operation.
	fn finish(&self, action: &str, result: &Result<()>, success: &str) {
		match result {
			Ok(()) => {
				self.events.info(success);
				self.events.state(OpState::Done);
			}
			Err(Error::NothingToUndo) => {
				self.events.warn("Nothing to undo");
				self.events.state(OpState::Idle);
			}
			Err(e) => {
				tracing::warn!(action, error = %e, "DNS operation failed");
				self.events.error(format!("ERROR {}: {}", action, e));
				self.events.state(OpState::Error);
			}
		}
	}
}
