use std::fmt;

use crate::adapter::{ConnectionState, InterfaceInfo, MediaType, NetworkAdapter};
use crate::error::{Error, Result};
use crate::events::EventSink;

/// Name of the network interface every DNS operation targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceHandle(String);

impl InterfaceHandle {
	/// Wrap an interface name. Blank names are rejected.
	pub fn new(name: &str) -> Option<Self> {
		let trimmed = name.trim();
		if trimmed.is_empty() {
			None
		} else {
			Some(Self(trimmed.to_string()))
		}
	}

	pub fn name(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for InterfaceHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// True for interfaces that are up and of a medium DNS switching applies to.
fn is_candidate(info: &InterfaceInfo) -> bool {
	info.admin_enabled
		&& info.state == ConnectionState::Connected
		&& matches!(info.media, MediaType::Wired | MediaType::Wireless)
}

/// Find the first connected wired or wireless interface.
///
/// Runs once at startup. A listing failure is logged and reported the same
/// way as an empty listing.
pub async fn resolve_active_interface(
	adapter: &dyn NetworkAdapter,
	events: &EventSink,
) -> Result<InterfaceHandle> {
	events.info("Detecting active network interface...");

	let interfaces = match adapter.list_interfaces().await {
		Ok(list) => list,
		Err(e) => {
			tracing::warn!(error = %e, "interface listing failed");
			events.error(format!("Could not list network interfaces: {}", e));
			return Err(Error::InterfaceNotFound);
		}
	};
	tracing::debug!(count = interfaces.len(), "listed interfaces");

	match interfaces.iter().find(|i| is_candidate(i)).and_then(|i| InterfaceHandle::new(&i.name)) {
		Some(handle) => {
			events.info(format!("Active interface: {}", handle));
			Ok(handle)
		}
		None => {
			events.error("No active interface found");
			Err(Error::InterfaceNotFound)
		}
	}
}
