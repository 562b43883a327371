use std::net::Ipv4Addr;

use crate::error::{Error, Result};

/// One entry of the DNS provider catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provider {
	pub name: String,
	pub primary: Ipv4Addr,
	pub secondary: Ipv4Addr,
}

impl Provider {
	pub fn new(name: &str, primary: Ipv4Addr, secondary: Ipv4Addr) -> Self {
		Self {
			name: name.to_string(),
			primary,
			secondary,
		}
	}
}

/// Return the built-in provider catalog, in display order.
pub fn default_providers() -> Vec<Provider> {
	vec![
		Provider::new(
			"Cloudflare (Fastest, Privacy)",
			Ipv4Addr::new(1, 1, 1, 1),
			Ipv4Addr::new(1, 0, 0, 1),
		),
		Provider::new(
			"Google Public DNS",
			Ipv4Addr::new(8, 8, 8, 8),
			Ipv4Addr::new(8, 8, 4, 4),
		),
		Provider::new(
			"Quad9 (Malware Blocking)",
			Ipv4Addr::new(9, 9, 9, 9),
			Ipv4Addr::new(149, 112, 112, 112),
		),
		Provider::new(
			"OpenDNS",
			Ipv4Addr::new(208, 67, 222, 222),
			Ipv4Addr::new(208, 67, 220, 220),
		),
		Provider::new(
			"AdGuard DNS",
			Ipv4Addr::new(94, 140, 14, 14),
			Ipv4Addr::new(94, 140, 15, 15),
		),
		Provider::new(
			"CleanBrowsing",
			Ipv4Addr::new(185, 228, 168, 168),
			Ipv4Addr::new(185, 228, 169, 168),
		),
		Provider::new(
			"Control D",
			Ipv4Addr::new(76, 76, 2, 0),
			Ipv4Addr::new(76, 76, 10, 0),
		),
		Provider::new(
			"NextDNS",
			Ipv4Addr::new(45, 90, 28, 0),
			Ipv4Addr::new(45, 90, 30, 0),
		),
		Provider::new(
			"DNS.WATCH",
			Ipv4Addr::new(84, 200, 69, 80),
			Ipv4Addr::new(84, 200, 70, 40),
		),
		Provider::new(
			"Comodo Secure DNS",
			Ipv4Addr::new(8, 26, 56, 26),
			Ipv4Addr::new(8, 20, 247, 20),
		),
	]
}

/// Look up a provider by display name.
///
/// An exact match wins; otherwise the first case-insensitive match is used.
pub fn find_provider<'a>(catalog: &'a [Provider], name: &str) -> Result<&'a Provider> {
	let wanted = name.trim();
	catalog.iter()
		.find(|p| p.name == wanted)
		.or_else(|| catalog.iter().find(|p| p.name.eq_ignore_ascii_case(wanted)))
		.ok_or_else(|| Error::UnknownProvider(wanted.to_string()))
}
