use std::io::Write;
use std::net::Ipv4Addr;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::adapter::NetworkAdapter;
use crate::bench::{run_benchmark, BenchmarkReport};
use crate::config::BenchmarkConfig;
use crate::error::Result;
use crate::events::{EventSink, OpState};
use crate::interface::{resolve_active_interface, InterfaceHandle};
use crate::output;
use crate::providers::{find_provider, Provider};
use crate::store::DnsStore;

const SHELL_HELP: &str = "\
Commands:
  list                 list providers
  show                 show current DNS configuration
  apply <provider>     apply a provider as static DNS
  set <primary> [sec]  apply arbitrary static DNS servers
  reset                switch back to automatic (DHCP)
  undo                 restore the configuration before the last change
  bench                rank providers by latency
  use-fastest          apply the winner of the last benchmark
  help                 show this help
  exit                 leave";

/// One parsed line of the interactive session
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
	List,
	Show,
	Apply(String),
	Set(Ipv4Addr, Option<Ipv4Addr>),
	Reset,
	Undo,
	Bench,
	UseFastest,
	Help,
	Exit,
	Empty,
	Invalid(String),
}

pub fn parse_shell_line(line: &str) -> ShellCommand {
	let trimmed = line.trim();
	let (word, rest) = match trimmed.split_once(char::is_whitespace) {
		Some((w, r)) => (w, r.trim()),
		None => (trimmed, ""),
	};

	match word.to_ascii_lowercase().as_str() {
		"" => ShellCommand::Empty,
		"list" | "providers" => ShellCommand::List,
		"show" => ShellCommand::Show,
		"apply" if !rest.is_empty() => ShellCommand::Apply(rest.to_string()),
		"apply" => ShellCommand::Invalid("usage: apply <provider>".to_string()),
		"set" => {
			let addrs: Vec<&str> = rest.split_whitespace().collect();
			let parsed: std::result::Result<Vec<Ipv4Addr>, _> =
				addrs.iter().map(|a| a.parse::<Ipv4Addr>()).collect();
			match parsed.as_deref() {
				Ok([primary]) => ShellCommand::Set(*primary, None),
				Ok([primary, secondary]) => ShellCommand::Set(*primary, Some(*secondary)),
				_ => ShellCommand::Invalid("usage: set <primary> [secondary] (IPv4)".to_string()),
			}
		}
		"reset" => ShellCommand::Reset,
		"undo" => ShellCommand::Undo,
		"bench" | "test" => ShellCommand::Bench,
		"use-fastest" => ShellCommand::UseFastest,
		"help" | "?" => ShellCommand::Help,
		"exit" | "quit" => ShellCommand::Exit,
		other => ShellCommand::Invalid(format!("unknown command '{}', try 'help'", other)),
	}
}

/// Pick the interface to operate on: the override if given, else detection.
pub async fn select_interface(
	adapter: &dyn NetworkAdapter,
	interface_override: Option<&str>,
	events: &EventSink,
) -> Option<InterfaceHandle> {
	match interface_override {
		Some(name) => match InterfaceHandle::new(name) {
			Some(handle) => {
				events.info(format!("Using interface: {}", handle));
				Some(handle)
			}
			None => {
				events.error("Interface name must not be blank");
				None
			}
		},
		None => resolve_active_interface(adapter, events).await.ok(),
	}
}

pub struct App {
	adapter: Arc<dyn NetworkAdapter>,
	store: DnsStore,
	catalog: Vec<Provider>,
	config: BenchmarkConfig,
	events: EventSink,
	last_report: Option<BenchmarkReport>,
}

impl App {
	pub fn new(
		adapter: Arc<dyn NetworkAdapter>,
		interface: Option<InterfaceHandle>,
		catalog: Vec<Provider>,
		config: BenchmarkConfig,
		events: EventSink,
	) -> Self {
		let store = DnsStore::new(adapter.clone(), interface, events.clone());
		Self {
			adapter,
			store,
			catalog,
			config,
			events,
			last_report: None,
		}
	}

	#[cfg(test)]
	pub fn store(&self) -> &DnsStore {
		&self.store
	}

	pub fn catalog(&self) -> &[Provider] {
		&self.catalog
	}

	pub async fn show(&self) -> Result<()> {
		let current = match self.store.read_current().await {
			Ok(snapshot) => snapshot,
			Err(e) => {
				self.events.error(format!("ERROR reading DNS: {}", e));
				return Err(e);
			}
		};
		let history = self.store.history().await;
		self.events.flush().await;
		if let Some(iface) = self.store.interface() {
			output::print_snapshot(iface, &current, history.as_ref());
		}
		Ok(())
	}

	pub async fn apply(&self, name: &str) -> Result<()> {
		let provider = match find_provider(&self.catalog, name) {
			Ok(p) => p,
			Err(e) => {
				self.events.error(e.to_string());
				self.events.state(OpState::Error);
				return Err(e);
			}
		};
		self.store.apply_provider(provider).await
	}

	pub async fn set(&self, primary: Ipv4Addr, secondary: Option<Ipv4Addr>) -> Result<()> {
		self.store.apply_static(primary, secondary).await
	}

	pub async fn reset(&self) -> Result<()> {
		self.store.reset_to_automatic().await
	}

	pub async fn undo(&self) -> Result<()> {
		self.store.undo_last().await
	}

	/// Run a benchmark, print its report and remember it for `use_fastest`.
	pub async fn bench(&mut self) -> Result<&BenchmarkReport> {
		// A failed run leaves nothing for use_fastest to apply
		self.last_report = None;
		let report = run_benchmark(
			self.adapter.clone(), &self.catalog, &self.config, &self.events,
		).await?;
		self.events.flush().await;
		output::print_report(&report);
		Ok(self.last_report.insert(report))
	}

	/// Apply the winner of the most recent benchmark.
	pub async fn use_fastest(&self) -> Result<()> {
		let Some(report) = &self.last_report else {
			self.events.warn("No benchmark has been run yet");
			return Ok(());
		};
		let winner = report.winner().to_string();
		self.events.info(format!("User selected {}", winner));
		self.apply(&winner).await
	}

	/// Execute one shell command. Returns false when the session should end.
	pub async fn execute(&mut self, command: ShellCommand) -> bool {
		// Failures are already on the activity log; the session carries on
		let result = match command {
			ShellCommand::Exit => return false,
			ShellCommand::Empty => Ok(()),
			ShellCommand::Help => {
				self.events.flush().await;
				println!("{}", SHELL_HELP);
				Ok(())
			}
			ShellCommand::Invalid(msg) => {
				self.events.warn(msg);
				Ok(())
			}
			ShellCommand::List => {
				self.events.flush().await;
				output::print_providers(&self.catalog);
				Ok(())
			}
			ShellCommand::Show => self.show().await,
			ShellCommand::Apply(name) => self.apply(&name).await,
			ShellCommand::Set(primary, secondary) => self.set(primary, secondary).await,
			ShellCommand::Reset => self.reset().await,
			ShellCommand::Undo => self.undo().await,
			ShellCommand::Bench => self.bench().await.map(|_| ()),
			ShellCommand::UseFastest => self.use_fastest().await,
		};
		if let Err(e) = result {
			tracing::debug!(error = %e, "shell command failed");
		}
		true
	}

	/// Read commands line by line until `exit` or end of input.
	pub async fn run_session<R: AsyncBufRead + Unpin>(&mut self, reader: R) -> anyhow::Result<()> {
		let mut lines = reader.lines();
		loop {
			self.events.flush().await;
			print!("dns> ");
			std::io::stdout().flush()?;

			let Some(line) = lines.next_line().await? else {
				println!();
				break;
			};
			if !self.execute(parse_shell_line(&line)).await {
				break;
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::Error;
	use crate::events::{drain, messages, states};
	use crate::fake::{FakeAdapter, ProbeScript};
	use crate::store::DnsSnapshot;

	fn ip(s: &str) -> Ipv4Addr {
		s.parse().unwrap()
	}

	fn app_with(adapter: Arc<FakeAdapter>) -> App {
		App::new(
			adapter,
			InterfaceHandle::new("Ethernet"),
			crate::providers::default_providers(),
			BenchmarkConfig::default(),
			EventSink::disabled(),
		)
	}

	#[test]
	fn test_parse_shell_lines() {
		assert_eq!(parse_shell_line("  "), ShellCommand::Empty);
		assert_eq!(parse_shell_line("LIST"), ShellCommand::List);
		assert_eq!(
			parse_shell_line("apply  Google Public DNS "),
			ShellCommand::Apply("Google Public DNS".to_string()),
		);
		assert_eq!(parse_shell_line("set 1.1.1.1"), ShellCommand::Set(ip("1.1.1.1"), None));
		assert_eq!(
			parse_shell_line("set 1.1.1.1 1.0.0.1"),
			ShellCommand::Set(ip("1.1.1.1"), Some(ip("1.0.0.1"))),
		);
		assert_eq!(parse_shell_line("quit"), ShellCommand::Exit);
		assert_eq!(parse_shell_line("use-fastest"), ShellCommand::UseFastest);
	}

	#[test]
	fn test_parse_shell_invalid() {
		assert!(matches!(parse_shell_line("apply"), ShellCommand::Invalid(_)));
		assert!(matches!(parse_shell_line("set x.y"), ShellCommand::Invalid(_)));
		assert!(matches!(parse_shell_line("set 1.1.1.1 2.2.2.2 3.3.3.3"), ShellCommand::Invalid(_)));
		assert!(matches!(parse_shell_line("frobnicate"), ShellCommand::Invalid(_)));
	}

	#[tokio::test]
	async fn test_select_interface_override() {
		let adapter = FakeAdapter::default();
		let events = EventSink::disabled();
		let handle = select_interface(&adapter, Some("Wi-Fi 2"), &events).await.unwrap();
		assert_eq!(handle.name(), "Wi-Fi 2");
		assert!(select_interface(&adapter, Some("  "), &events).await.is_none());
	}

	#[tokio::test]
	async fn test_select_interface_detects() {
		let adapter = FakeAdapter::with_ethernet();
		let handle = select_interface(&adapter, None, &EventSink::disabled()).await.unwrap();
		assert_eq!(handle.name(), "Ethernet");
	}

	#[tokio::test]
	async fn test_apply_unknown_provider_does_not_mutate() {
		let adapter = Arc::new(FakeAdapter::with_ethernet());
		let app = app_with(adapter.clone());
		assert!(matches!(app.apply("Nope").await, Err(Error::UnknownProvider(_))));
		assert_eq!(adapter.mutation_calls(), 0);
	}

	#[tokio::test]
	async fn test_apply_unknown_provider_ends_in_error_state() {
		let (events, mut rx) = EventSink::channel();
		let app = App::new(
			Arc::new(FakeAdapter::with_ethernet()),
			InterfaceHandle::new("Ethernet"),
			crate::providers::default_providers(),
			BenchmarkConfig::default(),
			events,
		);
		assert!(app.apply("Nope").await.is_err());
		assert_eq!(states(&drain(&mut rx)), vec![OpState::Error]);
	}

	#[tokio::test]
	async fn test_show_reads_without_mutating() {
		let adapter = Arc::new(FakeAdapter::with_ethernet().with(|s| {
			s.is_dhcp = false;
			s.static_addresses = vec![ip("8.8.8.8")];
		}));
		let app = app_with(adapter.clone());
		app.show().await.unwrap();
		assert_eq!(adapter.mutation_calls(), 0);
	}

	#[tokio::test]
	async fn test_show_query_failure() {
		let adapter = Arc::new(FakeAdapter::with_ethernet().with(|s| s.fail_query = true));
		let (events, mut rx) = EventSink::channel();
		let app = App::new(
			adapter.clone(),
			InterfaceHandle::new("Ethernet"),
			crate::providers::default_providers(),
			BenchmarkConfig::default(),
			events,
		);
		assert!(matches!(app.show().await, Err(Error::Query(_))));
		assert_eq!(adapter.mutation_calls(), 0);
		let log = messages(&drain(&mut rx));
		assert!(log.iter().any(|m| m.starts_with("ERROR reading DNS")));
	}

	#[tokio::test]
	async fn test_show_without_interface() {
		let adapter = Arc::new(FakeAdapter::with_ethernet());
		let app = App::new(
			adapter.clone(),
			None,
			crate::providers::default_providers(),
			BenchmarkConfig::default(),
			EventSink::disabled(),
		);
		assert!(matches!(app.show().await, Err(Error::InterfaceNotFound)));
		assert_eq!(adapter.mutation_calls(), 0);
	}

	#[tokio::test]
	async fn test_session_apply_and_undo() {
		let adapter = Arc::new(FakeAdapter::with_ethernet());
		let mut app = app_with(adapter);

		let input: &[u8] = b"apply cloudflare (fastest, privacy)\nundo\nundo\nexit\nreset\n";
		app.run_session(input).await.unwrap();

		// Session ended at exit: apply, undo back to DHCP, undo again to Cloudflare
		assert_eq!(
			app.store().read_current().await.unwrap(),
			DnsSnapshot::static_dns(vec![ip("1.1.1.1"), ip("1.0.0.1")]),
		);
	}

	#[tokio::test]
	async fn test_use_fastest_applies_winner() {
		let adapter = Arc::new(FakeAdapter::with_ethernet().with(|s| {
			s.probes.insert(ip("9.9.9.9"), ProbeScript::Respond { ping_ms: 3, resolve_ms: 4 });
			s.probes.insert(ip("8.8.8.8"), ProbeScript::Respond { ping_ms: 9, resolve_ms: 9 });
		}));
		let mut app = app_with(adapter);

		// Without a report nothing happens
		app.use_fastest().await.unwrap();
		assert_eq!(app.store().read_current().await.unwrap(), DnsSnapshot::automatic());

		let winner = app.bench().await.unwrap().winner().to_string();
		assert_eq!(winner, "Quad9 (Malware Blocking)");

		app.use_fastest().await.unwrap();
		assert_eq!(
			app.store().read_current().await.unwrap(),
			DnsSnapshot::static_dns(vec![ip("9.9.9.9"), ip("149.112.112.112")]),
		);
	}

	#[tokio::test]
	async fn test_failed_bench_forgets_previous_winner() {
		let adapter = Arc::new(FakeAdapter::with_ethernet().with(|s| {
			s.probes.insert(ip("9.9.9.9"), ProbeScript::Respond { ping_ms: 3, resolve_ms: 4 });
		}));
		let mut app = app_with(adapter.clone());
		app.bench().await.unwrap();

		adapter.configure(|s| s.probes.clear());
		assert!(matches!(app.bench().await, Err(Error::AllUnreachable)));

		app.use_fastest().await.unwrap();
		assert_eq!(app.store().read_current().await.unwrap(), DnsSnapshot::automatic());
		assert_eq!(adapter.mutation_calls(), 0);
	}

	#[tokio::test]
	async fn test_session_survives_failures() {
		let adapter = Arc::new(FakeAdapter::with_ethernet().with(|s| s.fail_set_static = true));
		let mut app = app_with(adapter.clone());

		let input: &[u8] = b"apply OpenDNS\nundo\nbogus\nreset\n";
		app.run_session(input).await.unwrap();

		// Apply failed at the first step; undo and reset still ran
		assert_eq!(app.store().read_current().await.unwrap(), DnsSnapshot::automatic());
		assert_eq!(adapter.mutation_calls(), 3);
	}
}
