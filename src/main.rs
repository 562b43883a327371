mod adapter;
mod app;
mod bench;
mod cli;
mod config;
mod dns;
mod error;
mod events;
#[cfg(test)]
mod fake;
mod interface;
mod logging;
mod output;
mod providers;
mod stats;
mod store;
mod system;

use std::sync::Arc;

use clap::Parser;

use crate::adapter::NetworkAdapter;
use crate::app::{select_interface, App};
use crate::cli::{Cli, Command};
use crate::events::{EventSink, OpState};
use crate::system::SystemAdapter;

async fn run(cli: Cli, command: Command, events: EventSink) -> anyhow::Result<()> {
	let config = cli.benchmark_config()?;
	let catalog = providers::default_providers();
	let adapter: Arc<dyn NetworkAdapter> = Arc::new(SystemAdapter::new());

	// Listing and a plain benchmark never touch the interface
	let needs_interface = !matches!(
		command,
		Command::Providers | Command::Bench { apply_fastest: false, .. }
	);
	let interface = if needs_interface {
		select_interface(adapter.as_ref(), cli.interface.as_deref(), &events).await
	} else {
		None
	};

	let mut app = App::new(adapter, interface, catalog, config, events.clone());

	match command {
		Command::Providers => {
			events.flush().await;
			output::print_providers(app.catalog());
		}
		Command::Show => app.show().await?,
		Command::Apply { provider } => app.apply(&provider).await?,
		Command::Set { primary, secondary } => app.set(primary, secondary).await?,
		Command::Reset => app.reset().await?,
		Command::Bench { apply_fastest, output: csv_path } => {
			let report = app.bench().await?.clone();
			if let Some(path) = &csv_path {
				output::write_csv(path, &report, app.catalog())?;
			}
			if apply_fastest {
				app.use_fastest().await?;
			}
		}
		Command::Shell => {
			println!("Type 'help' for commands.");
			let stdin = tokio::io::BufReader::new(tokio::io::stdin());
			app.run_session(stdin).await?;
		}
	}
	Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	logging::init(cli.verbose)?;

	let (events, rx) = EventSink::channel();
	let printer = events::spawn_printer(rx);
	events.info("Application started");
	events.state(OpState::Idle);

	let command = cli.command.clone().unwrap_or(Command::Shell);
	let result = run(cli, command, events.clone()).await;

	// Every sink must be gone before the printer can finish draining
	drop(events);
	if let Err(e) = printer.await {
		tracing::warn!(error = %e, "event printer failed");
	}
	result
}
