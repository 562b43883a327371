use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL};

use anyhow::Result;

use crate::bench::BenchmarkReport;
use crate::interface::InterfaceHandle;
use crate::providers::Provider;
use crate::store::DnsSnapshot;

fn new_table() -> Table {
	let mut table = Table::new();
	table.load_preset(UTF8_FULL);
	table.set_content_arrangement(ContentArrangement::Dynamic);
	table
}

fn ms_cell(value: Option<f64>) -> String {
	match value {
		Some(ms) => format!("{:.0} ms", ms),
		None => "-".to_string(),
	}
}

/// Print the provider catalog in display order.
pub fn print_providers(catalog: &[Provider]) {
	let mut table = new_table();
	table.set_header(vec!["Provider", "Primary", "Secondary"]);
	for p in catalog {
		table.add_row(vec![
			p.name.clone(),
			p.primary.to_string(),
			p.secondary.to_string(),
		]);
	}
	println!("{table}");
}

/// Print the interface's current DNS configuration and pending undo, if any.
pub fn print_snapshot(
	interface: &InterfaceHandle,
	current: &DnsSnapshot,
	history: Option<&DnsSnapshot>,
) {
	println!("Interface:      {}", interface);
	println!("DNS:            {}", current);
	if let Some(previous) = history {
		println!("Undo restores:  {}", previous);
	}
}

/// Render the ranked report as a table followed by the unreachable list.
pub fn format_report(report: &BenchmarkReport) -> String {
	let mut table = new_table();
	table.set_header(vec!["Rank", "Provider", "Ping", "Resolve", "Score"]);
	for r in &report.ranked {
		table.add_row(vec![
			r.rank.to_string(),
			r.name.clone(),
			ms_cell(Some(r.ping_ms)),
			ms_cell(Some(r.resolve_ms)),
			format!("{:.0}", r.score),
		]);
	}

	let mut out = String::new();
	out.push_str("\nDNS Speed Test Results (ms)\n");
	out.push_str("===========================\n\n");
	out.push_str(&table.to_string());
	out.push('\n');

	if !report.unreachable.is_empty() {
		out.push_str("\nUnreachable:\n");
		for r in &report.unreachable {
			out.push_str(&format!(
				"  - {} (ping: {}, resolve: {})\n",
				r.name, ms_cell(r.ping_ms), ms_cell(r.resolve_ms),
			));
		}
	}

	out.push_str(&format!("\nFastest DNS: {}\n", report.winner()));
	out
}

pub fn print_report(report: &BenchmarkReport) {
	print!("{}", format_report(report));
}

/// Write the ranked report to a CSV file.
pub fn write_csv(path: &str, report: &BenchmarkReport, catalog: &[Provider]) -> Result<()> {
	let mut writer = csv::Writer::from_path(path)?;

	writer.write_record(["rank", "provider", "primary", "ping_ms", "resolve_ms", "score"])?;

	for r in &report.ranked {
		let primary = catalog.iter()
			.find(|p| p.name == r.name)
			.map(|p| p.primary.to_string())
			.unwrap_or_default();
		writer.write_record([
			r.rank.to_string(),
			r.name.clone(),
			primary,
			format!("{:.2}", r.ping_ms),
			format!("{:.2}", r.resolve_ms),
			format!("{:.2}", r.score),
		])?;
	}

	writer.flush()?;
	println!("\nResults written to: {}", path);
	Ok(())
}
