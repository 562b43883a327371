use anyhow::Context;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

fn level_for(verbosity: u8) -> LevelFilter {
	match verbosity {
		0 => LevelFilter::WARN,
		1 => LevelFilter::INFO,
		2 => LevelFilter::DEBUG,
		_ => LevelFilter::TRACE,
	}
}

/// Install the diagnostic subscriber on stderr. `RUST_LOG` overrides `-v`.
pub fn init(verbosity: u8) -> Result<(), anyhow::Error> {
	let filter = EnvFilter::builder()
		.with_default_directive(level_for(verbosity).into())
		.from_env()
		.with_context(|| "failed to create env filter")?;

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.try_init()
		.map_err(|e| anyhow::anyhow!("failed to install logger: {}", e))
}
