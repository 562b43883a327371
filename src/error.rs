use std::io;

use thiserror::Error;

/// Failure reported by an OS adapter call
#[derive(Error, Debug)]
pub enum OsError {
	#[error("command failed: {0}")]
	Command(String),
	#[error("io error: {0}")]
	Io(#[from] io::Error),
	#[error("timed out")]
	Timeout,
	#[error("malformed response: {0}")]
	Malformed(String),
}

impl From<tokio::time::error::Elapsed> for OsError {
	fn from(_: tokio::time::error::Elapsed) -> Self {
		OsError::Timeout
	}
}

/// Errors surfaced by the DNS store and the benchmark engine
#[derive(Error, Debug)]
pub enum Error {
	#[error("no active network interface found")]
	InterfaceNotFound,
	#[error("failed to read current DNS configuration: {0}")]
	Query(String),
	#[error("failed to {step}: {detail}")]
	Apply { step: String, detail: String },
	#[error("nothing to undo")]
	NothingToUndo,
	#[error("no DNS provider responded")]
	AllUnreachable,
	#[error("unknown DNS provider '{0}'")]
	UnknownProvider(String),
}

pub type Result<T> = std::result::Result<T, Error>;
