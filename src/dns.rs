use std::net::SocketAddr;
use std::time::{Duration, Instant};

use hickory_proto::op::{Message, MessageType, Query, ResponseCode};
use hickory_proto::rr::{Name, RecordType};
use tokio::net::UdpSocket;

use crate::error::OsError;

/// DNS response information extracted from a parsed message
#[derive(Debug)]
pub struct DnsResponse {
	pub rcode: ResponseCode,
	pub answer_count: usize,
}

/// Build an A query for `domain` with recursion desired.
///
/// Returns the serialized query bytes ready to send over UDP.
pub fn build_query(domain: &str, txid: u16) -> Result<Vec<u8>, OsError> {
	let name = Name::from_ascii(domain)
		.map_err(|e| OsError::Malformed(format!("invalid domain name '{}': {}", domain, e)))?;

	let mut message = Message::new();
	message.set_id(txid);
	message.set_recursion_desired(true);
	message.add_query(Query::query(name, RecordType::A));

	message.to_vec()
		.map_err(|e| OsError::Malformed(format!("failed to serialize DNS query: {}", e)))
}

/// Parse a DNS response, validating the transaction ID.
pub fn parse_response(bytes: &[u8], expected_txid: u16) -> Result<DnsResponse, OsError> {
	let message = Message::from_vec(bytes)
		.map_err(|e| OsError::Malformed(format!("failed to parse DNS response: {}", e)))?;

	if message.id() != expected_txid {
		return Err(OsError::Malformed(format!(
			"txid mismatch: expected {}, got {}",
			expected_txid, message.id()
		)));
	}

	if message.message_type() != MessageType::Response {
		return Err(OsError::Malformed("received a query instead of a response".to_string()));
	}

	Ok(DnsResponse {
		rcode: message.response_code(),
		answer_count: message.answer_count() as usize,
	})
}

/// Send one A query to `server` and time the exchange.
///
/// Uses a dedicated socket. Any well-formed reply with a matching txid
/// counts, whatever its rcode: the server answered.
pub async fn timed_lookup(
	server: SocketAddr,
	domain: &str,
	timeout: Duration,
) -> Result<Duration, OsError> {
	let txid: u16 = rand::random();
	let query_bytes = build_query(domain, txid)?;

	let bind_addr = if server.is_ipv4() {
		"0.0.0.0:0"
	} else {
		"[::]:0"
	};
	let socket = UdpSocket::bind(bind_addr).await?;

	let start = Instant::now();
	socket.send_to(&query_bytes, server).await?;

	// Retry recv on stray or mismatched datagrams until the deadline
	let mut buf = vec![0u8; 4096];
	let max_retries = 3;
	for _ in 0..max_retries {
		let elapsed = start.elapsed();
		if elapsed >= timeout {
			break;
		}
		let remaining = timeout - elapsed;

		let (len, _src) = tokio::time::timeout(remaining, socket.recv_from(&mut buf)).await??;
		match parse_response(&buf[..len], txid) {
			Ok(response) => {
				let latency = start.elapsed();
				tracing::debug!(
					%server, domain, rcode = %response.rcode,
					answers = response.answer_count, ?latency,
					"lookup answered",
				);
				return Ok(latency);
			}
			Err(e) => {
				tracing::debug!(%server, error = %e, "discarding reply");
				continue;
			}
		}
	}

	Err(OsError::Timeout)
}
