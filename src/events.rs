use std::fmt;

use chrono::{DateTime, Local};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Coarse state of the tool, shown alongside the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpState {
	Idle,
	Applying,
	Resetting,
	Undoing,
	Testing,
	Done,
	Error,
}

impl fmt::Display for OpState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			OpState::Idle => "IDLE",
			OpState::Applying => "APPLYING DNS",
			OpState::Resetting => "RESETTING DNS",
			OpState::Undoing => "UNDOING DNS",
			OpState::Testing => "TESTING DNS",
			OpState::Done => "DONE",
			OpState::Error => "ERROR",
		};
		f.write_str(name)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
	Info,
	Warn,
	Error,
}

#[derive(Debug)]
pub enum Event {
	Log {
		timestamp: DateTime<Local>,
		level: Level,
		message: String,
	},
	State(OpState),
	/// Acknowledged by the printer once every earlier event is written
	Flush(oneshot::Sender<()>),
}

/// Sending half of the activity log
#[derive(Debug, Clone)]
pub struct EventSink {
	tx: Option<mpsc::UnboundedSender<Event>>,
}

impl EventSink {
	pub fn channel() -> (Self, mpsc::UnboundedReceiver<Event>) {
		let (tx, rx) = mpsc::unbounded_channel();
		(Self { tx: Some(tx) }, rx)
	}

	/// A sink that drops everything.
	#[cfg(test)]
	pub fn disabled() -> Self {
		Self { tx: None }
	}

	fn send(&self, event: Event) {
		if let Some(tx) = &self.tx {
			// A closed receiver only means nobody is listening anymore
			let _ = tx.send(event);
		}
	}

	fn log(&self, level: Level, message: String) {
		self.send(Event::Log {
			timestamp: Local::now(),
			level,
			message,
		});
	}

	pub fn info(&self, message: impl Into<String>) {
		self.log(Level::Info, message.into());
	}

	pub fn warn(&self, message: impl Into<String>) {
		self.log(Level::Warn, message.into());
	}

	pub fn error(&self, message: impl Into<String>) {
		self.log(Level::Error, message.into());
	}

	pub fn state(&self, state: OpState) {
		self.send(Event::State(state));
	}

	/// Wait until the printer has written everything sent so far.
	pub async fn flush(&self) {
		let Some(tx) = &self.tx else { return };
		let (ack_tx, ack_rx) = oneshot::channel();
		if tx.send(Event::Flush(ack_tx)).is_ok() {
			let _ = ack_rx.await;
		}
	}
}

/// Render one event as a display line. Flush markers render as nothing.
pub fn format_event(event: &Event) -> Option<String> {
	match event {
		Event::Log { timestamp, level, message } => {
			let prefix = match level {
				Level::Info => "",
				Level::Warn => "WARNING: ",
				Level::Error => "ERROR: ",
			};
			Some(format!("[{}] {}{}", timestamp.format("%H:%M:%S"), prefix, message))
		}
		Event::State(state) => Some(format!("STATE: {}", state)),
		Event::Flush(_) => None,
	}
}

/// Spawn the single consumer that prints events until every sink is dropped.
pub fn spawn_printer(mut rx: mpsc::UnboundedReceiver<Event>) -> JoinHandle<()> {
	tokio::spawn(async move {
		while let Some(event) = rx.recv().await {
			if let Some(line) = format_event(&event) {
				println!("{}", line);
			}
			if let Event::Flush(ack) = event {
				let _ = ack.send(());
			}
		}
	})
}

/// Drain whatever is queued without waiting. Used by tests to inspect the log.
#[cfg(test)]
pub fn drain(rx: &mut mpsc::UnboundedReceiver<Event>) -> Vec<Event> {
	let mut events = Vec::new();
	while let Ok(event) = rx.try_recv() {
		events.push(event);
	}
	events
}

/// Log messages only, in emission order.
#[cfg(test)]
pub fn messages(events: &[Event]) -> Vec<String> {
	events.iter()
		.filter_map(|e| match e {
			Event::Log { message, .. } => Some(message.clone()),
			_ => None,
		})
		.collect()
}

/// State transitions only, in emission order.
#[cfg(test)]
pub fn states(events: &[Event]) -> Vec<OpState> {
	events.iter()
		.filter_map(|e| match e {
			Event::State(s) => Some(*s),
			_ => None,
		})
		.collect()
}
