//! Bounded per-selector event log for postmortem dumps.

use std::collections::VecDeque;

use parking_lot::Mutex;

/// Ring of recent selection events.
///
/// Every selector owns (or shares via `Arc`) its own sink; entries are
/// plain strings and never feed back into selection state. Once full, the
/// oldest entry is evicted.
#[derive(Debug)]
pub struct EventLog {
	entries: Mutex<VecDeque<String>>,
	capacity: usize,
}

impl EventLog {
	pub const DEFAULT_CAPACITY: usize = 50;

	/// # Panics
	///
	/// Panics if `capacity` is zero.
	pub fn new(capacity: usize) -> Self {
		assert!(capacity > 0, "event log capacity must be non-zero");
		Self {
			entries: Mutex::new(VecDeque::with_capacity(capacity)),
			capacity,
		}
	}

	pub fn record(&self, line: impl Into<String>) {
		let line = line.into();
		let mut entries = self.entries.lock();
		if entries.len() == self.capacity {
			entries.pop_front();
		}
		entries.push_back(line);
	}

	/// Copies out the retained entries, oldest first.
	pub fn snapshot(&self) -> Vec<String> {
		self.entries.lock().iter().cloned().collect()
	}

	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}
}

impl Default for EventLog {
	fn default() -> Self {
		Self::new(Self::DEFAULT_CAPACITY)
	}
}
