//! Entry sinks
//!
//! Downstream consumers of appended and loaded entries, called in log order.

use crossbeam::channel::Sender;

use crate::entry::LogEntry;

/// Receives entries in the order they enter a segment
pub trait EntrySink {
    fn accept(&mut self, entry: &LogEntry);
}

impl<F> EntrySink for F
where
    F: FnMut(&LogEntry),
{
    fn accept(&mut self, entry: &LogEntry) {
        self(entry)
    }
}

/// Queues a copy of every entry on a channel
///
/// Payload buffers are shared with the original entry.
pub struct ChannelSink {
    sender: Sender<LogEntry>,
}

impl ChannelSink {
    pub fn new(sender: Sender<LogEntry>) -> Self {
        Self { sender }
    }
}

impl EntrySink for ChannelSink {
    fn accept(&mut self, entry: &LogEntry) {
        if self.sender.send(entry.clone()).is_err() {
            tracing::warn!(entry = %entry.term_index(), "Entry sink disconnected, dropping entry");
        }
    }
}
