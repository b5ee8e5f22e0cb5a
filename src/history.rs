use std::collections::VecDeque;

use crate::protocol::FixMessage;
use crate::types::UtcTimestamp;

/// What went out at one sequence number.
#[derive(Debug, Clone)]
pub enum SentRecord {
    /// An administrative message; replayed as a SequenceReset-GapFill.
    Admin,
    /// An application message, kept for retransmission with its original
    /// SendingTime.
    App {
        message: FixMessage,
        sending_time: UtcTimestamp,
    },
}

/// Bounded in-memory history of sent messages keyed by sequence number,
/// used to satisfy ResendRequests. FIFO: once the bound is exceeded the
/// oldest entries are gone and the corresponding range can only be
/// answered with a SequenceReset-Reset.
#[derive(Debug)]
pub struct SentHistory {
    entries: VecDeque<(u32, SentRecord)>,
    capacity: usize,
}

impl SentHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
        }
    }

    pub fn record_admin(&mut self, seq: u32) {
        self.push(seq, SentRecord::Admin);
    }

    pub fn record_app(&mut self, seq: u32, message: FixMessage, sending_time: UtcTimestamp) {
        self.push(
            seq,
            SentRecord::App {
                message,
                sending_time,
            },
        );
    }

    fn push(&mut self, seq: u32, record: SentRecord) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((seq, record));
    }

    pub fn get(&self, seq: u32) -> Option<&SentRecord> {
        // Sequence numbers are recorded in increasing order.
        let (first, _) = self.entries.front()?;
        let idx = seq.checked_sub(*first)? as usize;
        self.entries.get(idx).map(|(_, rec)| rec)
    }

    /// Oldest sequence number still retained; anything below it was
    /// evicted or never sent.
    pub fn oldest_seq(&self) -> Option<u32> {
        self.entries.front().map(|(seq, _)| *seq)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
