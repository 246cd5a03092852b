//! State Transition Traits
//!
//! Core traits for components that apply operations as atomic state
//! transitions, plus sequence tracking for hosts that replay a journal.

use crate::error::AmmError;

/// Core trait for stateful components that can apply events
pub trait Stateful {
    /// Event type this component can handle
    type Event;

    /// Value produced by a committed event
    type Outcome;

    /// Error type for failed operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Apply an event; on error the state is unchanged
    fn apply_event(&mut self, event: Self::Event) -> Result<Self::Outcome, Self::Error>;

    /// Create a snapshot of the current state
    fn snapshot(&self) -> Result<Vec<u8>, Self::Error>;

    /// Restore state from a snapshot
    fn restore(&mut self, snapshot: &[u8]) -> Result<(), Self::Error>;
}

/// Stateful component whose events carry ledger sequence numbers
pub trait SequencedStateful: Stateful {
    /// Apply an event with sequence number validation
    fn apply_sequenced(
        &mut self,
        sequence: u64,
        event: Self::Event,
    ) -> Result<Self::Outcome, Self::Error>;

    /// Get the last processed sequence number
    fn last_sequence(&self) -> u64;
}

/// Sequence tracking for gap detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceTracker {
    next_expected: u64,
    last_processed: u64,
}

impl SequenceTracker {
    /// Create a new sequence tracker starting from sequence 1
    pub fn new() -> Self {
        Self {
            next_expected: 1,
            last_processed: 0,
        }
    }

    pub fn next_expected(&self) -> u64 {
        self.next_expected
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_processed
    }

    /// Set the last processed sequence number (used during restore)
    pub fn set_last_sequence(&mut self, sequence: u64) {
        self.last_processed = sequence;
        self.next_expected = sequence + 1;
    }

    /// Reject anything but the next expected sequence, without advancing
    pub fn check(&self, sequence: u64) -> Result<(), AmmError> {
        if sequence == self.next_expected {
            Ok(())
        } else {
            Err(AmmError::SequenceGap {
                expected: self.next_expected,
                actual: sequence,
            })
        }
    }

    /// Mark the expected sequence as processed
    pub fn advance(&mut self) {
        self.last_processed = self.next_expected;
        self.next_expected += 1;
    }
}

impl Default for SequenceTracker {
    fn default() -> Self {
        Self::new()
    }
}
