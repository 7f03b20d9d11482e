//! Auto-dismiss timers with explicit cancellation tokens.

use crate::toast::ToastId;
use std::cmp::{Ordering as CmpOrdering, Reverse};
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Shared liveness flag for one toast. Once cancelled it stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
struct PendingTimer {
    deadline: Instant,
    seq: u64,
    toast_id: ToastId,
    token: CancelToken,
}

impl PartialEq for PendingTimer {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for PendingTimer {}

impl PartialOrd for PendingTimer {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingTimer {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        (self.deadline, self.seq).cmp(&(other.deadline, other.seq))
    }
}

/// Min-heap of deadlines. Cancelled timers are discarded lazily.
#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Reverse<PendingTimer>>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, toast_id: ToastId, deadline: Instant, token: CancelToken) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(PendingTimer {
            deadline,
            seq,
            toast_id,
            token,
        }));
    }

    /// Earliest deadline among live timers.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.discard_cancelled();
        self.heap.peek().map(|Reverse(timer)| timer.deadline)
    }

    /// Pops every live timer due at `now`, in deadline order.
    pub fn pop_due(&mut self, now: Instant) -> Vec<ToastId> {
        let mut due = Vec::new();
        while let Some(Reverse(timer)) = self.heap.peek() {
            if timer.deadline > now {
                break;
            }
            if let Some(Reverse(timer)) = self.heap.pop() {
                if !timer.token.is_cancelled() {
                    due.push(timer.toast_id);
                }
            }
        }
        due
    }

    /// Number of live timers.
    pub fn live(&self) -> usize {
        self.heap
            .iter()
            .filter(|Reverse(timer)| !timer.token.is_cancelled())
            .count()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    fn discard_cancelled(&mut self) {
        while self
            .heap
            .peek()
            .is_some_and(|Reverse(timer)| timer.token.is_cancelled())
        {
            self.heap.pop();
        }
    }
}
