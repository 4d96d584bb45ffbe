//! Thread-safe control event queue with coalescing.
//!
//! The queue is the only mailbox between event producers and the runner
//! loop. It is mutated under a single mutex + condvar pair, which is
//! one of exactly two cross-thread synchronization points in the
//! runtime (the other is the execution state machine).
//!
//! # Coalescing Rules
//!
//! - **Shutdown** is inserted at the consuming end of the queue and is
//!   always returned before any Stop/Rerun that was queued earlier.
//! - **Rerun** coalesces: if a Rerun is already pending, the new
//!   payload replaces the pending entry in place (position unchanged).
//!   At most one Rerun is ever queued, so edits arriving faster than
//!   execution cannot build an unbounded backlog.
//! - **Stop** enqueues in plain arrival order.

use crate::ControlEvent;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use tracing::trace;

/// A thread-safe queue of control events.
///
/// Producers call [`enqueue`](Self::enqueue) from any thread; the
/// session's runner loop consumes via [`dequeue`](Self::dequeue)
/// (blocking, between runs) or [`dequeue_nowait`](Self::dequeue_nowait)
/// (non-blocking, from the preemption checkpoint inside a run).
///
/// # Example
///
/// ```
/// use rill_event::{ControlEvent, ControlEventQueue, ScriptInvocation};
///
/// let queue = ControlEventQueue::new();
/// queue.enqueue(ControlEvent::Rerun(ScriptInvocation::new("a.lua")));
/// queue.enqueue(ControlEvent::Rerun(ScriptInvocation::new("b.lua")));
///
/// // The two reruns coalesced into one, keeping the latest payload.
/// match queue.dequeue_nowait() {
///     Some(ControlEvent::Rerun(inv)) => {
///         assert_eq!(inv.script_path.to_str(), Some("b.lua"));
///     }
///     other => panic!("unexpected: {other:?}"),
/// }
/// assert!(queue.dequeue_nowait().is_none());
/// ```
#[derive(Debug, Default)]
pub struct ControlEventQueue {
    queue: Mutex<VecDeque<ControlEvent>>,
    cond: Condvar,
}

impl ControlEventQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues an event, applying the coalescing rules.
    ///
    /// Never blocks and is callable from any thread. Linearizable with
    /// respect to dequeue: once this returns, a subsequent dequeue on
    /// any thread observes the event (or its coalesced successor).
    /// Wakes one blocked consumer.
    pub fn enqueue(&self, event: ControlEvent) {
        let mut queue = self.queue.lock();

        match event {
            ControlEvent::Shutdown => {
                // "Stop everything now": jump to the consuming end so
                // the shutdown is processed before older Stop/Rerun.
                queue.push_front(ControlEvent::Shutdown);
            }
            ControlEvent::Rerun(invocation) => {
                if let Some(slot) = queue.iter_mut().find(|e| e.is_rerun()) {
                    // Overwrite the pending rerun in place.
                    trace!("coalescing pending rerun");
                    *slot = ControlEvent::Rerun(invocation);
                } else {
                    queue.push_back(ControlEvent::Rerun(invocation));
                }
            }
            other => queue.push_back(other),
        }

        self.cond.notify_one();
    }

    /// Pops the next event, blocking until one is available.
    ///
    /// Wakes immediately on enqueue. Only the runner loop thread calls
    /// this; it is the loop's parking spot between runs.
    pub fn dequeue(&self) -> ControlEvent {
        let mut queue = self.queue.lock();
        loop {
            if let Some(event) = queue.pop_front() {
                return event;
            }
            self.cond.wait(&mut queue);
        }
    }

    /// Pops the next event without blocking.
    ///
    /// Returns `None` when the queue is empty. This is the hot path of
    /// the preemption checkpoint, so it does nothing but one lock and
    /// one pop.
    pub fn dequeue_nowait(&self) -> Option<ControlEvent> {
        self.queue.lock().pop_front()
    }

    /// Returns the number of queued events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Returns `true` when no events are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_types::ScriptInvocation;
    use std::sync::Arc;
    use std::time::Duration;

    fn rerun(path: &str) -> ControlEvent {
        ControlEvent::Rerun(ScriptInvocation::new(path))
    }

    #[test]
    fn empty_queue_returns_none() {
        let queue = ControlEventQueue::new();
        assert!(queue.dequeue_nowait().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn fifo_for_stop_events() {
        let queue = ControlEventQueue::new();
        queue.enqueue(ControlEvent::Stop);
        queue.enqueue(rerun("a.lua"));

        assert_eq!(queue.dequeue_nowait(), Some(ControlEvent::Stop));
        assert_eq!(queue.dequeue_nowait(), Some(rerun("a.lua")));
    }

    #[test]
    fn rerun_coalesces_to_latest_payload() {
        let queue = ControlEventQueue::new();
        queue.enqueue(rerun("a.lua"));
        queue.enqueue(rerun("b.lua"));
        queue.enqueue(rerun("c.lua"));

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.dequeue_nowait(), Some(rerun("c.lua")));
        assert!(queue.dequeue_nowait().is_none());
    }

    #[test]
    fn rerun_coalescing_preserves_position() {
        let queue = ControlEventQueue::new();
        queue.enqueue(rerun("a.lua"));
        queue.enqueue(ControlEvent::Stop);
        queue.enqueue(rerun("b.lua"));

        // The rerun keeps its original slot ahead of the Stop.
        assert_eq!(queue.dequeue_nowait(), Some(rerun("b.lua")));
        assert_eq!(queue.dequeue_nowait(), Some(ControlEvent::Stop));
    }

    #[test]
    fn shutdown_dequeued_first() {
        let queue = ControlEventQueue::new();
        queue.enqueue(ControlEvent::Stop);
        queue.enqueue(ControlEvent::Shutdown);
        queue.enqueue(rerun("a.lua"));

        assert_eq!(queue.dequeue_nowait(), Some(ControlEvent::Shutdown));
        assert_eq!(queue.dequeue_nowait(), Some(ControlEvent::Stop));
        assert_eq!(queue.dequeue_nowait(), Some(rerun("a.lua")));
    }

    #[test]
    fn blocking_dequeue_wakes_on_enqueue() {
        let queue = Arc::new(ControlEventQueue::new());

        let consumer = {
            let queue = Arc::clone(&queue);
            std::thread::spawn(move || queue.dequeue())
        };

        // Give the consumer a moment to park on the condvar.
        std::thread::sleep(Duration::from_millis(50));
        queue.enqueue(ControlEvent::Stop);

        assert_eq!(consumer.join().unwrap(), ControlEvent::Stop);
    }

    #[test]
    fn concurrent_enqueue_is_not_lossy() {
        let queue = Arc::new(ControlEventQueue::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        queue.enqueue(ControlEvent::Stop);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(queue.len(), 800);
    }
}
