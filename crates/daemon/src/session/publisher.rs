// SPDX-License-Identifier: MIT

//! Per-session event fan-out.
//!
//! Each subscriber owns a bounded queue. Publishing never blocks: a full
//! queue drops its oldest entry and counts the loss, and the subscriber
//! sees a synthetic `Overflow` marker before its next event. One slow
//! consumer therefore never stalls the reader or its peers.

use el_core::SessionEvent;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

struct SubQueue {
    events: Mutex<VecDeque<SessionEvent>>,
    dropped: AtomicU64,
    notify: Notify,
    /// Producer side: no more events will ever arrive.
    closed: AtomicBool,
    /// Consumer side: the handle is gone; stop feeding this queue.
    detached: AtomicBool,
}

impl SubQueue {
    fn new() -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            dropped: AtomicU64::new(0),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
            detached: AtomicBool::new(false),
        }
    }

    fn push(&self, capacity: usize, event: SessionEvent) {
        {
            let mut events = self.events.lock();
            if events.len() >= capacity {
                events.pop_front();
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            events.push_back(event);
        }
        self.notify.notify_one();
    }
}

/// Owns the subscriber set for one session.
pub struct Publisher {
    capacity: usize,
    subscribers: Mutex<Vec<Arc<SubQueue>>>,
    closed: AtomicBool,
}

impl Publisher {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            subscribers: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Register a subscriber. Late subscribers see only events published
    /// after this call.
    pub fn subscribe(&self) -> SubscriberHandle {
        let queue = Arc::new(SubQueue::new());
        if self.closed.load(Ordering::Acquire) {
            // Session already over: hand out an immediately-closed queue.
            queue.closed.store(true, Ordering::Release);
        } else {
            self.subscribers.lock().push(Arc::clone(&queue));
        }
        SubscriberHandle { queue }
    }

    /// Deliver to every live subscriber in producer order.
    pub fn publish(&self, event: SessionEvent) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|q| !q.detached.load(Ordering::Acquire));
        for queue in subscribers.iter() {
            queue.push(self.capacity, event.clone());
        }
    }

    /// Deliver the terminal exit event and seal the publisher; subsequent
    /// publishes are discarded and subscribers drain to completion.
    pub fn close(&self, code: Option<i32>, signal: Option<i32>) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|q| !q.detached.load(Ordering::Acquire));
        for queue in subscribers.iter() {
            queue.push(self.capacity, SessionEvent::Exit { code, signal });
            queue.closed.store(true, Ordering::Release);
            queue.notify.notify_one();
        }
        subscribers.clear();
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

/// Receiving end of one subscription. Dropping it releases the queue
/// immediately.
pub struct SubscriberHandle {
    queue: Arc<SubQueue>,
}

impl SubscriberHandle {
    /// Next event in producer order, `None` once the session is over and
    /// the queue is drained. An overflow marker is yielded before the
    /// first event that follows a loss.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        loop {
            let dropped = self.queue.dropped.swap(0, Ordering::Relaxed);
            if dropped > 0 {
                return Some(SessionEvent::Overflow { dropped });
            }
            if let Some(event) = self.queue.events.lock().pop_front() {
                return Some(event);
            }
            if self.queue.closed.load(Ordering::Acquire) {
                return None;
            }
            self.queue.notify.notified().await;
        }
    }

    /// Non-blocking variant for tests and polling consumers.
    pub fn try_recv(&mut self) -> Option<SessionEvent> {
        let dropped = self.queue.dropped.swap(0, Ordering::Relaxed);
        if dropped > 0 {
            return Some(SessionEvent::Overflow { dropped });
        }
        self.queue.events.lock().pop_front()
    }
}

impl Drop for SubscriberHandle {
    fn drop(&mut self) {
        self.queue.detached.store(true, Ordering::Release);
    }
}

#[cfg(test)]
#[path = "publisher_tests.rs"]
mod tests;
