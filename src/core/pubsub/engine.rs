// src/core/pubsub/engine.rs

//! The reference pub/sub fan-out engine: two inverted indexes (channel and
//! pattern) over per-subscriber bounded queues. `PubSubManager` (this
//! module's sibling) is the production implementation built on
//! `tokio::sync::broadcast`; this is the shape the spec fixes directly —
//! drop-newest backpressure, per-subscriber FIFO, and confirmations that
//! precede any published message.

use super::event::SubscriberEvent;
use crate::core::collections::linked_list::{LinkedList, Topology};
use crate::core::commands::scan::glob_match;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

/// A subscriber's outbound queue. Bounded; a publish that finds the queue
/// full drops the new event for that subscriber rather than blocking the
/// publisher or evicting an older, already-promised message.
pub struct Outbox {
    capacity: usize,
    queue: Mutex<VecDeque<SubscriberEvent>>,
}

impl Outbox {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            queue: Mutex::new(VecDeque::new()),
        }
    }

    fn push(&self, event: SubscriberEvent) {
        let mut q = self.queue.lock();
        if q.len() >= self.capacity {
            return;
        }
        q.push_back(event);
    }

    pub fn pop(&self) -> Option<SubscriberEvent> {
        self.queue.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

pub type SubscriberId = u64;

struct Subscriber {
    id: SubscriberId,
    outbox: Arc<Outbox>,
}

impl PartialEq for Subscriber {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Clone for Subscriber {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            outbox: self.outbox.clone(),
        }
    }
}

/// The channel/pattern fan-out engine. Ring-topology `LinkedList`s back each
/// index so that, in addition to ordinary fan-out, a caller can round-robin
/// across a channel's subscribers (e.g. a future `SPUBLISH`-style
/// single-delivery variant) without reallocating on every publish.
#[derive(Default)]
pub struct PubSubEngine {
    channels: Mutex<std::collections::HashMap<String, LinkedList<Subscriber>>>,
    patterns: Mutex<std::collections::HashMap<String, LinkedList<Subscriber>>>,
    memberships: Mutex<std::collections::HashMap<SubscriberId, (HashSet<String>, HashSet<String>)>>,
}

const DEFAULT_OUTBOX_CAPACITY: usize = 1024;

impl PubSubEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn member_entry(&self, id: SubscriberId) -> (HashSet<String>, HashSet<String>) {
        self.memberships
            .lock()
            .entry(id)
            .or_default()
            .clone()
    }

    /// Subscribes to each channel in order, enqueueing one confirmation per
    /// channel (index is the subscriber's total channel-subscription count
    /// after that channel is added, matching `SUBSCRIBE`'s reply shape).
    pub fn subscribe(&self, id: SubscriberId, outbox: &Arc<Outbox>, channels: &[String]) {
        for channel in channels {
            {
                let mut map = self.channels.lock();
                let list = map
                    .entry(channel.clone())
                    .or_insert_with(|| LinkedList::new(Topology::Ring));
                if !list.contains(&Subscriber {
                    id,
                    outbox: outbox.clone(),
                }) {
                    list.add(Subscriber {
                        id,
                        outbox: outbox.clone(),
                    });
                }
            }
            let mut memberships = self.memberships.lock();
            let entry = memberships.entry(id).or_default();
            entry.0.insert(channel.clone());
            let index = entry.0.len() + entry.1.len();
            drop(memberships);
            outbox.push(SubscriberEvent::Subscribe {
                channel: channel.clone(),
                index,
            });
        }
    }

    pub fn psubscribe(&self, id: SubscriberId, outbox: &Arc<Outbox>, patterns: &[String]) {
        for pattern in patterns {
            {
                let mut map = self.patterns.lock();
                let list = map
                    .entry(pattern.clone())
                    .or_insert_with(|| LinkedList::new(Topology::Ring));
                if !list.contains(&Subscriber {
                    id,
                    outbox: outbox.clone(),
                }) {
                    list.add(Subscriber {
                        id,
                        outbox: outbox.clone(),
                    });
                }
            }
            let mut memberships = self.memberships.lock();
            let entry = memberships.entry(id).or_default();
            entry.1.insert(pattern.clone());
            let index = entry.0.len() + entry.1.len();
            drop(memberships);
            outbox.push(SubscriberEvent::Psubscribe {
                pattern: pattern.clone(),
                index,
            });
        }
    }

    pub fn unsubscribe(&self, id: SubscriberId, outbox: &Arc<Outbox>, channels: &[String]) {
        for channel in channels {
            let mut map = self.channels.lock();
            if let Some(list) = map.get_mut(channel) {
                list.remove(&Subscriber {
                    id,
                    outbox: outbox.clone(),
                });
                if list.is_empty() {
                    map.remove(channel);
                }
            }
            drop(map);
            let mut memberships = self.memberships.lock();
            let entry = memberships.entry(id).or_default();
            entry.0.remove(channel);
            let index = entry.0.len() + entry.1.len();
            drop(memberships);
            outbox.push(SubscriberEvent::Unsubscribe {
                channel: channel.clone(),
                index,
            });
        }
    }

    pub fn punsubscribe(&self, id: SubscriberId, outbox: &Arc<Outbox>, patterns: &[String]) {
        for pattern in patterns {
            let mut map = self.patterns.lock();
            if let Some(list) = map.get_mut(pattern) {
                list.remove(&Subscriber {
                    id,
                    outbox: outbox.clone(),
                });
                if list.is_empty() {
                    map.remove(pattern);
                }
            }
            drop(map);
            let mut memberships = self.memberships.lock();
            let entry = memberships.entry(id).or_default();
            entry.1.remove(pattern);
            let index = entry.0.len() + entry.1.len();
            drop(memberships);
            outbox.push(SubscriberEvent::Punsubscribe {
                pattern: pattern.clone(),
                index,
            });
        }
    }

    /// Fans a message out to every literal subscriber of `channel` plus
    /// every subscriber of a pattern matching `channel`. A subscriber whose
    /// outbox is full simply does not receive this one message; it is never
    /// handed to the wrong subscriber.
    pub fn publish(&self, channel: &str, payload: Bytes) -> usize {
        let mut delivered = 0;
        if let Some(list) = self.channels.lock().get(channel) {
            for sub in list.iter() {
                sub.outbox.push(SubscriberEvent::Message {
                    channel: channel.to_string(),
                    payload: payload.clone(),
                });
                delivered += 1;
            }
        }
        for (pattern, list) in self.patterns.lock().iter() {
            if glob_match(pattern.as_bytes(), channel.as_bytes()) {
                for sub in list.iter() {
                    sub.outbox.push(SubscriberEvent::Pmessage {
                        pattern: pattern.clone(),
                        channel: channel.to_string(),
                        payload: payload.clone(),
                    });
                    delivered += 1;
                }
            }
        }
        delivered
    }

    /// Removes a subscriber from every index it belongs to and drains
    /// nothing on its own — the caller drops the `Outbox` (or it is dropped
    /// along with the connection), which discards any queued messages.
    pub fn disconnect(&self, id: SubscriberId) {
        let (channels, patterns) = self.member_entry(id);
        let placeholder = Arc::new(Outbox::new(0));
        let mut map = self.channels.lock();
        for channel in &channels {
            if let Some(list) = map.get_mut(channel) {
                list.remove(&Subscriber {
                    id,
                    outbox: placeholder.clone(),
                });
                if list.is_empty() {
                    map.remove(channel);
                }
            }
        }
        drop(map);
        let mut pmap = self.patterns.lock();
        for pattern in &patterns {
            if let Some(list) = pmap.get_mut(pattern) {
                list.remove(&Subscriber {
                    id,
                    outbox: placeholder.clone(),
                });
                if list.is_empty() {
                    pmap.remove(pattern);
                }
            }
        }
        drop(pmap);
        self.memberships.lock().remove(&id);
    }

    pub fn new_outbox(&self) -> Arc<Outbox> {
        Arc::new(Outbox::new(DEFAULT_OUTBOX_CAPACITY))
    }
}
