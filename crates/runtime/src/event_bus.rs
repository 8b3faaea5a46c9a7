use std::collections::{BTreeMap, VecDeque};

use tracing::debug;

/// Logical page that groups cooperating viewers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageId(pub String);

impl PageId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl From<&str> for PageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Handle returned by [`PageBus::subscribe`]; pass it back to drain or unsubscribe.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Subscription(u64);

#[derive(Debug)]
struct Subscriber<E> {
    page: PageId,
    inbox: VecDeque<E>,
}

/// Typed publish/subscribe channel scoped by page.
///
/// Every subscriber owns an inbox; publishing clones the event into each
/// inbox on the page, so consumers never share a mutable value. Delivery
/// order is publish order; subscribers are visited in subscription order.
#[derive(Debug)]
pub struct PageBus<E> {
    next_id: u64,
    subscribers: BTreeMap<Subscription, Subscriber<E>>,
}

impl<E> Default for PageBus<E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            subscribers: BTreeMap::new(),
        }
    }
}

impl<E: Clone> PageBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, page: PageId) -> Subscription {
        let sub = Subscription(self.next_id);
        self.next_id += 1;
        self.subscribers.insert(
            sub,
            Subscriber {
                page,
                inbox: VecDeque::new(),
            },
        );
        sub
    }

    /// Returns `true` if the subscription was live.
    pub fn unsubscribe(&mut self, sub: Subscription) -> bool {
        self.subscribers.remove(&sub).is_some()
    }

    /// Publishes to every subscriber on `page`; returns the number of inboxes reached.
    pub fn publish(&mut self, page: &PageId, event: E) -> usize {
        let mut delivered = 0usize;
        for s in self.subscribers.values_mut().filter(|s| &s.page == page) {
            s.inbox.push_back(event.clone());
            delivered += 1;
        }
        if delivered == 0 {
            debug!(page = %page.0, "event published with no subscribers");
        }
        delivered
    }

    /// Delivers to a single subscriber.
    pub fn deliver(&mut self, sub: Subscription, event: E) -> bool {
        match self.subscribers.get_mut(&sub) {
            Some(s) => {
                s.inbox.push_back(event);
                true
            }
            None => false,
        }
    }

    pub fn drain(&mut self, sub: Subscription) -> Vec<E> {
        self.subscribers
            .get_mut(&sub)
            .map(|s| s.inbox.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn pending(&self, sub: Subscription) -> usize {
        self.subscribers.get(&sub).map(|s| s.inbox.len()).unwrap_or(0)
    }

    pub fn subscriber_count(&self, page: &PageId) -> usize {
        self.subscribers.values().filter(|s| &s.page == page).count()
    }
}
