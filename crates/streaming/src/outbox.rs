use std::collections::VecDeque;

use tracing::debug;

use crate::protocol::{Query, Reply};
use crate::request::{Request, RequestKind, RequestTracker, Resolution};

#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub token: Request,
    pub query: Query,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Inbound {
    pub token: Request,
    pub reply: Reply,
}

/// Queue of queries waiting for the host to send, plus the tracker deciding
/// which replies are still wanted.
#[derive(Debug, Default)]
pub struct Outbox {
    tracker: RequestTracker,
    queued: VecDeque<Outbound>,
    stale_dropped: u64,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&mut self, query: Query) -> Request {
        let kind = query.kind();
        let token = self.tracker.issue(kind);
        debug!(?kind, token = token.0, "request issued");
        self.queued.push_back(Outbound { token, query });
        token
    }

    /// Hands every queued query to the caller, oldest first.
    pub fn drain(&mut self) -> Vec<Outbound> {
        self.queued.drain(..).collect()
    }

    pub fn queued(&self) -> usize {
        self.queued.len()
    }

    /// Resolves the token of any reply, transport failures included.
    ///
    /// Returns the reply if it is still wanted; stale and unknown tokens yield `None`.
    pub fn accept(&mut self, inbound: Inbound) -> Option<(Request, RequestKind, Reply)> {
        match self.tracker.resolve(inbound.token) {
            Resolution::Current(kind) => Some((inbound.token, kind, inbound.reply)),
            Resolution::Stale(kind) => {
                self.stale_dropped += 1;
                debug!(?kind, token = inbound.token.0, "stale reply dropped");
                None
            }
            Resolution::Unknown => {
                debug!(token = inbound.token.0, "reply for unknown token dropped");
                None
            }
        }
    }

    pub fn cancel(&mut self, kind: RequestKind) -> bool {
        self.queued.retain(|o| o.query.kind() != kind || !kind.is_exclusive());
        self.tracker.cancel(kind)
    }

    pub fn is_pending(&self, kind: RequestKind) -> bool {
        self.tracker.is_pending(kind)
    }

    pub fn stale_dropped(&self) -> u64 {
        self.stale_dropped
    }

    pub fn clear(&mut self) {
        self.queued.clear();
        self.tracker.clear();
    }
}
