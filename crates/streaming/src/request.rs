use std::collections::BTreeMap;

use tracing::debug;

/// Token identifying one outstanding collaborator request.
///
/// Tokens are issued from a monotonically increasing counter, so a larger
/// token was always issued later.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Request(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RequestKind {
    Coordinates,
    Colors,
    Labels,
    Overlaps,
    Translation,
    Trajectory,
}

impl RequestKind {
    /// Exclusive kinds keep only their latest request; earlier replies are stale.
    pub fn is_exclusive(self) -> bool {
        matches!(self, Self::Coordinates | Self::Colors | Self::Trajectory)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Resolution {
    Current(RequestKind),
    Stale(RequestKind),
    Unknown,
}

/// Latest-wins bookkeeping for one viewer's requests.
#[derive(Debug, Default)]
pub struct RequestTracker {
    next: u64,
    latest: BTreeMap<RequestKind, Request>,
    in_flight: BTreeMap<Request, RequestKind>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, kind: RequestKind) -> Request {
        self.next += 1;
        let req = Request(self.next);
        self.in_flight.insert(req, kind);
        if kind.is_exclusive() {
            if let Some(prev) = self.latest.insert(kind, req) {
                debug!(?kind, superseded = prev.0, token = req.0, "request superseded");
            }
        }
        req
    }

    pub fn resolve(&mut self, req: Request) -> Resolution {
        let Some(kind) = self.in_flight.remove(&req) else {
            return Resolution::Unknown;
        };
        if !kind.is_exclusive() {
            return Resolution::Current(kind);
        }
        if self.latest.get(&kind) == Some(&req) {
            self.latest.remove(&kind);
            Resolution::Current(kind)
        } else {
            Resolution::Stale(kind)
        }
    }

    /// Drops interest in the latest request of `kind`; its reply becomes stale.
    pub fn cancel(&mut self, kind: RequestKind) -> bool {
        self.latest.remove(&kind).is_some()
    }

    pub fn is_pending(&self, kind: RequestKind) -> bool {
        if kind.is_exclusive() {
            self.latest.contains_key(&kind)
        } else {
            self.in_flight.values().any(|k| *k == kind)
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Forgets every outstanding request; all later replies resolve as unknown.
    pub fn clear(&mut self) {
        self.latest.clear();
        self.in_flight.clear();
    }
}
