use tracing::debug;

/// Token attached to one data request. Tokens only ever grow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(u64);

impl LoadTicket {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Tracks outstanding data requests so that only the most recently issued one is applied.
/// Responses for older tickets are dropped even when they arrive last.
#[derive(Debug, Default)]
pub struct GraphLoader {
    issued: u64,
    applied: Option<u64>,
}

impl GraphLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> LoadTicket {
        self.issued += 1;
        LoadTicket(self.issued)
    }

    pub fn latest(&self) -> Option<LoadTicket> {
        (self.issued > 0).then_some(LoadTicket(self.issued))
    }

    pub fn is_pending(&self) -> bool {
        self.issued > 0 && self.applied != Some(self.issued)
    }

    /// Hands back `payload` when `ticket` is the latest one and has not been applied yet.
    pub fn accept<T>(&mut self, ticket: LoadTicket, payload: T) -> Option<T> {
        if ticket.0 != self.issued || self.applied == Some(ticket.0) {
            debug!(
                ticket = ticket.0,
                latest = self.issued,
                "discarding stale load result"
            );
            return None;
        }
        self.applied = Some(ticket.0);
        Some(payload)
    }
}
