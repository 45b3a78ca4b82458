//! Events emitted after committed ledger operations.

use rebase_types::{AccountId, Rate, Timestamp};

/// Ledger-level events that off-core observers (relays, indexers) consume.
///
/// Events are emitted only after the operation that produced them has
/// committed; a failed operation emits nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerEvent {
    /// The protocol rate was lowered (or re-set to the same value).
    ProtocolRateChanged {
        previous: Rate,
        current: Rate,
        at: Timestamp,
    },
    /// Settlement folded a nonzero amount of interest into principal.
    InterestSettled {
        account: AccountId,
        delta: u128,
        new_principal: u128,
        at: Timestamp,
    },
    Minted {
        to: AccountId,
        amount: u128,
    },
    Burned {
        from: AccountId,
        amount: u128,
    },
    Transferred {
        from: AccountId,
        to: AccountId,
        amount: u128,
    },
    Approval {
        owner: AccountId,
        spender: AccountId,
        amount: u128,
    },
}

/// Fire-and-forget receiver of ledger events.
///
/// The ledger calls `emit` after releasing its locks. Events from one thread
/// arrive in commit order; events from concurrent operations on the same
/// account may interleave, so hosts that need a total order must serialize
/// their calls into the ledger.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &LedgerEvent);
}

/// Synchronous fan-out event bus.
///
/// Listeners are invoked inline on the emitting thread, after the ledger has
/// released its locks; keep handlers fast.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&LedgerEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&LedgerEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }
}

impl EventSink for EventBus {
    fn emit(&self, event: &LedgerEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: &LedgerEvent) {}
}
