//! Dispatch outcomes and per-outcome counters.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use enum_map::{Enum, EnumMap};

/// Result of routing one interaction event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum)]
pub enum DispatchOutcome {
    HandledByCallback,
    HandledByHandler,

    /// Not one of ours; no reply sent
    IgnoredForeign,

    ExpiredCallback,
    UnknownHandler,

    /// Callback or handler returned an error or panicked
    HandlerError,
}

impl DispatchOutcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HandledByCallback => "handled_by_callback",
            Self::HandledByHandler => "handled_by_handler",
            Self::IgnoredForeign => "ignored_foreign",
            Self::ExpiredCallback => "expired_callback",
            Self::UnknownHandler => "unknown_handler",
            Self::HandlerError => "handler_error",
        }
    }

    pub const fn is_handled(self) -> bool {
        matches!(self, Self::HandledByCallback | Self::HandledByHandler)
    }
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default)]
pub struct RouterStats {
    outcomes: EnumMap<DispatchOutcome, AtomicU64>,
}

impl RouterStats {
    pub fn record(&self, outcome: DispatchOutcome) {
        self.outcomes[outcome].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self, outcome: DispatchOutcome) -> u64 {
        self.outcomes[outcome].load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.outcomes.values().map(|c| c.load(Ordering::Relaxed)).sum()
    }

    pub fn snapshot(&self) -> EnumMap<DispatchOutcome, u64> {
        EnumMap::from_fn(|outcome| self.count(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_per_outcome() {
        let stats = RouterStats::default();
        stats.record(DispatchOutcome::IgnoredForeign);
        stats.record(DispatchOutcome::IgnoredForeign);
        stats.record(DispatchOutcome::HandlerError);

        assert_eq!(stats.count(DispatchOutcome::IgnoredForeign), 2);
        assert_eq!(stats.snapshot()[DispatchOutcome::HandlerError], 1);
        assert_eq!(stats.total(), 3);
        assert_eq!(DispatchOutcome::ExpiredCallback.to_string(), "expired_callback");
    }
}
