//! Live handle table for the C ABI
//!
//! Every array and string handle given to generated code is recorded here
//! until it is released. Entry points consult the table before dereferencing
//! a handle, so a released handle is usually reported instead of being read,
//! and a second release is usually ignored instead of freeing twice.
//!
//! Detection is best-effort. The table is keyed by address, so once a new
//! handle of the same kind reuses a released address, the stale handle is
//! indistinguishable from the new one and acts on it.

use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::config::RuntimeConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Array,
    String,
}

/// Counters for one handle kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandleStats {
    pub registered: u64,
    pub released: u64,
    pub peak_live: u64,
}

impl HandleStats {
    pub fn live(&self) -> u64 {
        self.registered - self.released
    }
}

#[derive(Default)]
struct Counters {
    registered: AtomicU64,
    released: AtomicU64,
    peak_live: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> HandleStats {
        HandleStats {
            registered: self.registered.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            peak_live: self.peak_live.load(Ordering::Relaxed),
        }
    }
}

pub struct HandleRegistry {
    live: DashMap<usize, HandleKind>,
    arrays: Counters,
    strings: Counters,
}

static REGISTRY: LazyLock<HandleRegistry> = LazyLock::new(HandleRegistry::new);

/// The process-wide registry used by the C ABI.
pub fn registry() -> &'static HandleRegistry {
    &REGISTRY
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self {
            live: DashMap::new(),
            arrays: Counters::default(),
            strings: Counters::default(),
        }
    }

    fn counters(&self, kind: HandleKind) -> &Counters {
        match kind {
            HandleKind::Array => &self.arrays,
            HandleKind::String => &self.strings,
        }
    }

    pub fn register<T>(&self, handle: *const T, kind: HandleKind) {
        self.live.insert(handle as usize, kind);
        let counters = self.counters(kind);
        let registered = counters.registered.fetch_add(1, Ordering::Relaxed) + 1;
        let live = registered - counters.released.load(Ordering::Relaxed);
        counters.peak_live.fetch_max(live, Ordering::Relaxed);
    }

    /// Drop `handle` from the table. Returns whether it was live.
    pub fn unregister<T>(&self, handle: *const T, kind: HandleKind) -> bool {
        let removed = self
            .live
            .remove_if(&(handle as usize), |_, live_kind| *live_kind == kind)
            .is_some();
        if removed {
            self.counters(kind).released.fetch_add(1, Ordering::Relaxed);
        }
        removed
    }

    pub fn is_live<T>(&self, handle: *const T, kind: HandleKind) -> bool {
        self.live
            .get(&(handle as usize))
            .is_some_and(|live_kind| *live_kind == kind)
    }

    /// Whether an entry point may dereference `handle`.
    ///
    /// Always true when handle checking is turned off.
    pub fn admits<T>(&self, handle: *const T, kind: HandleKind) -> bool {
        !RuntimeConfig::global().check_handles || self.is_live(handle, kind)
    }

    pub fn stats(&self, kind: HandleKind) -> HandleStats {
        self.counters(kind).snapshot()
    }

    pub fn live_count(&self, kind: HandleKind) -> usize {
        self.live.iter().filter(|entry| *entry.value() == kind).count()
    }
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_release() {
        let registry = HandleRegistry::new();
        let value = 5u32;
        let handle: *const u32 = &value;

        registry.register(handle, HandleKind::Array);
        assert!(registry.is_live(handle, HandleKind::Array));
        assert!(!registry.is_live(handle, HandleKind::String));
        assert_eq!(registry.live_count(HandleKind::Array), 1);

        assert!(registry.unregister(handle, HandleKind::Array));
        assert!(!registry.unregister(handle, HandleKind::Array));
        assert!(!registry.is_live(handle, HandleKind::Array));
        assert_eq!(registry.live_count(HandleKind::Array), 0);
    }

    #[test]
    fn test_kind_mismatch_does_not_release() {
        let registry = HandleRegistry::new();
        let value = 1u8;
        let handle: *const u8 = &value;

        registry.register(handle, HandleKind::String);
        assert!(!registry.unregister(handle, HandleKind::Array));
        assert!(registry.is_live(handle, HandleKind::String));
    }

    #[test]
    fn test_stats() {
        let registry = HandleRegistry::new();
        let values = [0u64; 3];

        for value in &values {
            registry.register(value as *const u64, HandleKind::String);
        }
        registry.unregister(&values[0] as *const u64, HandleKind::String);
        registry.unregister(&values[0] as *const u64, HandleKind::String);

        let stats = registry.stats(HandleKind::String);
        assert_eq!(
            stats,
            HandleStats {
                registered: 3,
                released: 1,
                peak_live: 3,
            }
        );
        assert_eq!(stats.live(), 2);
        assert_eq!(registry.stats(HandleKind::Array), HandleStats::default());
    }
}
