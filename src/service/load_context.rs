//! Per-call-chain load nesting.
//!
//! A [`LoadContext`] travels by value through every load, import and change
//! call made on behalf of one top-level operation. Unrelated operations on
//! other threads carry their own context, so one thread's import load never
//! silences another thread's broadcasts.

/// Nesting depth of the current call chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadContext {
    load_depth: u32,
}

impl LoadContext {
    /// Context of a top-level call: no load in progress.
    #[must_use]
    pub const fn root() -> Self {
        Self { load_depth: 0 }
    }

    /// Context for the body of a load started from `self`.
    #[must_use]
    pub const fn enter_load(self) -> Self {
        Self {
            load_depth: self.load_depth.saturating_add(1),
        }
    }

    /// Returns `true` while inside a load; change broadcasts are
    /// suppressed then.
    #[must_use]
    pub const fn is_loading(self) -> bool {
        self.load_depth > 0
    }

    /// Current load depth.
    #[must_use]
    pub const fn load_depth(self) -> u32 {
        self.load_depth
    }
}
