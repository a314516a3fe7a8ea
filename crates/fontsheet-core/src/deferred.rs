// Copyright (c) 2023 the Fontsheet contributors.
// SPDX-License-Identifier: AGPL-3.0-or-later
//
// This file is part of Fontsheet.
//
// Fontsheet is free software: you can redistribute it and/or modify it under
// the terms of the GNU Affero General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Fontsheet is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more
// details.
//
// You should have received a copy of the GNU Affero General Public License
// along with Fontsheet. If not, see <https://www.gnu.org/licenses/>.

//! A cancellable, settle-once result cell.
//!
//! A [Deferred] starts out pending and settles exactly once: to done with a
//! value, to rejected with an error, or to canceled. Whatever settles first
//! wins and later settle calls are ignored. Any clone of the handle may
//! settle it or wait on it.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

/// The observable state of a [Deferred].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeferredState {
    Pending,
    Done,
    Canceled,
    Rejected,
}

/// How a [Deferred] settled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome<T, E> {
    Done(T),
    Canceled,
    Rejected(E),
}

impl<T, E> Outcome<T, E> {
    pub fn state(&self) -> DeferredState {
        match self {
            Outcome::Done(_) => DeferredState::Done,
            Outcome::Canceled => DeferredState::Canceled,
            Outcome::Rejected(_) => DeferredState::Rejected,
        }
    }
}

struct Inner<T, E> {
    outcome: Mutex<Option<Outcome<T, E>>>,
    settled: Notify,
}

pub struct Deferred<T, E> {
    inner: Arc<Inner<T, E>>,
}

impl<T, E> Clone for Deferred<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T, E> Default for Deferred<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> std::fmt::Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred")
            .field("state", &self.state())
            .finish()
    }
}

impl<T, E> Deferred<T, E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                outcome: Mutex::new(None),
                settled: Notify::new(),
            }),
        }
    }

    pub fn state(&self) -> DeferredState {
        self.inner
            .outcome
            .lock()
            .as_ref()
            .map(Outcome::state)
            .unwrap_or(DeferredState::Pending)
    }

    pub fn is_pending(&self) -> bool {
        self.state() == DeferredState::Pending
    }

    pub fn is_canceled(&self) -> bool {
        self.state() == DeferredState::Canceled
    }

    /// Whether two handles refer to the same deferred result.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Settles to done. Returns `false` if already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Outcome::Done(value))
    }

    /// Settles to rejected. Returns `false` if already settled.
    pub fn reject(&self, error: E) -> bool {
        self.settle(Outcome::Rejected(error))
    }

    /// Settles to canceled. Returns `false` if already settled.
    pub fn cancel(&self) -> bool {
        self.settle(Outcome::Canceled)
    }

    fn settle(&self, outcome: Outcome<T, E>) -> bool {
        let mut slot = self.inner.outcome.lock();
        if slot.is_some() {
            return false;
        }

        *slot = Some(outcome);
        drop(slot);
        self.inner.settled.notify_waiters();
        true
    }
}

impl<T: Clone, E: Clone> Deferred<T, E> {
    /// The outcome, if settled.
    pub fn outcome(&self) -> Option<Outcome<T, E>> {
        self.inner.outcome.lock().clone()
    }

    /// Waits until settled.
    pub async fn wait(&self) -> Outcome<T, E> {
        loop {
            // register before checking so a settle in between is not missed
            let settled = self.inner.settled.notified();

            if let Some(outcome) = self.outcome() {
                return outcome;
            }

            settled.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestDeferred = Deferred<u32, String>;

    #[test]
    fn starts_pending() {
        let deferred = TestDeferred::new();
        assert_eq!(deferred.state(), DeferredState::Pending);
        assert_eq!(deferred.outcome(), None);
    }

    #[test]
    fn resolve_is_final() {
        let deferred = TestDeferred::new();
        assert!(deferred.resolve(1));
        assert!(!deferred.resolve(2));
        assert!(!deferred.reject("late".into()));
        assert!(!deferred.cancel());
        assert_eq!(deferred.outcome(), Some(Outcome::Done(1)));
    }

    #[test]
    fn reject_is_final() {
        let deferred = TestDeferred::new();
        assert!(deferred.reject("bad".into()));
        assert!(!deferred.resolve(1));
        assert_eq!(deferred.state(), DeferredState::Rejected);
    }

    #[test]
    fn cancel_suppresses_settle() {
        let deferred = TestDeferred::new();
        assert!(deferred.cancel());
        assert!(!deferred.resolve(1));
        assert!(!deferred.reject("bad".into()));
        assert_eq!(deferred.outcome(), Some(Outcome::Canceled));
    }

    #[test]
    fn clones_share_state() {
        let a = TestDeferred::new();
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&TestDeferred::new()));

        b.resolve(7);
        assert_eq!(a.outcome(), Some(Outcome::Done(7)));
    }

    #[tokio::test]
    async fn wait_sees_later_resolve() {
        let deferred = TestDeferred::new();
        let settler = deferred.clone();

        let (outcome, _) = tokio::join!(deferred.wait(), async move {
            tokio::task::yield_now().await;
            settler.resolve(3);
        });

        assert_eq!(outcome, Outcome::Done(3));
    }

    #[tokio::test]
    async fn wait_after_cancel() {
        let deferred = TestDeferred::new();
        deferred.cancel();
        assert_eq!(deferred.wait().await, Outcome::Canceled);
    }
}
