//! The shared state behind one link of a promise chain.
//!
//! Every operation takes the guard only long enough to read or flip the
//! state and to queue or drain callbacks. User callbacks always run after the
//! guard has been released, so a callback may freely attach more handlers to,
//! or wait on, the cell that invoked it.
use crate::{Error, Status};
use std::{
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    task::Waker,
    time::{Duration, Instant},
};

pub(crate) type ResolveCallback<T> = Box<dyn FnOnce(&T) + Send>;
pub(crate) type RejectCallback<E> = Box<dyn FnOnce(&E) + Send>;
pub(crate) type FinallyCallback = Box<dyn FnOnce() + Send>;

/// Settlement state. The payload lives behind an `Arc` so it can be handed to
/// callbacks without holding the guard.
#[derive(Debug)]
pub(crate) enum State<T, E> {
    Ongoing,
    Resolved(Arc<T>),
    Rejected(Arc<E>),
}

impl<T, E> State<T, E> {
    pub(crate) fn status(&self) -> Status {
        match self {
            State::Ongoing => Status::Ongoing,
            State::Resolved(_) => Status::Resolved,
            State::Rejected(_) => Status::Rejected,
        }
    }
}

impl<T, E> Clone for State<T, E> {
    fn clone(&self) -> Self {
        match self {
            State::Ongoing => State::Ongoing,
            State::Resolved(value) => State::Resolved(value.clone()),
            State::Rejected(error) => State::Rejected(error.clone()),
        }
    }
}

struct Inner<T, E> {
    state: State<T, E>,
    resolve_callbacks: Vec<ResolveCallback<T>>,
    reject_callbacks: Vec<RejectCallback<E>>,
    finally_callbacks: Vec<FinallyCallback>,
    wakers: Vec<Waker>,
}

/// Everything queued on a cell at the moment it settled.
struct Drained<T, E> {
    resolve_callbacks: Vec<ResolveCallback<T>>,
    reject_callbacks: Vec<RejectCallback<E>>,
    finally_callbacks: Vec<FinallyCallback>,
}

impl<T, E> Drained<T, E> {
    /// Runs the branch matching `state`, then the finally callbacks. The
    /// other branch is dropped unrun.
    fn dispatch(self, state: &State<T, E>) {
        match state {
            State::Resolved(value) => {
                for callback in self.resolve_callbacks {
                    callback(&**value);
                }
            }
            State::Rejected(error) => {
                for callback in self.reject_callbacks {
                    callback(&**error);
                }
            }
            State::Ongoing => unreachable!("dispatching an unsettled cell"),
        }
        for callback in self.finally_callbacks {
            callback();
        }
    }
}

/// Releases blocked and async waiters when dropped, so they are woken after
/// the callbacks ran, or while a panicking callback unwinds.
struct Wakeup<'a> {
    signal: &'a Condvar,
    wakers: Vec<Waker>,
}

impl Drop for Wakeup<'_> {
    fn drop(&mut self) {
        self.signal.notify_all();
        for waker in self.wakers.drain(..) {
            waker.wake();
        }
    }
}

pub(crate) struct Cell<T, E> {
    inner: Mutex<Inner<T, E>>,
    /// Paired with `inner`, so a settlement can never slip between a waiter's
    /// status check and its sleep.
    signal: Condvar,
}

impl<T, E> Cell<T, E> {
    pub(crate) fn new() -> Self {
        Self::with_state(State::Ongoing)
    }

    pub(crate) fn resolved(value: T) -> Self {
        Self::with_state(State::Resolved(Arc::new(value)))
    }

    pub(crate) fn rejected(error: E) -> Self {
        Self::with_state(State::Rejected(Arc::new(error)))
    }

    fn with_state(state: State<T, E>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state,
                resolve_callbacks: Vec::new(),
                reject_callbacks: Vec::new(),
                finally_callbacks: Vec::new(),
                wakers: Vec::new(),
            }),
            signal: Condvar::new(),
        }
    }

    // No user code runs under the guard, so a poisoned lock still holds a
    // consistent state.
    fn lock(&self) -> MutexGuard<'_, Inner<T, E>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn state(&self) -> State<T, E> {
        self.lock().state.clone()
    }

    pub(crate) fn status(&self) -> Status {
        self.lock().state.status()
    }

    pub(crate) fn value(&self) -> Option<Arc<T>> {
        match &self.lock().state {
            State::Resolved(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub(crate) fn error(&self) -> Option<Arc<E>> {
        match &self.lock().state {
            State::Rejected(error) => Some(error.clone()),
            _ => None,
        }
    }

    pub(crate) fn resolve(&self, value: T) -> Result<(), Error> {
        self.settle(State::Resolved(Arc::new(value)))
    }

    pub(crate) fn reject(&self, error: E) -> Result<(), Error> {
        self.settle(State::Rejected(Arc::new(error)))
    }

    fn settle(&self, settled: State<T, E>) -> Result<(), Error> {
        let mut inner = self.lock();
        if !matches!(inner.state, State::Ongoing) {
            log::debug!(
                "ignoring {} of a promise that is already {}",
                settled.status(),
                inner.state.status()
            );
            return Err(Error::AlreadySettled);
        }

        inner.state = settled.clone();
        let drained = Drained {
            resolve_callbacks: std::mem::take(&mut inner.resolve_callbacks),
            reject_callbacks: std::mem::take(&mut inner.reject_callbacks),
            finally_callbacks: std::mem::take(&mut inner.finally_callbacks),
        };
        let _wakeup = Wakeup {
            signal: &self.signal,
            wakers: std::mem::take(&mut inner.wakers),
        };
        drop(inner);

        log::trace!(
            "promise {}, dispatching {} callbacks",
            settled.status(),
            drained.resolve_callbacks.len()
                + drained.reject_callbacks.len()
                + drained.finally_callbacks.len()
        );
        drained.dispatch(&settled);
        Ok(())
    }

    /// Queues `callback` for a future resolution, or runs it right away if
    /// the cell is already resolved. Dropped if the cell was rejected.
    pub(crate) fn on_resolve<F>(&self, callback: F)
    where
        F: FnOnce(&T) + Send + 'static,
    {
        let mut inner = self.lock();
        match inner.state.clone() {
            State::Ongoing => inner.resolve_callbacks.push(Box::new(callback)),
            State::Resolved(value) => {
                drop(inner);
                callback(&*value);
            }
            State::Rejected(_) => {}
        }
    }

    /// Queues `callback` for a future rejection, or runs it right away if the
    /// cell is already rejected. Dropped if the cell was resolved.
    pub(crate) fn on_reject<F>(&self, callback: F)
    where
        F: FnOnce(&E) + Send + 'static,
    {
        let mut inner = self.lock();
        match inner.state.clone() {
            State::Ongoing => inner.reject_callbacks.push(Box::new(callback)),
            State::Rejected(error) => {
                drop(inner);
                callback(&*error);
            }
            State::Resolved(_) => {}
        }
    }

    pub(crate) fn on_finally<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut inner = self.lock();
        if let State::Ongoing = inner.state {
            inner.finally_callbacks.push(Box::new(callback));
        } else {
            drop(inner);
            callback();
        }
    }

    /// Returns the settled state, or registers `waker` and returns
    /// `State::Ongoing`.
    ///
    /// Wakers are only released on settlement, so those of dropped or re-polled
    /// waiters stay queued for as long as the cell is pending.
    pub(crate) fn poll_settled(&self, waker: &Waker) -> State<T, E> {
        let mut inner = self.lock();
        if let State::Ongoing = inner.state {
            if !inner.wakers.iter().any(|known| known.will_wake(waker)) {
                inner.wakers.push(waker.clone());
            }
        }
        inner.state.clone()
    }

    pub(crate) fn wait(&self) {
        let mut inner = self.lock();
        while let State::Ongoing = inner.state {
            inner = self.signal.wait(inner).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Waits until the cell settles or `timeout` elapses. Returns whether the
    /// cell is settled.
    pub(crate) fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut inner = self.lock();
        if !matches!(inner.state, State::Ongoing) {
            return true;
        }
        // A deadline past what `Instant` can hold means no deadline at all.
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            drop(inner);
            self.wait();
            return true;
        };

        while let State::Ongoing = inner.state {
            let remaining = deadline.checked_duration_since(Instant::now()).unwrap_or_default();
            if remaining.is_zero() {
                return false;
            }
            let (guard, _) = self
                .signal
                .wait_timeout(inner, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            inner = guard;
        }
        true
    }
}
