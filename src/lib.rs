//! A thread-safe promise that is settled exactly once.
//!
//! A [`Promise`] starts out pending and is settled by a producer, from any
//! thread, either to a value or to an error. Handlers can be attached before
//! or after settlement with [`Promise::then`], [`Promise::failed`] and
//! [`Promise::finally`]; a handler that returns another promise is flattened
//! into the chain.
//!
//! # Examples
//!
//! ```
//! use settle::Promise;
//! use std::{thread, time::Duration};
//!
//! let promise = Promise::<u32>::new(|resolve, _reject| {
//!     thread::spawn(move || {
//!         thread::sleep(Duration::from_millis(10));
//!         let _ = resolve.resolve(21);
//!     });
//! });
//!
//! let doubled = promise.then(|value| Promise::<u32>::resolved(value * 2));
//! doubled.wait();
//! assert_eq!(doubled.value(), Some(42));
//! ```
mod cell;
mod continuation;
mod promise;
mod settler;
mod waiter;

pub use continuation::Continuation;
pub use promise::Promise;
pub use settler::{Rejecter, Resolver};
pub use waiter::Waiter;

use std::fmt;

/// Where a promise is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ongoing,
    Resolved,
    Rejected,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ongoing => f.write_str("ongoing"),
            Status::Resolved => f.write_str("resolved"),
            Status::Rejected => f.write_str("rejected"),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// `resolve` or `reject` was called on a promise that had already settled.
    #[error("promise is already settled")]
    AlreadySettled,
}
