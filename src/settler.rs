//! The two functions handed to a producer.
//!
//! Both are cheap to clone and can be moved to any thread. Only the first
//! settlement of a promise takes effect; later calls report
//! [`Error::AlreadySettled`] and leave the promise untouched.
use crate::{cell::Cell, Error};
use std::{
    fmt::{self, Debug, Formatter},
    sync::Arc,
};

/// Settles a promise with a value.
///
/// # Examples
///
/// ```
/// use settle::{Error, Promise};
///
/// let (promise, resolve, _reject) = Promise::<&str>::pending();
/// assert_eq!(resolve.resolve("first"), Ok(()));
/// assert_eq!(resolve.resolve("second"), Err(Error::AlreadySettled));
/// assert_eq!(promise.value(), Some("first"));
/// ```
pub struct Resolver<T, E = String> {
    cell: Arc<Cell<T, E>>,
}

impl<T, E> Resolver<T, E> {
    pub(crate) fn new(cell: Arc<Cell<T, E>>) -> Self {
        Self { cell }
    }

    pub fn resolve(&self, value: T) -> Result<(), Error> {
        self.cell.resolve(value)
    }
}

impl<T, E> Clone for Resolver<T, E> {
    fn clone(&self) -> Self {
        Self { cell: self.cell.clone() }
    }
}

impl<T, E> Debug for Resolver<T, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver").field("status", &self.cell.status()).finish()
    }
}

/// Settles a promise with an error.
pub struct Rejecter<T, E = String> {
    cell: Arc<Cell<T, E>>,
}

impl<T, E> Rejecter<T, E> {
    pub(crate) fn new(cell: Arc<Cell<T, E>>) -> Self {
        Self { cell }
    }

    pub fn reject(&self, error: E) -> Result<(), Error> {
        self.cell.reject(error)
    }
}

impl<T, E> Clone for Rejecter<T, E> {
    fn clone(&self) -> Self {
        Self { cell: self.cell.clone() }
    }
}

impl<T, E> Debug for Rejecter<T, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejecter").field("status", &self.cell.status()).finish()
    }
}
