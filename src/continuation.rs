//! What a [`Promise::then`] handler may return.
//!
//! A handler either returns nothing, in which case the chain carries the same
//! value on, or it returns another promise with the same error type, whose
//! settlement becomes the settlement of the chain. The trait is sealed; `()`
//! and [`Promise`] are the only implementors.
use crate::{Promise, Rejecter, Resolver};

mod sealed {
    pub trait Sealed {}

    impl Sealed for () {}
    impl<U, E> Sealed for crate::Promise<U, E> {}
}

pub trait Continuation<T, E>: sealed::Sealed + Sized + 'static {
    /// The value type of the promise `then` returns.
    type Value: Send + Sync + 'static;

    /// The handle `then` returns when the handler ran on an already resolved
    /// promise.
    fn resolved(self, upstream: &Promise<T, E>) -> Promise<Self::Value, E>;

    /// The handle `then` returns when the handler was skipped because
    /// `upstream` failed with `error`.
    fn skipped(upstream: &Promise<T, E>, error: E) -> Promise<Self::Value, E>;

    /// Settles the downstream link once the handler has run on a value that
    /// arrived after `then` was called.
    fn forward(
        self,
        value: &T,
        resolve: Resolver<Self::Value, E>,
        reject: Rejecter<Self::Value, E>,
    );
}

impl<T, E> Continuation<T, E> for ()
where
    T: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    type Value = T;

    fn resolved(self, upstream: &Promise<T, E>) -> Promise<T, E> {
        upstream.clone()
    }

    fn skipped(upstream: &Promise<T, E>, _error: E) -> Promise<T, E> {
        upstream.clone()
    }

    fn forward(self, value: &T, resolve: Resolver<T, E>, _reject: Rejecter<T, E>) {
        // The downstream link is only reachable from here, so this is its
        // first settlement.
        let _ = resolve.resolve(value.clone());
    }
}

impl<T, U, E> Continuation<T, E> for Promise<U, E>
where
    U: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    type Value = U;

    fn resolved(self, _upstream: &Promise<T, E>) -> Promise<U, E> {
        self
    }

    fn skipped(_upstream: &Promise<T, E>, error: E) -> Promise<U, E> {
        Promise::rejected(error)
    }

    fn forward(self, _value: &T, resolve: Resolver<U, E>, reject: Rejecter<U, E>) {
        log::trace!("flattening nested promise into its chain");
        self.pipe(resolve, reject);
    }
}
