use crate::{
    cell::{Cell, State},
    Continuation, Rejecter, Resolver, Status, Waiter,
};
use std::{
    fmt::{self, Debug, Formatter},
    future::IntoFuture,
    sync::Arc,
    time::Duration,
};

/// A handle to a value that is settled exactly once, to `T` on success or to
/// `E` on failure.
///
/// Cloning a `Promise` shares its settlement: every clone observes the same
/// outcome.
///
/// # Examples
///
/// ```
/// use settle::Promise;
/// use std::sync::mpsc::channel;
///
/// let (tx, rx) = channel();
/// Promise::<String, i32>::rejected(20)
///     .then(|value| println!("never printed: {value}"))
///     .failed(move |error| tx.send(*error).unwrap());
/// assert_eq!(rx.recv().unwrap(), 20);
/// ```
pub struct Promise<T, E = String> {
    cell: Arc<Cell<T, E>>,
}

impl<T, E> Promise<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Creates a pending promise and hands its settlement functions to
    /// `producer`, which runs before `new` returns. The producer may settle
    /// right away, move the functions to another thread, or drop them.
    ///
    /// # Examples
    ///
    /// ```
    /// use settle::Promise;
    ///
    /// let promise = Promise::<i32>::new(|resolve, _reject| {
    ///     let _ = resolve.resolve(10);
    /// });
    /// assert_eq!(promise.value(), Some(10));
    /// ```
    pub fn new<P>(producer: P) -> Self
    where
        P: FnOnce(Resolver<T, E>, Rejecter<T, E>),
    {
        let (promise, resolve, reject) = Self::pending();
        producer(resolve, reject);
        promise
    }

    /// Creates a pending promise together with its settlement functions.
    pub fn pending() -> (Self, Resolver<T, E>, Rejecter<T, E>) {
        let cell = Arc::new(Cell::new());
        log::trace!("created pending promise");
        (
            Self::from_cell(cell.clone()),
            Resolver::new(cell.clone()),
            Rejecter::new(cell),
        )
    }

    pub fn resolved(value: T) -> Self {
        Self::from_cell(Arc::new(Cell::resolved(value)))
    }

    pub fn rejected(error: E) -> Self {
        Self::from_cell(Arc::new(Cell::rejected(error)))
    }

    fn from_cell(cell: Arc<Cell<T, E>>) -> Self {
        Self { cell }
    }

    /// Runs `on_settled` once the promise leaves the pending state, whichever
    /// way it settles. Runs immediately if it already has.
    ///
    /// Callbacks queued on a pending promise run in the order they were
    /// added, and `finally` callbacks run after every `then` and `failed`
    /// callback of the same promise.
    pub fn finally<F>(&self, on_settled: F) -> &Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.cell.on_finally(on_settled);
        self
    }

    /// Blocks the calling thread until the promise settles.
    ///
    /// Must not be called from a producer before it settles this promise.
    pub fn wait(&self) -> &Self {
        self.cell.wait();
        self
    }

    /// Blocks until the promise settles or `timeout` elapses, and returns
    /// whether it settled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.cell.wait_timeout(timeout)
    }

    pub fn status(&self) -> Status {
        self.cell.status()
    }

    pub fn is_settled(&self) -> bool {
        self.status() != Status::Ongoing
    }

    /// An awaitable view of the promise.
    pub fn waiter(&self) -> Waiter<T, E> {
        Waiter::new(self.cell.clone())
    }
}

impl<T, E> Promise<T, E>
where
    T: Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Chains `on_fulfilled` onto the promise.
    ///
    /// The handler receives the value once the promise resolves and returns
    /// either `()` or another promise with the same error type:
    ///
    /// * returning `()` yields a promise that resolves with the same value;
    /// * returning a `Promise<U, E>` yields a promise that settles the way the
    ///   returned one does, so nested promises never pile up.
    ///
    /// If the promise is already resolved the handler runs right away on the
    /// calling thread. If it failed, the handler never runs and the error is
    /// carried to the returned promise.
    ///
    /// # Examples
    ///
    /// ```
    /// use settle::Promise;
    ///
    /// let length = Promise::<String>::resolved("hello".into())
    ///     .then(|text| Promise::<usize>::resolved(text.len()));
    /// assert_eq!(length.value(), Some(5));
    /// ```
    pub fn then<F, R>(&self, on_fulfilled: F) -> Promise<R::Value, E>
    where
        F: FnOnce(&T) -> R + Send + 'static,
        R: Continuation<T, E>,
    {
        match self.cell.state() {
            State::Rejected(error) => R::skipped(self, (*error).clone()),
            State::Resolved(value) => on_fulfilled(&*value).resolved(self),
            State::Ongoing => {
                let (downstream, resolve, reject) = Promise::pending();
                let forward_reject = reject.clone();
                self.cell
                    .on_resolve(move |value| on_fulfilled(value).forward(value, resolve, reject));
                self.cell.on_reject(move |error| {
                    let _ = forward_reject.reject(error.clone());
                });
                downstream
            }
        }
    }

    /// Runs `on_rejected` with the error if the promise fails. Runs
    /// immediately if it already has.
    pub fn failed<F>(&self, on_rejected: F) -> &Self
    where
        F: FnOnce(&E) + Send + 'static,
    {
        self.cell.on_reject(on_rejected);
        self
    }

    /// Settles the given link the same way this promise settles.
    pub(crate) fn pipe(&self, resolve: Resolver<T, E>, reject: Rejecter<T, E>)
    where
        T: Clone,
    {
        self.cell.on_resolve(move |value| {
            let _ = resolve.resolve(value.clone());
        });
        self.cell.on_reject(move |error| {
            let _ = reject.reject(error.clone());
        });
    }
}

impl<T, E> Promise<T, E> {
    /// A clone of the value, if the promise resolved.
    pub fn value(&self) -> Option<T>
    where
        T: Clone,
    {
        self.cell.value().map(|value| (*value).clone())
    }

    /// A clone of the error, if the promise failed.
    pub fn error(&self) -> Option<E>
    where
        E: Clone,
    {
        self.cell.error().map(|error| (*error).clone())
    }
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Self { cell: self.cell.clone() }
    }
}

impl<T, E> Debug for Promise<T, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise").field("status", &self.cell.status()).finish()
    }
}

impl<T, E> IntoFuture for Promise<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    type Output = Result<T, E>;
    type IntoFuture = Waiter<T, E>;

    fn into_future(self) -> Self::IntoFuture {
        Waiter::new(self.cell)
    }
}

#[cfg(test)]
mod tests {
    use super::Promise;
    use crate::Status;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_then_unit_on_resolved_returns_same_promise() {
        let promise = Promise::<u8>::resolved(3);
        let next = promise.then(|_| ());
        assert!(Arc::ptr_eq(&promise.cell, &next.cell));
    }

    #[test]
    fn test_then_unit_on_rejected_returns_same_promise() {
        let promise = Promise::<u8, i32>::rejected(-4);
        let next = promise.then(|_| ());
        assert!(Arc::ptr_eq(&promise.cell, &next.cell));
    }

    #[test]
    fn test_then_nested_on_resolved_returns_nested_promise() {
        let nested = Promise::<String>::resolved("y".into());
        let inner = nested.clone();
        let next = Promise::<u8>::resolved(3).then(move |_| inner);
        assert!(Arc::ptr_eq(&nested.cell, &next.cell));
    }

    #[test]
    fn test_then_nested_on_rejected_synthesizes_rejection() {
        let called = Arc::new(Mutex::new(false));
        let flag = called.clone();
        let next = Promise::<u8, i32>::rejected(7).then(move |value| {
            *flag.lock().unwrap() = true;
            Promise::<String, i32>::resolved(value.to_string())
        });
        assert!(!*called.lock().unwrap());
        assert_eq!(next.status(), Status::Rejected);
        assert_eq!(next.error(), Some(7));
    }

    #[test]
    fn test_then_on_pending_allocates_new_link() {
        let (promise, resolve, _reject) = Promise::<u8>::pending();
        let next = promise.then(|_| ());
        assert!(!Arc::ptr_eq(&promise.cell, &next.cell));
        assert_eq!(next.status(), Status::Ongoing);
        resolve.resolve(8).unwrap();
        assert_eq!(next.value(), Some(8));
    }

    #[test]
    fn test_debug() {
        assert_eq!(format!("{:?}", Promise::<u8>::resolved(1)), "Promise { status: Resolved }");
        let (promise, _resolve, _reject) = Promise::<u8>::pending();
        assert_eq!(format!("{:?}", promise), "Promise { status: Ongoing }");
    }
}
