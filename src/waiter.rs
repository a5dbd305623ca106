//! Awaiting a promise from async code.
use crate::cell::{Cell, State};
use std::{
    fmt::{self, Debug, Formatter},
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

/// Completes with `Ok(value)` or `Err(error)` once the promise settles.
///
/// Any number of waiters can watch the same promise; each one gets its own
/// clone of the outcome.
///
/// # Examples
///
/// ```
/// use settle::Promise;
/// use futures::executor::block_on;
/// use std::thread;
///
/// let (promise, resolve, _reject) = Promise::<String>::pending();
/// let task = thread::spawn(move || block_on(async { promise.await }));
/// resolve.resolve("🍓".into()).unwrap();
/// assert_eq!(task.join().expect("The task thread has panicked"), Ok("🍓".into()));
/// ```
pub struct Waiter<T, E = String> {
    cell: Arc<Cell<T, E>>,
}

impl<T, E> Waiter<T, E> {
    pub(crate) fn new(cell: Arc<Cell<T, E>>) -> Self {
        Self { cell }
    }
}

impl<T, E> Future for Waiter<T, E>
where
    T: Clone,
    E: Clone,
{
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.cell.poll_settled(cx.waker()) {
            State::Ongoing => Poll::Pending,
            State::Resolved(value) => Poll::Ready(Ok((*value).clone())),
            State::Rejected(error) => Poll::Ready(Err((*error).clone())),
        }
    }
}

impl<T, E> Clone for Waiter<T, E> {
    fn clone(&self) -> Self {
        Self { cell: self.cell.clone() }
    }
}

impl<T, E> Debug for Waiter<T, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Waiter").field("status", &self.cell.status()).finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::Promise;
    use futures::executor::block_on;
    use std::{future::IntoFuture, thread, time::Duration};

    #[test]
    fn test_waiter_resolve() {
        let (promise, resolve, _reject) = Promise::<String>::pending();
        let task1 = thread::spawn(move || block_on(async { promise.await }));
        let task2 = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            resolve.resolve(String::from("🍓")).unwrap();
        });
        task2.join().expect("The task2 thread has panicked");
        assert_eq!(task1.join().expect("The task1 thread has panicked"), Ok("🍓".to_string()));
    }

    #[test]
    fn test_two_waiters_resolve() {
        let (promise, resolve, _reject) = Promise::<String>::pending();
        let op_a = promise.waiter();
        let op_b = promise.waiter();
        let task1 = thread::spawn(move || block_on(op_a));
        let task2 = thread::spawn(move || block_on(op_b));
        let task3 = thread::spawn(move || resolve.resolve(String::from("🍓")).unwrap());
        task3.join().expect("The task3 thread has panicked");
        assert_eq!(task1.join().expect("The task1 thread has panicked"), Ok("🍓".to_string()));
        assert_eq!(task2.join().expect("The task2 thread has panicked"), Ok("🍓".to_string()));
    }

    #[test]
    fn test_waiter_reject() {
        let (promise, _resolve, reject) = Promise::<u8>::pending();
        let task1 = thread::spawn(move || block_on(promise.waiter()));
        let task2 = thread::spawn(move || reject.reject(String::from("reject!!")).unwrap());
        task2.join().expect("The task2 thread has panicked");
        assert_eq!(
            task1.join().expect("The task1 thread has panicked"),
            Err("reject!!".to_string())
        );
    }

    #[test]
    fn test_waiter_on_settled_promise() {
        assert_eq!(block_on(Promise::<u8, i32>::resolved(4).waiter()), Ok(4));
        assert_eq!(block_on(Promise::<u8, i32>::rejected(-2).into_future()), Err(-2));
    }
}
