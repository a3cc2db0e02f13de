// ── Single-fire completion and deferred actions ──
//
// Building blocks for resolving a racing operation exactly once: whoever
// calls `Completion::complete` first wins, every later attempt is a no-op.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A completion slot that accepts exactly one value.
///
/// Shared between competing resolvers (normal exit, timer, cancellation)
/// behind an `Arc`. The first `complete` call delivers its value to the
/// paired receiver; later calls return `false` and drop their value.
#[derive(Debug)]
pub struct Completion<T> {
    fired: AtomicBool,
    sender: Mutex<Option<oneshot::Sender<T>>>,
}

impl<T> Completion<T> {
    /// Create a slot together with the receiver its single value goes to.
    pub fn channel() -> (Arc<Self>, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        let completion = Arc::new(Self {
            fired: AtomicBool::new(false),
            sender: Mutex::new(Some(tx)),
        });
        (completion, rx)
    }

    /// Resolve the slot. Returns `true` only for the winning call.
    pub fn complete(&self, value: T) -> bool {
        if self
            .fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(tx) = sender {
            // Receiver may be gone; the slot is still spent.
            let _ = tx.send(value);
        }
        true
    }

    pub fn is_complete(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

/// An action scheduled to run after a delay unless cancelled first.
///
/// Cancelling is idempotent and also happens on drop, so an abandoned
/// timer never fires late.
#[derive(Debug)]
pub struct DeferredAction {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl DeferredAction {
    pub fn schedule<F>(delay: Duration, action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {}
                () = tokio::time::sleep(delay) => action(),
            }
        });
        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Prevent the action from running. No-op if it already ran or was
    /// already cancelled.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancel and wait until the timer task has fully stopped.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for DeferredAction {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn second_completion_is_discarded() {
        let (completion, rx) = Completion::channel();
        assert!(completion.complete("first"));
        assert!(!completion.complete("second"));
        assert!(completion.is_complete());
        assert_eq!(rx.await.unwrap(), "first");
    }

    #[test]
    fn receiver_wakes_on_completion() {
        let (completion, rx) = Completion::channel();
        let mut rx = tokio_test::task::spawn(rx);
        tokio_test::assert_pending!(rx.poll());

        assert!(completion.complete(7));
        assert!(rx.is_woken());
        assert_eq!(tokio_test::assert_ready!(rx.poll()).unwrap(), 7);
    }

    #[tokio::test]
    async fn completion_without_receiver_still_counts() {
        let (completion, rx) = Completion::channel();
        drop(rx);
        assert!(completion.complete(1));
        assert!(!completion.complete(2));
    }

    #[tokio::test(start_paused = true)]
    async fn deferred_action_fires_after_delay() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let action = DeferredAction::schedule(Duration::from_secs(5), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        // cancelling after it fired is a no-op
        action.cancel();
        action.shutdown().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_action_never_fires() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let action = DeferredAction::schedule(Duration::from_secs(5), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        action.cancel();
        action.cancel();
        action.shutdown().await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_action_never_fires() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        drop(DeferredAction::schedule(Duration::from_secs(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    proptest::proptest! {
        #![proptest_config(proptest::prelude::ProptestConfig::with_cases(64))]

        /// A normal exit racing its own timeout resolves exactly once,
        /// whatever the relative timing.
        #[test]
        fn proptest_race_resolves_exactly_once(exit_us in 0u64..400, timeout_us in 0u64..400) {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_time()
                .build()
                .unwrap();

            let (wins, value) = runtime.block_on(async move {
                let (completion, rx) = Completion::channel();

                let timer_slot = Arc::clone(&completion);
                let timer = DeferredAction::schedule(Duration::from_micros(timeout_us), move || {
                    timer_slot.complete("timeout");
                });

                let exit_slot = Arc::clone(&completion);
                let exit = tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_micros(exit_us)).await;
                    exit_slot.complete("exit")
                });

                let exit_won = exit.await.unwrap();
                timer.shutdown().await;
                let timer_won = completion.is_complete() && !exit_won;
                let value = rx.await.unwrap();
                (usize::from(exit_won) + usize::from(timer_won), value)
            });

            proptest::prop_assert_eq!(wins, 1);
            proptest::prop_assert!(value == "exit" || value == "timeout");
        }
    }
}
