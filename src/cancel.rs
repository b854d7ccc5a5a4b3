use std::future::Future;
use tokio::sync::watch;

use crate::error::FetchError;

/// Trips every `CancelSignal` cloned from the same pair.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

pub fn pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl CancelSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_, signal) = pair();
        signal
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // handle dropped without canceling
                std::future::pending::<()>().await;
            }
        }
    }

    /// Runs `fut` unless the signal fires first, in which case the call is
    /// abandoned with `FetchError::Canceled`.
    pub async fn guard<T, F>(&self, fut: F) -> Result<T, FetchError>
    where
        F: Future<Output = Result<T, FetchError>>,
    {
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(FetchError::Canceled),
            res = fut => res,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn guard_passes_through_when_not_canceled() {
        let signal = CancelSignal::never();
        let out = signal.guard(async { Ok::<_, FetchError>(7) }).await;
        assert_eq!(out.unwrap(), 7);
        assert!(!signal.is_cancelled());
    }

    #[tokio::test]
    async fn guard_aborts_pending_call_once_canceled() {
        let (handle, signal) = pair();
        handle.cancel();

        let out = signal
            .guard(async {
                std::future::pending::<()>().await;
                Ok::<_, FetchError>(())
            })
            .await;

        assert!(out.unwrap_err().is_canceled());
        assert!(signal.is_cancelled());
    }

    #[tokio::test]
    async fn clones_observe_cancellation() {
        let (handle, signal) = pair();
        let clone = signal.clone();
        tokio::spawn(async move {
            handle.cancel();
        })
        .await
        .unwrap();
        clone.cancelled().await;
        assert!(clone.is_cancelled());
    }
}
