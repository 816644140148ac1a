use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::task::{Context, Poll};

use tokio::sync::oneshot::{self, error::TryRecvError};

use crate::errors::BridgeError;

pub type BridgeResult = Result<String, BridgeError>;

/// Single-use completion side of a request. Settling consumes the handle.
#[derive(Debug)]
pub struct ResultHandle {
    tx: oneshot::Sender<BridgeResult>,
}

impl ResultHandle {
    pub fn channel() -> (ResultHandle, PendingResult) {
        let (tx, rx) = oneshot::channel();
        (ResultHandle { tx }, PendingResult { rx })
    }

    pub fn resolve(self, value: impl Into<String>) {
        self.settle(Ok(value.into()));
    }

    pub fn reject(self, error: BridgeError) {
        self.settle(Err(error));
    }

    fn settle(self, result: BridgeResult) {
        if self.tx.send(result).is_err() {
            tracing::warn!("request settled after its caller went away");
        }
    }
}

/// Caller side of a request: resolves once with the SDK outcome.
///
/// Dropping the adapter before the SDK answers yields an
/// `ERR_UNEXPECTED_EXCEPTION` instead of hanging.
#[derive(Debug)]
pub struct PendingResult {
    rx: oneshot::Receiver<BridgeResult>,
}

impl PendingResult {
    pub fn resolved(value: impl Into<String>) -> Self {
        let (handle, pending) = ResultHandle::channel();
        handle.resolve(value);
        pending
    }

    pub fn rejected(error: BridgeError) -> Self {
        let (handle, pending) = ResultHandle::channel();
        handle.reject(error);
        pending
    }

    /// Non-blocking check. Returns the outcome the first time it is available.
    pub fn try_result(&mut self) -> Option<BridgeResult> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(abandoned())),
        }
    }
}

impl Future for PendingResult {
    type Output = BridgeResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(abandoned())))
    }
}

fn abandoned() -> BridgeError {
    BridgeError::Unexpected("request abandoned before the SDK answered".into())
}

/// Identifies one claim on a [`RequestSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug)]
enum SlotState {
    Idle,
    Pending { ticket: Ticket, handle: ResultHandle },
}

/// Holds at most one in-flight request of a given kind.
///
/// Request methods claim the slot from the caller's thread while SDK
/// callbacks settle it from SDK threads; every transition happens under
/// the lock and a handle leaves the slot exactly once.
#[derive(Debug)]
pub struct RequestSlot {
    kind: &'static str,
    state: Mutex<SlotState>,
    next_ticket: AtomicU64,
}

impl RequestSlot {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            state: Mutex::new(SlotState::Idle),
            next_ticket: AtomicU64::new(1),
        }
    }

    /// Store `handle` as the live request. Hands it back if one is already pending.
    pub fn claim(&self, handle: ResultHandle) -> Result<Ticket, ResultHandle> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*state, SlotState::Pending { .. }) {
            tracing::warn!("{} request already pending", self.kind);
            return Err(handle);
        }
        let ticket = Ticket(self.next_ticket.fetch_add(1, Ordering::Relaxed));
        *state = SlotState::Pending { ticket, handle };
        Ok(ticket)
    }

    /// Take the handle back only if it still belongs to `ticket`.
    pub fn release(&self, ticket: Ticket) -> Option<ResultHandle> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match mem::replace(&mut *state, SlotState::Idle) {
            SlotState::Pending { ticket: held, handle } if held == ticket => Some(handle),
            other => {
                *state = other;
                None
            }
        }
    }

    pub fn resolve(&self, value: impl Into<String>) -> bool {
        match self.take() {
            Some(handle) => {
                handle.resolve(value);
                true
            }
            None => false,
        }
    }

    pub fn reject(&self, error: BridgeError) -> bool {
        match self.take() {
            Some(handle) => {
                handle.reject(error);
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(
            *self.state.lock().unwrap_or_else(PoisonError::into_inner),
            SlotState::Pending { .. }
        )
    }

    fn take(&self) -> Option<ResultHandle> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match mem::replace(&mut *state, SlotState::Idle) {
            SlotState::Pending { handle, .. } => Some(handle),
            SlotState::Idle => {
                tracing::debug!("no pending {} request to settle", self.kind);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::FutureExt;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn settled_constructors_are_ready() {
        let mut ok = PendingResult::resolved("done");
        assert_eq!(ok.try_result(), Some(Ok("done".to_string())));

        let err = PendingResult::rejected(BridgeError::join("nope"));
        assert_eq!(err.now_or_never(), Some(Err(BridgeError::join("nope"))));
    }

    #[test]
    fn slot_settles_exactly_once() {
        let slot = RequestSlot::new("meeting");
        let (handle, mut pending) = ResultHandle::channel();
        slot.claim(handle).unwrap();
        assert!(slot.is_pending());
        assert_eq!(pending.try_result(), None);

        assert!(slot.resolve("first"));
        assert!(!slot.resolve("second"));
        assert!(!slot.reject(BridgeError::start("late")));
        assert!(!slot.is_pending());
        assert_eq!(pending.try_result(), Some(Ok("first".to_string())));
    }

    #[test]
    fn second_claim_is_refused() {
        let slot = RequestSlot::new("meeting");
        let (first, mut first_pending) = ResultHandle::channel();
        let (second, _second_pending) = ResultHandle::channel();

        slot.claim(first).unwrap();
        let refused = slot.claim(second).unwrap_err();
        refused.reject(BridgeError::start("busy"));

        slot.resolve("ok");
        assert_eq!(first_pending.try_result(), Some(Ok("ok".to_string())));
    }

    #[test]
    fn release_ignores_stale_ticket() {
        let slot = RequestSlot::new("meeting");
        let (first, _p1) = ResultHandle::channel();
        let stale = slot.claim(first).unwrap();
        slot.resolve("settled by callback");

        let (second, _p2) = ResultHandle::channel();
        let current = slot.claim(second).unwrap();
        assert_ne!(stale, current);

        assert!(slot.release(stale).is_none());
        assert!(slot.is_pending());
        assert!(slot.release(current).is_some());
        assert!(!slot.is_pending());
    }

    #[test]
    fn racing_settlers_deliver_exactly_once() {
        let slot = Arc::new(RequestSlot::new("meeting"));
        for _ in 0..200 {
            let (handle, mut pending) = ResultHandle::channel();
            let ticket = slot.claim(handle).unwrap();
            let settled = Arc::new(AtomicUsize::new(0));
            let barrier = Arc::new(Barrier::new(4));

            let workers: Vec<_> = (0..4)
                .map(|i| {
                    let slot = slot.clone();
                    let settled = settled.clone();
                    let barrier = barrier.clone();
                    thread::spawn(move || {
                        barrier.wait();
                        let won = if i % 2 == 0 {
                            slot.resolve("status callback")
                        } else {
                            slot.release(ticket)
                                .map(|h| h.reject(BridgeError::start("immediate failure")))
                                .is_some()
                        };
                        if won {
                            settled.fetch_add(1, Ordering::SeqCst);
                        }
                    })
                })
                .collect();
            for worker in workers {
                worker.join().unwrap();
            }

            assert_eq!(settled.load(Ordering::SeqCst), 1);
            assert!(!slot.is_pending());
            assert!(pending.try_result().is_some());
        }
    }

    #[tokio::test]
    async fn dropped_handle_reports_abandoned() {
        let (handle, pending) = ResultHandle::channel();
        drop(handle);
        let err = pending.await.unwrap_err();
        assert_eq!(err.code(), "ERR_UNEXPECTED_EXCEPTION");
    }

    #[tokio::test]
    async fn pending_result_awaits_settlement() {
        let (handle, pending) = ResultHandle::channel();
        let waiter = tokio::spawn(pending);
        handle.resolve("later");
        assert_eq!(waiter.await.unwrap(), Ok("later".to_string()));
    }
}
