//! Streaming relay of upstream response bodies.
//!
//! # Responsibilities
//! - Hand upstream frames to the inbound connection as they arrive
//! - Keep enforcing the exchange deadline after the head was sent
//! - Report to the forwarding task how the relay ended
//!
//! # Design Decisions
//! - Frames are only pulled when hyper polls, so a slow client stalls upstream
//!   reads instead of growing a buffer
//! - The upstream body sits in a slot shared with a [`RelayWatch`]; the watch
//!   empties the slot at the deadline even when hyper has stopped polling
//! - Errors after the head cannot become an error status; yielding an error
//!   makes hyper abort the inbound connection
//! - Dropping the upstream body closes that connection

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use hyper::body::{Body, Bytes, Frame, Incoming, SizeHint};
use tokio::sync::oneshot;
use tokio::time::Sleep;

use crate::http::forward::ForwardError;
use crate::resilience::RequestDeadline;

type Slot = Arc<Mutex<Option<Pin<Box<Incoming>>>>>;

fn lock(slot: &Slot) -> MutexGuard<'_, Option<Pin<Box<Incoming>>>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Response body that relays an upstream body frame by frame.
pub struct RelayBody {
    slot: Slot,
    deadline: Pin<Box<Sleep>>,
    timeout: Duration,
    done: Option<oneshot::Sender<Result<u64, ForwardError>>>,
    relayed: u64,
}

/// Forwarding-task side of a [`RelayBody`].
pub struct RelayWatch {
    slot: Slot,
    done: oneshot::Receiver<Result<u64, ForwardError>>,
}

impl RelayBody {
    pub fn new(
        inner: Incoming,
        deadline: &RequestDeadline,
        timeout: Duration,
    ) -> (RelayBody, RelayWatch) {
        let slot: Slot = Arc::new(Mutex::new(Some(Box::pin(inner))));
        let (tx, rx) = oneshot::channel();
        let body = RelayBody {
            slot: slot.clone(),
            deadline: Box::pin(deadline.sleep()),
            timeout,
            done: Some(tx),
            relayed: 0,
        };
        (body, RelayWatch { slot, done: rx })
    }

    fn finish(&mut self, end: Result<u64, ForwardError>) {
        if let Some(tx) = self.done.take() {
            let _ = tx.send(end);
        }
    }

    fn finished(&self) -> bool {
        self.done.is_none()
    }

    fn upstream_ended(&self) -> bool {
        lock(&self.slot)
            .as_ref()
            .is_some_and(|inner| inner.is_end_stream())
    }
}

impl Body for RelayBody {
    type Data = Bytes;
    type Error = ForwardError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, Self::Error>>> {
        let this = self.get_mut();
        if this.finished() {
            return Poll::Ready(None);
        }

        if this.deadline.as_mut().poll(cx).is_ready() {
            lock(&this.slot).take();
            this.finish(Err(ForwardError::Timeout(this.timeout)));
            return Poll::Ready(Some(Err(ForwardError::Timeout(this.timeout))));
        }

        let polled = {
            let mut slot = lock(&this.slot);
            match slot.as_mut() {
                Some(inner) => inner
                    .as_mut()
                    .poll_frame(cx)
                    .map(|frame| frame.map(|r| r.map_err(Some))),
                // Emptied by the watch at the deadline.
                None => Poll::Ready(Some(Err(None))),
            }
        };

        match polled {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    this.relayed += data.len() as u64;
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Poll::Ready(Some(Err(Some(e)))) => {
                lock(&this.slot).take();
                this.finish(Err(ForwardError::UpstreamProtocol(e.to_string().into())));
                Poll::Ready(Some(Err(ForwardError::UpstreamProtocol(Box::new(e)))))
            }
            Poll::Ready(Some(Err(None))) => {
                this.finish(Err(ForwardError::Timeout(this.timeout)));
                Poll::Ready(Some(Err(ForwardError::Timeout(this.timeout))))
            }
            Poll::Ready(None) => {
                let relayed = this.relayed;
                this.finish(Ok(relayed));
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.finished() || self.upstream_ended()
    }

    fn size_hint(&self) -> SizeHint {
        lock(&self.slot)
            .as_ref()
            .map(|inner| inner.size_hint())
            .unwrap_or_default()
    }
}

impl Drop for RelayBody {
    fn drop(&mut self) {
        // hyper stops polling once a sized body reports its end.
        if !self.finished() && self.upstream_ended() {
            let relayed = self.relayed;
            self.finish(Ok(relayed));
        }
    }
}

impl RelayWatch {
    /// Wait for the relay to end, or empty the slot at the deadline.
    ///
    /// Returns the number of relayed bytes on a clean end. A relay dropped
    /// before its end means the client went away.
    pub async fn enforce(
        self,
        deadline: &RequestDeadline,
        timeout: Duration,
    ) -> Result<u64, ForwardError> {
        let RelayWatch { slot, done } = self;
        tokio::select! {
            biased;
            end = done => end.unwrap_or(Err(ForwardError::ClientDisconnected)),
            _ = deadline.sleep() => {
                lock(&slot).take();
                Err(ForwardError::Timeout(timeout))
            }
        }
    }
}
