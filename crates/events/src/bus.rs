//! Change publication/subscription abstraction (mechanics only).
//!
//! The bus fans applied-change notifications out to whoever renders state: a
//! terminal view or a future GUI. It carries no persistence;
//! durable state is written by the session before anything is published.

use std::sync::Arc;
use std::sync::mpsc::Receiver;

/// A subscription to the change stream.
///
/// Each subscription gets a copy of every message published after it was
/// created (broadcast semantics). Intended for a single consumer.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Drain everything already delivered, without blocking.
    pub fn drain(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }
}

/// Pub/sub abstraction for change notifications.
///
/// Messages are delivered in publish order to each subscriber. `publish()` can
/// fail (e.g. a poisoned lock); callers log the failure and carry on since the
/// state change itself has already happened.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
