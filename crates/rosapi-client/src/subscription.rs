use std::sync::mpsc;
use std::time::Duration;

/// A subscription to one of the client's event streams.
///
/// Dropping the stream detaches the subscription: the publisher prunes the
/// dead sender at its next publish, so stream lifetime is driven entirely by
/// the listener count.
pub struct EventStream<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> EventStream<T> {
    /// Block until the next item, or `None` once the stream completes.
    pub fn recv(&self) -> Option<T> {
        self.rx.recv().ok()
    }

    /// Block up to `timeout` for the next item.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<T> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Take the next item if one is already buffered.
    pub fn try_recv(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Iterate over items until the stream completes.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.rx.iter()
    }
}

impl<T> IntoIterator for EventStream<T> {
    type Item = T;
    type IntoIter = mpsc::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.rx.into_iter()
    }
}

/// Publisher half of the stream fan-out.
///
/// One upstream publisher, any number of downstream `EventStream`s; each
/// publish is delivered to every live subscriber in subscription order.
pub(crate) struct SubscriberList<T> {
    senders: Vec<mpsc::Sender<T>>,
}

impl<T: Clone> SubscriberList<T> {
    pub fn new() -> Self {
        Self {
            senders: Vec::new(),
        }
    }

    /// Attach a new subscriber.
    pub fn subscribe(&mut self) -> EventStream<T> {
        let (tx, rx) = mpsc::channel();
        self.senders.push(tx);
        EventStream { rx }
    }

    /// Deliver `item` to every live subscriber, pruning dropped ones.
    pub fn publish(&mut self, item: T) {
        self.senders.retain(|tx| tx.send(item.clone()).is_ok());
    }

    /// Complete the stream: every subscriber sees end-of-stream.
    pub fn clear(&mut self) {
        self.senders.clear();
    }
}
