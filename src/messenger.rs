use crate::combine::Combine;
use crate::error::try_alloc;
use crate::PregelError;

use std::sync::Arc;

use parking_lot::Mutex;

/// Carries messages from one superstep to the next.
///
/// Messages sent during superstep `i` are only returned by [`Messenger::take_messages`] during
/// superstep `i + 1`. Sends and receives use disjoint buffers; [`Messenger::init_superstep`]
/// swaps them and must only be called while no worker is running.
pub trait Messenger<M>: Send + Sync {
    fn init_superstep(&mut self, superstep: usize);

    fn send_to(&self, target: usize, message: M);

    /// Removes and returns the messages delivered to `node` for the current superstep.
    fn take_messages(&self, node: usize) -> Messages<M>;

    /// Drops all buffered messages and the memory behind them.
    fn release(&mut self);

    fn kind(&self) -> &'static str;
}

/// The messages a node receives in one superstep.
#[derive(Debug)]
pub enum Messages<M> {
    Queue(std::vec::IntoIter<M>),
    Combined(Option<M>),
}

impl<M> Messages<M> {
    pub fn empty() -> Self {
        Messages::Combined(None)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Messages::Queue(messages) => messages.as_slice().is_empty(),
            Messages::Combined(message) => message.is_none(),
        }
    }
}

impl<M> Iterator for Messages<M> {
    type Item = M;

    fn next(&mut self) -> Option<M> {
        match self {
            Messages::Queue(messages) => messages.next(),
            Messages::Combined(message) => message.take(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = match self {
            Messages::Queue(messages) => messages.len(),
            Messages::Combined(message) => message.is_some() as usize,
        };
        (len, Some(len))
    }
}

impl<M> ExactSizeIterator for Messages<M> {}

fn check_target(target: usize, node_count: usize) {
    assert!(
        target < node_count,
        "message target {} out of range for {} nodes",
        target,
        node_count
    );
}

/// Keeps every message, delivering them as a sequence per receiver.
pub struct QueueMessenger<M> {
    node_count: usize,
    send_queues: Box<[Mutex<Vec<M>>]>,
    recv_queues: Box<[Mutex<Vec<M>>]>,
}

impl<M: Send> QueueMessenger<M> {
    pub fn new(node_count: usize) -> Result<Self, PregelError> {
        let send_queues = try_alloc("message queues", node_count, node_count, || {
            Mutex::new(Vec::new())
        })?;
        let recv_queues = try_alloc("message queues", node_count, node_count, || {
            Mutex::new(Vec::new())
        })?;

        Ok(QueueMessenger {
            node_count,
            send_queues: send_queues.into_boxed_slice(),
            recv_queues: recv_queues.into_boxed_slice(),
        })
    }
}

impl<M: Send> Messenger<M> for QueueMessenger<M> {
    fn init_superstep(&mut self, _superstep: usize) {
        std::mem::swap(&mut self.send_queues, &mut self.recv_queues);

        // Anything left unread belongs to the superstep that just ended.
        for queue in self.send_queues.iter_mut() {
            queue.get_mut().clear();
        }
    }

    fn send_to(&self, target: usize, message: M) {
        check_target(target, self.node_count);
        self.send_queues[target].lock().push(message);
    }

    fn take_messages(&self, node: usize) -> Messages<M> {
        check_target(node, self.node_count);
        let messages = std::mem::take(&mut *self.recv_queues[node].lock());
        Messages::Queue(messages.into_iter())
    }

    fn release(&mut self) {
        self.send_queues = Box::new([]);
        self.recv_queues = Box::new([]);
        self.node_count = 0;
    }

    fn kind(&self) -> &'static str {
        "queue"
    }
}

/// Folds messages to the same receiver through a [`Combine`] as they are sent, so each node
/// holds at most one pending value.
pub struct CombiningMessenger<M> {
    node_count: usize,
    combiner: Arc<dyn Combine<M>>,
    send_slots: Box<[Mutex<Option<M>>]>,
    recv_slots: Box<[Mutex<Option<M>>]>,
}

impl<M: Send> CombiningMessenger<M> {
    pub fn new(node_count: usize, combiner: Arc<dyn Combine<M>>) -> Result<Self, PregelError> {
        let send_slots = try_alloc("message slots", node_count, node_count, || Mutex::new(None))?;
        let recv_slots = try_alloc("message slots", node_count, node_count, || Mutex::new(None))?;

        Ok(CombiningMessenger {
            node_count,
            combiner,
            send_slots: send_slots.into_boxed_slice(),
            recv_slots: recv_slots.into_boxed_slice(),
        })
    }
}

impl<M: Send> Messenger<M> for CombiningMessenger<M> {
    fn init_superstep(&mut self, _superstep: usize) {
        std::mem::swap(&mut self.send_slots, &mut self.recv_slots);

        for slot in self.send_slots.iter_mut() {
            *slot.get_mut() = None;
        }
    }

    fn send_to(&self, target: usize, message: M) {
        check_target(target, self.node_count);
        let mut slot = self.send_slots[target].lock();
        *slot = Some(match slot.take() {
            Some(pending) => self.combiner.combine(pending, message),
            None => message,
        });
    }

    fn take_messages(&self, node: usize) -> Messages<M> {
        check_target(node, self.node_count);
        Messages::Combined(self.recv_slots[node].lock().take())
    }

    fn release(&mut self) {
        self.send_slots = Box::new([]);
        self.recv_slots = Box::new([]);
        self.node_count = 0;
    }

    fn kind(&self) -> &'static str {
        "combining"
    }
}
