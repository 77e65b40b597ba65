//! Double-buffered message routing between supersteps.
//!
//! Messages produced during superstep `t` land in the next-round buffer and
//! only become visible to their destination at the start of superstep `t + 1`,
//! after [`MessageRouter::swap_buffers`] runs at the barrier. The next-round
//! buffer is append-only during a round (one mutex per destination); the
//! current-round buffer is drained exactly once by the runner.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::graph::VertexId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message<M> {
    pub from: VertexId,
    pub payload: M,
}

pub(crate) struct MessageRouter<M> {
    current: Vec<Vec<Message<M>>>,
    next: Vec<Mutex<Vec<Message<M>>>>,
}

impl<M: Send> MessageRouter<M> {
    pub(crate) fn new(num_vertices: usize) -> Self {
        Self {
            current: (0..num_vertices).map(|_| Vec::new()).collect(),
            next: (0..num_vertices).map(|_| Mutex::new(Vec::new())).collect(),
        }
    }

    /// Append a message to `to`'s inbox for the next superstep.
    pub(crate) fn send(&self, from: VertexId, to: usize, payload: M) {
        self.next[to].lock().push(Message { from, payload });
    }

    /// Hand the current round's inboxes to the runner, leaving empty slots
    /// behind. Each inbox is owned by its destination from here on.
    pub(crate) fn take_current(&mut self) -> Vec<Vec<Message<M>>> {
        let n = self.current.len();
        std::mem::replace(&mut self.current, (0..n).map(|_| Vec::new()).collect())
    }

    /// Barrier rotation: everything buffered for the next round becomes the
    /// current round. Returns the number of pending messages.
    pub(crate) fn swap_buffers(&mut self) -> usize {
        let mut pending = 0;
        self.current = self
            .next
            .iter_mut()
            .map(|slot| {
                let inbox = std::mem::take(slot.get_mut());
                pending += inbox.len();
                inbox
            })
            .collect();
        pending
    }
}

#[cfg(test)]
mod router_test {
    use super::*;

    #[test]
    fn sends_are_invisible_until_the_swap() {
        let mut router: MessageRouter<u64> = MessageRouter::new(3);
        router.send(0, 1, 42);

        let inboxes = router.take_current();
        assert!(inboxes.iter().all(|i| i.is_empty()));

        let pending = router.swap_buffers();
        assert_eq!(pending, 1);
        let inboxes = router.take_current();
        assert_eq!(inboxes[1], vec![Message { from: 0, payload: 42 }]);
    }

    #[test]
    fn inboxes_are_drained_exactly_once() {
        let mut router: MessageRouter<&str> = MessageRouter::new(2);
        router.send(1, 0, "ping");
        router.swap_buffers();

        let first = router.take_current();
        assert_eq!(first[0].len(), 1);
        let second = router.take_current();
        assert!(second[0].is_empty());
    }

    #[test]
    fn self_messages_are_delivered() {
        let mut router: MessageRouter<u64> = MessageRouter::new(1);
        router.send(7, 0, 7);
        assert_eq!(router.swap_buffers(), 1);
        assert_eq!(router.take_current()[0][0].from, 7);
    }
}
