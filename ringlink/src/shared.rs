//! Sharing one node between interrupt and foreground contexts
//!
//! A bare [`Node`] is re-entrant-unsafe: it must be driven from one
//! interrupt context or one polling loop, never both. [`SharedNode`] wraps
//! it in a blocking mutex so, for example, a UART interrupt can run
//! `update` while a foreground task sends and consumes messages.
//!
//! Pick the `RawMutex` implementation for the sharing actually needed:
//! `CriticalSectionRawMutex` when an interrupt is involved,
//! `ThreadModeRawMutex` or `NoopRawMutex` otherwise. Locks are held only for
//! the duration of one call.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::core::Destination;
use crate::device::Device;
use crate::message::Message;
use crate::node::Node;
use crate::store::StoreError;

pub struct SharedNode<M, D, const MTU: usize, const DEPTH: usize, const SLOTS: usize>
where
    M: RawMutex,
{
    inner: Mutex<M, RefCell<Node<D, MTU, DEPTH, SLOTS>>>,
}

impl<M, D, const MTU: usize, const DEPTH: usize, const SLOTS: usize>
    SharedNode<M, D, MTU, DEPTH, SLOTS>
where
    M: RawMutex,
    D: Device,
{
    pub const fn new(node: Node<D, MTU, DEPTH, SLOTS>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(node)),
        }
    }

    /// See [`Node::send`].
    pub fn send(
        &self,
        destination: Destination,
        command: u8,
        payload: &[u8],
    ) -> Result<(), StoreError> {
        self.inner
            .lock(|node| node.borrow_mut().send(destination, command, payload))
    }

    /// See [`Node::update`].
    pub fn update(&self) {
        self.inner.lock(|node| node.borrow_mut().update())
    }

    /// Runs a closure over the oldest received message without consuming it.
    ///
    /// The payload borrows the store, so it cannot leave the lock; process
    /// it inside the closure and follow up with [`SharedNode::drop_received`].
    pub fn with_received<R>(&self, f: impl FnOnce(Option<Message<'_>>) -> R) -> R {
        self.inner.lock(|node| f(node.borrow().received()))
    }

    /// See [`Node::drop_received`].
    pub fn drop_received(&self) {
        self.inner.lock(|node| node.borrow_mut().drop_received())
    }

    /// Arbitrary access to the node under the lock.
    pub fn with_node<R>(&self, f: impl FnOnce(&mut Node<D, MTU, DEPTH, SLOTS>) -> R) -> R {
        self.inner.lock(|node| f(&mut node.borrow_mut()))
    }
}
