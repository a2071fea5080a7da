//! Bounded message queues backed by a fixed payload pool
//!
//! The store owns every queued payload byte. Two bounded FIFO lanes (outbound
//! and inbound) share one slot pool of `SLOTS` buffers of `MTU` bytes each.
//! Enqueueing allocates a slot and copies the payload in; popping releases
//! the slot in the same operation, so a header is never live without its
//! payload and a payload never outlives its header. [`Payload`] handles are
//! not `Copy` and are consumed on free, so a double release does not compile.
//!
//! Capacity errors are the only errors this layer surfaces; they carry no
//! side effects and the caller may simply retry later.

use crate::message::{Header, Message};

/// Capacity failure reported to the sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// The lane already holds `DEPTH` messages.
    QueueFull,
    /// No free payload slot.
    PoolExhausted,
    /// The payload does not fit one pool slot.
    PayloadTooLong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferError {
    SourceEmpty,
    DestinationFull,
}

/// Queue selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Lane {
    Outbound,
    Inbound,
}

impl Lane {
    const fn index(self) -> usize {
        self as usize
    }
}

/// Owned reference to one allocated pool slot
///
/// Returned only by [`Pool::alloc`] and consumed only by [`Pool::free`].
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) struct Payload {
    slot: u8,
    length: u16,
}

impl Payload {
    pub(crate) const fn len(&self) -> usize {
        self.length as usize
    }
}

pub(crate) struct Pool<const MTU: usize, const SLOTS: usize> {
    slots: [[u8; MTU]; SLOTS],
    // stack of free slot indexes
    free: [u8; SLOTS],
    free_count: usize,
}

impl<const MTU: usize, const SLOTS: usize> Pool<MTU, SLOTS> {
    pub(crate) const fn new() -> Self {
        // slot indexes are u8; a larger pool would alias slots
        assert!(SLOTS <= 256, "pool capacity exceeds the slot index width");

        let mut free = [0u8; SLOTS];
        let mut i = 0;
        while i < SLOTS {
            free[i] = i as u8;
            i += 1;
        }
        Self {
            slots: [[0; MTU]; SLOTS],
            free,
            free_count: SLOTS,
        }
    }

    pub(crate) fn alloc(&mut self, bytes: &[u8]) -> Result<Payload, StoreError> {
        if bytes.len() > MTU {
            return Err(StoreError::PayloadTooLong);
        }
        if self.free_count == 0 {
            return Err(StoreError::PoolExhausted);
        }

        self.free_count -= 1;
        let slot = self.free[self.free_count];
        self.slots[slot as usize][..bytes.len()].copy_from_slice(bytes);

        Ok(Payload {
            slot,
            length: bytes.len() as u16,
        })
    }

    pub(crate) fn free(&mut self, payload: Payload) {
        self.free[self.free_count] = payload.slot;
        self.free_count += 1;
    }

    pub(crate) fn bytes(&self, payload: &Payload) -> &[u8] {
        &self.slots[payload.slot as usize][..payload.len()]
    }

    pub(crate) const fn available(&self) -> usize {
        self.free_count
    }
}

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) struct Entry {
    pub(crate) header: Header,
    pub(crate) payload: Payload,
}

struct Queue<const DEPTH: usize> {
    entries: [Option<Entry>; DEPTH],
    head: usize,
    length: usize,
}

impl<const DEPTH: usize> Queue<DEPTH> {
    const EMPTY: Option<Entry> = None;

    const fn new() -> Self {
        Self {
            entries: [Self::EMPTY; DEPTH],
            head: 0,
            length: 0,
        }
    }

    const fn len(&self) -> usize {
        self.length
    }

    const fn is_full(&self) -> bool {
        self.length == DEPTH
    }

    fn push_back(&mut self, entry: Entry) -> Result<(), Entry> {
        if self.is_full() {
            return Err(entry);
        }
        let index = (self.head + self.length) % DEPTH;
        self.entries[index] = Some(entry);
        self.length += 1;
        Ok(())
    }

    fn front(&self) -> Option<&Entry> {
        if self.length == 0 {
            return None;
        }
        self.entries[self.head].as_ref()
    }

    fn pop_front(&mut self) -> Option<Entry> {
        if self.length == 0 {
            return None;
        }
        let entry = unwrap!(self.entries[self.head].take());
        self.head = (self.head + 1) % DEPTH;
        self.length -= 1;
        Some(entry)
    }
}

/// Outbound and inbound message queues with their shared payload pool
pub struct Store<const MTU: usize, const DEPTH: usize, const SLOTS: usize> {
    pool: Pool<MTU, SLOTS>,
    lanes: [Queue<DEPTH>; 2],
}

impl<const MTU: usize, const DEPTH: usize, const SLOTS: usize> Store<MTU, DEPTH, SLOTS> {
    pub const fn new() -> Self {
        Self {
            pool: Pool::new(),
            lanes: [Queue::new(), Queue::new()],
        }
    }

    pub const fn free_slots(&self) -> usize {
        self.pool.available()
    }

    pub fn len(&self, lane: Lane) -> usize {
        self.lanes[lane.index()].len()
    }

    pub fn is_empty(&self, lane: Lane) -> bool {
        self.len(lane) == 0
    }

    /// Copies a message into the store.
    ///
    /// Fails without side effects when the lane is full, the pool is
    /// exhausted, or the payload exceeds one slot.
    pub fn enqueue(
        &mut self,
        lane: Lane,
        header: Header,
        payload: &[u8],
    ) -> Result<(), StoreError> {
        if self.lanes[lane.index()].is_full() {
            return Err(StoreError::QueueFull);
        }
        let payload = self.pool.alloc(payload)?;
        unwrap!(self.lanes[lane.index()].push_back(Entry { header, payload }));
        Ok(())
    }

    /// Non-destructive look at the oldest message of a lane.
    pub fn front(&self, lane: Lane) -> Option<Message<'_>> {
        let entry = self.lanes[lane.index()].front()?;
        Some(Message {
            header: entry.header,
            payload: self.pool.bytes(&entry.payload),
        })
    }

    /// Removes the oldest message of a lane and releases its payload slot.
    pub fn pop(&mut self, lane: Lane) -> Option<Header> {
        let entry = self.lanes[lane.index()].pop_front()?;
        self.pool.free(entry.payload);
        Some(entry.header)
    }

    /// Moves the oldest message of one lane to the back of another.
    ///
    /// Pure ownership transfer: the payload slot is neither copied nor
    /// reallocated. Transferring within one lane rotates it.
    pub fn transfer_front(&mut self, from: Lane, to: Lane) -> Result<(), TransferError> {
        if from != to && self.lanes[to.index()].is_full() {
            return Err(TransferError::DestinationFull);
        }
        let entry = self.lanes[from.index()]
            .pop_front()
            .ok_or(TransferError::SourceEmpty)?;
        unwrap!(self.lanes[to.index()].push_back(entry));
        Ok(())
    }
}

impl<const MTU: usize, const DEPTH: usize, const SLOTS: usize> Default
    for Store<MTU, DEPTH, SLOTS>
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Address, Scope};

    fn header(command: u8) -> Header {
        Header {
            scope: Scope::Unicast,
            destination: 0x0002,
            source: Address::new(1).unwrap(),
            command,
        }
    }

    #[test]
    fn test_fifo_order() {
        let mut store: Store<8, 4, 8> = Store::new();
        for command in 0..3 {
            store
                .enqueue(Lane::Outbound, header(command), &[command; 2])
                .unwrap();
        }

        for command in 0..3 {
            let message = store.front(Lane::Outbound).unwrap();
            assert_eq!(message.header.command, command);
            assert_eq!(message.payload, &[command; 2]);
            store.pop(Lane::Outbound).unwrap();
        }
        assert!(store.front(Lane::Outbound).is_none());
        assert_eq!(store.free_slots(), 8);
    }

    #[test]
    fn test_queue_full() {
        let mut store: Store<8, 2, 8> = Store::new();
        store.enqueue(Lane::Outbound, header(0), &[0]).unwrap();
        store.enqueue(Lane::Outbound, header(1), &[1]).unwrap();
        assert_eq!(
            store.enqueue(Lane::Outbound, header(2), &[2]),
            Err(StoreError::QueueFull)
        );

        // the failure must not disturb queued messages or leak a slot
        assert_eq!(store.len(Lane::Outbound), 2);
        assert_eq!(store.free_slots(), 6);
        assert_eq!(store.front(Lane::Outbound).unwrap().payload, &[0]);
    }

    #[test]
    fn test_pool_exhausted() {
        let mut store: Store<8, 4, 2> = Store::new();
        store.enqueue(Lane::Outbound, header(0), &[0]).unwrap();
        store.enqueue(Lane::Inbound, header(1), &[1]).unwrap();
        assert_eq!(
            store.enqueue(Lane::Outbound, header(2), &[2]),
            Err(StoreError::PoolExhausted)
        );

        store.pop(Lane::Inbound).unwrap();
        store.enqueue(Lane::Outbound, header(2), &[2]).unwrap();
    }

    #[test]
    #[should_panic(expected = "slot index width")]
    fn test_oversized_pool_rejected() {
        let _store: Store<1, 150, 300> = Store::new();
    }

    #[test]
    fn test_payload_too_long() {
        let mut store: Store<4, 2, 2> = Store::new();
        assert_eq!(
            store.enqueue(Lane::Outbound, header(0), &[0; 5]),
            Err(StoreError::PayloadTooLong)
        );
        assert_eq!(store.free_slots(), 2);
    }

    #[test]
    fn test_transfer_keeps_allocation() {
        let mut store: Store<8, 4, 8> = Store::new();
        store
            .enqueue(Lane::Outbound, header(7), &[9, 9])
            .unwrap();
        let slots = store.free_slots();

        store.transfer_front(Lane::Outbound, Lane::Inbound).unwrap();
        assert_eq!(store.free_slots(), slots);
        assert!(store.is_empty(Lane::Outbound));

        let message = store.front(Lane::Inbound).unwrap();
        assert_eq!(message.header.command, 7);
        assert_eq!(message.payload, &[9, 9]);

        assert_eq!(
            store.transfer_front(Lane::Outbound, Lane::Inbound),
            Err(TransferError::SourceEmpty)
        );
    }

    #[test]
    fn test_transfer_destination_full() {
        let mut store: Store<8, 1, 4> = Store::new();
        store.enqueue(Lane::Outbound, header(0), &[]).unwrap();
        store.enqueue(Lane::Inbound, header(1), &[]).unwrap();
        assert_eq!(
            store.transfer_front(Lane::Outbound, Lane::Inbound),
            Err(TransferError::DestinationFull)
        );
        assert_eq!(store.front(Lane::Outbound).unwrap().header.command, 0);
    }
}
