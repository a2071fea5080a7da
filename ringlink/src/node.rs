//! Bus node: receive state machine, transmit engine, cut-through relay
//!
//! A [`Node`] owns its byte [`Device`], its identity, and a [`Store`] of
//! outbound and inbound messages. [`Node::update`] must be called
//! periodically, from one interrupt context or one polling loop, never both:
//! it first flushes at most one queued outbound message if the bus has gone
//! idle, then drains every byte the device currently has through the receive
//! state machine. Nothing here blocks.
//!
//! Relaying is cut-through, not store-and-forward. The start delimiter and
//! the four address bytes are withheld until the source address is decoded;
//! once a frame proves eligible (not our own, not unicast) the withheld
//! preamble is emitted and every further byte is forwarded as it arrives,
//! adding at most one byte of latency.

use crate::core::{Address, Destination, Identity, Scope, VALUE_MASK};
use crate::crc;
use crate::device::Device;
use crate::message::{Header, Message};
use crate::store::{Lane, Store, StoreError};
use crate::utils::PaddedBytes;
use crate::wire;

/// Receive buffer slack beyond MTU: command byte plus frame check sequence
const RX_MARGIN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Waiting for a start delimiter
    Idle,
    /// Collecting the four raw address bytes
    Header { cursor: u8 },
    /// Collecting command, payload, and frame check sequence
    Payload,
}

/// Decode state of the one in-flight frame
///
/// Reset unconditionally by every start delimiter; no reference into the
/// buffer survives that reset.
struct RxContext<const MTU: usize> {
    phase: Phase,
    unescaper: wire::Unescaper,
    crc: u16,
    /// raw destination and source bytes, withheld for a deferred relay flush
    address_bytes: [u8; 4],
    destination: u16,
    source: u16,
    /// destination scope; `None` until decoded or when unmatched
    scope: Option<Scope>,
    source_recognized: bool,
    relay: bool,
    overflow: bool,
    /// decoded bytes seen past the header, whether stored or dropped
    received: usize,
    /// bytes stored into `buffer`
    buffered: usize,
    buffer: PaddedBytes<RX_MARGIN, MTU>,
}

impl<const MTU: usize> RxContext<MTU> {
    const fn new() -> Self {
        Self {
            phase: Phase::Idle,
            unescaper: wire::Unescaper::new(),
            crc: crc::INIT,
            address_bytes: [0; 4],
            destination: 0,
            source: 0,
            scope: None,
            source_recognized: false,
            relay: false,
            overflow: false,
            received: 0,
            buffered: 0,
            buffer: PaddedBytes::new(),
        }
    }

    fn restart(&mut self) {
        self.phase = Phase::Header { cursor: 0 };
        self.unescaper.reset();
        self.crc = crc::INIT;
        self.scope = None;
        self.source_recognized = false;
        self.relay = false;
        self.overflow = false;
        self.received = 0;
        self.buffered = 0;
    }

    fn abort(&mut self) {
        self.phase = Phase::Idle;
        self.unescaper.reset();
    }
}

/// One bus node instance
///
/// `MTU` is the largest payload accepted in either direction, `DEPTH` the
/// capacity of each message queue, `SLOTS` the number of payload buffers
/// shared by both queues.
pub struct Node<D, const MTU: usize, const DEPTH: usize, const SLOTS: usize> {
    device: D,
    identity: Identity,
    store: Store<MTU, DEPTH, SLOTS>,
    rx: RxContext<MTU>,
    /// set when an end delimiter completes a frame, cleared by the next start
    bus_idle: bool,
}

impl<D: Device, const MTU: usize, const DEPTH: usize, const SLOTS: usize>
    Node<D, MTU, DEPTH, SLOTS>
{
    pub fn new(device: D, identity: Identity) -> Self {
        Self {
            device,
            identity,
            store: Store::new(),
            rx: RxContext::new(),
            bus_idle: false,
        }
    }

    pub const fn identity(&self) -> Identity {
        self.identity
    }

    /// Direct access to the underlying device, for drivers and tests.
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn release(self) -> D {
        self.device
    }

    /// True between a completed frame and the next start delimiter.
    pub fn is_bus_idle(&self) -> bool {
        self.bus_idle
    }

    /// Number of messages waiting for the bus to go idle
    pub fn pending_sends(&self) -> usize {
        self.store.len(Lane::Outbound)
    }

    /// Sends a datagram, best effort.
    ///
    /// Serialized to the wire immediately unless another frame is currently
    /// mid-reception, in which case a copy is queued and flushed by a later
    /// [`Node::update`] once the bus reports idle. Queueing can fail on
    /// capacity; immediate transmission cannot.
    pub fn send(
        &mut self,
        destination: Destination,
        command: u8,
        payload: &[u8],
    ) -> Result<(), StoreError> {
        if payload.len() > MTU {
            return Err(StoreError::PayloadTooLong);
        }

        if self.mid_frame() {
            trace!("bus busy, queueing send");
            let header = Header {
                scope: destination.scope(),
                destination: destination.into_raw(),
                source: self.identity.address(),
                command,
            };
            self.store.enqueue(Lane::Outbound, header, payload)
        } else {
            write_frame(
                &mut self.device,
                destination.into_raw(),
                self.identity.address().into_u16(),
                command,
                payload,
            );
            Ok(())
        }
    }

    /// Drives the node: one outbound flush attempt, then a full drain of the
    /// device's pending bytes.
    ///
    /// The flush runs first so a message queued during the previous frame's
    /// end delimiter goes out before new frames are parsed.
    pub fn update(&mut self) {
        self.flush_outbound();
        while let Some(byte) = self.device.read() {
            self.consume(byte);
        }
    }

    /// Oldest received message, if any. Non-destructive.
    pub fn received(&self) -> Option<Message<'_>> {
        self.store.front(Lane::Inbound)
    }

    /// Discards the oldest received message and releases its payload buffer.
    pub fn drop_received(&mut self) {
        self.store.pop(Lane::Inbound);
    }

    fn mid_frame(&self) -> bool {
        self.rx.phase != Phase::Idle
    }

    fn flush_outbound(&mut self) {
        if !self.bus_idle {
            return;
        }
        let Some(message) = self.store.front(Lane::Outbound) else {
            return;
        };
        trace!("flushing queued send");
        write_frame(
            &mut self.device,
            message.header.destination,
            message.header.source.into_u16(),
            message.header.command,
            message.payload,
        );
        self.store.pop(Lane::Outbound);
    }

    fn consume(&mut self, byte: u8) {
        if byte == wire::START {
            trace!("start delimiter");
            self.bus_idle = false;
            self.rx.restart();
        } else if byte == wire::END {
            self.finish_frame();
        } else if let Some(data) = self.rx.unescaper.push(byte) {
            match self.rx.phase {
                // data before any start delimiter is noise
                Phase::Idle => {}
                Phase::Header { cursor } => self.collect_header(cursor, data),
                Phase::Payload => self.collect_payload(data),
            }
        }
    }

    fn finish_frame(&mut self) {
        // an end delimiter between frames is noise
        if self.rx.phase == Phase::Idle {
            return;
        }

        // below the minimum of destination + source + command the delimiter
        // is noise too: the decode context resets, the frame stays open and
        // the bus stays busy
        if 4 + self.rx.received < wire::MIN_FRAME_BYTES {
            trace!("short frame, delimiter ignored");
            self.rx.restart();
            return;
        }

        self.bus_idle = true;

        if self.rx.relay {
            self.device.write(wire::END);
        }

        if let Some(scope) = self.rx.scope {
            if self.rx.buffered > wire::FCS_BYTES && crc::is_valid(self.rx.crc) {
                // strip the leading command byte and the trailing check sequence
                let command = self.rx.buffer[0];
                let payload = &self.rx.buffer[1..self.rx.buffered - wire::FCS_BYTES];
                let header = Header {
                    scope,
                    destination: self.rx.destination,
                    source: Address::from_u16_truncating(self.rx.source),
                    command,
                };
                if let Err(error) = self.store.enqueue(Lane::Inbound, header, payload) {
                    debug!("inbound frame dropped: {:?}", error);
                }
            } else {
                trace!("checksum mismatch, frame dropped");
            }
        }

        self.rx.abort();
    }

    fn collect_header(&mut self, cursor: u8, data: u8) {
        self.rx.address_bytes[cursor as usize] = data;

        match cursor {
            1 => {
                let destination = u16::from_le_bytes([self.rx.address_bytes[0], data]);
                self.rx.destination = destination;
                self.rx.scope = self.identity.classify(destination);
                // only frames we buffer take part in the checksum
                if self.rx.scope.is_some() {
                    self.rx.crc = crc::update(self.rx.crc, self.rx.address_bytes[0]);
                    self.rx.crc = crc::update(self.rx.crc, data);
                }
                trace!("destination {}: {:?}", destination, self.rx.scope);
            }
            3 => {
                let source = u16::from_le_bytes([self.rx.address_bytes[2], data]);
                self.rx.source = source & VALUE_MASK;
                self.rx.source_recognized = self.identity.is_own_source(source);
                if self.rx.scope.is_some() {
                    self.rx.crc = crc::update(self.rx.crc, self.rx.address_bytes[2]);
                    self.rx.crc = crc::update(self.rx.crc, data);
                }

                // eligibility is decided here and holds for the whole frame:
                // never echo our own frames, never propagate unicast
                self.rx.relay =
                    !self.rx.source_recognized && self.rx.scope != Some(Scope::Unicast);
                if self.rx.relay {
                    trace!("relaying frame from {}", self.rx.source);
                    self.device.write(wire::START);
                    let address_bytes = self.rx.address_bytes;
                    for &raw in &address_bytes {
                        write_escaped(&mut self.device, raw);
                    }
                }
            }
            _ => {}
        }

        self.rx.phase = match cursor {
            3 => Phase::Payload,
            cursor => Phase::Header { cursor: cursor + 1 },
        };
    }

    fn collect_payload(&mut self, data: u8) {
        self.rx.received += 1;

        if self.rx.scope.is_some() {
            if self.rx.buffered < self.rx.buffer.capacity() {
                self.rx.buffer[self.rx.buffered] = data;
                self.rx.buffered += 1;
                self.rx.crc = crc::update(self.rx.crc, data);
            } else if !self.rx.overflow {
                // dropped bytes stay out of the checksum, which rejects the frame
                self.rx.overflow = true;
                warn!("receive buffer overflow");
            }
        }

        if self.rx.relay {
            write_escaped(&mut self.device, data);
        }
    }
}

fn write_escaped<D: Device>(device: &mut D, raw: u8) {
    for &byte in wire::escape(raw).iter() {
        device.write(byte);
    }
}

/// Serializes one complete frame to the device.
fn write_frame<D: Device>(
    device: &mut D,
    destination: u16,
    source: u16,
    command: u8,
    payload: &[u8],
) {
    let mut fcs = crc::INIT;

    device.write(wire::START);
    for raw in [
        destination as u8,
        (destination >> 8) as u8,
        source as u8,
        (source >> 8) as u8,
        command,
    ] {
        write_escaped(device, raw);
        fcs = crc::update(fcs, raw);
    }
    for &raw in payload {
        write_escaped(device, raw);
        fcs = crc::update(fcs, raw);
    }
    write_escaped(device, fcs as u8);
    write_escaped(device, (fcs >> 8) as u8);
    device.write(wire::END);
}
