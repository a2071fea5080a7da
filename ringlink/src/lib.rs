//! # Ringlink
//!
//! This library implements an addressable serial bus protocol for no_std
//! environments: escape-coded framing, a running frame check sequence,
//! three-tier addressing (unicast, multicast, broadcast), and loop-safe
//! cut-through relaying between bus segments, all driven from a single
//! non-blocking byte device. It uses fixed-capacity buffers throughout and
//! requires no dynamic memory allocation.
//!
//! ## Architecture
//!
//! ```text
//!             ┌──────────┐   update()    ┌──────────────┐
//!  Device ───►│ Receive  ├──────────────►│   Inbound    │──► received()
//!  (bytes)    │ machine  │  frame ok     │   queue      │
//!             └────┬─────┘               ├──────────────┤
//!                  │ cut-through         │ Payload pool │
//!  Device ◄────────┤ relay               ├──────────────┤
//!  (bytes)         │                     │   Outbound   │◄── send()
//!             ┌────┴─────┐   bus idle    │   queue      │
//!  Device ◄───┤ Transmit │◄──────────────┴──────────────┘
//!             └──────────┘
//! ```
//!
//! Components:
//! * _Node_ owns the device, the node identity, and the message store. Its
//!   `update` method is called periodically from one interrupt context or
//!   one polling loop and drives everything else.
//! * _Receive machine_ reconstructs one in-flight frame into a single shared
//!   buffer, classifies the destination, and decides relay eligibility while
//!   the frame is still streaming.
//! * _Transmit engine_ serializes a message immediately when the bus is free
//!   and queues it otherwise; queued messages flush when the bus goes idle.
//! * _Store_ holds two bounded message queues over one fixed payload pool
//!   and owns every queued byte.
//! * _SharedNode_ wraps a node in a blocking mutex for setups where an
//!   interrupt handler and a foreground task both need access.
//!
//! This is a best-effort datagram layer: there is no delivery guarantee, no
//! retransmission, and no congestion control beyond waiting for bus idle.
//! Malformed frames are dropped silently; only local capacity errors are
//! reported to the caller.
//!
//! The wire constants in [`wire`], the address layout in [`core`], and the
//! checksum in [`crc`] are bus-wide invariants: every node sharing a bus
//! must be built with the same values.
#![no_std]

pub use ringlink_core as core;
pub use ringlink_device as device;

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod crc;
pub mod message;
pub mod node;
pub mod shared;
pub mod store;
mod utils;
pub mod wire;

pub use message::{Header, Message};
pub use node::Node;
pub use store::{Lane, Store, StoreError, TransferError};
