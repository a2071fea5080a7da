//! Protocol datagram types

use crate::core::{Address, Scope};

/// Decoded frame header
///
/// `destination` is the raw 16-bit wire field; its meaning is already
/// captured by `scope`. `source` is the masked individual address of the
/// originator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Header {
    pub scope: Scope,
    pub destination: u16,
    pub source: Address,
    pub command: u8,
}

/// One queued datagram, payload borrowed from the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Message<'a> {
    pub header: Header,
    pub payload: &'a [u8],
}
