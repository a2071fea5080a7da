//! Byte-stuffed wire format
//!
//! One frame on the wire:
//!
//! ```text
//! START | dest_lo dest_hi | src_lo src_hi | command | payload... | fcs_lo fcs_hi | END
//! ```
//!
//! Every byte between `START` and `END` is escape-coded: the three reserved
//! byte values never appear as data, so a receiver can resynchronize on the
//! next `START` after arbitrary corruption. The delimiters themselves go out
//! bare. These constants are bus-wide invariants; mixing nodes built with
//! different values on one bus cannot work.

/// Start-of-frame delimiter, never escaped
pub const START: u8 = 0x7e;

/// End-of-frame delimiter, never escaped
pub const END: u8 = 0x7c;

/// Escape prefix for reserved byte values occurring in data
pub const ESC: u8 = 0x7d;

/// XOR mask applied to an escaped byte
pub const ESC_XOR: u8 = 0x20;

/// Decoded bytes in the smallest meaningful frame: destination, source, command
pub const MIN_FRAME_BYTES: usize = 5;

/// Frame check sequence length in decoded bytes
pub const FCS_BYTES: usize = 2;

pub const fn is_reserved(byte: u8) -> bool {
    byte == START || byte == END || byte == ESC
}

/// Wire rendition of one raw byte: the byte itself, or `ESC` plus the byte
/// with bit 5 toggled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Escaped {
    bytes: [u8; 2],
    length: u8,
}

impl core::ops::Deref for Escaped {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.bytes[..self.length as usize]
    }
}

pub const fn escape(raw: u8) -> Escaped {
    if is_reserved(raw) {
        Escaped {
            bytes: [ESC, raw ^ ESC_XOR],
            length: 2,
        }
    } else {
        Escaped {
            bytes: [raw, 0],
            length: 1,
        }
    }
}

/// Escape decoder for the data bytes of one frame
///
/// `START` and `END` are structural and must be interpreted by the caller
/// before bytes reach this decoder. An `ESC` immediately followed by a
/// delimiter is malformed; the delimiter wins, the pending escape is
/// discarded by the caller's [`Unescaper::reset`], and frame integrity is
/// left to the checksum.
#[derive(Debug, Default, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Unescaper {
    pending: bool,
}

impl Unescaper {
    pub const fn new() -> Self {
        Self { pending: false }
    }

    pub fn reset(&mut self) {
        self.pending = false;
    }

    /// Consumes one non-structural wire byte.
    ///
    /// Returns the decoded data byte, or `None` when the byte was an escape
    /// prefix and carried no data itself.
    pub fn push(&mut self, wire: u8) -> Option<u8> {
        if wire == ESC {
            self.pending = true;
            None
        } else if self.pending {
            self.pending = false;
            Some(wire ^ ESC_XOR)
        } else {
            Some(wire)
        }
    }
}
