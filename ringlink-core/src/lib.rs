//! Ring-bus protocol core data types
//!
//! This crate provides the basic data type definitions used by the other Ringlink
//! crates: bus addresses, group addresses, node identity, and message scope.
//! Ringlink users should not depend on this crate directly. Use the `ringlink::core`
//! reexport instead.
//!
//! ## Address field layout
//!
//! The wire carries 16-bit address fields with the following layout. Every node on
//! a bus must agree on it:
//! * `0xFFFF` is the broadcast sentinel and matches every node.
//! * Bit 15 set marks a group (multicast) address.
//! * The remaining 15 bits are the address magnitude.
//!
//! The group value `0x7FFF` is reserved: combined with the group bit it would
//! collide with the broadcast sentinel.
#![no_std]

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidValue;

/// Broadcast sentinel address, matched by every node
pub const BROADCAST: u16 = 0xffff;

/// Marks a raw address field as a group (multicast) address
pub const GROUP_BIT: u16 = 0x8000;

/// Magnitude bits of a raw address field
pub const VALUE_MASK: u16 = 0x7fff;

/// Individual node address
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Address(u16);

impl Address {
    const MAX_VALUE: u16 = VALUE_MASK;
    pub const MAX: Address = Address(Self::MAX_VALUE);

    pub const fn new(value: u16) -> Option<Self> {
        if value <= Self::MAX_VALUE {
            Some(Self::from_u16_truncating(value))
        } else {
            None
        }
    }

    pub const fn from_u16_truncating(value: u16) -> Self {
        Self(value & Self::MAX_VALUE)
    }

    pub const fn into_u16(self) -> u16 {
        self.0
    }
}

impl From<Address> for u16 {
    fn from(value: Address) -> Self {
        value.into_u16()
    }
}

impl TryFrom<u16> for Address {
    type Error = InvalidValue;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(InvalidValue)
    }
}

/// Group (multicast) address
///
/// The value `0x7FFF` is reserved, see the crate documentation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GroupAddress(u16);

impl GroupAddress {
    const MAX_VALUE: u16 = VALUE_MASK - 1;
    pub const MAX: GroupAddress = GroupAddress(Self::MAX_VALUE);

    pub const fn new(value: u16) -> Option<Self> {
        if value <= Self::MAX_VALUE {
            Some(Self(value))
        } else {
            None
        }
    }

    pub const fn into_u16(self) -> u16 {
        self.0
    }
}

impl From<GroupAddress> for u16 {
    fn from(value: GroupAddress) -> Self {
        value.into_u16()
    }
}

impl TryFrom<u16> for GroupAddress {
    type Error = InvalidValue;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(InvalidValue)
    }
}

/// Addressing tier of a frame
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Scope {
    /// Addressed to exactly one node. Never relayed.
    Unicast,
    /// Addressed to every member of one group.
    Multicast,
    /// Addressed to every node on the bus.
    Broadcast,
}

/// Destination of an outgoing message
///
/// Encodes both the scope and the address magnitude of the wire-level
/// destination field.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Destination {
    Unicast(Address),
    Multicast(GroupAddress),
    Broadcast,
}

impl Destination {
    /// Raw 16-bit destination field as it appears on the wire
    pub const fn into_raw(self) -> u16 {
        match self {
            Destination::Unicast(address) => address.into_u16(),
            Destination::Multicast(group) => group.into_u16() | GROUP_BIT,
            Destination::Broadcast => BROADCAST,
        }
    }

    pub const fn scope(self) -> Scope {
        match self {
            Destination::Unicast(_) => Scope::Unicast,
            Destination::Multicast(_) => Scope::Multicast,
            Destination::Broadcast => Scope::Broadcast,
        }
    }
}

/// Node identity, fixed at construction
///
/// Holds the individual address and the group membership a node classifies
/// incoming destination fields against.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Identity {
    address: Address,
    group: GroupAddress,
}

impl Identity {
    pub const fn new(address: Address, group: GroupAddress) -> Self {
        Self { address, group }
    }

    pub const fn address(&self) -> Address {
        self.address
    }

    pub const fn group(&self) -> GroupAddress {
        self.group
    }

    /// Classifies a raw destination field against this identity.
    ///
    /// Returns `None` when the destination does not match this node. Unmatched
    /// frames are not buffered, though they may still be relayed.
    pub const fn classify(&self, raw: u16) -> Option<Scope> {
        if raw == BROADCAST {
            Some(Scope::Broadcast)
        } else if raw & GROUP_BIT != 0 {
            if raw & VALUE_MASK == self.group.into_u16() {
                Some(Scope::Multicast)
            } else {
                None
            }
        } else if raw & VALUE_MASK == self.address.into_u16() {
            Some(Scope::Unicast)
        } else {
            None
        }
    }

    /// True iff a raw source field names this node.
    ///
    /// Used for loop suppression only, never for acceptance.
    pub const fn is_own_source(&self, raw: u16) -> bool {
        raw & VALUE_MASK == self.address.into_u16()
    }
}
