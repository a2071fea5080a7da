//! Three nodes daisy-chained into a ring: a -> b -> c -> a

use ringlink::core::{Address, Destination, GroupAddress, Identity, Scope};
use ringlink::device::SoftDevice;
use ringlink::Node;

type TestNode = Node<SoftDevice<512>, 32, 4, 8>;

fn node(address: u16, group: u16) -> TestNode {
    let identity = Identity::new(
        Address::new(address).unwrap(),
        GroupAddress::new(group).unwrap(),
    );
    Node::new(SoftDevice::new(), identity)
}

/// Moves every written byte one hop down the ring.
fn transfer(from: &mut TestNode, to: &mut TestNode) -> usize {
    let mut moved = 0;
    while let Some(byte) = from.device_mut().pop_written() {
        assert_eq!(to.device_mut().feed(&[byte]), 1);
        moved += 1;
    }
    moved
}

/// Runs the ring until no node has anything left to forward.
///
/// Relay loop suppression is what makes this terminate; the iteration cap
/// turns an accidental loop into a test failure instead of a hang.
fn pump(a: &mut TestNode, b: &mut TestNode, c: &mut TestNode) {
    for _ in 0..16 {
        let mut moved = 0;
        moved += transfer(a, b);
        b.update();
        moved += transfer(b, c);
        c.update();
        moved += transfer(c, a);
        a.update();
        if moved == 0 {
            return;
        }
    }
    panic!("ring did not quiesce, relay loop suspected");
}

#[test]
fn test_broadcast_travels_the_ring() {
    let mut a = node(1, 5);
    let mut b = node(2, 5);
    let mut c = node(3, 6);

    a.send(Destination::Broadcast, 9, &[1, 2, 3]).unwrap();
    pump(&mut a, &mut b, &mut c);

    for receiver in [&mut b, &mut c] {
        let message = receiver.received().expect("broadcast reaches every node");
        assert_eq!(message.header.scope, Scope::Broadcast);
        assert_eq!(message.header.source, Address::new(1).unwrap());
        assert_eq!(message.header.command, 9);
        assert_eq!(message.payload, &[1, 2, 3]);
    }

    // the originator hears its own broadcast once the ring closes, but
    // must not relay it again
    let message = a.received().expect("broadcast comes full circle");
    assert_eq!(message.header.source, Address::new(1).unwrap());
    a.drop_received();
    assert!(a.received().is_none());
}

#[test]
fn test_multicast_group_selection() {
    let mut a = node(1, 5);
    let mut b = node(2, 5);
    let mut c = node(3, 6);

    a.send(
        Destination::Multicast(GroupAddress::new(5).unwrap()),
        7,
        &[9, 9],
    )
    .unwrap();
    pump(&mut a, &mut b, &mut c);

    let message = b.received().expect("group member receives");
    assert_eq!(message.header.scope, Scope::Multicast);
    assert_eq!(message.header.command, 7);
    assert_eq!(message.payload, &[9, 9]);

    // c is in another group: it relays the frame but never buffers it
    assert!(c.received().is_none());
}

#[test]
fn test_unicast_is_contained() {
    let mut a = node(1, 5);
    let mut b = node(2, 5);
    let mut c = node(3, 6);

    a.send(Destination::Unicast(Address::new(2).unwrap()), 1, &[])
        .unwrap();
    assert!(transfer(&mut a, &mut b) > 0);
    b.update();

    assert_eq!(b.received().unwrap().header.scope, Scope::Unicast);
    // the frame stops at its recipient
    assert_eq!(transfer(&mut b, &mut c), 0);
    c.update();
    assert!(c.received().is_none());
}

#[test]
fn test_unmatched_unicast_passes_through() {
    let mut a = node(1, 5);
    let mut b = node(2, 5);
    let mut c = node(3, 6);

    // addressed past b: b forwards it without buffering, c consumes it
    a.send(Destination::Unicast(Address::new(3).unwrap()), 5, &[7])
        .unwrap();
    assert!(transfer(&mut a, &mut b) > 0);
    b.update();
    assert!(b.received().is_none());

    assert!(transfer(&mut b, &mut c) > 0);
    c.update();
    let message = c.received().expect("relayed unicast reaches its target");
    assert_eq!(message.header.command, 5);
    assert_eq!(message.payload, &[7]);

    // and dies there
    assert_eq!(transfer(&mut c, &mut a), 0);
}

#[test]
fn test_relayed_frame_is_byte_identical() {
    let mut a = node(1, 5);
    let mut b = node(2, 5);

    a.send(Destination::Broadcast, 4, &[0x7e, 0x7d, 0x7c]).unwrap();
    let mut original = Vec::new();
    while let Some(byte) = a.device_mut().pop_written() {
        original.push(byte);
    }

    b.device_mut().feed(&original);
    b.update();

    let mut relayed = Vec::new();
    while let Some(byte) = b.device_mut().pop_written() {
        relayed.push(byte);
    }
    assert_eq!(relayed, original);
}
