//! End-to-end ring flow: registration, setup, distribution, queries, leave.
//!
//! The coordinator and node state machines are wired through an in-memory
//! datagram router, so the whole protocol runs without sockets and every
//! hop is observable.

use coordinator::Coordinator;
use corelib::record::Record;
use corelib::wire::{Envelope, Message};
use node::Node;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::net::SocketAddr;

fn addr(port: u16) -> SocketAddr {
    format!("127.0.0.1:{port}").parse().unwrap()
}

fn record(key: &str, state: &str) -> Record {
    let mut attributes = BTreeMap::new();
    attributes.insert("key".to_string(), key.to_string());
    attributes.insert("state".to_string(), state.to_string());
    Record::new(key, attributes)
}

/// What happened while a batch of envelopes drained.
#[derive(Debug, Default)]
struct Trace {
    /// `FindEvent` datagrams delivered, with their destinations.
    forwards: Vec<SocketAddr>,
    /// Terminal `Found` replies: (originator, key, attributes).
    found: Vec<(SocketAddr, String, BTreeMap<String, String>)>,
    /// Terminal `NotFound` replies: (originator, key).
    not_found: Vec<(SocketAddr, String)>,
}

struct TestRing {
    coordinator_addr: SocketAddr,
    coordinator: Coordinator,
    nodes: HashMap<SocketAddr, Node>,
}

impl TestRing {
    fn new(records: Vec<Record>) -> Self {
        Self {
            coordinator_addr: addr(5000),
            coordinator: Coordinator::new(records),
            nodes: HashMap::new(),
        }
    }

    /// Registers a node and constructs its state machine from the assigned id.
    fn join(&mut self, port: u16) {
        let address = addr(port);
        let replies = self.coordinator.handle_message(
            Message::Register {
                from_address: address,
            },
            address,
        );
        let assigned_id = match replies.as_slice() {
            [Envelope {
                message: Message::RegisterAck { assigned_id },
                ..
            }] => *assigned_id,
            other => panic!("expected one RegisterAck, got {other:?}"),
        };
        let identity = corelib::node::NodeIdentity::new(assigned_id, address);
        self.nodes
            .insert(address, Node::new(identity, self.coordinator_addr));
    }

    /// Drains a batch of envelopes to completion, recording the traffic.
    fn deliver(&mut self, envelopes: Vec<Envelope>) -> Trace {
        let mut trace = Trace::default();
        let mut queue: VecDeque<Envelope> = envelopes.into();
        while let Some(envelope) = queue.pop_front() {
            match &envelope.message {
                Message::FindEvent { .. } => trace.forwards.push(envelope.to),
                Message::Found { key, attributes } => {
                    trace
                        .found
                        .push((envelope.to, key.clone(), attributes.clone()));
                }
                Message::NotFound { key } => {
                    trace.not_found.push((envelope.to, key.clone()));
                }
                _ => {}
            }
            let replies = if envelope.to == self.coordinator_addr {
                self.coordinator
                    .handle_message(envelope.message, envelope.to)
            } else if let Some(node) = self.nodes.get_mut(&envelope.to) {
                node.handle_message(envelope.message, envelope.to)
            } else {
                // Undeliverable: the recipient left or tore down.
                Vec::new()
            };
            queue.extend(replies);
        }
        trace
    }

    fn node_mut(&mut self, port: u16) -> &mut Node {
        self.nodes.get_mut(&addr(port)).unwrap()
    }
}

/// Builds the scenario ring: nodes 1, 2, 3 with records 10 and 11 distributed.
fn scenario_ring() -> TestRing {
    let mut ring = TestRing::new(vec![record("10", "TEXAS"), record("11", "KANSAS")]);
    for port in [6001, 6002, 6003] {
        ring.join(port);
    }
    let setup = ring.coordinator.setup();
    assert_eq!(setup.len(), 3);
    ring.deliver(setup);

    let stores = ring.coordinator.distribute();
    assert_eq!(stores.len(), 2);
    ring.deliver(stores);
    ring
}

#[test]
fn distribution_places_each_record_on_its_owner() {
    let mut ring = scenario_ring();
    // 10 % 3 == 1 -> node 2, 11 % 3 == 2 -> node 3; node 1 holds nothing.
    assert!(ring.node_mut(6001).partition().is_empty());
    assert!(ring.node_mut(6002).partition().get("10").is_some());
    assert!(ring.node_mut(6003).partition().get("11").is_some());
}

#[test]
fn query_from_any_node_finds_a_stored_record_within_two_forwards() {
    for port in [6001, 6002, 6003] {
        let mut ring = scenario_ring();
        let envelopes = ring.node_mut(port).query("10");
        let trace = ring.deliver(envelopes);

        assert_eq!(trace.found.len(), 1, "query from {port} must terminate once");
        let (originator, key, attributes) = &trace.found[0];
        assert_eq!(*originator, addr(port));
        assert_eq!(key, "10");
        assert_eq!(attributes["state"], "TEXAS");
        assert!(trace.not_found.is_empty());
        assert!(
            trace.forwards.len() <= 2,
            "query from {port} took {} forwards",
            trace.forwards.len(),
        );
    }
}

#[test]
fn absent_key_is_not_found_after_exactly_three_hops() {
    let mut ring = scenario_ring();
    let envelopes = ring.node_mut(6001).query("99");
    let trace = ring.deliver(envelopes);

    assert_eq!(trace.forwards.len(), 3);
    assert_eq!(trace.found.len(), 0);
    assert_eq!(trace.not_found, vec![(addr(6001), "99".to_string())]);
}

#[test]
fn leave_shrinks_the_ring_and_abandons_the_partition() {
    let mut ring = scenario_ring();

    let leave = ring.node_mut(6002).leave();
    let trace = ring.deliver(leave);
    assert!(trace.found.is_empty() && trace.not_found.is_empty());

    // Node 2 held key 10; after it leaves, the query traverses 1 -> 3 -> 1
    // and terminates without ever touching the departed node.
    let envelopes = ring.node_mut(6001).query("10");
    let trace = ring.deliver(envelopes);
    assert_eq!(trace.not_found, vec![(addr(6001), "10".to_string())]);
    assert_eq!(trace.forwards.len(), 2);
    assert!(trace.forwards.iter().all(|to| *to != addr(6002)));
}

#[test]
fn teardown_halts_every_node() {
    let mut ring = scenario_ring();
    let envelopes = ring.coordinator.teardown();
    ring.deliver(envelopes);

    for port in [6001, 6002, 6003] {
        assert!(ring.node_mut(port).is_terminated());
        assert!(ring.node_mut(port).query("10").is_empty());
    }
}
