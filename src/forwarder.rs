// vectorlink: a distributed overlay IP path-vector router
// Copyright (C) 2026 The vectorlink Authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//! The Forwarder: longest-prefix-match forwarding and packet-plane
//! multiplexing between the application, the Router and the Substrate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};

use vectorlink_wire::{OverlayAddr, Packet, Prefix, Protocol};

use crate::blocking_queue::BoundedQueue;

/// Capacity shared by every bounded queue in the system.
pub const QUEUE_CAPACITY: usize = 1000;

/// The initial TTL stamped onto locally-originated data packets.
const INITIAL_TTL: u8 = 99;

/// Per-link egress queue entry: a packet paired with the instant it was
/// handed to the substrate, used by the egress scheduler to compute release
/// time.
pub type EgressQueue = BoundedQueue<(Packet, Instant)>;

/// Inserts or updates `(prefix, link)` in a forwarding table kept in
/// descending prefix-length order, in place.
fn upsert(table: &mut Vec<(Prefix, usize)>, prefix: Prefix, link: usize) {
    if let Some(entry) = table.iter_mut().find(|(p, _)| *p == prefix) {
        entry.1 = link;
        return;
    }
    match table.iter().position(|(p, _)| p.length() < prefix.length()) {
        Some(idx) => table.insert(idx, (prefix, link)),
        None => table.push((prefix, link)),
    }
}

/// Longest-prefix match: the table is kept sorted, so the first match wins.
fn lookup_in(table: &[(Prefix, usize)], ip: OverlayAddr) -> Option<usize> {
    table
        .iter()
        .find(|(prefix, _)| prefix.matches(ip))
        .map(|(_, link)| *link)
}

pub struct Forwarder {
    my_ip: OverlayAddr,
    table: Mutex<Vec<(Prefix, usize)>>,

    from_app_tx: Sender<(String, OverlayAddr)>,
    from_app_rx: Receiver<(String, OverlayAddr)>,
    to_app_tx: Sender<(String, OverlayAddr)>,
    to_app_rx: Receiver<(String, OverlayAddr)>,

    from_router_tx: Sender<(Packet, usize)>,
    from_router_rx: Receiver<(Packet, usize)>,
    to_router_tx: Sender<Packet>,
    to_router_rx: Receiver<Packet>,

    from_wire_rx: Receiver<(Packet, usize)>,
    to_wire: Vec<Arc<EgressQueue>>,
}

impl Forwarder {
    /// `to_wire[i]` is the substrate egress queue for link `i`; `from_wire`
    /// is the substrate's single ingress queue. Link 0's default route
    /// (`0.0.0.0/0`) is installed permanently and is never removed.
    pub fn new(
        my_ip: OverlayAddr,
        from_wire_rx: Receiver<(Packet, usize)>,
        to_wire: Vec<Arc<EgressQueue>>,
    ) -> Self {
        let (from_app_tx, from_app_rx) = bounded(QUEUE_CAPACITY);
        let (to_app_tx, to_app_rx) = bounded(QUEUE_CAPACITY);
        let (from_router_tx, from_router_rx) = bounded(QUEUE_CAPACITY);
        let (to_router_tx, to_router_rx) = bounded(QUEUE_CAPACITY);

        Forwarder {
            my_ip,
            table: Mutex::new(vec![(Prefix::default_route(), 0)]),
            from_app_tx,
            from_app_rx,
            to_app_tx,
            to_app_rx,
            from_router_tx,
            from_router_rx,
            to_router_tx,
            to_router_rx,
            from_wire_rx,
            to_wire,
        }
    }

    // -- application plane -------------------------------------------------

    /// Builds and enqueues a data packet. Fails (rather than blocking) when
    /// the application-plane queue is full.
    pub fn send(&self, payload: impl Into<String>, dest: OverlayAddr) -> bool {
        self.from_app_tx
            .try_send((payload.into(), dest))
            .is_ok()
    }

    /// Blocks until a payload addressed to this router is available.
    pub fn receive(&self) -> (String, OverlayAddr) {
        self.to_app_rx
            .recv()
            .expect("forwarder dropped while app is still receiving")
    }

    pub fn ready(&self) -> bool {
        self.from_app_tx.len() < QUEUE_CAPACITY
    }

    pub fn incoming(&self) -> bool {
        !self.to_app_rx.is_empty()
    }

    // -- routing plane -------------------------------------------------------

    /// Enqueues a router-originated packet for egress on `link`, blocking
    /// if the queue is full.
    pub fn send_pkt(&self, packet: Packet, link: usize) {
        self.from_router_tx
            .send((packet, link))
            .expect("forwarder dropped while router is still sending")
    }

    /// Blocks until a control packet addressed to this router is available.
    pub fn receive_pkt(&self) -> Packet {
        self.to_router_rx
            .recv()
            .expect("forwarder dropped while router is still receiving")
    }

    pub fn ready_pkt(&self) -> bool {
        self.from_router_tx.len() < QUEUE_CAPACITY
    }

    pub fn incoming_pkt(&self) -> bool {
        !self.to_router_rx.is_empty()
    }

    // -- forwarding table ------------------------------------------------

    /// Idempotent upsert into the forwarding table.
    pub fn add_route(&self, prefix: Prefix, link: usize) {
        let mut table = self.table.lock().unwrap();
        upsert(&mut table, prefix, link);
    }

    /// Longest-prefix-match lookup. Returns `None` only if the permanent
    /// default route were somehow removed, which this implementation never
    /// allows; callers keep a defensive branch anyway.
    pub fn lookup(&self, ip: OverlayAddr) -> Option<usize> {
        lookup_in(&self.table.lock().unwrap(), ip)
    }

    pub fn print_table(&self) {
        let table = self.table.lock().unwrap();
        log::debug!("forwarding table ({} entries):", table.len());
        for (prefix, link) in table.iter() {
            log::debug!("  {prefix} -> link {link}");
        }
    }

    // -- main loop ---------------------------------------------------------

    /// Runs the Forwarder's main loop until `quit` is set. Priority order:
    /// substrate ingress, then router egress, then application egress;
    /// otherwise sleep 1ms.
    pub fn run(&self, quit: &AtomicBool) {
        while !quit.load(Ordering::Relaxed) {
            if let Ok((packet, in_link)) = self.from_wire_rx.try_recv() {
                self.handle_from_wire(packet, in_link);
                continue;
            }
            if let Ok((packet, link)) = self.from_router_rx.try_recv() {
                self.forward_to_wire(packet, link);
                continue;
            }
            if let Ok((payload, dest)) = self.from_app_rx.try_recv() {
                self.handle_from_app(payload, dest);
                continue;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    fn handle_from_wire(&self, mut packet: Packet, in_link: usize) {
        if packet.dest_adr == self.my_ip {
            match packet.protocol {
                Protocol::Data => {
                    let _ = self.to_app_tx.send((packet.payload, packet.src_adr));
                }
                Protocol::Control => {
                    let _ = self.to_router_tx.send(packet);
                }
            }
            return;
        }

        // Transit traffic.
        packet.ttl = packet.ttl.saturating_sub(1);
        if packet.ttl == 0 {
            log::debug!(
                "dropping transit packet to {} from link {in_link}: ttl expired",
                packet.dest_adr
            );
            return;
        }
        match self.lookup(packet.dest_adr) {
            Some(link) => self.forward_to_wire(packet, link),
            None => {
                // Unreachable under normal configuration: the default
                // route is installed at construction and never removed.
                log::error!("no forwarding entry for {}, dropping", packet.dest_adr);
            }
        }
    }

    fn handle_from_app(&self, payload: String, dest: OverlayAddr) {
        let packet = Packet::new(Protocol::Data, INITIAL_TTL, self.my_ip, dest, payload);
        match self.lookup(dest) {
            Some(link) => self.forward_to_wire(packet, link),
            None => log::error!("no forwarding entry for {dest}, dropping"),
        }
    }

    fn forward_to_wire(&self, packet: Packet, link: usize) {
        match self.to_wire.get(link) {
            Some(queue) => queue.push_blocking((packet, Instant::now())),
            None => log::error!("no such link {link}, dropping packet to {}", packet.dest_adr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pfx(s: &str) -> Prefix {
        s.parse().unwrap()
    }

    #[test]
    fn default_route_is_installed_and_never_removed() {
        let (_tx, rx) = bounded(1);
        let fwd = Forwarder::new(OverlayAddr(0), rx, vec![]);
        assert_eq!(fwd.lookup(OverlayAddr(0xFFFF_FFFF)), Some(0));
    }

    #[test]
    fn longest_prefix_match_with_overlapping_prefixes() {
        let mut table = vec![(Prefix::default_route(), 0)];
        upsert(&mut table, pfx("1.2.0.0/16"), 3);
        upsert(&mut table, pfx("1.2.3.0/24"), 5);
        assert_eq!(
            table,
            vec![
                (pfx("1.2.3.0/24"), 5),
                (pfx("1.2.0.0/16"), 3),
                (Prefix::default_route(), 0),
            ]
        );
        assert_eq!(lookup_in(&table, "1.2.3.9".parse().unwrap()), Some(5));
        assert_eq!(lookup_in(&table, "1.2.9.9".parse().unwrap()), Some(3));
        assert_eq!(lookup_in(&table, "9.9.9.9".parse().unwrap()), Some(0));
    }

    #[test]
    fn add_route_is_idempotent() {
        let mut t1 = vec![(Prefix::default_route(), 0)];
        upsert(&mut t1, pfx("10.0.0.0/8"), 2);

        let mut t2 = vec![(Prefix::default_route(), 0)];
        upsert(&mut t2, pfx("10.0.0.0/8"), 2);
        upsert(&mut t2, pfx("10.0.0.0/8"), 2);

        assert_eq!(t1, t2);
    }

    #[test]
    fn add_route_replaces_link_for_existing_prefix() {
        let mut table = vec![(Prefix::default_route(), 0)];
        upsert(&mut table, pfx("10.0.0.0/8"), 2);
        upsert(&mut table, pfx("10.0.0.0/8"), 7);
        assert_eq!(table, vec![(pfx("10.0.0.0/8"), 7), (Prefix::default_route(), 0)]);
    }

    #[test]
    fn send_fails_when_queue_is_full() {
        let (_tx, rx) = bounded(1);
        let fwd = Forwarder::new(OverlayAddr(1), rx, vec![]);
        // Fill the from_app queue to capacity by draining nothing.
        for _ in 0..QUEUE_CAPACITY {
            assert!(fwd.send("x", OverlayAddr(2)));
        }
        assert!(!fwd.send("overflow", OverlayAddr(2)));
    }
}
