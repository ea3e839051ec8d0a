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
//! The Substrate: per-link egress delay emulation, ingress demultiplexing,
//! and wire encode/decode over a shared UDP socket (spec.md §4.3).

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};
use rand::Rng;

use vectorlink_wire::{Packet, Protocol, MAX_PACKET_LEN};

use crate::config::NeighborConfig;
use crate::error::SubstrateError;
use crate::forwarder::{EgressQueue, QUEUE_CAPACITY};

/// The overlay's fixed UDP port (spec.md §6 "Wire format").
pub const PORT: u16 = 31313;

const EGRESS_GRACE: Duration = Duration::from_secs(3);
const INGRESS_GRACE: Duration = Duration::from_secs(5);
const SOCKET_TIMEOUT: Duration = Duration::from_millis(100);

struct LinkAddr {
    addr: SocketAddr,
}

pub struct Substrate {
    socket: UdpSocket,
    links: Vec<LinkAddr>,
    delays: Mutex<Vec<f64>>,
    static_delay: bool,
    to_wire: Vec<Arc<EgressQueue>>,
    from_wire_tx: Sender<(Packet, usize)>,
    egress_watermark: Mutex<Option<Instant>>,
    ingress_watermark: Mutex<Option<Instant>>,
}

impl Substrate {
    /// Binds the shared UDP socket at `host_ip:31313`, resolves every
    /// neighbor's host address, and builds the egress queues and ingress
    /// channel. Returns the `Substrate` plus the ingress receiver, which
    /// the caller hands to the [`crate::forwarder::Forwarder`] alongside
    /// [`Substrate::egress_queues`].
    pub fn new(
        host_ip: &str,
        neighbors: &[NeighborConfig],
        static_delay: bool,
    ) -> Result<(Self, Receiver<(Packet, usize)>), SubstrateError> {
        Self::bind(host_ip, PORT, neighbors, static_delay)
    }

    /// As [`Substrate::new`], but binding the given port rather than the
    /// fixed overlay port. Used by tests so parallel test runs don't
    /// collide on `31313`.
    fn bind(
        host_ip: &str,
        port: u16,
        neighbors: &[NeighborConfig],
        static_delay: bool,
    ) -> Result<(Self, Receiver<(Packet, usize)>), SubstrateError> {
        let socket = UdpSocket::bind((host_ip, port))
            .map_err(|e| SubstrateError::Bind(host_ip.to_string(), e))?;
        socket
            .set_read_timeout(Some(SOCKET_TIMEOUT))
            .map_err(|e| SubstrateError::Bind(host_ip.to_string(), e))?;

        let mut links = Vec::with_capacity(neighbors.len());
        let mut delays = Vec::with_capacity(neighbors.len());
        let mut to_wire = Vec::with_capacity(neighbors.len());
        for n in neighbors {
            let addr = (n.host_ip.as_str(), PORT)
                .to_socket_addrs()
                .map_err(|e| SubstrateError::UnresolvableHost(n.host_ip.clone(), e))?
                .next()
                .ok_or_else(|| SubstrateError::NoAddressForHost(n.host_ip.clone()))?;
            links.push(LinkAddr { addr });
            delays.push(n.delay);
            to_wire.push(Arc::new(EgressQueue::new(QUEUE_CAPACITY)));
        }

        let (from_wire_tx, from_wire_rx) = bounded(QUEUE_CAPACITY);

        let substrate = Substrate {
            socket,
            links,
            delays: Mutex::new(delays),
            static_delay,
            to_wire,
            from_wire_tx,
            egress_watermark: Mutex::new(None),
            ingress_watermark: Mutex::new(None),
        };
        Ok((substrate, from_wire_rx))
    }

    /// The per-link egress queues, shared with the Forwarder.
    pub fn egress_queues(&self) -> Vec<Arc<EgressQueue>> {
        self.to_wire.clone()
    }

    fn link_for_addr(&self, addr: SocketAddr) -> Option<usize> {
        self.links.iter().position(|l| l.addr.ip() == addr.ip())
    }

    // -- egress ----------------------------------------------------------

    /// Scans every link's egress queue, releasing and transmitting packets
    /// whose emulated delay has elapsed, until `quit` is set or the
    /// idle-grace termination heuristic fires (spec.md §4.3).
    pub fn run_egress(&self, quit: &AtomicBool) {
        let mut last_perturb = Instant::now();
        loop {
            if quit.load(Ordering::Relaxed) || self.egress_idle_too_long() {
                break;
            }
            if !self.static_delay && last_perturb.elapsed() >= Duration::from_secs(1) {
                self.perturb_delays();
                last_perturb = Instant::now();
            }

            let mut released_any = false;
            for link in 0..self.to_wire.len() {
                let deadline = Duration::from_secs_f64(self.delays.lock().unwrap()[link].abs());
                let released = self.to_wire[link].pop_front_if(|(_, enqueued_at)| {
                    Instant::now() >= *enqueued_at + deadline
                });
                if let Some((packet, _)) = released {
                    released_any = true;
                    if packet.protocol == Protocol::Data {
                        self.mark_egress_activity();
                    }
                    self.transmit(link, &packet);
                }
            }
            if !released_any {
                thread::sleep(Duration::from_millis(1));
            }
        }
    }

    /// `delay[i] += 0.002*(i+1)^3`; flips sign if `|delay[i]| > 0.5` or on a
    /// 2% random draw (spec.md §4.3 "Dynamic delay emulation").
    fn perturb_delays(&self) {
        let mut delays = self.delays.lock().unwrap();
        let mut rng = rand::thread_rng();
        for (i, delay) in delays.iter_mut().enumerate() {
            *delay += 0.002 * ((i + 1) as f64).powi(3);
            if delay.abs() > 0.5 || rng.gen::<f64>() < 0.02 {
                *delay = -*delay;
            }
        }
    }

    fn transmit(&self, link: usize, packet: &Packet) {
        let bytes = match packet.encode() {
            Ok(bytes) => bytes,
            Err(e) => {
                log::error!("failed to encode packet for link {link}: {e}");
                return;
            }
        };
        if let Err(e) = self.socket.send_to(&bytes, self.links[link].addr) {
            log::warn!("send to link {link} ({}) failed: {e}", self.links[link].addr);
        }
    }

    fn mark_egress_activity(&self) {
        *self.egress_watermark.lock().unwrap() = Some(Instant::now());
    }

    fn egress_idle_too_long(&self) -> bool {
        matches!(*self.egress_watermark.lock().unwrap(), Some(t) if t.elapsed() >= EGRESS_GRACE)
    }

    // -- ingress -----------------------------------------------------------

    /// Blocking receive loop with a 100ms socket timeout. Unknown-host
    /// datagrams and malformed (too-short/too-large) datagrams are fatal;
    /// the caller is expected to exit the process on `Err`.
    pub fn run_ingress(&self, quit: &AtomicBool) -> Result<(), SubstrateError> {
        let mut buf = [0u8; MAX_PACKET_LEN];
        loop {
            if quit.load(Ordering::Relaxed) || self.ingress_idle_too_long() {
                return Ok(());
            }
            let (n, src) = match self.socket.recv_from(&mut buf) {
                Ok(pair) => pair,
                Err(e) if is_timeout(&e) => continue,
                Err(e) => {
                    log::warn!("ingress recv error: {e}");
                    continue;
                }
            };

            let packet = match Packet::decode(&buf[..n]) {
                Ok(packet) => packet,
                Err(e @ (vectorlink_wire::WireError::TooShort(_)
                | vectorlink_wire::WireError::TooLarge(_))) => {
                    return Err(SubstrateError::MalformedDatagram(e));
                }
                Err(e) => {
                    log::debug!("dropping malformed datagram from {src}: {e}");
                    continue;
                }
            };

            let link = self
                .link_for_addr(src)
                .ok_or(SubstrateError::UnknownHost(src))?;

            if packet.protocol == Protocol::Data {
                self.mark_ingress_activity();
            }
            if self.from_wire_tx.try_send((packet, link)).is_err() {
                log::debug!("ingress queue full, dropping packet from link {link}");
            }
        }
    }

    fn mark_ingress_activity(&self) {
        *self.ingress_watermark.lock().unwrap() = Some(Instant::now());
    }

    fn ingress_idle_too_long(&self) -> bool {
        matches!(*self.ingress_watermark.lock().unwrap(), Some(t) if t.elapsed() >= INGRESS_GRACE)
    }
}

fn is_timeout(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neighbor(ip: &str, port_host: &str, delay: f64) -> NeighborConfig {
        NeighborConfig {
            overlay_ip: ip.parse().unwrap(),
            host_ip: port_host.to_string(),
            delay,
        }
    }

    #[test]
    fn binds_and_resolves_neighbors() {
        let neighbors = vec![neighbor("1.1.0.2", "127.0.0.1", 0.1)];
        let (substrate, _rx) = Substrate::bind("127.0.0.1", 0, &neighbors, true).unwrap();
        assert_eq!(substrate.links.len(), 1);
        assert_eq!(substrate.egress_queues().len(), 1);
    }

    #[test]
    fn unresolvable_host_is_an_error() {
        let neighbors = vec![neighbor("1.1.0.2", "not-a-real-host.invalid", 0.1)];
        assert!(Substrate::bind("127.0.0.1", 0, &neighbors, true).is_err());
    }

    #[test]
    fn perturb_flips_sign_past_threshold() {
        let neighbors = vec![neighbor("1.1.0.2", "127.0.0.1", 0.499)];
        let (substrate, _rx) = Substrate::bind("127.0.0.1", 0, &neighbors, false).unwrap();
        for _ in 0..10 {
            substrate.perturb_delays();
        }
        // Should have crossed the 0.5 threshold and flipped at least once
        // without ever diverging unboundedly.
        assert!(substrate.delays.lock().unwrap()[0].abs() < 1.0);
    }
}
