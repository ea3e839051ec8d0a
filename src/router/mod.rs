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
//! The Router: neighbor liveness, link-cost estimation, and path-vector
//! route advertisement.

mod link;
mod route;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use vectorlink_wire::{ControlBody, OverlayAddr, Packet, Prefix, Protocol};

use crate::config::NeighborConfig;
use crate::forwarder::Forwarder;

pub use link::LinkInfo;
pub use route::{path_contains_adjacency, route_update_applies, Route};

const HELLO_INTERVAL: Duration = Duration::from_secs(1);
const ADVERT_INTERVAL: Duration = Duration::from_secs(10);
const CONTROL_TTL: u8 = 99;

pub struct Router {
    my_ip: OverlayAddr,
    links: Vec<LinkInfo>,
    local_prefixes: Vec<Prefix>,
    enable_fa: bool,
    routes: HashMap<Prefix, Route>,
    forwarder: Arc<Forwarder>,
    start: Instant,
    last_hello: Instant,
    last_advert: Instant,
}

impl Router {
    pub fn new(
        my_ip: OverlayAddr,
        neighbors: &[NeighborConfig],
        local_prefixes: Vec<Prefix>,
        enable_fa: bool,
        forwarder: Arc<Forwarder>,
    ) -> Self {
        let links = neighbors
            .iter()
            .map(|n| LinkInfo::new(n.overlay_ip, n.delay))
            .collect();
        let start = Instant::now();
        Router {
            my_ip,
            links,
            local_prefixes,
            enable_fa,
            routes: HashMap::new(),
            forwarder,
            start,
            last_hello: start,
            last_advert: start,
        }
    }

    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    fn link_for_peer(&self, peer: OverlayAddr) -> Option<usize> {
        self.links.iter().position(|l| l.peer_ip == peer)
    }

    fn send_control(&self, link: usize, body: ControlBody) {
        let Some(info) = self.links.get(link) else {
            log::error!("no such link {link}, cannot send control packet");
            return;
        };
        let packet = Packet::new(
            Protocol::Control,
            CONTROL_TTL,
            self.my_ip,
            info.peer_ip,
            body.to_payload(),
        );
        self.forwarder.send_pkt(packet, link);
    }

    // -- main loop -----------------------------------------------------

    /// Runs the Router's main loop until `quit` is set. Priority order:
    /// HELLO timer, then periodic ADVERT timer, then inbound packets, then
    /// sleep 1ms. Each branch runs to completion.
    pub fn run(&mut self, quit: &AtomicBool) {
        while !quit.load(Ordering::Relaxed) {
            if self.last_hello.elapsed() >= HELLO_INTERVAL {
                self.emit_hello_round();
                self.last_hello = Instant::now();
                continue;
            }
            if self.last_advert.elapsed() >= ADVERT_INTERVAL {
                self.emit_periodic_advert();
                self.last_advert = Instant::now();
                continue;
            }
            if self.forwarder.incoming_pkt() {
                let packet = self.forwarder.receive_pkt();
                self.handle_packet(packet);
                continue;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    // -- HELLO -----------------------------------------------------------

    fn emit_hello_round(&mut self) {
        for link in 0..self.links.len() {
            self.process_liveness(link);
            let now = self.now();
            self.send_control(link, ControlBody::Hello { timestamp: now });
        }
    }

    fn process_liveness(&mut self, link: usize) {
        if !self.links[link].got_reply {
            if self.links[link].hello_state == 1 {
                self.links[link].hello_state = 0;
                let mut changed = false;
                for route in self.routes.values_mut() {
                    if route.out_link == link && route.valid {
                        route.valid = false;
                        changed = true;
                    }
                }
                if changed {
                    if log::log_enabled!(log::Level::Debug) {
                        self.print_routing_table();
                    }
                    if self.enable_fa {
                        self.send_failure_advert(link);
                    }
                }
            } else if self.links[link].hello_state > 0 {
                self.links[link].hello_state -= 1;
            }
        }
        self.links[link].got_reply = false;
    }

    fn handle_hello(&self, link: usize, timestamp: f64) {
        self.send_control(link, ControlBody::Hello2u { timestamp });
    }

    fn handle_hello_reply(&mut self, link: usize, timestamp: f64) {
        let now = self.now();
        let rtt = now - timestamp;
        let sample = rtt / 2.0;
        self.links[link].record_sample(sample);
    }

    // -- ADVERT ------------------------------------------------------------

    /// Periodic re-origination of the local prefix list. No split horizon:
    /// these prefixes originate at this router, so there is no upstream
    /// neighbor to exclude.
    fn emit_periodic_advert(&mut self) {
        let now = self.now();
        for prefix in self.local_prefixes.clone() {
            for link in 0..self.links.len() {
                self.send_control(
                    link,
                    ControlBody::Advert {
                        prefix,
                        timestamp: now,
                        cost: 0.0,
                        path: vec![self.my_ip],
                    },
                );
            }
        }
    }

    fn handle_advert(
        &mut self,
        in_link: usize,
        prefix: Prefix,
        _sender_timestamp: f64,
        advertised_cost: f64,
        received_path: Vec<OverlayAddr>,
    ) {
        if self.links[in_link].hello_state == 0 {
            log::debug!("dropping advert on dead link {in_link}");
            return;
        }
        if received_path.contains(&self.my_ip) {
            log::debug!("dropping advert for {prefix}: contains self (loop)");
            return;
        }
        let received_from = received_path[0];

        let mut new_path = Vec::with_capacity(received_path.len() + 1);
        new_path.push(self.my_ip);
        new_path.extend(received_path);

        let new_route = Route {
            pfx: prefix,
            timestamp: self.now(),
            cost: advertised_cost + self.links[in_link].cost,
            path: new_path,
            out_link: in_link,
            valid: true,
        };

        let install = match self.routes.get(&prefix) {
            None => true,
            Some(existing) => route_update_applies(existing, &new_route),
        };
        if !install {
            return;
        }

        let out_link_changed = self
            .routes
            .get(&prefix)
            .map(|existing| existing.out_link != new_route.out_link)
            .unwrap_or(true);

        self.routes.insert(prefix, new_route.clone());
        if out_link_changed {
            self.forwarder.add_route(prefix, new_route.out_link);
        }
        self.readvertise(&new_route, received_from);
    }

    /// Re-advertises `route` on every link except the one whose peer is
    /// `except_peer` (split horizon).
    fn readvertise(&self, route: &Route, except_peer: OverlayAddr) {
        for (idx, link) in self.links.iter().enumerate() {
            if link.peer_ip == except_peer {
                continue;
            }
            self.send_control(
                idx,
                ControlBody::Advert {
                    prefix: route.pfx,
                    timestamp: route.timestamp,
                    cost: route.cost,
                    path: route.path.clone(),
                },
            );
        }
    }

    // -- FADVERT -------------------------------------------------------

    fn send_failure_advert(&self, failed_link: usize) {
        let now = self.now();
        let peer = self.links[failed_link].peer_ip;
        for (idx, link) in self.links.iter().enumerate() {
            if link.hello_state == 0 {
                continue;
            }
            self.send_control(
                idx,
                ControlBody::FAdvert {
                    a: self.my_ip,
                    b: peer,
                    timestamp: now,
                    path: vec![self.my_ip],
                },
            );
        }
    }

    fn handle_fadvert(
        &mut self,
        in_link: usize,
        a: OverlayAddr,
        b: OverlayAddr,
        _timestamp: f64,
        path: Vec<OverlayAddr>,
    ) {
        if path.contains(&self.my_ip) {
            log::debug!("dropping fadvert for ({a}, {b}): contains self (loop)");
            return;
        }
        let mut changed = false;
        for route in self.routes.values_mut() {
            if path_contains_adjacency(&route.path, a, b) {
                if route.valid {
                    changed = true;
                }
                route.valid = false;
            }
        }
        if !changed {
            return;
        }

        let now = self.now();
        let mut new_path = Vec::with_capacity(path.len() + 1);
        new_path.push(self.my_ip);
        new_path.extend(path);

        let sender_peer = self.links[in_link].peer_ip;
        for (idx, link) in self.links.iter().enumerate() {
            if link.peer_ip == sender_peer {
                continue;
            }
            self.send_control(
                idx,
                ControlBody::FAdvert {
                    a,
                    b,
                    timestamp: now,
                    path: new_path.clone(),
                },
            );
        }
    }

    // -- dispatch ------------------------------------------------------

    fn handle_packet(&mut self, packet: Packet) {
        let Some(in_link) = self.link_for_peer(packet.src_adr) else {
            log::debug!("control packet from unconfigured peer {}, dropping", packet.src_adr);
            return;
        };
        match ControlBody::parse(&packet.payload) {
            Some(ControlBody::Hello { timestamp }) => self.handle_hello(in_link, timestamp),
            Some(ControlBody::Hello2u { timestamp }) => self.handle_hello_reply(in_link, timestamp),
            Some(ControlBody::Advert {
                prefix,
                timestamp,
                cost,
                path,
            }) => self.handle_advert(in_link, prefix, timestamp, cost, path),
            Some(ControlBody::FAdvert {
                a,
                b,
                timestamp,
                path,
            }) => self.handle_fadvert(in_link, a, b, timestamp, path),
            None => {}
        }
    }

    fn print_routing_table(&self) {
        log::debug!("routing table ({} entries):", self.routes.len());
        for route in self.routes.values() {
            log::debug!(
                "  {} via link {} cost {:.3} valid={} path={:?}",
                route.pfx,
                route.out_link,
                route.cost,
                route.valid,
                route.path
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    fn test_router(n_links: usize) -> Router {
        let (_tx, rx) = bounded(1);
        let forwarder = Arc::new(Forwarder::new(OverlayAddr(1), rx, vec![]));
        let neighbors: Vec<NeighborConfig> = (0..n_links)
            .map(|i| NeighborConfig {
                overlay_ip: OverlayAddr((i + 2) as u32),
                host_ip: "127.0.0.1".to_string(),
                delay: 0.1,
            })
            .collect();
        Router::new(OverlayAddr(1), &neighbors, vec![], false, forwarder)
    }

    #[test]
    fn loop_avoidance_scenario_6() {
        let mut router = test_router(1);
        router.handle_advert(
            0,
            "1.2.0.0/16".parse().unwrap(),
            0.0,
            0.01,
            vec![OverlayAddr(9), OverlayAddr(1)],
        );
        assert!(router.routes.is_empty());
    }

    #[test]
    fn first_advert_installs_route() {
        let mut router = test_router(1);
        router.handle_advert(0, "1.2.0.0/16".parse().unwrap(), 0.0, 0.02, vec![OverlayAddr(2)]);
        let route = router.routes.get(&"1.2.0.0/16".parse().unwrap()).unwrap();
        assert_eq!(route.path, vec![OverlayAddr(1), OverlayAddr(2)]);
        assert!(route.valid);
    }

    #[test]
    fn failure_invalidation_scenario_8() {
        let mut router = test_router(1);
        router.handle_advert(0, "1.2.0.0/16".parse().unwrap(), 0.0, 0.02, vec![OverlayAddr(2)]);
        assert_eq!(router.links[0].hello_state, 3);

        router.process_liveness(0); // no reply: 3 -> 2
        assert_eq!(router.links[0].hello_state, 2);
        router.process_liveness(0); // 2 -> 1
        assert_eq!(router.links[0].hello_state, 1);
        router.process_liveness(0); // 1 -> 0, invalidates routes on link 0
        assert_eq!(router.links[0].hello_state, 0);

        let route = router.routes.get(&"1.2.0.0/16".parse().unwrap()).unwrap();
        assert!(!route.valid);
    }
}
