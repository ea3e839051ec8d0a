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
//! Per-link liveness and cost state (spec.md §3 "Link-info table").

use vectorlink_wire::OverlayAddr;

/// One entry per configured neighbor, indexed by the stable link index.
#[derive(Debug, Clone)]
pub struct LinkInfo {
    pub peer_ip: OverlayAddr,
    /// EWMA-estimated one-way link cost, in seconds.
    pub cost: f64,
    /// Reset to false before each HELLO round, set on HELLO-REPLY receipt.
    pub got_reply: bool,
    /// Liveness counter in `0..=3`; 3 is healthy, 0 is down.
    pub hello_state: u8,
    pub count: u64,
    pub total_cost: f64,
    pub min_cost: f64,
    pub max_cost: f64,
}

impl LinkInfo {
    pub fn new(peer_ip: OverlayAddr, initial_delay: f64) -> Self {
        let cost = initial_delay.abs();
        LinkInfo {
            peer_ip,
            cost,
            got_reply: false,
            hello_state: 3,
            count: 0,
            total_cost: 0.0,
            min_cost: cost,
            max_cost: cost,
        }
    }

    /// Folds one RTT sample into the EWMA cost estimate (α=0.1) and updates
    /// the running count/min/max statistics (spec.md §4.2 "HELLO-REPLY
    /// handling").
    pub fn record_sample(&mut self, sample: f64) {
        self.cost = 0.1 * sample + 0.9 * self.cost;
        self.count += 1;
        self.total_cost += self.cost;
        self.min_cost = self.min_cost.min(self.cost);
        self.max_cost = self.max_cost.max(self.cost);
        self.got_reply = true;
        self.hello_state = 3;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ewma_update_scenario_3() {
        // Scenario 3 from the spec.
        let mut link = LinkInfo::new(OverlayAddr(0), 0.10);
        let rtt = 10.040 - 10.000;
        link.record_sample(rtt / 2.0);
        assert!((link.cost - 0.092).abs() < 1e-9);
        assert_eq!(link.count, 1);
    }

    #[test]
    fn new_starts_healthy() {
        let link = LinkInfo::new(OverlayAddr(1), 0.05);
        assert_eq!(link.hello_state, 3);
        assert!(!link.got_reply);
    }
}
