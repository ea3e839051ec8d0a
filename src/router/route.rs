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
//! Routing-table entries and the route-update decision rule.

use vectorlink_wire::{OverlayAddr, Prefix};

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub pfx: Prefix,
    pub timestamp: f64,
    pub cost: f64,
    /// Head (`path[0]`) is this router; tail is the destination router.
    pub path: Vec<OverlayAddr>,
    pub out_link: usize,
    pub valid: bool,
}

/// Decides whether `nu` should replace `rte`, evaluating the five rules
/// from spec.md §4.2 in order. Kept free of any table/lock access so it is
/// directly unit-testable against the spec's literal scenarios.
pub fn route_update_applies(rte: &Route, nu: &Route) -> bool {
    if !nu.valid {
        return false;
    }
    if !rte.valid {
        return true;
    }
    if rte.path == nu.path && rte.out_link == nu.out_link {
        return true;
    }
    if nu.cost <= 0.9 * rte.cost {
        return true;
    }
    if nu.timestamp >= rte.timestamp + 20.0 {
        return true;
    }
    false
}

/// True iff the ordered pair `(a, b)` appears as adjacent hops in `path`
/// (spec.md §4.2 "Failure-advertisement handling").
pub fn path_contains_adjacency(path: &[OverlayAddr], a: OverlayAddr, b: OverlayAddr) -> bool {
    path.windows(2).any(|w| w[0] == a && w[1] == b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(cost: f64, timestamp: f64, path: Vec<OverlayAddr>, out_link: usize, valid: bool) -> Route {
        Route {
            pfx: "1.2.0.0/16".parse().unwrap(),
            timestamp,
            cost,
            path,
            out_link,
            valid,
        }
    }

    #[test]
    fn update_by_cost_improvement_scenario_4() {
        let rte = route(0.100, 0.0, vec![OverlayAddr(1), OverlayAddr(2)], 0, true);
        let nu = route(0.089, 1.0, vec![OverlayAddr(1), OverlayAddr(3)], 1, true);
        assert!(route_update_applies(&rte, &nu));
    }

    #[test]
    fn update_rejected_scenario_5() {
        let rte = route(0.100, 5.0, vec![OverlayAddr(1), OverlayAddr(2)], 0, true);
        let nu = route(0.095, 10.0, vec![OverlayAddr(1), OverlayAddr(3)], 1, true);
        assert!(!route_update_applies(&rte, &nu));
    }

    #[test]
    fn invalid_candidate_never_applies() {
        let rte = route(0.100, 0.0, vec![OverlayAddr(1)], 0, true);
        let nu = route(0.010, 1.0, vec![OverlayAddr(1)], 1, false);
        assert!(!route_update_applies(&rte, &nu));
    }

    #[test]
    fn invalid_existing_route_is_always_replaced() {
        let rte = route(0.050, 0.0, vec![OverlayAddr(1)], 0, false);
        let nu = route(0.900, 1.0, vec![OverlayAddr(1), OverlayAddr(2)], 1, true);
        assert!(route_update_applies(&rte, &nu));
    }

    #[test]
    fn same_path_and_link_refreshes_even_with_worse_cost() {
        // Open question from the spec: retained intentionally for route
        // aging under steady-state reconvergence.
        let path = vec![OverlayAddr(1), OverlayAddr(2)];
        let rte = route(0.050, 0.0, path.clone(), 2, true);
        let nu = route(0.300, 1.0, path, 2, true);
        assert!(route_update_applies(&rte, &nu));
    }

    #[test]
    fn staleness_rule_forces_replacement() {
        let rte = route(0.050, 0.0, vec![OverlayAddr(1)], 0, true);
        let nu = route(0.060, 20.0, vec![OverlayAddr(1), OverlayAddr(9)], 1, true);
        assert!(route_update_applies(&rte, &nu));
    }

    #[test]
    fn adjacency_detection() {
        let path = vec![OverlayAddr(1), OverlayAddr(2), OverlayAddr(3)];
        assert!(path_contains_adjacency(&path, OverlayAddr(2), OverlayAddr(3)));
        assert!(!path_contains_adjacency(&path, OverlayAddr(1), OverlayAddr(3)));
    }
}
