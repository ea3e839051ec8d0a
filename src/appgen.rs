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
//! Traffic generator / ping responder (SPEC_FULL.md §6.4). Drives the
//! Forwarder purely through its application-plane interface —
//! `send`/`receive`/`ready`/`incoming` — the same surface any external
//! application would use.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use vectorlink_wire::OverlayAddr;

use crate::forwarder::Forwarder;

/// Sends one `PING <seq> <now>` to each destination every `delta` seconds,
/// for `run_length` seconds total.
pub fn run_generator(forwarder: &Forwarder, destinations: &[OverlayAddr], delta: f64, run_length: f64, quit: &AtomicBool) {
    let start = Instant::now();
    let delta = Duration::from_secs_f64(delta.max(0.0));
    let deadline = Duration::from_secs_f64(run_length.max(0.0));
    let mut seq: u64 = 0;

    while !quit.load(Ordering::Relaxed) && start.elapsed() < deadline {
        let now = start.elapsed().as_secs_f64();
        for dest in destinations {
            let payload = format!("PING {seq} {now:.3}");
            if forwarder.ready() {
                if !forwarder.send(payload, *dest) {
                    log::debug!("app-plane queue full, dropping ping {seq} to {dest}");
                }
            } else {
                log::debug!("app-plane not ready, dropping ping {seq} to {dest}");
            }
        }
        seq += 1;
        thread::sleep(delta);
    }
}

/// Blocks on `receive()`, replying to every `PING` with a `PONG` addressed
/// back to the sender. Any other payload is logged and dropped.
pub fn run_responder(forwarder: &Forwarder, quit: &AtomicBool) {
    while !quit.load(Ordering::Relaxed) {
        if !forwarder.incoming() {
            thread::sleep(Duration::from_millis(1));
            continue;
        }
        let (payload, src) = forwarder.receive();
        match parse_ping(&payload) {
            Some((seq, ts)) => {
                let reply = format!("PONG {seq} {ts}");
                if !forwarder.send(reply, src) {
                    log::debug!("app-plane queue full, dropping pong {seq} to {src}");
                }
            }
            None => log::debug!("responder ignoring non-ping payload from {src}: {payload:?}"),
        }
    }
}

fn parse_ping(payload: &str) -> Option<(u64, &str)> {
    let mut fields = payload.split_whitespace();
    if fields.next()? != "PING" {
        return None;
    }
    let seq: u64 = fields.next()?.parse().ok()?;
    let ts = fields.next()?;
    Some((seq, ts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_ping() {
        assert_eq!(parse_ping("PING 3 1.250"), Some((3, "1.250")));
    }

    #[test]
    fn rejects_non_ping_payloads() {
        assert_eq!(parse_ping("PONG 3 1.250"), None);
        assert_eq!(parse_ping("garbage"), None);
        assert_eq!(parse_ping("PING not-a-number 1.250"), None);
    }
}
