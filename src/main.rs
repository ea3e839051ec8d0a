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
//! `vectorlinkd`: launches the Substrate, Forwarder and Router as
//! cooperating threads and drives the traffic generator / ping responder
//! on the calling thread (SPEC_FULL.md §2 "process wiring").

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;

use vectorlink::cli::Cli;
use vectorlink::config::Config;
use vectorlink::forwarder::Forwarder;
use vectorlink::router::Router;
use vectorlink::substrate::Substrate;
use vectorlink::{appgen, logging};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.debug);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(&cli.config_file)?;

    let (substrate, from_wire_rx) =
        Substrate::new(&config.host_ip, &config.neighbors, cli.static_delay)?;
    let substrate = Arc::new(substrate);

    let forwarder = Arc::new(Forwarder::new(
        config.my_ip,
        from_wire_rx,
        substrate.egress_queues(),
    ));

    let mut router = Router::new(
        config.my_ip,
        &config.neighbors,
        config.prefixes.clone(),
        cli.enable_fa,
        Arc::clone(&forwarder),
    );

    let quit = Arc::new(AtomicBool::new(false));
    {
        let quit = Arc::clone(&quit);
        ctrlc::set_handler(move || {
            log::warn!("received interrupt, shutting down");
            quit.store(true, Ordering::Relaxed);
        })?;
    }

    let egress_handle = {
        let substrate = Arc::clone(&substrate);
        let quit = Arc::clone(&quit);
        thread::Builder::new()
            .name("substrate-egress".into())
            .spawn(move || substrate.run_egress(&quit))?
    };
    let ingress_handle = {
        let substrate = Arc::clone(&substrate);
        let quit = Arc::clone(&quit);
        thread::Builder::new()
            .name("substrate-ingress".into())
            .spawn(move || substrate.run_ingress(&quit))?
    };
    let forwarder_handle = {
        let forwarder = Arc::clone(&forwarder);
        let quit = Arc::clone(&quit);
        thread::Builder::new()
            .name("forwarder".into())
            .spawn(move || forwarder.run(&quit))?
    };
    let router_handle = {
        let quit = Arc::clone(&quit);
        thread::Builder::new()
            .name("router".into())
            .spawn(move || router.run(&quit))?
    };

    if config.destinations.is_empty() {
        appgen::run_responder(&forwarder, &quit);
    } else {
        appgen::run_generator(&forwarder, &config.destinations, cli.delta, cli.run_length, &quit);
        quit.store(true, Ordering::Relaxed);
    }

    // Give the core threads a moment to observe `quit` before joining, so
    // a generator run doesn't race the substrate's idle-grace shutdown.
    thread::sleep(Duration::from_millis(10));

    forwarder_handle.join().expect("forwarder thread panicked");
    router_handle.join().expect("router thread panicked");
    egress_handle.join().expect("substrate egress thread panicked");
    match ingress_handle.join().expect("substrate ingress thread panicked") {
        Ok(()) => {}
        Err(e) => anyhow::bail!("substrate ingress: {e}"),
    }

    Ok(())
}
